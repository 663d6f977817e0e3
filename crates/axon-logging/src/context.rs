//! Node context injection for multi-node logging
//!
//! This module provides thread-local storage for the identity of the node
//! whose work the current thread is doing. Worker-pool threads are shared by
//! every message, so the context is set per handled message.

use std::cell::RefCell;

use axon_core::Iden;
use uuid::Uuid;

/// Node context data stored in thread-local storage
#[derive(Debug, Clone)]
pub struct NodeContextData {
    /// The node's iden
    pub iden: Iden,
    /// Short form of the iden, as logged
    pub node_id: String,
    /// Unique instance ID for this scope
    pub instance_id: Uuid,
}

thread_local! {
    static NODE_CONTEXT: RefCell<Option<NodeContextData>> = const { RefCell::new(None) };
}

/// RAII guard for node context
///
/// When this guard is created, it sets the node context for the current
/// thread. When it's dropped, it restores the previous context (if any).
///
/// # Example
///
/// ```ignore
/// use axon_logging::NodeContextGuard;
///
/// let _guard = NodeContextGuard::new(&node.iden());
///
/// // Spans opened in this scope carry the node's short id
/// tracing::info!("Routing message");
/// ```
pub struct NodeContextGuard {
    previous: Option<NodeContextData>,
}

impl NodeContextGuard {
    pub fn new(iden: &Iden) -> Self {
        Self::with_instance_id(iden, Uuid::new_v4())
    }

    /// Create a guard with a specific instance ID
    pub fn with_instance_id(iden: &Iden, instance_id: Uuid) -> Self {
        let data = NodeContextData {
            iden: *iden,
            node_id: iden.short_id(),
            instance_id,
        };
        let previous = NODE_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    /// Get the current node context (if any)
    pub fn current() -> Option<NodeContextData> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current node's iden (if set)
    pub fn current_iden() -> Option<Iden> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|data| data.iden))
    }

    /// Get the current instance ID (if set)
    pub fn current_instance_id() -> Option<Uuid> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|data| data.instance_id))
    }
}

impl Drop for NodeContextGuard {
    fn drop(&mut self) {
        NODE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to create a node context scope
///
/// # Example
///
/// ```ignore
/// with_node_context!(&iden, {
///     tracing::info!("Applying record");
/// });
/// ```
#[macro_export]
macro_rules! with_node_context {
    ($iden:expr, $body:block) => {{
        let _guard = $crate::context::NodeContextGuard::new($iden);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_context_guard() {
        assert!(NodeContextGuard::current().is_none());

        let iden = Iden::random();
        {
            let _guard = NodeContextGuard::new(&iden);

            let ctx = NodeContextGuard::current().unwrap();
            assert_eq!(ctx.iden, iden);
            assert_eq!(ctx.node_id, iden.short_id());
        }

        assert!(NodeContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        let (a, b) = (Iden::random(), Iden::random());

        {
            let _guard_a = NodeContextGuard::new(&a);
            assert_eq!(NodeContextGuard::current_iden(), Some(a));

            {
                let _guard_b = NodeContextGuard::new(&b);
                assert_eq!(NodeContextGuard::current_iden(), Some(b));
            }

            // Restored to A after B's guard drops
            assert_eq!(NodeContextGuard::current_iden(), Some(a));
        }

        assert!(NodeContextGuard::current_iden().is_none());
    }

    #[test]
    fn test_with_instance_id() {
        let instance_id = Uuid::new_v4();
        let _guard = NodeContextGuard::with_instance_id(&Iden::random(), instance_id);
        assert_eq!(NodeContextGuard::current_instance_id(), Some(instance_id));
    }

    #[test]
    fn test_macro_scope() {
        let iden = Iden::random();
        let seen = crate::with_node_context!(&iden, { NodeContextGuard::current_iden() });
        assert_eq!(seen, Some(iden));
        assert!(NodeContextGuard::current().is_none());
    }
}
