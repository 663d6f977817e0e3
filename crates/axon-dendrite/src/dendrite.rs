//! The dendrite: a registry of named operations
//!
//! Handlers implement [`Operation`] (closures of the right shape do so
//! automatically). [`Dendrite::exec`] runs one [`Work`] inside a task scope
//! and always leaves the task finished: unknown names, handler errors and
//! handler panics all become failure results on the task.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ErrorInfo, OperationError, OperationResult};
use crate::task::Task;
use crate::work::Work;

/// A handler for one named operation
pub trait Operation: Send + Sync {
    fn call(&self, task: &Task, work: &Work) -> OperationResult<Value>;
}

impl<F> Operation for F
where
    F: Fn(&Task, &Work) -> OperationResult<Value> + Send + Sync,
{
    fn call(&self, task: &Task, work: &Work) -> OperationResult<Value> {
        self(task, work)
    }
}

/// A bundle of operations registered together
pub trait Service: Send + Sync {
    /// The operations this service provides, by name
    fn operations(self: Arc<Self>) -> Vec<(String, Arc<dyn Operation>)>;
}

/// Named-operation registry
#[derive(Default)]
pub struct Dendrite {
    ops: DashMap<String, Arc<dyn Operation>>,
}

impl Dendrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`, replacing any previous handler
    pub fn add<F>(&self, name: impl Into<String>, func: F)
    where
        F: Fn(&Task, &Work) -> OperationResult<Value> + Send + Sync + 'static,
    {
        self.add_op(name, Arc::new(func));
    }

    /// Register a shared handler under `name`, replacing any previous one
    pub fn add_op(&self, name: impl Into<String>, op: Arc<dyn Operation>) {
        let name = name.into();
        debug!(op = %name, "Registered operation");
        self.ops.insert(name, op);
    }

    /// Register every operation of `service`
    pub fn with_service<S>(self, service: Arc<S>) -> Self
    where
        S: Service + 'static,
    {
        for (name, op) in service.operations() {
            self.add_op(name, op);
        }
        self
    }

    /// Names of registered operations, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ops.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run `work` as `task`
    ///
    /// Returns once the task is finished. Never panics on behalf of the
    /// handler.
    pub fn exec(&self, task: &Task, work: &Work) {
        let _scope = task.enter();

        // Clone out of the map so the shard lock is not held by the handler
        let op = self.ops.get(&work.name).map(|e| Arc::clone(e.value()));
        let Some(op) = op else {
            debug!(op = %work.name, "No such operation");
            task.err(OperationError::NoSuchOperation(work.name.clone()).into());
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| op.call(task, work))) {
            Ok(Ok(value)) => {
                task.retn(value);
            }
            Ok(Err(error)) => {
                debug!(op = %work.name, kind = error.kind(), "Operation failed");
                task.err(ErrorInfo::from(&error));
            }
            Err(payload) => {
                let info = ErrorInfo::from_panic(payload.as_ref());
                warn!(op = %work.name, mesg = %info.mesg, "Operation panicked");
                task.err(info);
            }
        }
    }
}
