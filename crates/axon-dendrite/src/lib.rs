//! # Axon Dendrite
//!
//! Service endpoints reachable over the mesh.
//!
//! A [`Dendrite`] maps operation names to handlers. Executing a [`Work`]
//! always finishes its [`Task`] with exactly one result: the handler's value,
//! or an [`ErrorInfo`] naming the kind of failure. Handler errors and panics
//! never escape [`Dendrite::exec`].
//!
//! ```rust,ignore
//! use axon_dendrite::{Dendrite, Task, Work};
//!
//! let dendrite = Dendrite::new();
//! dendrite.add("sum", |_: &Task, work: &Work| {
//!     Ok((work.arg_i64(0)? + work.arg_i64(1)?).into())
//! });
//!
//! let task = Task::new();
//! dendrite.exec(&task, &Work::new("sum").with_args([2, 3]));
//! assert_eq!(task.result(), Some(Ok(5.into())));
//! ```
//!
//! A dendrite does not depend on the link graph. It may be embedded in a
//! node or used standalone.

pub mod dendrite;
pub mod error;
pub mod task;
pub mod work;

// Re-export main types
pub use dendrite::{Dendrite, Operation, Service};
pub use error::{ErrorInfo, OperationError, OperationResult};
pub use task::{Task, TaskResult, TaskScope};
pub use work::Work;
