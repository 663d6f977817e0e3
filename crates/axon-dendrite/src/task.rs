//! Tasks: a single terminal result fanned out to completion listeners
//!
//! A [`Task`] finishes exactly once, either with a value ([`Task::retn`]) or
//! with an [`ErrorInfo`] ([`Task::err`]). Later attempts are ignored.
//! Listeners registered with [`Task::on_retn`] see the result once; a
//! listener added after completion is called immediately.

use std::fmt;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::error::ErrorInfo;

/// The terminal result of a task
pub type TaskResult = Result<Value, ErrorInfo>;

type Listener = Box<dyn FnOnce(&TaskResult) + Send>;

#[derive(Default)]
struct TaskState {
    result: Option<TaskResult>,
    listeners: Vec<Listener>,
}

/// One unit of work executed by a dendrite
pub struct Task {
    id: Uuid,
    state: Mutex<TaskState>,
}

impl Task {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(TaskState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register a completion listener
    pub fn on_retn<F>(&self, listener: F)
    where
        F: FnOnce(&TaskResult) + Send + 'static,
    {
        let mut state = self.state.lock();
        if let Some(result) = state.result.clone() {
            drop(state);
            listener(&result);
            return;
        }
        state.listeners.push(Box::new(listener));
    }

    /// Finish with a value; returns `false` if already finished
    pub fn retn(&self, value: Value) -> bool {
        self.finish(Ok(value))
    }

    /// Finish with an error; returns `false` if already finished
    pub fn err(&self, info: ErrorInfo) -> bool {
        self.finish(Err(info))
    }

    fn finish(&self, result: TaskResult) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if state.result.is_some() {
                return false;
            }
            state.result = Some(result.clone());
            std::mem::take(&mut state.listeners)
        };

        trace!(task = %self.id, ok = result.is_ok(), "Task finished");
        for listener in listeners {
            listener(&result);
        }
        true
    }

    pub fn is_fini(&self) -> bool {
        self.state.lock().result.is_some()
    }

    /// The terminal result, once finished
    pub fn result(&self) -> Option<TaskResult> {
        self.state.lock().result.clone()
    }

    /// Enter the task's scope
    ///
    /// If the returned guard is dropped before the task finished, the task
    /// is failed with kind `TaskAbandoned`.
    pub fn enter(&self) -> TaskScope<'_> {
        TaskScope { task: self }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("fini", &self.is_fini())
            .finish()
    }
}

/// Scope guard returned by [`Task::enter`]
#[must_use = "the task is abandoned as soon as the scope is dropped"]
pub struct TaskScope<'a> {
    task: &'a Task,
}

impl Drop for TaskScope<'_> {
    fn drop(&mut self) {
        if !self.task.is_fini() {
            self.task
                .err(ErrorInfo::new("TaskAbandoned", "task scope exited without a result"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_single_terminal_result() {
        let task = Task::new();
        assert!(!task.is_fini());
        assert!(task.result().is_none());

        assert!(task.retn(Value::from(1)));
        assert!(!task.retn(Value::from(2)));
        assert!(!task.err(ErrorInfo::new("Late", "too late")));

        assert_eq!(task.result(), Some(Ok(Value::from(1))));
    }

    #[test]
    fn test_listeners_called_once() {
        let task = Task::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            task.on_retn(move |result| {
                assert!(result.is_err());
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        task.err(ErrorInfo::new("Boom", "boom"));
        task.err(ErrorInfo::new("Boom", "again"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_late_listener_called_immediately() {
        let task = Task::new();
        task.retn(Value::from("done"));

        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        task.on_retn(move |result| *slot.lock() = Some(result.clone()));

        assert_eq!(*seen.lock(), Some(Ok(Value::from("done"))));
    }

    #[test]
    fn test_abandoned_scope_fails_task() {
        let task = Task::new();
        {
            let _scope = task.enter();
        }
        let info = task.result().unwrap().unwrap_err();
        assert_eq!(info.err, "TaskAbandoned");
    }

    #[test]
    fn test_finished_scope_keeps_result() {
        let task = Task::new();
        {
            let _scope = task.enter();
            task.retn(Value::Null);
        }
        assert_eq!(task.result(), Some(Ok(Value::Null)));
    }
}
