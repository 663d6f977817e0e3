//! Execution through the public dendrite surface

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use axon_dendrite::{Dendrite, OperationError, Task, TaskResult, Work};
use parking_lot::Mutex;
use serde_json::Value;

fn dendrite() -> Dendrite {
    let dendrite = Dendrite::new();
    dendrite.add("sum", |_, work| {
        Ok(Value::from(work.arg_i64(0)? + work.arg_i64(1)?))
    });
    dendrite.add("fail", |_, work| {
        let kind = work
            .kwarg("kind")
            .and_then(Value::as_str)
            .unwrap_or("Failure");
        Err(OperationError::failed(kind, "requested failure"))
    });
    dendrite
}

#[test]
fn test_sum_over_listener() {
    let dendrite = dendrite();
    let task = Task::new();

    let seen: Arc<Mutex<Vec<TaskResult>>> = Arc::new(Mutex::new(Vec::new()));
    let slot = Arc::clone(&seen);
    task.on_retn(move |result| slot.lock().push(result.clone()));

    dendrite.exec(&task, &Work::new("sum").with_args([2, 3]));

    assert_eq!(*seen.lock(), vec![Ok(Value::from(5))]);
}

#[test]
fn test_failure_kind_reaches_listener() {
    let dendrite = dendrite();
    let task = Task::new();

    let kind = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&kind);
    task.on_retn(move |result| {
        if let Err(info) = result {
            *slot.lock() = Some(info.err.clone());
        }
    });

    dendrite.exec(&task, &Work::new("fail").with_kwarg("kind", "QuotaExceeded"));

    assert!(task.is_fini());
    assert_eq!(kind.lock().as_deref(), Some("QuotaExceeded"));
}

#[test]
fn test_json_work_round_trip_through_exec() {
    let dendrite = dendrite();
    let work = Work::from_bytes(br#"{"name":"sum","args":[40,2]}"#).unwrap();

    let task = Task::new();
    dendrite.exec(&task, &work);
    assert_eq!(task.result(), Some(Ok(Value::from(42))));
}

#[test]
fn test_concurrent_exec() {
    const THREADS: usize = 8;
    const CALLS: usize = 200;

    let dendrite = Arc::new(dendrite());
    let ok = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for thread_id in 0..THREADS {
        let dendrite = Arc::clone(&dendrite);
        let ok = Arc::clone(&ok);
        handles.push(thread::spawn(move || {
            for i in 0..CALLS {
                let task = Task::new();
                dendrite.exec(&task, &Work::new("sum").with_args([thread_id, i]));
                if task.result() == Some(Ok(Value::from(thread_id + i))) {
                    ok.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread should complete");
    }
    assert_eq!(ok.load(Ordering::Relaxed), THREADS * CALLS);
}
