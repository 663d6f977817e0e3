//! Stress tests for axon-logging node context
//!
//! Worker-pool threads switch node context once per handled message, so the
//! guard must be cheap and must never leak context between scopes.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use axon_core::Iden;
use axon_logging::NodeContextGuard;

/// Concurrent guard creation and switching across many threads
#[test]
fn test_concurrent_node_contexts() {
    const NUM_THREADS: usize = 32;
    const ITERATIONS: usize = 500;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = vec![];

    let start = Instant::now();

    for _ in 0..NUM_THREADS {
        let barrier = Arc::clone(&barrier);

        handles.push(thread::spawn(move || {
            let iden = Iden::random();

            // Wait for all threads to be ready
            barrier.wait();

            for _ in 0..ITERATIONS {
                let _guard = NodeContextGuard::new(&iden);
                assert_eq!(NodeContextGuard::current_iden(), Some(iden));
            }

            // After all guards drop, context should be None
            assert!(NodeContextGuard::current().is_none());
        }));
    }

    for handle in handles {
        handle.join().expect("Thread should complete");
    }

    println!(
        "Switched {} node contexts in {:?}",
        NUM_THREADS * ITERATIONS,
        start.elapsed()
    );
}

/// Deeply nested guards unwind back to each previous node in order
#[test]
fn test_deep_nesting_restores_in_order() {
    const DEPTH: usize = 256;

    let idens: Vec<Iden> = (0..DEPTH).map(|_| Iden::random()).collect();
    let mut guards = Vec::with_capacity(DEPTH);

    for iden in &idens {
        guards.push(NodeContextGuard::new(iden));
        assert_eq!(NodeContextGuard::current_iden(), Some(*iden));
    }

    for depth in (0..DEPTH).rev() {
        assert_eq!(NodeContextGuard::current_iden(), Some(idens[depth]));
        drop(guards.pop());
    }

    assert!(NodeContextGuard::current().is_none());
}

/// A pool thread handling messages for several nodes never mixes them up
#[test]
fn test_shared_thread_many_nodes() {
    let nodes: Vec<Iden> = (0..8).map(|_| Iden::random()).collect();

    for round in 0..1_000 {
        let iden = nodes[round % nodes.len()];
        let _guard = NodeContextGuard::new(&iden);
        let ctx = NodeContextGuard::current().unwrap();
        assert_eq!(ctx.iden, iden);
        assert_eq!(ctx.node_id, iden.short_id());
    }
}
