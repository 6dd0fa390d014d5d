use greensync::sync::{Scheduler, exclusive};
use greensync::task::{self, spawn};
use greensync::{Current, Queue, RuntimeBuilder, RuntimeError, yield_now};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn block_on_returns_the_future_output() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn builder_options_are_applied() {
    let rt = RuntimeBuilder::new().task_capacity(16).name("worker").build();

    assert_eq!(rt.name(), "worker");
    assert_eq!(rt.num_tasks(), 0);
    assert_eq!(rt.block_on(async { "done" }), "done");
}

#[test]
fn tasks_spawned_before_block_on_run_inside_it() {
    let rt = RuntimeBuilder::new().build();

    let handle = rt.spawn(async { 1 + 1 });
    assert_eq!(rt.num_tasks(), 1);

    assert_eq!(rt.block_on(handle), 2);
    assert_eq!(rt.num_tasks(), 0);
}

#[test]
fn ready_tasks_run_in_spawn_order() {
    let rt = RuntimeBuilder::new().build();
    let log = Rc::new(RefCell::new(Vec::new()));

    let log_clone = log.clone();
    rt.block_on(async move {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let log = log_clone.clone();
                spawn(async move {
                    log.borrow_mut().push(i);
                    yield_now().await;
                    log.borrow_mut().push(i + 10);
                })
            })
            .collect();

        for handle in handles {
            handle.await;
        }
    });

    assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 10, 11, 12, 13]);
}

#[test]
fn stalled_runtime_is_reported() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.try_block_on(async {
        let queue: Queue<u8> = Queue::new();
        queue.pop().await
    });

    assert_eq!(result, Err(RuntimeError::Stalled { suspended: 1 }));
}

#[test]
#[should_panic(expected = "block_on failed")]
fn block_on_panics_when_stalled() {
    let rt = RuntimeBuilder::new().build();

    rt.block_on(async {
        let queue: Queue<u8> = Queue::new();
        queue.pop().await
    });
}

#[test]
fn aborted_task_never_completes() {
    let rt = RuntimeBuilder::new().build();
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    let handle = rt.spawn(async move {
        *flag.borrow_mut() = true;
    });

    let id = handle.id();
    handle.abort();

    rt.block_on(async move {
        yield_now().await;
        assert!(!Current.is_alive(&id));
    });

    assert!(!*ran.borrow());
    assert_eq!(rt.num_tasks(), 0);
}

#[test]
fn current_task_ids_are_distinct() {
    let rt = RuntimeBuilder::new().build();

    rt.block_on(async {
        let root = task::current();
        let child = spawn(async { task::current() });
        let child_id = child.id();

        assert_eq!(child.await, child_id);
        assert_ne!(root, child_id);
    });
}

#[test]
fn exclusive_restores_the_critical_flag() {
    let rt = RuntimeBuilder::new().build();

    rt.block_on(async {
        let inside = exclusive(|| Current.is_critical());

        assert!(inside);
        assert!(!Current.is_critical());
    });
}

#[greensync::test(task_capacity = 4, name = "attr")]
async fn test_attribute_accepts_options() {
    let handle = spawn(async { 5 });
    assert_eq!(handle.await, 5);
}
