mod common;

use common::poll_once_then_drop;
use greensync::task::{self, spawn};
use greensync::{ConditionVariable, LockError, Mutex, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[greensync::test]
async fn wait_releases_and_reacquires_the_mutex() {
    let mutex = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());

    mutex.lock().await.unwrap();

    let signaller = spawn({
        let mutex = mutex.clone();
        let cond = cond.clone();
        async move {
            mutex.lock().await.unwrap();
            assert_eq!(cond.num_waiting(), 1);

            cond.signal().await;
            mutex.unlock().await;
        }
    });

    cond.wait(&mutex).await.unwrap();

    assert!(mutex.is_locked());
    assert_eq!(mutex.owner(), Some(task::current()));
    assert_eq!(cond.num_waiting(), 0);

    mutex.unlock().await;
    signaller.await;
}

#[greensync::test]
async fn wait_without_holding_the_mutex_is_rejected() {
    let mutex = Mutex::new();
    let cond = ConditionVariable::new();

    assert_eq!(cond.wait(&mutex).await, Err(LockError::NotOwner));
    assert_eq!(cond.num_waiting(), 0);
    assert!(!mutex.is_locked());
}

fn spawn_waiters(
    mutex: &Rc<Mutex>,
    cond: &Rc<ConditionVariable>,
    log: &Rc<RefCell<String>>,
) -> Vec<task::JoinHandle<()>> {
    "abcdef"
        .chars()
        .map(|letter| {
            let mutex = mutex.clone();
            let cond = cond.clone();
            let log = log.clone();

            spawn(async move {
                mutex.lock().await.unwrap();
                cond.wait(&mutex).await.unwrap();
                log.borrow_mut().push(letter);
                mutex.unlock().await;
            })
        })
        .collect()
}

#[greensync::test]
async fn signal_wakes_waiters_in_arrival_order() {
    let mutex = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());
    let log = Rc::new(RefCell::new(String::new()));

    let handles = spawn_waiters(&mutex, &cond, &log);

    yield_now().await;
    assert_eq!(cond.num_waiting(), 6);
    assert!(!mutex.is_locked());

    for _ in 0..6 {
        cond.signal().await;
    }

    for handle in handles {
        handle.await;
    }

    assert_eq!(*log.borrow(), "abcdef");
}

#[greensync::test]
async fn broadcast_wakes_every_waiter() {
    let mutex = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());
    let log = Rc::new(RefCell::new(String::new()));

    let handles = spawn_waiters(&mutex, &cond, &log);

    yield_now().await;
    assert_eq!(cond.num_waiting(), 6);

    cond.broadcast().await;
    assert_eq!(cond.num_waiting(), 0);

    for handle in handles {
        handle.await;
    }

    assert_eq!(*log.borrow(), "abcdef");
}

#[greensync::test]
async fn signal_skips_aborted_waiters() {
    let mutex = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());
    let log = Rc::new(RefCell::new(String::new()));

    let mut handles = spawn_waiters(&mutex, &cond, &log);

    yield_now().await;

    for handle in handles.drain(..2) {
        handle.abort();
    }

    cond.signal().await;
    assert_eq!(cond.num_waiting(), 3);

    cond.broadcast().await;

    for handle in handles {
        handle.await;
    }

    assert_eq!(*log.borrow(), "cdef");
}

#[greensync::test]
async fn synchronized_waiters_are_signalled_in_order() {
    let mutex = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());
    let log = Rc::new(RefCell::new(String::new()));

    let handles: Vec<_> = "abcdef"
        .chars()
        .map(|letter| {
            let mutex = mutex.clone();
            let cond = cond.clone();
            let log = log.clone();

            spawn(async move {
                mutex
                    .synchronize(|| async {
                        cond.wait(&mutex).await.unwrap();
                        assert!(mutex.is_held_by_current());
                        log.borrow_mut().push(letter);
                    })
                    .await
                    .unwrap();
            })
        })
        .collect();

    yield_now().await;
    assert_eq!(cond.num_waiting(), 6);

    for (index, handle) in handles.into_iter().enumerate() {
        assert!(!handle.is_finished());

        cond.signal().await;
        handle.await;

        let written = mutex
            .synchronize(|| async { log.borrow().len() })
            .await
            .unwrap();
        assert_eq!(written, index + 1);
    }

    assert_eq!(*log.borrow(), "abcdef");
    assert!(!mutex.is_locked());
}

#[greensync::test]
async fn dropped_lock_future_does_not_wake_a_later_wait() {
    let first = Rc::new(Mutex::new());
    let second = Rc::new(Mutex::new());
    let cond = Rc::new(ConditionVariable::new());
    let signalled = Rc::new(Cell::new(false));

    first.lock().await.unwrap();

    let sleeper = spawn({
        let first = first.clone();
        let second = second.clone();
        let cond = cond.clone();
        let signalled = signalled.clone();
        async move {
            assert!(poll_once_then_drop(first.lock()).await);

            second.lock().await.unwrap();
            cond.wait(&second).await.unwrap();
            assert!(signalled.get());
            second.unlock().await;
        }
    });

    yield_now().await;
    assert_eq!(first.num_waiting(), 0);
    assert_eq!(cond.num_waiting(), 1);

    first.unlock().await;
    yield_now().await;

    assert!(!sleeper.is_finished());
    assert_eq!(cond.num_waiting(), 1);

    signalled.set(true);
    cond.signal().await;
    sleeper.await;

    assert!(!second.is_locked());
}
