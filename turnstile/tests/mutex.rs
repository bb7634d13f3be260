use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use turnstile::sync::AsyncMutex;
use turnstile::time::sleep;
use turnstile::{JoinError, RuntimeBuilder, join, task, yield_now};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Enter(usize),
    Exit(usize),
}

async fn explode() -> u32 {
    panic!("critical section failed");
}

#[test]
fn test_critical_sections_never_overlap() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    rt.block_on({
        let mutex = mutex.clone();
        let log = log.clone();

        async move {
            let handles: Vec<_> = (0..5)
                .map(|i| {
                    let mutex = mutex.clone();
                    let log = log.clone();

                    task::spawn(async move {
                        mutex
                            .dispatch(move || async move {
                                log.lock().unwrap().push(Event::Enter(i));
                                yield_now().await;
                                yield_now().await;
                                log.lock().unwrap().push(Event::Exit(i));
                            })
                            .await
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap();
            }
        }
    });

    let expected: Vec<_> = (0..5)
        .flat_map(|i| [Event::Enter(i), Event::Exit(i)])
        .collect();

    assert_eq!(*log.lock().unwrap(), expected);
    assert!(!mutex.is_locked());
}

#[test]
fn test_grants_follow_call_order_not_poll_order() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = AsyncMutex::new();
    let order = Mutex::new(Vec::new());

    rt.block_on(async {
        let order = &order;

        let first = mutex.dispatch_sync(move || order.lock().unwrap().push("first"));
        let second = mutex.dispatch_sync(move || order.lock().unwrap().push("second"));
        let third = mutex.dispatch_sync(move || order.lock().unwrap().push("third"));

        join!(third, second, first);
    });

    assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
}

#[test]
fn test_read_yield_write_without_lost_updates() {
    const TASKS: usize = 20;

    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());
    let counter = Arc::new(AtomicUsize::new(0));

    rt.block_on({
        let counter = counter.clone();

        async move {
            let handles: Vec<_> = (0..TASKS)
                .map(|_| {
                    let mutex = mutex.clone();
                    let counter = counter.clone();

                    task::spawn(async move {
                        mutex
                            .dispatch(move || async move {
                                let value = counter.load(Ordering::SeqCst);
                                yield_now().await;
                                counter.store(value + 1, Ordering::SeqCst);
                            })
                            .await
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap();
            }
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), TASKS);
}

#[test]
fn test_read_yield_write_loses_updates_without_lock() {
    const TASKS: usize = 20;

    let rt = RuntimeBuilder::new().build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    rt.block_on({
        let counter = counter.clone();

        async move {
            let handles: Vec<_> = (0..TASKS)
                .map(|_| {
                    let counter = counter.clone();

                    task::spawn(async move {
                        let value = counter.load(Ordering::SeqCst);
                        yield_now().await;
                        counter.store(value + 1, Ordering::SeqCst);
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap();
            }
        }
    });

    assert!(counter.load(Ordering::SeqCst) < TASKS);
}

#[test]
fn test_sleeping_holders_finish_in_order() {
    const STEP: Duration = Duration::from_millis(30);

    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(Mutex::new(Vec::new()));

    let start = Instant::now();

    rt.block_on({
        let counter = counter.clone();
        let finished = finished.clone();

        async move {
            let handles: Vec<_> = (1..=3)
                .map(|id| {
                    let mutex = mutex.clone();
                    let counter = counter.clone();
                    let finished = finished.clone();

                    task::spawn(async move {
                        mutex
                            .dispatch(move || async move {
                                sleep(STEP).await;
                                let value = counter.fetch_add(1, Ordering::SeqCst) + 1;
                                finished.lock().unwrap().push((id, value));
                            })
                            .await
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap();
            }
        }
    });

    assert!(start.elapsed() >= STEP * 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(*finished.lock().unwrap(), [(1, 1), (2, 2), (3, 3)]);
}

#[test]
fn test_error_output_is_returned_and_lock_released() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = AsyncMutex::new();

    rt.block_on(async {
        let result: Result<u32, &str> = mutex.dispatch(|| async { Err("rejected") }).await;
        assert_eq!(result, Err("rejected"));
        assert!(!mutex.is_locked());

        let result: Result<u32, &str> = mutex.dispatch(|| async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    });
}

#[test]
fn test_panic_in_critical_section_releases_lock() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());

    rt.block_on({
        let mutex = mutex.clone();

        async move {
            let failing = task::spawn({
                let mutex = mutex.clone();
                async move { mutex.dispatch(explode).await }
            });

            let waiting = task::spawn({
                let mutex = mutex.clone();
                async move { mutex.dispatch(|| async { "after panic" }).await }
            });

            let err = failing.await.unwrap_err();
            assert_eq!(
                err,
                JoinError::Panicked {
                    message: "critical section failed".to_string()
                }
            );

            assert_eq!(waiting.await.unwrap(), "after panic");
            assert_eq!(mutex.dispatch_sync(|| 1 + 1).await, 2);
        }
    });

    assert!(!mutex.is_locked());
    assert_eq!(mutex.queued(), 0);
}

#[test]
fn test_panic_in_sync_work_releases_lock() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());

    rt.block_on({
        let mutex = mutex.clone();

        async move {
            let handle = task::spawn({
                let mutex = mutex.clone();
                async move {
                    mutex
                        .dispatch_sync(|| -> u32 { panic!("sync work failed") })
                        .await
                }
            });

            assert!(handle.await.unwrap_err().is_panic());
        }
    });

    assert!(!mutex.is_locked());
}

#[test]
fn test_unused_mutex_has_no_effect() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = AsyncMutex::new();

    let value = rt.block_on(async {
        yield_now().await;
        5
    });

    assert_eq!(value, 5);
    assert!(!mutex.is_locked());
    assert_eq!(mutex.queued(), 0);
}

#[test]
fn test_manual_acquire_and_release() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let mutex = Arc::new(AsyncMutex::new());

    rt.block_on({
        let mutex = mutex.clone();

        async move {
            let handle = mutex.acquire().await;
            assert!(mutex.is_locked());

            let waiter = task::spawn({
                let mutex = mutex.clone();
                async move {
                    let handle = mutex.acquire().await;
                    let ticket = handle.ticket();
                    handle.release();
                    ticket
                }
            });

            yield_now().await;
            assert_eq!(mutex.queued(), 1);
            assert!(!waiter.is_finished());

            handle.release();
            assert_eq!(waiter.await.unwrap(), 1);
        }
    });

    assert!(!mutex.is_locked());
}

#[test]
fn test_dropping_runtime_releases_held_lock() {
    let mutex = Arc::new(AsyncMutex::new());
    let rt = RuntimeBuilder::new().build().unwrap();

    let holder = rt.spawn({
        let mutex = mutex.clone();
        async move {
            let _handle = mutex.acquire().await;
            std::future::pending::<()>().await;
        }
    });

    let waiter = rt.spawn({
        let mutex = mutex.clone();
        async move { mutex.dispatch_sync(|| ()).await }
    });

    rt.block_on(yield_now());
    assert!(mutex.is_locked());
    assert_eq!(mutex.queued(), 1);

    drop(rt);

    assert!(!mutex.is_locked());
    assert_eq!(mutex.queued(), 0);

    let rt = RuntimeBuilder::new().build().unwrap();
    assert_eq!(rt.block_on(holder), Err(JoinError::Shutdown));
    assert_eq!(rt.block_on(waiter), Err(JoinError::Shutdown));
}

#[test]
fn test_mutex_shared_across_runtimes_on_two_threads() {
    const ROUNDS: usize = 50;

    let mutex = Arc::new(AsyncMutex::new());
    let inside = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..2)
        .map(|_| {
            let mutex = mutex.clone();
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            let total = total.clone();

            thread::spawn(move || {
                let rt = RuntimeBuilder::new().build().unwrap();

                rt.block_on(async move {
                    let inside = &inside;
                    let overlaps = &overlaps;
                    let total = &total;

                    for _ in 0..ROUNDS {
                        mutex
                            .dispatch(move || async move {
                                if inside.swap(true, Ordering::SeqCst) {
                                    overlaps.fetch_add(1, Ordering::SeqCst);
                                }
                                yield_now().await;
                                total.fetch_add(1, Ordering::SeqCst);
                                inside.store(false, Ordering::SeqCst);
                            })
                            .await;
                    }
                });
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(total.load(Ordering::SeqCst), ROUNDS * 2);
    assert!(!mutex.is_locked());
}

#[turnstile::test]
async fn test_introspection_tracks_queue() {
    let mutex = AsyncMutex::new();
    assert!(!mutex.is_locked());

    let first = mutex.acquire();
    let second = mutex.acquire();
    assert!(mutex.is_locked());
    assert_eq!(mutex.queued(), 1);
    assert_eq!((first.ticket(), second.ticket()), (0, 1));

    drop(first.await);
    assert_eq!(mutex.queued(), 0);

    second.await.release();
    assert!(!mutex.is_locked());
}
