use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use turnstile::sync::AsyncMutex;
use turnstile::{RuntimeBuilder, join, task, yield_now};

#[test]
fn test_join_empty() {
    let rt = RuntimeBuilder::new().build().unwrap();

    let () = rt.block_on(async { join!() });
}

#[test]
fn test_join_single_future() {
    let rt = RuntimeBuilder::new().build().unwrap();

    let result = rt.block_on(async {
        let a = join!(async { 42 });
        a
    });

    assert_eq!(result, 42);
}

#[test]
fn test_join_two_futures() {
    let rt = RuntimeBuilder::new().build().unwrap();

    let result = rt.block_on(async {
        let (a, b) = join!(async { 10 }, async { 20 });
        (a, b)
    });

    assert_eq!(result, (10, 20));
}

#[test]
fn test_join_different_types_with_trailing_comma() {
    let rt = RuntimeBuilder::new().build().unwrap();

    let result = rt.block_on(async {
        join!(async { "hello" }, async { 42 }, async { vec![1, 2, 3] },)
    });

    assert_eq!(result, ("hello", 42, vec![1, 2, 3]));
}

#[test]
fn test_join_concurrent_execution() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let c1 = counter.clone();
    let c2 = counter.clone();
    let c3 = counter.clone();

    rt.block_on(async move {
        join!(
            async move {
                c1.fetch_add(1, Ordering::SeqCst);
            },
            async move {
                c2.fetch_add(10, Ordering::SeqCst);
            },
            async move {
                c3.fetch_add(100, Ordering::SeqCst);
            }
        );
    });

    assert_eq!(counter.load(Ordering::SeqCst), 111);
}

#[test]
fn test_join_interleaves_at_yield_points() {
    let rt = RuntimeBuilder::new().build().unwrap();
    let order = Mutex::new(Vec::new());

    rt.block_on(async {
        let order = &order;

        join!(
            async move {
                order.lock().unwrap().push("a1");
                yield_now().await;
                order.lock().unwrap().push("a2");
            },
            async move {
                order.lock().unwrap().push("b1");
                yield_now().await;
                order.lock().unwrap().push("b2");
            }
        );
    });

    assert_eq!(*order.lock().unwrap(), ["a1", "b1", "a2", "b2"]);
}

#[test]
fn test_join_task_handles() {
    let rt = RuntimeBuilder::new().build().unwrap();

    let (a, b) = rt.block_on(async {
        join!(task::spawn(async { 1 }), task::spawn(async { 2 }))
    });

    assert_eq!((a, b), (Ok(1), Ok(2)));
}

#[turnstile::test]
async fn test_join_dispatches_serialize_in_argument_order() {
    let mutex = AsyncMutex::new();
    let log = Mutex::new(Vec::new());
    let log = &log;

    let (x, y) = join!(
        mutex.dispatch(move || async move {
            log.lock().unwrap().push("x enter");
            yield_now().await;
            log.lock().unwrap().push("x exit");
            'x'
        }),
        mutex.dispatch(move || async move {
            log.lock().unwrap().push("y enter");
            yield_now().await;
            log.lock().unwrap().push("y exit");
            'y'
        })
    );

    assert_eq!((x, y), ('x', 'y'));
    assert_eq!(
        *log.lock().unwrap(),
        ["x enter", "x exit", "y enter", "y exit"]
    );
}
