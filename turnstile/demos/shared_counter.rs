//! Example: three tasks updating a shared counter through an `AsyncMutex`.
//!
//! Each task sleeps for a second inside its critical section before
//! incrementing the counter, so the updates land one second apart, in
//! spawn order, and the counter ends at 3.
//!
//! Run with `cargo run --example shared_counter`.

use log::{Level, LevelFilter, Log, Metadata, Record, info};
use turnstile::sync::AsyncMutex;
use turnstile::task;
use turnstile::time::sleep;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Prints `info` and above to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[turnstile::main]
async fn main() {
    log::set_logger(&LOGGER).expect("logger already installed");
    log::set_max_level(LevelFilter::Info);

    let mutex = Arc::new(AsyncMutex::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (1..=3)
        .map(|id| {
            let mutex = mutex.clone();
            let counter = counter.clone();

            task::spawn(async move {
                mutex
                    .dispatch(move || async move {
                        info!("task {id} entered after {:.1?}", start.elapsed());
                        sleep(Duration::from_secs(1)).await;
                        let value = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        info!("task {id} done, counter = {value}");
                    })
                    .await
            })
        })
        .collect();

    for handle in handles {
        if let Err(err) = handle.await {
            log::error!("task failed: {err}");
        }
    }

    info!("final value: {}", counter.load(Ordering::SeqCst));
}
