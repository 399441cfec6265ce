//! A `log::Log` that keeps records in memory so tests can assert on them.
//!
//! The logger is process-wide while tests run on parallel threads, so every
//! record is tagged with the thread that emitted it and [`take`] only hands
//! back the caller's own records.

use std::{
    sync::{Mutex, Once},
    thread::{self, ThreadId},
};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct Captured {
    thread: ThreadId,
    level: Level,
    message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<Captured>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push(Captured {
                thread: thread::current().id(),
                level: record.level(),
                message: record.args().to_string(),
            });
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

pub fn install() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("Another logger is already installed");
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Drains the records logged so far on the current thread.
pub fn take() -> Vec<(Level, String)> {
    let me = thread::current().id();
    let mut records = LOGGER.records.lock().unwrap();
    let (mine, others): (Vec<_>, Vec<_>) = records.drain(..).partition(|r| r.thread == me);
    *records = others;
    mine.into_iter().map(|r| (r.level, r.message)).collect()
}

pub fn count(records: &[(Level, String)], level: Level, message: &str) -> usize {
    records
        .iter()
        .filter(|(l, m)| *l == level && m == message)
        .count()
}
