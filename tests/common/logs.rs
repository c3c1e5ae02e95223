//! Warning capture through the global log callback.
//!
//! The callback is process-wide and test threads run concurrently, so every
//! record is tagged with the emitting thread and [`capture_warnings`] only
//! returns the caller's own.

use kernsplit::{LogLevel, set_log_callback};
use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};

type Record = (ThreadId, LogLevel, String);

fn records() -> &'static Mutex<Vec<Record>> {
    static RECORDS: OnceLock<Mutex<Vec<Record>>> = OnceLock::new();
    RECORDS.get_or_init(|| Mutex::new(Vec::new()))
}

fn install() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        set_log_callback(|level, message| {
            if let Ok(mut guard) = records().lock() {
                guard.push((thread::current().id(), level, message.to_string()));
            }
        });
    });
}

fn drain_own(id: ThreadId) -> Vec<Record> {
    let mut guard = records().lock().unwrap();
    let (own, rest): (Vec<Record>, Vec<Record>) = guard.drain(..).partition(|r| r.0 == id);
    *guard = rest;
    own
}

/// Run `f` and return its result with the warnings it emitted.
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    install();
    let id = thread::current().id();
    drain_own(id);
    let result = f();
    let warnings = drain_own(id)
        .into_iter()
        .filter(|(_, level, _)| *level == LogLevel::Warn)
        .map(|(_, _, message)| message)
        .collect();
    (result, warnings)
}
