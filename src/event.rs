//! Log callback system.
//!
//! Every recoverable condition (empty content, missing parent for
//! auto-splitting, a host detached mid-measurement, an invalid split type)
//! is reported here as a warning and the pipeline carries on.

use std::sync::{Mutex, OnceLock};

/// Log level for diagnostic callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

fn log_callback() -> &'static Mutex<Option<LogCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<LogCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

/// Set the global log callback.
pub fn set_log_callback<F>(callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    if let Ok(mut guard) = log_callback().lock() {
        *guard = Some(Box::new(callback));
    }
}

/// Remove the global log callback.
pub fn clear_log_callback() {
    if let Ok(mut guard) = log_callback().lock() {
        *guard = None;
    }
}

/// Emit a log message.
pub fn emit_log(level: LogLevel, message: &str) {
    #[cfg(feature = "tracing")]
    match level {
        LogLevel::Debug => tracing::debug!(target: "kernsplit", "{message}"),
        LogLevel::Info => tracing::info!(target: "kernsplit", "{message}"),
        LogLevel::Warn => tracing::warn!(target: "kernsplit", "{message}"),
        LogLevel::Error => tracing::error!(target: "kernsplit", "{message}"),
    }

    if let Ok(guard) = log_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(level, message);
        }
    }
}

/// Emit a warning.
pub(crate) fn warn(message: &str) {
    emit_log(LogLevel::Warn, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_callback() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let seen = Arc::new(AtomicBool::new(false));
        let seen_clone = Arc::clone(&seen);
        set_log_callback(move |level, msg| {
            if level == LogLevel::Info && msg == "event-test-hello" {
                seen_clone.store(true, Ordering::SeqCst);
            }
        });
        emit_log(LogLevel::Info, "event-test-hello");
        assert!(seen.load(Ordering::SeqCst));
    }
}
