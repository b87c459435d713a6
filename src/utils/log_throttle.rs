use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_started_at: Instant,
    suppressed: u64,
}

/// Per-key rate limiter for log events that may fire on every request.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<&'static str, WindowState>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(suppressed_count)` when a log for `key` should be emitted,
    /// otherwise `None` and the event is counted as suppressed for the active window.
    pub fn should_emit(&self, key: &'static str) -> Option<u64> {
        let mut map = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match map.get_mut(key) {
            Some(state) if now.duration_since(state.window_started_at) < self.interval => {
                state.suppressed += 1;
                None
            }
            Some(state) => {
                state.window_started_at = now;
                Some(std::mem::take(&mut state.suppressed))
            }
            None => {
                map.insert(
                    key,
                    WindowState {
                        window_started_at: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        LogThrottle::new(Duration::from_secs(60))
    }
}
