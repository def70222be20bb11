//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (animation-frame timestamps to deltas)
//! - Logger setup
//! - The JS-facing factory handle (web only)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Converts monotonic timestamps into frame deltas.
///
/// Deltas are never clamped: after a long stall the simulation clock
/// catches up by running several logical ticks in one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_ms: Option<f64>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; 0 on the first call or if time
    /// went backwards
    pub fn delta(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    /// Forget the previous timestamp (e.g. after the tab was hidden and
    /// the host wants to resume without a catch-up burst)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Initialize native logging from `RUST_LOG`, defaulting to info
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Route `log` to the browser console and panics to `console.error`
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_delta_is_zero() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.delta(1234.0), 0.0);
        assert!((timer.delta(1250.0) - 0.016).abs() < 1e-12);
    }

    #[test]
    fn test_long_stall_not_clamped() {
        let mut timer = FrameTimer::new();
        timer.delta(0.0);
        assert_eq!(timer.delta(5000.0), 5.0);
    }

    #[test]
    fn test_backwards_time_and_reset() {
        let mut timer = FrameTimer::new();
        timer.delta(1000.0);
        assert_eq!(timer.delta(900.0), 0.0);
        timer.reset();
        assert_eq!(timer.delta(9000.0), 0.0);
    }
}
