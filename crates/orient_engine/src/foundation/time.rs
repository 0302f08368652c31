//! Time management utilities

use std::time::{Duration, Instant};

/// Monotonic clock for per-frame tick deltas
pub struct Timer {
    origin: Instant,
    last_tick: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_tick: 0.0,
        }
    }

    /// Seconds since the timer was created
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Seconds elapsed between the last stored tick and `tick_time`
    pub fn tick_diff(&self, tick_time: f64) -> f32 {
        (tick_time - self.last_tick) as f32
    }

    /// Remember `tick_time` as the reference for the next frame
    pub fn store_tick(&mut self, tick_time: f64) {
        self.last_tick = tick_time;
    }

    /// Read the clock, store it as the new tick and return it together
    /// with the seconds since the previous tick
    pub fn advance(&mut self) -> (f64, f32) {
        let tick_time = self.now();
        let tick_diff = self.tick_diff(tick_time);
        self.store_tick(tick_time);
        (tick_time, tick_diff)
    }
}

/// Stopwatch measuring phase durations in milliseconds
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start a new measurement
    pub fn start(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and return the measured time in milliseconds.
    ///
    /// Returns 0 when the stopwatch was not running.
    pub fn stop(&mut self) -> f32 {
        if let Some(start) = self.start_time.take() {
            self.elapsed = start.elapsed();
        }
        self.elapsed_millis()
    }

    /// Stop, then immediately start the next measurement.
    ///
    /// Used for the frame stopwatch where one frame ends as the next begins.
    pub fn lap(&mut self) -> f32 {
        let millis = self.stop();
        self.start();
        millis
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        match self.start_time {
            Some(start) => start.elapsed(),
            None => self.elapsed,
        }
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stopwatch_stop_reports_elapsed_millis() {
        let mut stopwatch = Stopwatch::start_new();
        thread::sleep(Duration::from_millis(5));
        let millis = stopwatch.stop();

        assert!(millis >= 5.0);
        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed_millis(), millis);
    }

    #[test]
    fn test_stopwatch_stop_without_start_is_zero() {
        let mut stopwatch = Stopwatch::new();
        assert_eq!(stopwatch.stop(), 0.0);
    }

    #[test]
    fn test_lap_restarts_measurement() {
        let mut stopwatch = Stopwatch::start_new();
        thread::sleep(Duration::from_millis(2));
        let first = stopwatch.lap();

        assert!(first >= 2.0);
        assert!(stopwatch.is_running());
        assert!(stopwatch.elapsed_millis() < first + 1000.0);
    }

    #[test]
    fn test_tick_diff_uses_stored_tick() {
        let mut timer = Timer::new();
        timer.store_tick(1.5);

        assert!((timer.tick_diff(2.0) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_advance_stores_the_tick_it_reports() {
        let mut timer = Timer::new();
        timer.store_tick(-10.0);

        let (first_time, first_diff) = timer.advance();
        assert!(first_diff >= 10.0);

        let (second_time, second_diff) = timer.advance();
        assert!(second_time >= first_time);
        assert!(second_diff < 10.0);
        assert!((second_diff - (second_time - first_time) as f32).abs() < 1e-4);
    }
}
