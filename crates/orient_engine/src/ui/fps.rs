//! Smoothed frames-per-second readout

/// Weight of the previous value in the moving average
pub const FPS_AVERAGING_ALPHA: f32 = 0.96;

/// Exponential moving average of the frame rate.
///
/// A frame time of zero keeps the previous sample so the readout never
/// jumps to infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsCounter {
    frames_per_second: f32,
    last_sample: f32,
}

impl FpsCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the last frame time in milliseconds and return the smoothed rate
    pub fn update(&mut self, frame_time_ms: f32) -> f32 {
        if frame_time_ms > 0.0 {
            self.last_sample = 1000.0 / frame_time_ms;
        }
        self.frames_per_second =
            FPS_AVERAGING_ALPHA * self.frames_per_second + (1.0 - FPS_AVERAGING_ALPHA) * self.last_sample;
        self.frames_per_second
    }

    /// Current smoothed rate
    pub fn value(&self) -> f32 {
        self.frames_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_update_weights_new_sample() {
        let mut fps = FpsCounter::new();
        // 10 ms -> 100 fps, blended 4% into a zero start
        assert_relative_eq!(fps.update(10.0), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_converges_to_frame_rate() {
        let mut fps = FpsCounter::new();
        for _ in 0..500 {
            fps.update(1000.0 / 60.0);
        }
        assert_relative_eq!(fps.value(), 60.0, epsilon = 1e-2);
    }

    #[test]
    fn test_zero_frame_time_reuses_previous_sample() {
        let mut fps = FpsCounter::new();
        for _ in 0..500 {
            fps.update(20.0);
        }
        let settled = fps.value();

        let after_zero = fps.update(0.0);
        assert!(after_zero.is_finite());
        assert_relative_eq!(after_zero, settled, epsilon = 1e-2);
    }
}
