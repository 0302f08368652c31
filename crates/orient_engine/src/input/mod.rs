//! Camera input handling
//!
//! Mouse-look while the cursor is locked and WASD/QE movement intents.
//! Both operate on [`RenderData`] so they can be driven without a window.

use glfw::Key;

use crate::render::render_data::RenderData;

/// Mouse motion in pixels is divided by this before it turns the camera
pub const MOUSE_SENSITIVITY_DIVISOR: f32 = 10.0;

/// Movement multiplier while a shift key is held
pub const FAST_MOVEMENT_MULTIPLIER: i32 = 4;

/// Largest elevation magnitude in degrees
pub const MAX_ELEVATION: f32 = 89.0;

/// Wrap an azimuth in degrees into `[0, 360)`
pub fn wrap_azimuth(azimuth: f32) -> f32 {
    let wrapped = azimuth.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Clamp an elevation in degrees into `[-89, 89]`
pub fn clamp_elevation(elevation: f32) -> f32 {
    elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION)
}

/// Mouse-look state toggled with the right mouse button
#[derive(Debug, Clone, Default)]
pub struct MouseLook {
    locked: bool,
    last_x: f64,
    last_y: f64,
}

impl MouseLook {
    /// Create an unlocked mouse-look
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the lock state and return the new state
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    /// Whether cursor motion currently turns the camera
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Feed an absolute cursor position.
    ///
    /// While locked, the delta to the previous position turns the camera.
    /// The position is stored in either case so locking never causes a jump.
    pub fn handle_motion(&mut self, data: &mut RenderData, x: f64, y: f64) {
        if self.locked {
            let delta_x = (x - self.last_x) as f32;
            let delta_y = (y - self.last_y) as f32;

            data.view_azimuth = wrap_azimuth(data.view_azimuth + delta_x / MOUSE_SENSITIVITY_DIVISOR);
            data.view_elevation = clamp_elevation(data.view_elevation - delta_y / MOUSE_SENSITIVITY_DIVISOR);
        }

        self.last_x = x;
        self.last_y = y;
    }
}

/// Snapshot of the movement keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    /// W
    pub forward: bool,
    /// S
    pub backward: bool,
    /// D
    pub right: bool,
    /// A
    pub left: bool,
    /// E
    pub up: bool,
    /// Q
    pub down: bool,
    /// Either shift key
    pub fast: bool,
}

impl MovementKeys {
    /// Read the key state through a pressed-key query
    pub fn from_key_state(is_pressed: impl Fn(Key) -> bool) -> Self {
        Self {
            forward: is_pressed(Key::W),
            backward: is_pressed(Key::S),
            right: is_pressed(Key::D),
            left: is_pressed(Key::A),
            up: is_pressed(Key::E),
            down: is_pressed(Key::Q),
            fast: is_pressed(Key::LeftShift) || is_pressed(Key::RightShift),
        }
    }

    /// Forward, right and up intents, each in `-4..=4`
    pub fn intents(&self) -> (i32, i32, i32) {
        let axis = |positive: bool, negative: bool| i32::from(positive) - i32::from(negative);
        let multiplier = if self.fast { FAST_MOVEMENT_MULTIPLIER } else { 1 };

        (
            axis(self.forward, self.backward) * multiplier,
            axis(self.right, self.left) * multiplier,
            axis(self.up, self.down) * multiplier,
        )
    }

    /// Store the intents in the render data
    pub fn apply(&self, data: &mut RenderData) {
        let (forward, right, up) = self.intents();
        data.move_forward = forward;
        data.move_right = right;
        data.move_up = up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azimuth_wrap_stays_in_range() {
        for start in [0.0_f32, 10.0, 359.9, 180.0] {
            for increment in [-10_000.0_f32, -360.0, -0.001, -1e-7, 0.0, 0.5, 360.0, 725.3, 10_000.0] {
                let wrapped = wrap_azimuth(start + increment);
                assert!((0.0..360.0).contains(&wrapped), "{start} + {increment} -> {wrapped}");
            }
        }
        assert!((wrap_azimuth(370.0) - 10.0).abs() < 1e-4);
        assert!((wrap_azimuth(-10.0) - 350.0).abs() < 1e-4);
    }

    #[test]
    fn test_elevation_clamp_stays_in_range() {
        for value in [-1e9_f32, -90.0, -89.0, 0.0, 45.0, 89.0, 89.5, 1e9] {
            let clamped = clamp_elevation(value);
            assert!((-89.0..=89.0).contains(&clamped));
        }
        assert_eq!(clamp_elevation(12.5), 12.5);
    }

    #[test]
    fn test_unlocked_motion_only_tracks_position() {
        let mut look = MouseLook::new();
        let mut data = RenderData::default();
        let before = data.clone();

        look.handle_motion(&mut data, 500.0, 300.0);

        assert_eq!(data, before);
    }

    #[test]
    fn test_locked_motion_turns_camera() {
        let mut look = MouseLook::new();
        let mut data = RenderData {
            view_azimuth: 355.0,
            view_elevation: 0.0,
            ..RenderData::default()
        };

        look.handle_motion(&mut data, 100.0, 100.0);
        assert!(look.toggle_lock());
        look.handle_motion(&mut data, 200.0, 50.0);

        // +100 px -> +10 degrees azimuth, wrapped; -50 px up -> +5 elevation
        assert!((data.view_azimuth - 5.0).abs() < 1e-3);
        assert!((data.view_elevation - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_large_motion_clamps_elevation() {
        let mut look = MouseLook::new();
        let mut data = RenderData::default();
        look.toggle_lock();

        look.handle_motion(&mut data, 0.0, -100_000.0);
        assert_eq!(data.view_elevation, MAX_ELEVATION);

        look.handle_motion(&mut data, 0.0, 100_000.0);
        assert_eq!(data.view_elevation, -MAX_ELEVATION);
    }

    #[test]
    fn test_movement_intents() {
        let keys = MovementKeys {
            forward: true,
            left: true,
            up: true,
            down: true,
            ..MovementKeys::default()
        };
        assert_eq!(keys.intents(), (1, -1, 0));
    }

    #[test]
    fn test_shift_multiplies_intents() {
        let keys = MovementKeys::from_key_state(|key| matches!(key, Key::S | Key::D | Key::Q | Key::RightShift));
        assert_eq!(keys.intents(), (-4, 4, -4));

        let mut data = RenderData::default();
        keys.apply(&mut data);
        assert_eq!((data.move_forward, data.move_right, data.move_up), (-4, 4, -4));
    }
}
