//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and quaternion/curve helpers
//! - Time measurement
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
