//! Animation Bindings
//!
//! A [`Motion`] computes an object's model transform for a logical time.
//! The engine calls [`Motion::sample`] once per frame for every live,
//! non-stationary object that carries a binding; curve evaluation itself is
//! up to the implementation.
//!
//! Logical time is in milliseconds; speeds are unitless multipliers applied
//! on top of each motion's own rate.

use glam::{Mat4, Vec3};

use crate::engine::LogicalTime;

/// Animation binding for a single object's transform.
pub trait Motion: Send {
    /// Binds the motion to an object: captures whatever it needs from the
    /// object's transform at `time` and applies the speed multiplier.
    fn start(&mut self, time: LogicalTime, initial: &Mat4, speed: f32);

    /// Writes the transform for `time` into `dst`.
    fn sample(&mut self, dst: &mut Mat4, time: LogicalTime);
}

/// Straight-line motion at a constant velocity (units per second).
///
/// Preserves the rotation/scale part of the transform captured at start and
/// animates only the translation.
#[derive(Debug, Clone)]
pub struct LinearMotion {
    velocity: Vec3,
    origin: Vec3,
    start_time: LogicalTime,
    speed: f32,
}

impl LinearMotion {
    #[must_use]
    pub fn new(velocity: Vec3) -> Self {
        Self {
            velocity,
            origin: Vec3::ZERO,
            start_time: 0,
            speed: 1.0,
        }
    }
}

impl Motion for LinearMotion {
    fn start(&mut self, time: LogicalTime, initial: &Mat4, speed: f32) {
        self.origin = initial.w_axis.truncate();
        self.start_time = time;
        self.speed = speed;
    }

    fn sample(&mut self, dst: &mut Mat4, time: LogicalTime) {
        let dt = time.saturating_sub(self.start_time) as f32 / 1000.0;
        let translation = self.origin + self.velocity * self.speed * dt;
        dst.w_axis = translation.extend(1.0);
    }
}

/// Rotation about a fixed axis at a constant rate (radians per second),
/// composed on top of the transform captured at start.
#[derive(Debug, Clone)]
pub struct SpinMotion {
    axis: Vec3,
    rate: f32,
    base: Mat4,
    start_time: LogicalTime,
    speed: f32,
}

impl SpinMotion {
    #[must_use]
    pub fn new(axis: Vec3, rate: f32) -> Self {
        Self {
            axis: axis.normalize_or_zero(),
            rate,
            base: Mat4::IDENTITY,
            start_time: 0,
            speed: 1.0,
        }
    }
}

impl Motion for SpinMotion {
    fn start(&mut self, time: LogicalTime, initial: &Mat4, speed: f32) {
        self.base = *initial;
        self.start_time = time;
        self.speed = speed;
    }

    fn sample(&mut self, dst: &mut Mat4, time: LogicalTime) {
        let dt = time.saturating_sub(self.start_time) as f32 / 1000.0;
        let angle = self.rate * self.speed * dt;
        *dst = Mat4::from_axis_angle(self.axis, angle) * self.base;
    }
}
