//! Camera Collaborator
//!
//! The engine drives exactly one camera per frame: [`Camera::advance`] with
//! the frame's logical time, then [`Camera::write_view_matrix`] into the
//! generation being written. Projection math stays on the consumer side;
//! the engine only transports the view matrix.

use glam::{Mat4, Vec3};

use crate::engine::LogicalTime;

/// Per-frame camera interface, invoked once per iteration by the engine.
pub trait Camera: Send {
    /// Advances camera state to the given logical time.
    fn advance(&mut self, time: LogicalTime);

    /// Writes the current view matrix into `dst`.
    fn write_view_matrix(&self, dst: &mut Mat4);
}

/// A camera with a fixed view matrix.
///
/// The view matrix is the inverse of the camera's world transform; for the
/// common case this is built directly with a look-at construction.
#[derive(Debug, Clone)]
pub struct StaticCamera {
    view: Mat4,
}

impl StaticCamera {
    /// A camera placed at `eye`, looking at `target`, with `up` as the up
    /// reference.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, up),
        }
    }

    /// A camera with an explicit view matrix.
    #[must_use]
    pub fn from_view(view: Mat4) -> Self {
        Self { view }
    }
}

impl Default for StaticCamera {
    fn default() -> Self {
        Self::from_view(Mat4::IDENTITY)
    }
}

impl Camera for StaticCamera {
    fn advance(&mut self, _time: LogicalTime) {}

    fn write_view_matrix(&self, dst: &mut Mat4) {
        *dst = self.view;
    }
}
