//! Scene Lighting
//!
//! The engine carries a single directional light. Its values may be changed
//! from any thread through [`EngineHandle::set_light`]; the change is
//! recorded under a dedicated lock and applied to each buffer generation the
//! next time the engine publishes it, so both generations converge on the
//! new values within two publishes.
//!
//! [`EngineHandle::set_light`]: crate::engine::EngineHandle::set_light

use glam::Vec3;
use parking_lot::Mutex;

use crate::frame::Generation;

/// Directional light: a direction vector and an RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightRig {
    pub direction: Vec3,
    pub color: Vec3,
}

impl LightRig {
    #[must_use]
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self { direction, color }
    }
}

/// Cross-thread light state.
///
/// `set` is called from command threads; `apply_pending` only from the
/// engine thread, for the generation it is about to publish. Both generations
/// carry their own pending flag so a single update reaches each of them
/// exactly once.
#[derive(Debug, Default)]
pub(crate) struct SharedLight {
    state: Mutex<PendingLight>,
}

#[derive(Debug, Default)]
struct PendingLight {
    rig: LightRig,
    pending: [bool; 2],
}

impl SharedLight {
    /// Records new light values and marks both generations pending.
    pub(crate) fn set(&self, direction: Vec3, color: Vec3) {
        let mut state = self.state.lock();
        state.rig = LightRig::new(direction, color);
        state.pending = [true, true];
    }

    /// Copies pending values into `dst` if `generation` has not seen them
    /// yet, clearing that generation's flag.
    pub(crate) fn apply_pending(&self, generation: Generation, dst: &mut LightRig) {
        let mut state = self.state.lock();
        if state.pending[generation.index()] {
            *dst = state.rig;
            state.pending[generation.index()] = false;
        }
    }
}
