//! Pause Gate
//!
//! An explicit pausable-condition primitive for the engine thread. Command
//! threads toggle it with [`pause`](PauseGate::pause) /
//! [`resume`](PauseGate::resume); the engine blocks in
//! [`block_while_paused`](PauseGate::block_while_paused) at the end of each
//! iteration. A termination request also wakes the wait, so a paused engine
//! can still shut down.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    paused: bool,
    terminated: bool,
}

#[derive(Debug, Default)]
pub(crate) struct PauseGate {
    state: Mutex<GateState>,
    condvar: Condvar,
}

impl PauseGate {
    /// Requests a pause. Idempotent; takes effect at the engine's next
    /// iteration boundary.
    pub(crate) fn pause(&self) {
        self.state.lock().paused = true;
    }

    /// Clears the pause and wakes a blocked engine thread. Idempotent.
    pub(crate) fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        self.condvar.notify_all();
    }

    /// Marks termination and wakes any blocked wait.
    pub(crate) fn terminate(&self) {
        let mut state = self.state.lock();
        state.terminated = true;
        self.condvar.notify_all();
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.state.lock().terminated
    }

    /// Blocks while paused. Returns as soon as the gate is resumed or
    /// termination has been requested; spurious wakeups re-check the
    /// predicate and keep waiting.
    pub(crate) fn block_while_paused(&self) {
        let mut state = self.state.lock();
        if state.paused && !state.terminated {
            log::debug!("engine paused, waiting to resume");
        }
        while state.paused && !state.terminated {
            self.condvar.wait(&mut state);
        }
    }
}
