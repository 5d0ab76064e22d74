//! Command Queues
//!
//! Four independent multi-producer/single-consumer queues carry mutations
//! from command threads into the engine loop: immediate actions, delayed
//! actions, object additions, and object removals. The senders live in the
//! shared engine control; the receivers are moved into the engine thread at
//! start, so no other thread can ever poll them.
//!
//! The delayed queue is ordered by release time (ties broken by submission
//! order) and measured against the engine's logical clock. Draining it is a
//! non-blocking expiry check: the loop keeps producing frames and picks up
//! due actions at the top of each iteration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use parking_lot::Mutex;

use crate::engine::LogicalTime;
use crate::scene::object::{ObjectId, SceneObject};

/// A closure run on the engine thread.
pub(crate) type Action = Box<dyn FnOnce() + Send>;

pub(crate) struct CommandSenders {
    pub actions: flume::Sender<Action>,
    pub additions: flume::Sender<SceneObject>,
    pub removals: flume::Sender<ObjectId>,
}

pub(crate) struct CommandReceivers {
    pub actions: flume::Receiver<Action>,
    pub additions: flume::Receiver<SceneObject>,
    pub removals: flume::Receiver<ObjectId>,
}

pub(crate) fn command_queues() -> (CommandSenders, CommandReceivers) {
    let (actions_tx, actions_rx) = flume::unbounded();
    let (additions_tx, additions_rx) = flume::unbounded();
    let (removals_tx, removals_rx) = flume::unbounded();
    (
        CommandSenders {
            actions: actions_tx,
            additions: additions_tx,
            removals: removals_tx,
        },
        CommandReceivers {
            actions: actions_rx,
            additions: additions_rx,
            removals: removals_rx,
        },
    )
}

struct DelayedAction {
    release: LogicalTime,
    seq: u64,
    action: Action,
}

impl PartialEq for DelayedAction {
    fn eq(&self, other: &Self) -> bool {
        self.release == other.release && self.seq == other.seq
    }
}

impl Eq for DelayedAction {}

impl PartialOrd for DelayedAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedAction {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse to pop the earliest release
        // first, with submission order breaking ties.
        (other.release, other.seq).cmp(&(self.release, self.seq))
    }
}

#[derive(Default)]
struct DelayState {
    heap: BinaryHeap<DelayedAction>,
    next_seq: u64,
}

/// Time-ordered queue of deferred actions.
#[derive(Default)]
pub(crate) struct DelayQueue {
    state: Mutex<DelayState>,
}

impl DelayQueue {
    /// Enqueues `action` for release at the given logical time.
    pub(crate) fn push(&self, release: LogicalTime, action: Action) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(DelayedAction {
            release,
            seq,
            action,
        });
    }

    /// Removes and returns every action whose release time has elapsed at
    /// `now`, in release order.
    pub(crate) fn drain_released(&self, now: LogicalTime) -> Vec<Action> {
        let mut state = self.state.lock();
        let mut released = Vec::new();
        while state.heap.peek().is_some_and(|head| head.release <= now) {
            if let Some(entry) = state.heap.pop() {
                released.push(entry.action);
            }
        }
        released
    }
}
