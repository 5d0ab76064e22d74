//! Engine Core
//!
//! [`Engine`] is the single-owner worker at the heart of the crate: one
//! dedicated thread owns the live object list and both frame-buffer
//! generations, drains the cross-thread command queues, advances every
//! object, serializes the result into the writable generation, and hands it
//! to the output sink. [`EngineHandle`] is the thread-safe command surface
//! the rest of the application talks to.
//!
//! # Lifecycle
//!
//! 1. Create with [`Engine::new`] (sink + camera + capacities).
//! 2. Bulk-load initial objects directly with [`Engine::add_object`], a cheap
//!    synchronous mutation that is only possible before start.
//! 3. Call [`Engine::start`]; the engine moves onto its own named thread and
//!    all further mutation goes through the returned handle's queues.
//! 4. Shut down with [`EngineHandle::request_termination`], then join.
//!
//! Because `start` consumes the engine, there is no way to run the loop on
//! a foreign thread or to touch the live list after start; both misuses are
//! unrepresentable rather than checked at runtime.
//!
//! # Per-iteration order
//!
//! Immediate actions → additions → removals (flagging) → due delayed
//! actions → flush (if requested) → frame hook → advancement →
//! serialization → publish → generation flip → pause gate. The drain order
//! is load-bearing: an addition and a removal of the same object submitted
//! in the same frame resolves as add-then-flag.

mod commands;
mod pause;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use glam::Vec3;

use crate::errors::{EngineError, Result};
use crate::frame::{FrameBuffers, Generation, Primitive};
use crate::pipe::{FramePacket, OutputSink};
use crate::scene::camera::Camera;
use crate::scene::light::SharedLight;
use crate::scene::object::{ObjectId, SceneObject};
use crate::settings::EngineSettings;

use commands::{CommandReceivers, CommandSenders, DelayQueue, command_queues};
use pause::PauseGate;

/// Simulation time in milliseconds, assigned monotonically to published
/// frames. Distinct from wall-clock time: the output sink decides what the
/// next frame's logical time is.
pub type LogicalTime = u64;

/// Per-frame callback run on the engine thread before objects advance.
///
/// Receives the frame's logical time and the live list; game logic may flag
/// objects for deletion or adjust transforms here.
pub type FrameHook = Box<dyn FnMut(LogicalTime, &mut [SceneObject]) + Send>;

struct EngineControl {
    senders: CommandSenders,
    delayed: DelayQueue,
    gate: PauseGate,
    light: SharedLight,
    flush_requested: AtomicBool,
    time: AtomicU64,
}

/// Thread-safe command surface for a started engine.
///
/// Cheap to clone; every method may be called from any thread. Commands
/// sent after the engine has stopped are dropped.
#[derive(Clone)]
pub struct EngineHandle {
    control: Arc<EngineControl>,
}

impl EngineHandle {
    /// Queues an object for addition at the next iteration's drain.
    pub fn add_object(&self, object: SceneObject) {
        let _ = self.control.senders.additions.send(object);
    }

    /// Queues several objects, preserving submission order.
    pub fn add_objects(&self, objects: impl IntoIterator<Item = SceneObject>) {
        for object in objects {
            self.add_object(object);
        }
    }

    /// Queues an object for removal. The engine flags it for deletion; it
    /// leaves the live list only on the next flush.
    pub fn remove_object(&self, id: ObjectId) {
        let _ = self.control.senders.removals.send(id);
    }

    /// Runs `action` on the engine thread at the next iteration's
    /// immediate-action drain.
    pub fn schedule(&self, action: impl FnOnce() + Send + 'static) {
        let _ = self.control.senders.actions.send(Box::new(action));
    }

    /// Runs `action` on the engine thread once the engine's logical time has
    /// reached now + `delay` (milliseconds). Released no earlier than that
    /// time, not necessarily exactly at it.
    pub fn schedule_delayed(&self, action: impl FnOnce() + Send + 'static, delay: LogicalTime) {
        let release = self.time() + delay;
        self.control.delayed.push(release, Box::new(action));
    }

    /// Requests that deletion-flagged objects be physically removed on the
    /// next iteration. Idempotent.
    pub fn request_flush(&self) {
        self.control.flush_requested.store(true, Ordering::Release);
    }

    /// Pauses the engine at the end of its current iteration. Idempotent.
    pub fn pause(&self) {
        self.control.gate.pause();
    }

    /// Resumes a paused engine; the next iteration starts from the top of
    /// the loop. Idempotent.
    pub fn resume(&self) {
        self.control.gate.resume();
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.control.gate.is_paused()
    }

    /// Updates the scene's directional light. Both generations pick the new
    /// values up as they are published, so the change is fully visible by
    /// the second publish after this call.
    pub fn set_light(&self, direction: Vec3, color: Vec3) {
        self.control.light.set(direction, color);
    }

    /// Requests cooperative termination and wakes a paused engine. The frame
    /// in progress still runs through its publish before the loop exits.
    pub fn request_termination(&self) {
        self.control.gate.terminate();
    }

    /// The logical time of the frame the engine is currently computing.
    #[must_use]
    pub fn time(&self) -> LogicalTime {
        self.control.time.load(Ordering::Acquire)
    }
}

/// The frame engine: owns the live object list and both buffer generations.
pub struct Engine {
    settings: EngineSettings,
    objects: Vec<SceneObject>,
    camera: Box<dyn Camera>,
    sink: Box<dyn OutputSink>,
    hook: Option<FrameHook>,
    control: Arc<EngineControl>,
    receivers: CommandReceivers,
    back: Option<Box<FrameBuffers>>,
    spare: Option<Box<FrameBuffers>>,
    generation: Generation,
    time: LogicalTime,
}

impl Engine {
    /// Creates an engine with both buffer generations allocated to the given
    /// capacities. Logical time starts at zero.
    #[must_use]
    pub fn new(
        settings: EngineSettings,
        sink: impl OutputSink + 'static,
        camera: impl Camera + 'static,
    ) -> Self {
        log::debug!(
            "constructing engine: {} vertex bytes, {} index bytes, {} objects max",
            settings.vertex_capacity,
            settings.index_capacity,
            settings.max_objects
        );
        let (senders, receivers) = command_queues();
        let back = Box::new(FrameBuffers::new(&settings));
        let spare = Box::new(FrameBuffers::new(&settings));
        Self {
            settings,
            objects: Vec::new(),
            camera: Box::new(camera),
            sink: Box::new(sink),
            hook: None,
            control: Arc::new(EngineControl {
                senders,
                delayed: DelayQueue::default(),
                gate: PauseGate::default(),
                light: SharedLight::default(),
                flush_requested: AtomicBool::new(false),
                time: AtomicU64::new(0),
            }),
            receivers,
            back: Some(back),
            spare: Some(spare),
            generation: Generation::A,
            time: 0,
        }
    }

    /// Installs the per-frame hook. Default is a no-op.
    pub fn set_frame_hook(&mut self, hook: impl FnMut(LogicalTime, &mut [SceneObject]) + Send + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Adds an object directly to the live list. Only possible before
    /// [`start`](Self::start); afterwards use [`EngineHandle::add_object`].
    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Adds several objects directly, preserving order.
    pub fn add_objects(&mut self, objects: impl IntoIterator<Item = SceneObject>) {
        self.objects.extend(objects);
    }

    /// Removes an object from the live list synchronously (pre-start only).
    pub fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|object| object.id() != id);
    }

    /// The live list as loaded so far (pre-start inspection).
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// A command handle. Commands sent before [`start`](Self::start) are
    /// drained on the first iteration.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            control: Arc::clone(&self.control),
        }
    }

    /// Consumes the engine and runs its loop on a dedicated named thread.
    ///
    /// Returns the command handle and the thread's join handle. From this
    /// point the live list and the buffer generations belong to the engine
    /// thread alone.
    #[must_use]
    pub fn start(self) -> (EngineHandle, JoinHandle<()>) {
        let handle = self.handle();
        let thread = std::thread::Builder::new()
            .name("skiff-engine".into())
            .spawn(move || self.run_loop())
            .expect("failed to spawn engine thread");
        (handle, thread)
    }

    fn run_loop(mut self) {
        log::debug!("engine thread started");
        let control = Arc::clone(&self.control);
        control.time.store(self.time, Ordering::Release);

        while !control.gate.is_terminated() {
            // 1. Immediate actions, submission order.
            for action in self.receivers.actions.try_iter() {
                action();
            }

            // 2. New objects join the live list tail.
            for object in self.receivers.additions.try_iter() {
                self.objects.push(object);
            }

            // 3. Removals only flag; physical removal waits for a flush.
            for id in self.receivers.removals.try_iter() {
                if let Some(object) = self.objects.iter_mut().find(|o| o.id() == id) {
                    object.mark_for_deletion();
                }
            }

            // 4. Delayed actions that have come due, in release order.
            for action in control.delayed.drain_released(self.time) {
                action();
            }

            // 5. Flush: one linear pass, list order preserved.
            if control.flush_requested.swap(false, Ordering::AcqRel) {
                self.objects.retain(|object| !object.is_marked_for_deletion());
            }

            // 6. Frame hook.
            let time = self.time;
            if let Some(hook) = self.hook.as_mut() {
                hook(time, &mut self.objects);
            }

            // 7. Advance live objects and the camera.
            for object in &mut self.objects {
                if !object.is_marked_for_deletion() {
                    object.advance(time);
                }
            }
            self.camera.advance(time);

            // 8.–10. Serialize into the writable generation.
            if let Err(err) = self.write_frame() {
                log::error!("fatal fault while serializing frame: {err}");
                break;
            }

            // 11.–13. Publish, then exchange generations.
            let Some(buffers) = self.back.take() else {
                log::error!("fatal fault: {}", EngineError::MissingGeneration);
                break;
            };
            let packet = FramePacket {
                generation: self.generation,
                buffers,
            };
            match self.sink.publish(self.time, packet) {
                Ok((next_time, reclaimed)) => {
                    self.back = match reclaimed.or_else(|| self.spare.take()) {
                        Some(buffers) => Some(buffers),
                        None => {
                            log::error!("fatal fault: {}", EngineError::MissingGeneration);
                            break;
                        }
                    };
                    self.generation = self.generation.flip();
                    self.time = next_time;
                    control.time.store(next_time, Ordering::Release);
                }
                Err(err) => {
                    log::info!("output sink closed, stopping engine: {err}");
                    break;
                }
            }

            // 14. Pause gate; a termination request wakes this wait.
            control.gate.block_while_paused();
        }

        log::debug!("engine thread ended");
    }

    /// Serializes every live, non-flagged object into the writable
    /// generation, in live-list order.
    fn write_frame(&mut self) -> Result<()> {
        let buffers = self.back.as_mut().ok_or(EngineError::MissingGeneration)?;
        buffers.reset();

        let live = self
            .objects
            .iter()
            .filter(|object| !object.is_marked_for_deletion())
            .count();
        if live > self.settings.max_objects {
            return Err(EngineError::ObjectCapacityExceeded {
                count: live,
                capacity: self.settings.max_objects,
            });
        }

        // Indices are stored unadjusted; this counter is carried in the
        // metadata so the consumer can rebase them.
        let mut first_vertex = 0usize;

        for object in &mut self.objects {
            if object.is_marked_for_deletion() {
                // Offset bookkeeping still happens; no bytes contributed.
                object.set_index_offset(buffers.index_data().len());
                continue;
            }

            let material = Arc::clone(object.material());
            let floats = material.vertex_floats(object.mesh());
            let (vertex_offset, slot) = buffers.vertex_slot(floats)?;
            let written = material.write_vertex_data(object.mesh(), slot);
            debug_assert_eq!(written, floats);

            let index_offset = buffers.push_indices(object.mesh().indices())?;
            object.set_index_offset(index_offset);

            buffers.push_matrix(&object.model_matrix)?;

            buffers.primitives.push(Primitive {
                object: object.id(),
                vertex_count: object.vertex_count(),
                index_count: object.index_count(),
                vertex_offset,
                first_vertex,
                index_offset,
                material,
            });

            first_vertex += object.vertex_count();
        }

        // 9. View matrix.
        self.camera.write_view_matrix(&mut buffers.view_matrix);

        // 10./13. Pending light values reach the generation being published.
        self.control.light.apply_pending(self.generation, &mut buffers.light);

        Ok(())
    }
}
