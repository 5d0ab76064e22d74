//! Engine Integration Tests
//!
//! End-to-end tests against a running engine thread and the canonical
//! render pipe:
//! - Pre-start loading and submission order
//! - Serialization layout and frame metadata
//! - Deletion flagging, flush, and same-frame add/remove resolution
//! - Delayed actions against the logical clock
//! - Light convergence across generations
//! - Pause/resume, termination, backpressure, and fault halts

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glam::{Mat4, Vec3};
use skiff::{
    Engine, EngineSettings, FrameConsumer, LinearMotion, MeshData, ObjectId, PublishedFrame,
    RenderPipe, SceneObject, StaticCamera, VertexColorMaterial,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn triangle_mesh() -> Arc<MeshData> {
    Arc::new(
        MeshData::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        )
        .expect("valid triangle mesh"),
    )
}

fn colored_object() -> SceneObject {
    SceneObject::new(triangle_mesh(), Arc::new(VertexColorMaterial))
}

fn new_engine() -> (Engine, FrameConsumer) {
    init_logger();
    let (pipe, consumer) = RenderPipe::new(16);
    let engine = Engine::new(EngineSettings::default(), pipe, StaticCamera::default());
    (engine, consumer)
}

/// Receives frames, releasing each with `time + step`, until `pred` matches;
/// the matching frame is returned unreleased.
fn pump_until<F>(consumer: &FrameConsumer, step: u64, mut pred: F) -> PublishedFrame
where
    F: FnMut(&PublishedFrame) -> bool,
{
    for _ in 0..500 {
        let frame = consumer
            .recv_timeout(Duration::from_secs(5))
            .expect("engine stopped publishing");
        if pred(&frame) {
            return frame;
        }
        let next = frame.time + step;
        frame.release(next);
    }
    panic!("condition not reached within 500 frames");
}

/// Installs a hook that mirrors the live list's ids after each drain.
fn track_live_ids(engine: &mut Engine) -> Arc<Mutex<Vec<ObjectId>>> {
    let ids = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ids);
    engine.set_frame_hook(move |_, objects| {
        *sink.lock().unwrap() = objects.iter().map(SceneObject::id).collect();
    });
    ids
}

// ============================================================================
// Pre-Start Loading
// ============================================================================

#[test]
fn pre_start_list_matches_submissions() {
    let (mut engine, _consumer) = new_engine();

    let a = colored_object();
    let b = colored_object();
    let c = colored_object();
    let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());

    engine.add_object(a);
    engine.add_objects([b, c]);
    engine.remove_object(b_id);

    let ids: Vec<ObjectId> = engine.objects().iter().map(SceneObject::id).collect();
    assert_eq!(
        ids,
        vec![a_id, c_id],
        "pre-start mutation is synchronous and order-preserving"
    );
}

// ============================================================================
// Generations & Serialization
// ============================================================================

#[test]
fn generations_alternate_and_never_alias() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (handle, thread) = engine.start();

    let first = consumer.recv().expect("first frame");
    let second = consumer
        .recv_timeout(Duration::from_secs(5))
        .expect("second frame");

    assert_ne!(first.generation, second.generation);
    assert_eq!(first.generation, second.generation.flip());
    let p0 = std::ptr::from_ref(first.buffers()).cast::<u8>();
    let p1 = std::ptr::from_ref(second.buffers()).cast::<u8>();
    assert_ne!(p0, p1, "the two generations never share storage");

    handle.request_termination();
    drop((first, second, consumer));
    thread.join().expect("engine thread");
}

#[test]
fn serialized_frame_contents() {
    init_logger();
    let (pipe, consumer) = RenderPipe::new(16);
    let camera = StaticCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let mut engine = Engine::new(EngineSettings::default(), pipe, camera);

    let mut object = colored_object();
    object.model_matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    object.set_stationary(true);
    let id = object.id();
    let mesh = Arc::clone(object.mesh());
    engine.add_object(object);

    let (handle, thread) = engine.start();
    let frame = consumer.recv().expect("first frame");
    let buffers = frame.buffers();

    assert_eq!(buffers.vertex_data().len(), 27);
    assert_eq!(&buffers.vertex_data()[..9], mesh.positions());
    assert_eq!(buffers.index_data(), mesh.indices());
    assert_eq!(
        buffers.model_matrices(),
        Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .to_cols_array()
            .as_slice()
    );
    assert_eq!(
        buffers.view_matrix,
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    );

    assert_eq!(buffers.primitives.len(), 1);
    let primitive = &buffers.primitives[0];
    assert_eq!(primitive.object, id);
    assert_eq!(primitive.vertex_count, 3);
    assert_eq!(primitive.index_count, 3);
    assert_eq!(primitive.vertex_offset, 0);
    assert_eq!(primitive.first_vertex, 0);
    assert_eq!(primitive.index_offset, 0);

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

#[test]
fn frame_scenario_stationary_moving_flagged() {
    let (mut engine, consumer) = new_engine();

    let mut a = colored_object();
    a.model_matrix = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    a.set_stationary(true);

    let mut b = colored_object();
    b.start_motion(Box::new(LinearMotion::new(Vec3::X)), 0, 1.0);

    let c = colored_object();
    let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());

    engine.add_objects([a, b, c]);
    let live_ids = track_live_ids(&mut engine);

    let (handle, thread) = engine.start();
    handle.remove_object(c_id);

    let frame = pump_until(&consumer, 16, |frame| frame.buffers().primitives.len() == 2);
    let buffers = frame.buffers();

    let ids: Vec<ObjectId> = buffers.primitives.iter().map(|p| p.object).collect();
    assert_eq!(ids, vec![a_id, b_id], "flagged object is not serialized");

    let matrices = buffers.model_matrices();
    assert_eq!(matrices.len(), 32);
    assert_eq!(
        &matrices[..16],
        Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            .to_cols_array()
            .as_slice(),
        "stationary object's matrix is unchanged"
    );
    let expected_x = frame.time as f32 / 1000.0;
    assert!(
        (matrices[16 + 12] - expected_x).abs() < 1e-4,
        "moving object's translation follows its motion at the frame time"
    );

    assert_eq!(
        live_ids.lock().unwrap().as_slice(),
        &[a_id, b_id, c_id],
        "flagged object stays in the live list until a flush"
    );

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

// ============================================================================
// Flush & Same-Frame Add/Remove
// ============================================================================

#[test]
fn flush_removes_flagged_objects_order_preserved() {
    let (mut engine, consumer) = new_engine();

    let objects: Vec<SceneObject> = (0..4).map(|_| colored_object()).collect();
    let ids: Vec<ObjectId> = objects.iter().map(SceneObject::id).collect();
    engine.add_objects(objects);
    let live_ids = track_live_ids(&mut engine);

    let (handle, thread) = engine.start();
    handle.remove_object(ids[1]);
    handle.remove_object(ids[3]);

    let frame = pump_until(&consumer, 16, |frame| frame.buffers().primitives.len() == 2);
    let next = frame.time + 16;
    frame.release(next);
    assert_eq!(live_ids.lock().unwrap().len(), 4, "flagged but not removed");

    // Two requests with no new deletions in between are equivalent to one.
    handle.request_flush();
    handle.request_flush();

    let frame = pump_until(&consumer, 16, |_| live_ids.lock().unwrap().len() == 2);
    assert_eq!(
        live_ids.lock().unwrap().as_slice(),
        &[ids[0], ids[2]],
        "flush keeps the survivors in order"
    );
    let next = frame.time + 16;
    frame.release(next);

    // A further flush with nothing flagged changes nothing.
    handle.request_flush();
    let frame = pump_until(&consumer, 16, |frame| frame.buffers().primitives.len() == 2);
    assert_eq!(live_ids.lock().unwrap().as_slice(), &[ids[0], ids[2]]);

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

#[test]
fn same_frame_add_and_remove_resolves_as_add_then_flag() {
    let (mut engine, consumer) = new_engine();

    let a = colored_object();
    let a_id = a.id();
    engine.add_object(a);
    let live_ids = track_live_ids(&mut engine);

    // Queue both commands before the loop ever runs: the addition drains
    // first, then the removal flags the freshly added object.
    let handle = engine.handle();
    let x = colored_object();
    let x_id = x.id();
    handle.add_object(x);
    handle.remove_object(x_id);

    let (handle, thread) = engine.start();

    let frame = consumer.recv().expect("first frame");
    let ids: Vec<ObjectId> = frame.buffers().primitives.iter().map(|p| p.object).collect();
    assert_eq!(ids, vec![a_id], "the flagged newcomer never reaches a frame");
    assert_eq!(
        live_ids.lock().unwrap().as_slice(),
        &[a_id, x_id],
        "it is live (flagged) until a flush"
    );

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

// ============================================================================
// Delayed Actions
// ============================================================================

#[test]
fn delayed_action_respects_logical_time() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());

    let fired = Arc::new(AtomicBool::new(false));
    let records = Arc::new(Mutex::new(Vec::new()));
    {
        let fired = Arc::clone(&fired);
        let records = Arc::clone(&records);
        engine.set_frame_hook(move |time, _| {
            records.lock().unwrap().push((time, fired.load(Ordering::SeqCst)));
        });
    }

    let handle = engine.handle();
    let flag = Arc::clone(&fired);
    handle.schedule_delayed(move || flag.store(true, Ordering::SeqCst), 100);

    let (handle, thread) = engine.start();

    // Advance logical time in 30 ms steps until the hook has seen the
    // action's effect.
    let frame = pump_until(&consumer, 30, |_| {
        records.lock().unwrap().iter().any(|(_, fired)| *fired)
    });

    let records = records.lock().unwrap();
    let first_fired = records
        .iter()
        .find(|(_, fired)| *fired)
        .expect("action observed by the hook");
    assert!(
        first_fired.0 >= 100,
        "released no earlier than submission time + delay"
    );
    for (time, fired) in records.iter() {
        if *time < 100 {
            assert!(!fired, "must not run while logical time < release time");
        }
    }

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

// ============================================================================
// Lighting
// ============================================================================

#[test]
fn light_update_converges_across_generations() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (handle, thread) = engine.start();

    let direction = Vec3::new(0.0, -1.0, 0.0);
    let color = Vec3::new(1.0, 0.9, 0.8);
    handle.set_light(direction, color);

    // Up to two frames may already have been serialized when the update
    // landed; the two after that must both carry it.
    let mut frames = Vec::new();
    for _ in 0..4 {
        let frame = consumer
            .recv_timeout(Duration::from_secs(5))
            .expect("frame");
        let next = frame.time + 16;
        frames.push((frame.generation, frame.buffers().light));
        frame.release(next);
    }
    let (gen_a, light_a) = frames[2];
    let (gen_b, light_b) = frames[3];
    assert_ne!(gen_a, gen_b, "consecutive frames are opposite generations");
    for light in [light_a, light_b] {
        assert_eq!(light.direction, direction);
        assert_eq!(light.color, color);
    }

    handle.request_termination();
    drop(consumer);
    thread.join().expect("engine thread");
}

// ============================================================================
// Pause / Resume / Termination
// ============================================================================

#[test]
fn pause_halts_publishing_until_resume() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (handle, thread) = engine.start();

    let frame = consumer.recv().expect("running engine publishes");
    let next = frame.time + 16;
    frame.release(next);

    handle.pause();
    assert!(handle.is_paused());

    // Drain whatever was in flight before the gate engaged.
    while let Some(frame) = consumer.recv_timeout(Duration::from_millis(300)) {
        let next = frame.time + 16;
        frame.release(next);
    }
    assert!(
        consumer.recv_timeout(Duration::from_millis(300)).is_none(),
        "a paused engine publishes nothing"
    );

    handle.resume();
    assert!(!handle.is_paused());
    let frame = consumer
        .recv_timeout(Duration::from_secs(5))
        .expect("resume restarts publishing");

    handle.request_termination();
    drop((frame, consumer));
    thread.join().expect("engine thread");
}

#[test]
fn termination_wakes_a_paused_engine() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (handle, thread) = engine.start();

    handle.pause();
    while let Some(frame) = consumer.recv_timeout(Duration::from_millis(300)) {
        let next = frame.time + 16;
        frame.release(next);
    }

    handle.request_termination();
    thread.join().expect("termination must wake the pause wait");
}

#[test]
fn consumer_disconnect_stops_engine() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (_handle, thread) = engine.start();

    drop(consumer);
    thread.join().expect("engine stops when the pipe closes");
}

// ============================================================================
// Backpressure & Capacity Faults
// ============================================================================

#[test]
fn backpressure_bounds_frames_in_flight() {
    let (mut engine, consumer) = new_engine();
    engine.add_object(colored_object());
    let (handle, thread) = engine.start();

    let held = consumer.recv().expect("first frame");
    std::thread::sleep(Duration::from_millis(200));

    let second = consumer.try_recv();
    assert!(second.is_some(), "the second generation may still be written");
    assert!(
        consumer.try_recv().is_none(),
        "with both generations out, the engine must block"
    );

    handle.request_termination();
    drop((held, second, consumer));
    thread.join().expect("engine thread");
}

#[test]
fn capacity_fault_halts_engine() {
    init_logger();
    let (pipe, consumer) = RenderPipe::new(16);
    let settings = EngineSettings {
        vertex_capacity: 8,
        index_capacity: 2,
        max_objects: 4,
    };
    let mut engine = Engine::new(settings, pipe, StaticCamera::default());
    engine.add_object(colored_object());

    let (_handle, thread) = engine.start();

    assert!(
        consumer.recv().is_err(),
        "no frame is published after a capacity fault"
    );
    thread.join().expect("engine halts on the fault");
}
