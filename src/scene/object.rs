//! Scene Objects
//!
//! [`SceneObject`] is the leaf entity the engine simulates: an immutable,
//! shareable mesh payload, a mutable model transform, an optional animation
//! binding, and the bookkeeping the engine needs to serialize the object
//! into a frame.
//!
//! # Lifecycle
//!
//! An object is created externally with mesh and material, handed to the
//! engine (directly before start, through the addition queue after), and
//! from then on mutated only by the engine thread. Removal is two-phase:
//! the removal queue sets the deletion flag, and a later flush physically
//! drops flagged objects from the live list. The flag is monotonic: once
//! set it stays set until the object is removed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

use crate::animation::Motion;
use crate::engine::LogicalTime;
use crate::errors::{EngineError, Result};
use crate::material::Material;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Engine-assigned object identity, unique per process.
///
/// Used to address objects across the thread boundary, e.g. in
/// [`EngineHandle::remove_object`](crate::engine::EngineHandle::remove_object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Immutable mesh payload: positions, indices, a free-form attribute block
/// (UVs or vertex colors; the material decides how to interpret it), and
/// normals.
///
/// Shared between object instances via `Arc`; never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct MeshData {
    positions: Vec<f32>,
    indices: Vec<u16>,
    attributes: Vec<f32>,
    normals: Vec<f32>,
}

impl MeshData {
    /// Builds a mesh payload, validating that positions and normals agree on
    /// the vertex count and that every index stays within the mesh's own
    /// vertex range.
    ///
    /// The attribute block is not validated here: its stride is
    /// material-dependent (two floats per vertex for UVs, three for colors).
    pub fn new(
        positions: Vec<f32>,
        indices: Vec<u16>,
        attributes: Vec<f32>,
        normals: Vec<f32>,
    ) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(EngineError::AttributeMismatch {
                attribute: "positions",
                actual: positions.len(),
                expected: positions.len() / 3 * 3,
            });
        }
        let vertex_count = positions.len() / 3;
        if normals.len() != positions.len() {
            return Err(EngineError::AttributeMismatch {
                attribute: "normals",
                actual: normals.len(),
                expected: positions.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| usize::from(i) >= vertex_count) {
            return Err(EngineError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(Self {
            positions,
            indices,
            attributes,
            normals,
        })
    }

    /// Number of vertices in this mesh.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[f32] {
        &self.attributes
    }

    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }
}

/// A live scene entity: shared mesh payload plus per-instance state.
pub struct SceneObject {
    id: ObjectId,
    mesh: Arc<MeshData>,
    material: Arc<dyn Material>,

    /// Model transform, defaults to identity. Written by the animation
    /// binding each frame; may also be set directly for static placement.
    pub model_matrix: Mat4,

    motion: Option<Box<dyn Motion>>,
    stationary: bool,
    deleted: bool,
    last_advance: LogicalTime,
    index_offset: Option<usize>,
}

impl SceneObject {
    /// Creates an object from a mesh payload and the material that will
    /// serialize it.
    #[must_use]
    pub fn new(mesh: Arc<MeshData>, material: Arc<dyn Material>) -> Self {
        Self {
            id: ObjectId::next(),
            mesh,
            material,
            model_matrix: Mat4::IDENTITY,
            motion: None,
            stationary: false,
            deleted: false,
            last_advance: 0,
            index_offset: None,
        }
    }

    /// Creates `quantity` additional instances sharing this object's mesh
    /// payload and material, each with an independent identity, identity
    /// transform, and no animation binding.
    #[must_use]
    pub fn instance(&self, quantity: usize) -> Vec<Self> {
        (0..quantity)
            .map(|_| Self::new(Arc::clone(&self.mesh), Arc::clone(&self.material)))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> &Arc<MeshData> {
        &self.mesh
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> &Arc<dyn Material> {
        &self.material
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[inline]
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.mesh.indices().len()
    }

    /// `true` if this object has no motion of its own. The model matrix can
    /// still be changed directly; it just won't be animated.
    #[inline]
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.stationary
    }

    pub fn set_stationary(&mut self, stationary: bool) {
        self.stationary = stationary;
    }

    /// Sets and starts the motion that animates this object's transform.
    pub fn start_motion(&mut self, mut motion: Box<dyn Motion>, time: LogicalTime, speed: f32) {
        motion.start(time, &self.model_matrix, speed);
        self.motion = Some(motion);
    }

    /// Recomputes the transform for the given logical time.
    ///
    /// Stationary or unbound objects only record the time.
    pub fn advance(&mut self, time: LogicalTime) {
        if !self.stationary
            && let Some(motion) = self.motion.as_mut()
        {
            motion.sample(&mut self.model_matrix, time);
        }
        self.last_advance = time;
    }

    /// The last logical time passed to [`advance`](Self::advance).
    #[inline]
    #[must_use]
    pub fn last_advanced(&self) -> LogicalTime {
        self.last_advance
    }

    /// Flags this object for deletion. It stays in the live list (skipped by
    /// advancement and serialization) until the next flush removes it.
    ///
    /// Must only be called on the engine thread, from the per-frame hook or
    /// a scheduled action. External threads use
    /// [`EngineHandle::remove_object`](crate::engine::EngineHandle::remove_object).
    pub fn mark_for_deletion(&mut self) {
        self.deleted = true;
    }

    #[inline]
    #[must_use]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.deleted
    }

    /// Index-buffer offset assigned during the last serialization, if any.
    #[inline]
    #[must_use]
    pub fn index_offset(&self) -> Option<usize> {
        self.index_offset
    }

    pub(crate) fn set_index_offset(&mut self, offset: usize) {
        self.index_offset = Some(offset);
    }
}
