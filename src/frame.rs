//! Frame Output Buffers
//!
//! One [`FrameBuffers`] value is a complete generation of draw data: flat
//! vertex and index arrays, packed model matrices, lighting, a view-matrix
//! slot, and the ordered per-object metadata that mirrors serialization
//! order. The engine owns two generations and alternates between them, so
//! the consumer can read one while the next is being written.
//!
//! Generations are exchanged by ownership transfer through the output sink
//! rather than shared behind a flag: at no instant can the writer and the
//! reader hold the same storage.

use std::sync::Arc;

use glam::Mat4;

use crate::errors::{EngineError, Result};
use crate::material::Material;
use crate::scene::light::LightRig;
use crate::scene::object::ObjectId;
use crate::settings::EngineSettings;

/// Identifies one of the two alternating buffer generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    A,
    B,
}

impl Generation {
    /// The other generation.
    #[inline]
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Index of this generation into per-generation state pairs.
    #[inline]
    #[must_use]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Per-object draw metadata, appended in serialization order.
///
/// The list published with each frame mirrors the order in which object data
/// was written into the flat buffers, so the consumer can walk both in step.
#[derive(Clone)]
pub struct Primitive {
    /// Engine-assigned identity of the source object.
    pub object: ObjectId,
    /// Number of vertices the object contributed.
    pub vertex_count: usize,
    /// Number of indices the object contributed.
    pub index_count: usize,
    /// Offset into the frame's vertex buffer, in floats.
    pub vertex_offset: usize,
    /// Running vertex counter at this object: indices are stored unadjusted,
    /// so the consumer rebases them by this amount.
    pub first_vertex: usize,
    /// Offset into the frame's index buffer, in slots.
    pub index_offset: usize,
    /// The material that produced the object's vertex layout.
    pub material: Arc<dyn Material>,
}

/// One generation of flat output buffers.
///
/// All storage is allocated once from [`EngineSettings`] capacities and fully
/// overwritten each frame; it is never reallocated. Exceeding a capacity
/// while writing is a fatal fault surfaced as an error, never a resize.
pub struct FrameBuffers {
    vertex_data: Vec<f32>,
    index_data: Vec<u16>,
    model_matrices: Vec<f32>,
    vertex_fill: usize,
    index_fill: usize,
    matrix_fill: usize,

    /// Directional light for this generation.
    pub light: LightRig,
    /// View matrix captured from the camera at serialization time.
    pub view_matrix: Mat4,
    /// Per-object metadata in serialization order.
    pub primitives: Vec<Primitive>,
}

impl FrameBuffers {
    /// Allocates one generation sized to the given capacities.
    #[must_use]
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            vertex_data: vec![0.0; settings.vertex_floats()],
            index_data: vec![0; settings.index_slots()],
            model_matrices: vec![0.0; settings.max_objects * 16],
            vertex_fill: 0,
            index_fill: 0,
            matrix_fill: 0,
            light: LightRig::default(),
            view_matrix: Mat4::IDENTITY,
            primitives: Vec::with_capacity(settings.max_objects),
        }
    }

    /// Clears fill counters and metadata for the next frame. Buffer contents
    /// are left in place; only the filled prefix is meaningful.
    pub(crate) fn reset(&mut self) {
        self.vertex_fill = 0;
        self.index_fill = 0;
        self.matrix_fill = 0;
        self.primitives.clear();
    }

    /// Reserves `len` floats of vertex storage, returning the writable slice
    /// and its offset.
    pub(crate) fn vertex_slot(&mut self, len: usize) -> Result<(usize, &mut [f32])> {
        let offset = self.vertex_fill;
        let end = offset + len;
        if end > self.vertex_data.len() {
            return Err(EngineError::VertexCapacityExceeded {
                needed: end,
                capacity: self.vertex_data.len(),
            });
        }
        self.vertex_fill = end;
        Ok((offset, &mut self.vertex_data[offset..end]))
    }

    /// Appends indices, returning the offset they were written at.
    pub(crate) fn push_indices(&mut self, indices: &[u16]) -> Result<usize> {
        let offset = self.index_fill;
        let end = offset + indices.len();
        if end > self.index_data.len() {
            return Err(EngineError::IndexCapacityExceeded {
                needed: end,
                capacity: self.index_data.len(),
            });
        }
        self.index_data[offset..end].copy_from_slice(indices);
        self.index_fill = end;
        Ok(offset)
    }

    /// Appends one 16-float model matrix.
    pub(crate) fn push_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        let offset = self.matrix_fill;
        let end = offset + 16;
        if end > self.model_matrices.len() {
            return Err(EngineError::ObjectCapacityExceeded {
                count: end / 16,
                capacity: self.model_matrices.len() / 16,
            });
        }
        self.model_matrices[offset..end].copy_from_slice(&matrix.to_cols_array());
        self.matrix_fill = end;
        Ok(())
    }

    // ========================================================================
    // Consumer-side accessors
    // ========================================================================

    /// The filled prefix of the vertex buffer, in floats.
    #[inline]
    #[must_use]
    pub fn vertex_data(&self) -> &[f32] {
        &self.vertex_data[..self.vertex_fill]
    }

    /// The filled prefix of the vertex buffer as raw bytes, ready for upload.
    #[inline]
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertex_data())
    }

    /// The filled prefix of the index buffer.
    #[inline]
    #[must_use]
    pub fn index_data(&self) -> &[u16] {
        &self.index_data[..self.index_fill]
    }

    /// The filled prefix of the index buffer as raw bytes.
    #[inline]
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.index_data())
    }

    /// Index-buffer update watermark: the slot count up to which the consumer
    /// should refresh its copy. Fixed at the full capacity.
    #[inline]
    #[must_use]
    pub fn index_watermark(&self) -> usize {
        self.index_data.len()
    }

    /// Packed model matrices, 16 floats per serialized object, in the same
    /// order as [`FrameBuffers::primitives`].
    #[inline]
    #[must_use]
    pub fn model_matrices(&self) -> &[f32] {
        &self.model_matrices[..self.matrix_fill]
    }
}
