//! Engine Settings
//!
//! Fixed capacities for the double-buffered output storage. Both buffer
//! generations are allocated once from these values when the engine is
//! constructed and are never reallocated; exceeding a capacity during
//! serialization is a fatal fault, not a resize trigger.

/// Global configuration for engine construction.
///
/// # Fields
///
/// | Field             | Description                                | Default |
/// |-------------------|--------------------------------------------|---------|
/// | `vertex_capacity` | Vertex buffer size per generation, bytes   | 1 MiB   |
/// | `index_capacity`  | Index buffer size per generation, bytes    | 128 KiB |
/// | `max_objects`     | Maximum simultaneous live objects          | 512     |
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Vertex buffer capacity per generation, in bytes. Each vertex float
    /// occupies four bytes.
    pub vertex_capacity: usize,

    /// Index buffer capacity per generation, in bytes. Each index occupies
    /// two bytes.
    pub index_capacity: usize,

    /// Maximum number of simultaneous live objects. Sizes the model-matrix
    /// array (16 floats per object) and the per-frame metadata list.
    pub max_objects: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vertex_capacity: 1024 * 1024,
            index_capacity: 128 * 1024,
            max_objects: 512,
        }
    }
}

impl EngineSettings {
    /// Vertex buffer capacity in `f32` slots.
    #[inline]
    #[must_use]
    pub fn vertex_floats(&self) -> usize {
        self.vertex_capacity / 4
    }

    /// Index buffer capacity in `u16` slots.
    #[inline]
    #[must_use]
    pub fn index_slots(&self) -> usize {
        self.index_capacity / 2
    }
}
