//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EngineError`] covers all failure modes including:
//! - Mesh validation errors
//! - Serialization capacity faults
//! - Internal buffer-consistency faults
//! - Output pipe disconnection
//!
//! Capacity and consistency faults are fatal by design: the engine loop logs
//! them and halts rather than publishing a partially written frame.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, EngineError>`.

use thiserror::Error;

/// The main error type for the Skiff engine.
///
/// Each variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================================================
    // Mesh Validation Errors
    // ========================================================================
    /// A mesh index references a vertex outside the mesh's own vertex range.
    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index value.
        index: u16,
        /// The number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A mesh attribute array does not match the mesh's vertex count.
    #[error("mesh attribute `{attribute}` has {actual} elements, expected {expected}")]
    AttributeMismatch {
        /// Name of the attribute block.
        attribute: &'static str,
        /// Number of elements found.
        actual: usize,
        /// Number of elements required by the vertex count.
        expected: usize,
    },

    // ========================================================================
    // Capacity Faults (fatal)
    // ========================================================================
    /// The vertex buffer capacity would be exceeded during serialization.
    #[error("vertex buffer capacity exceeded: need {needed} floats, capacity {capacity}")]
    VertexCapacityExceeded {
        /// Floats required to serialize the frame so far.
        needed: usize,
        /// Configured capacity in floats.
        capacity: usize,
    },

    /// The index buffer capacity would be exceeded during serialization.
    #[error("index buffer capacity exceeded: need {needed} indices, capacity {capacity}")]
    IndexCapacityExceeded {
        /// Indices required to serialize the frame so far.
        needed: usize,
        /// Configured capacity in indices.
        capacity: usize,
    },

    /// More live objects than the configured maximum.
    #[error("object capacity exceeded: {count} live objects, capacity {capacity}")]
    ObjectCapacityExceeded {
        /// Number of live objects this frame.
        count: usize,
        /// Configured maximum object count.
        capacity: usize,
    },

    // ========================================================================
    // Consistency Faults (fatal)
    // ========================================================================
    /// No writable buffer generation was available when one was required.
    ///
    /// Both generations are allocated at construction and exchanged through
    /// the output sink; this fault means the exchange protocol was violated.
    #[error("no writable frame buffer generation available")]
    MissingGeneration,

    // ========================================================================
    // Output Pipe Errors
    // ========================================================================
    /// The consumer side of the output pipe is gone.
    #[error("output pipe disconnected")]
    PipeDisconnected,
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
