//! Materials
//!
//! A [`Material`] owns the serialization layout of an object's vertex data:
//! the engine asks it how many floats the object contributes and hands it
//! the destination slice to fill. Two stock layouts are provided; both write
//! planar blocks (all positions, then the attribute block, then normals).
//!
//! Texture contents are out of scope here; a material carries only the
//! identifier a downstream texture library resolves.

use crate::scene::object::MeshData;

/// Serialization-layout seam between an object's mesh payload and the flat
/// vertex buffer.
pub trait Material: Send + Sync {
    /// Number of floats [`write_vertex_data`](Self::write_vertex_data) will
    /// produce for `mesh`.
    fn vertex_floats(&self, mesh: &MeshData) -> usize;

    /// Writes the mesh's vertex data into `dst`, which is exactly
    /// [`vertex_floats`](Self::vertex_floats) long. Returns the number of
    /// floats written.
    fn write_vertex_data(&self, mesh: &MeshData, dst: &mut [f32]) -> usize;
}

fn write_blocks(dst: &mut [f32], blocks: &[&[f32]]) -> usize {
    let mut offset = 0;
    for block in blocks {
        dst[offset..offset + block.len()].copy_from_slice(block);
        offset += block.len();
    }
    offset
}

/// Unlit per-vertex color layout: positions, RGB colors, normals.
///
/// Interprets the mesh attribute block as three floats per vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexColorMaterial;

impl Material for VertexColorMaterial {
    fn vertex_floats(&self, mesh: &MeshData) -> usize {
        mesh.positions().len() + mesh.attributes().len() + mesh.normals().len()
    }

    fn write_vertex_data(&self, mesh: &MeshData, dst: &mut [f32]) -> usize {
        write_blocks(dst, &[mesh.positions(), mesh.attributes(), mesh.normals()])
    }
}

/// Textured layout: positions, UVs, normals.
///
/// Interprets the mesh attribute block as two floats per vertex and carries
/// the identifier of the texture to sample.
#[derive(Debug, Clone)]
pub struct TexturedMaterial {
    /// Identifier resolved by the consumer's texture library.
    pub texture: String,
}

impl TexturedMaterial {
    #[must_use]
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
        }
    }
}

impl Material for TexturedMaterial {
    fn vertex_floats(&self, mesh: &MeshData) -> usize {
        mesh.positions().len() + mesh.attributes().len() + mesh.normals().len()
    }

    fn write_vertex_data(&self, mesh: &MeshData, dst: &mut [f32]) -> usize {
        write_blocks(dst, &[mesh.positions(), mesh.attributes(), mesh.normals()])
    }
}
