//! Mesh data handed to the renderer
//!
//! Meshes are pure CPU-side data. The Vulkan backend turns them into vertex
//! and index buffers through the resource uploader; the layout the shaders
//! see is described in `backends::vulkan::rendering::vertex_layout`.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Vertex with position, color and texture coordinate
///
/// Equality and hashing compare the bit patterns of every component so that
/// deduplication treats two vertices as the same only when they are
/// structurally identical.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Vertex color, multiplied with the sampled texel
    pub color: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding.
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// White vertex at `position` sampling `tex_coord`
    pub const fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            color: [1.0, 1.0, 1.0],
            tex_coord,
        }
    }

    /// Replace the vertex color
    #[must_use]
    pub const fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    fn bits(&self) -> [u32; 8] {
        [
            self.position[0].to_bits(),
            self.position[1].to_bits(),
            self.position[2].to_bits(),
            self.color[0].to_bits(),
            self.color[1].to_bits(),
            self.color[2].to_bits(),
            self.tex_coord[0].to_bits(),
            self.tex_coord[1].to_bits(),
        ]
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Named triangle mesh with 32-bit indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    /// Name used in logs, usually the source file stem
    pub name: String,
    /// Unique vertices
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a mesh from already indexed data
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    /// Build a mesh from a triangle-list vertex stream, merging identical vertices
    pub fn from_triangle_stream(name: impl Into<String>, stream: impl IntoIterator<Item = Vertex>) -> Self {
        let mut builder = MeshBuilder::new(name);
        for vertex in stream {
            builder.push(vertex);
        }
        builder.build()
    }

    /// Vertex data as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of indices to draw
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Whether the mesh has anything to draw
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Check that every index points at an existing vertex
    pub fn indices_in_bounds(&self) -> bool {
        let count = self.vertices.len();
        self.indices.iter().all(|&index| (index as usize) < count)
    }
}

/// Incremental mesh builder deduplicating vertices on insert
#[derive(Debug)]
pub struct MeshBuilder {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: HashMap<Vertex, u32>,
}

impl MeshBuilder {
    /// Start an empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            indices: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Append one corner of a triangle
    pub fn push(&mut self, vertex: Vertex) {
        let index = *self.lookup.entry(vertex).or_insert_with(|| {
            self.vertices.push(vertex);
            (self.vertices.len() - 1) as u32
        });
        self.indices.push(index);
    }

    /// Number of unique vertices so far
    pub fn unique_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Finish the mesh
    pub fn build(self) -> Mesh {
        Mesh::new(self.name, self.vertices, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_stream() -> Vec<Vertex> {
        let a = Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]);
        let b = Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0]);
        let c = Vertex::new([1.0, 1.0, 0.0], [1.0, 1.0]);
        let d = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0]);
        vec![a, b, c, c, d, a]
    }

    #[test]
    fn test_quad_shares_corner_vertices() {
        let mesh = Mesh::from_triangle_stream("quad", quad_stream());
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 3, 0]);
        assert!(mesh.indices_in_bounds());
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn test_different_texcoords_are_kept_apart() {
        let a = Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]);
        let seam = Vertex::new([0.0, 0.0, 0.0], [1.0, 0.0]);
        let mesh = Mesh::from_triangle_stream("seam", [a, seam, a]);
        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_signed_zero_is_distinct() {
        let positive = Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]);
        let negative = Vertex::new([-0.0, 0.0, 0.0], [0.0, 0.0]);
        assert_ne!(positive, negative);
        let mesh = Mesh::from_triangle_stream("zeros", [positive, negative]);
        assert_eq!(mesh.vertices.len(), 2);
    }

    #[test]
    fn test_byte_views_match_layout() {
        let mesh = Mesh::from_triangle_stream("quad", quad_stream());
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(mesh.vertex_bytes().len(), 4 * 32);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }

    #[test]
    fn test_empty_and_out_of_bounds() {
        let empty = MeshBuilder::new("empty").build();
        assert!(empty.is_empty());

        let broken = Mesh::new("broken", vec![Vertex::new([0.0; 3], [0.0; 2])], vec![0, 1, 0]);
        assert!(!broken.indices_in_bounds());
    }
}
