use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::error::SetupError;

/// Interleaved cube vertex: `position.xyz` followed by `color.rgb`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Vertex of the flat triangle, clip-space `xy` only.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    pub position: [f32; 2],
}

/// Mapping from a named shader input to its slice of an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub name: &'static str,
    pub components: u32,
    pub offset: u32,
}

/// Per-vertex layout shared by every attribute read from one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [AttributeBinding],
}

const F32: u32 = size_of::<f32>() as u32;

pub const CUBE_LAYOUT: VertexLayout = VertexLayout {
    stride: 6 * F32,
    attributes: &[
        AttributeBinding {
            name: "vertPosition",
            components: 3,
            offset: 0,
        },
        AttributeBinding {
            name: "vertColor",
            components: 3,
            offset: 3 * F32,
        },
    ],
};

pub const TRIANGLE_LAYOUT: VertexLayout = VertexLayout {
    stride: 2 * F32,
    attributes: &[AttributeBinding {
        name: "vertPosition",
        components: 2,
        offset: 0,
    }],
};

/// Static geometry handed to the device binder.
#[derive(Debug, Clone, Copy)]
pub struct Mesh<V: Pod> {
    pub vertices: &'static [V],
    /// Empty for meshes drawn as plain triangle lists.
    pub indices: &'static [u16],
    pub layout: VertexLayout,
}

impl<V: Pod> Mesh<V> {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices)
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Checks the invariants the draw call relies on: whole triangles, indices
    /// in range and a layout stride matching the vertex type.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.layout.stride as usize != size_of::<V>() {
            return Err(SetupError::GeometryInvalid(format!(
                "layout stride {} does not match vertex size {}",
                self.layout.stride,
                size_of::<V>()
            )));
        }
        let primitive_count = if self.is_indexed() {
            self.indices.len()
        } else {
            self.vertices.len()
        };
        if primitive_count % 3 != 0 {
            return Err(SetupError::GeometryInvalid(format!(
                "{primitive_count} elements do not form whole triangles"
            )));
        }
        if let Some(index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= self.vertices.len())
        {
            return Err(SetupError::GeometryInvalid(format!(
                "index {index} is out of range for {} vertices",
                self.vertices.len()
            )));
        }
        Ok(())
    }
}

const fn v(position: [f32; 3], color: [f32; 3]) -> Vertex {
    Vertex { position, color }
}

const TOP: [f32; 3] = [0.5, 0.5, 0.5];
const LEFT: [f32; 3] = [0.75, 0.25, 0.5];
const RIGHT: [f32; 3] = [1.0, 0.0, 0.75];
const FRONT: [f32; 3] = [1.0, 0.0, 0.15];
const BACK: [f32; 3] = [0.0, 1.0, 0.15];
const BOTTOM: [f32; 3] = [0.5, 0.5, 1.0];

/// Four vertices per face so every face keeps its own flat color. Each quad is
/// listed counter-clockwise as seen from outside the cube.
pub const CUBE_VERTICES: [Vertex; 24] = [
    // top
    v([-1.0, 1.0, -1.0], TOP),
    v([-1.0, 1.0, 1.0], TOP),
    v([1.0, 1.0, 1.0], TOP),
    v([1.0, 1.0, -1.0], TOP),
    // left
    v([-1.0, 1.0, 1.0], LEFT),
    v([-1.0, 1.0, -1.0], LEFT),
    v([-1.0, -1.0, -1.0], LEFT),
    v([-1.0, -1.0, 1.0], LEFT),
    // right
    v([1.0, 1.0, 1.0], RIGHT),
    v([1.0, -1.0, 1.0], RIGHT),
    v([1.0, -1.0, -1.0], RIGHT),
    v([1.0, 1.0, -1.0], RIGHT),
    // front
    v([-1.0, 1.0, 1.0], FRONT),
    v([-1.0, -1.0, 1.0], FRONT),
    v([1.0, -1.0, 1.0], FRONT),
    v([1.0, 1.0, 1.0], FRONT),
    // back
    v([1.0, 1.0, -1.0], BACK),
    v([1.0, -1.0, -1.0], BACK),
    v([-1.0, -1.0, -1.0], BACK),
    v([-1.0, 1.0, -1.0], BACK),
    // bottom
    v([-1.0, -1.0, 1.0], BOTTOM),
    v([-1.0, -1.0, -1.0], BOTTOM),
    v([1.0, -1.0, -1.0], BOTTOM),
    v([1.0, -1.0, 1.0], BOTTOM),
];

pub const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // top
    4, 5, 6, 4, 6, 7, // left
    8, 9, 10, 8, 10, 11, // right
    12, 13, 14, 12, 14, 15, // front
    16, 17, 18, 16, 18, 19, // back
    20, 21, 22, 20, 22, 23, // bottom
];

pub const TRIANGLE_VERTICES: [FlatVertex; 3] = [
    FlatVertex {
        position: [0.0, 0.5],
    },
    FlatVertex {
        position: [-0.5, -0.5],
    },
    FlatVertex {
        position: [0.5, -0.5],
    },
];

pub fn cube_mesh() -> Mesh<Vertex> {
    Mesh {
        vertices: &CUBE_VERTICES,
        indices: &CUBE_INDICES,
        layout: CUBE_LAYOUT,
    }
}

pub fn triangle_mesh() -> Mesh<FlatVertex> {
    Mesh {
        vertices: &TRIANGLE_VERTICES,
        indices: &[],
        layout: TRIANGLE_LAYOUT,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn cube_indices_form_two_triangles_per_face() {
        assert_eq!(CUBE_VERTICES.len(), 24);
        assert_eq!(CUBE_INDICES.len(), 36);
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < CUBE_VERTICES.len()));
        for (face, triangles) in CUBE_INDICES.chunks_exact(6).enumerate() {
            let first = face as u16 * 4;
            assert!(triangles.iter().all(|&i| (first..first + 4).contains(&i)));
        }
        cube_mesh().validate().unwrap();
    }

    #[test]
    fn cube_triangles_face_outward() {
        for triangle in CUBE_INDICES.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from(CUBE_VERTICES[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "triangle {triangle:?} is wound clockwise"
            );
        }
    }

    #[test]
    fn faces_have_uniform_colors_in_range() {
        for face in CUBE_VERTICES.chunks_exact(4) {
            assert!(face.iter().all(|vertex| vertex.color == face[0].color));
            assert!(face[0].color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn cube_layout_interleaves_position_and_color() {
        assert_eq!(CUBE_LAYOUT.stride, 24);
        assert_eq!(CUBE_LAYOUT.attributes[0].offset, 0);
        assert_eq!(CUBE_LAYOUT.attributes[1].offset, 12);
        assert_eq!(cube_mesh().vertex_bytes().len(), 24 * 24);
        assert_eq!(cube_mesh().index_bytes().len(), 36 * 2);
    }

    #[test]
    fn rejects_out_of_range_index() {
        static BAD: [u16; 3] = [0, 1, 3];
        let mesh = Mesh {
            vertices: &TRIANGLE_VERTICES,
            indices: &BAD,
            layout: TRIANGLE_LAYOUT,
        };
        assert!(matches!(mesh.validate(), Err(SetupError::GeometryInvalid(_))));
    }

    #[test]
    fn triangle_is_drawn_without_indices() {
        let mesh = triangle_mesh();
        assert!(!mesh.is_indexed());
        mesh.validate().unwrap();
    }
}
