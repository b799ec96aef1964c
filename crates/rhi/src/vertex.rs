//! Vertex data structures and input descriptions.
//!
//! This module defines the mesh vertex format (binding 0, per-vertex) and
//! the per-instance input layout (binding 1, per-instance) used by the
//! instanced mesh pipeline.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Standard mesh vertex with position, normal, and UV.
///
/// # Memory Layout
///
/// `#[repr(C)]` for predictable layout:
/// - Offset 0: position (12 bytes)
/// - Offset 12: normal (12 bytes)
/// - Offset 24: uv (8 bytes)
/// - Total size: 32 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: normal (vec3)
/// - location 2: uv (vec2)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MeshVertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// Surface normal vector (should be normalized).
    pub normal: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
}

impl MeshVertex {
    /// Creates a new mesh vertex.
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Get the per-vertex input binding description (binding 0).
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // Normal at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            // UV at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

/// Get the per-instance input binding description (binding 1).
///
/// One `Mat4` model transform per instance, consumed as four vec4 columns.
pub fn instance_binding_description() -> vk::VertexInputBindingDescription {
    vk::VertexInputBindingDescription {
        binding: 1,
        stride: std::mem::size_of::<glam::Mat4>() as u32,
        input_rate: vk::VertexInputRate::INSTANCE,
    }
}

/// Get the per-instance attribute descriptions.
///
/// Four vec4 columns at locations 3 through 6, continuing after the mesh
/// vertex attributes.
pub fn instance_attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
    [
        vk::VertexInputAttributeDescription {
            binding: 1,
            location: 3,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: 0,
        },
        vk::VertexInputAttributeDescription {
            binding: 1,
            location: 4,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: 16,
        },
        vk::VertexInputAttributeDescription {
            binding: 1,
            location: 5,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: 32,
        },
        vk::VertexInputAttributeDescription {
            binding: 1,
            location: 6,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: 48,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_vertex_size() {
        // Vec3 (12) + Vec3 (12) + Vec2 (8) = 32 bytes
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
    }

    #[test]
    fn test_mesh_vertex_binding_description() {
        let binding = MeshVertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 32);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_mesh_vertex_offsets() {
        use std::mem::offset_of;

        assert_eq!(offset_of!(MeshVertex, position), 0);
        assert_eq!(offset_of!(MeshVertex, normal), 12);
        assert_eq!(offset_of!(MeshVertex, uv), 24);

        let attrs = MeshVertex::attribute_descriptions();
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
    }

    #[test]
    fn test_instance_binding_description() {
        let binding = instance_binding_description();
        assert_eq!(binding.binding, 1);
        assert_eq!(binding.stride, 64);
        assert_eq!(binding.input_rate, vk::VertexInputRate::INSTANCE);
    }

    #[test]
    fn test_instance_attribute_descriptions() {
        let attrs = instance_attribute_descriptions();
        assert_eq!(attrs.len(), 4);
        for (i, attr) in attrs.iter().enumerate() {
            assert_eq!(attr.binding, 1);
            assert_eq!(attr.location, 3 + i as u32);
            assert_eq!(attr.format, vk::Format::R32G32B32A32_SFLOAT);
            assert_eq!(attr.offset, 16 * i as u32);
        }
    }

    #[test]
    fn test_mesh_vertex_pod_roundtrip() {
        let vertex = MeshVertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec2::new(0.5, 0.5),
        );

        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 32);

        let back: &MeshVertex = bytemuck::from_bytes(bytes);
        assert_eq!(back.position, vertex.position);
        assert_eq!(back.uv, vertex.uv);
    }
}
