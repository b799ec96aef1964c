//! Immutable asset records for the renderer.
//!
//! This crate is the asset collaborator boundary: meshes and textures are
//! registered once under stable integer IDs and never mutated afterwards.
//! The renderer consumes them through the narrow [`AssetCatalog`] capability
//! (lookup by ID, enumerate all). File decoding is out of scope; callers
//! hand over already-decoded vertex and pixel data.

mod error;
mod store;

pub use error::{AssetError, AssetResult};
pub use store::{AssetCatalog, AssetStore};

pub use glint_rhi::vertex::MeshVertex;

/// Stable identifier for a registered mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Stable identifier for a registered texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Index data with its element width.
///
/// The width is captured at registration and drives the index type bound at
/// draw time.
#[derive(Clone, Debug)]
pub enum IndexData {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexData {
    /// Returns the number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(v) => v.len(),
            IndexData::U32(v) => v.len(),
        }
    }

    /// Returns true if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw bytes of the index data.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(v) => bytemuck::cast_slice(v),
            IndexData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Immutable mesh record: vertices plus indices.
#[derive(Clone, Debug)]
pub struct MeshData {
    /// Vertex data.
    pub vertices: Vec<MeshVertex>,
    /// Index data with element width.
    pub indices: IndexData,
}

impl MeshData {
    /// Creates a mesh record, validating that both arrays are non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `vertices` or `indices` is empty.
    pub fn new(vertices: Vec<MeshVertex>, indices: IndexData) -> AssetResult<Self> {
        if vertices.is_empty() {
            return Err(AssetError::InvalidData(
                "mesh has no vertices".to_string(),
            ));
        }
        if indices.is_empty() {
            return Err(AssetError::InvalidData("mesh has no indices".to_string()));
        }
        Ok(Self { vertices, indices })
    }
}

/// Immutable texture record: tightly packed RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct TextureData {
    /// Pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureData {
    /// Number of channels per pixel. Always RGBA.
    pub const CHANNELS: u32 = 4;

    /// Creates a texture record, validating extent and pixel count.
    ///
    /// # Errors
    ///
    /// Returns an error on zero extent or a pixel buffer whose length does
    /// not match `width * height * 4`.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> AssetResult<Self> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidData(format!(
                "texture extent must be nonzero, got {}x{}",
                width, height
            )));
        }
        // Widened so extreme extents cannot wrap the expected byte count.
        let expected = u64::from(width) * u64::from(height) * u64::from(Self::CHANNELS);
        if pixels.len() as u64 != expected {
            return Err(AssetError::InvalidData(format!(
                "texture pixel buffer is {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_index_data_bytes() {
        let u16_indices = IndexData::U16(vec![0, 1, 2]);
        assert_eq!(u16_indices.len(), 3);
        assert_eq!(u16_indices.as_bytes().len(), 6);

        let u32_indices = IndexData::U32(vec![0, 1, 2]);
        assert_eq!(u32_indices.as_bytes().len(), 12);
    }

    #[test]
    fn test_mesh_data_rejects_empty() {
        let vertex = MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO);

        assert!(MeshData::new(vec![], IndexData::U16(vec![0])).is_err());
        assert!(MeshData::new(vec![vertex], IndexData::U16(vec![])).is_err());
        assert!(MeshData::new(vec![vertex], IndexData::U16(vec![0])).is_ok());
    }

    #[test]
    fn test_texture_data_validation() {
        assert!(TextureData::new(vec![0; 16], 2, 2).is_ok());
        assert!(TextureData::new(vec![0; 15], 2, 2).is_err());
        assert!(TextureData::new(vec![], 0, 2).is_err());
    }

    #[test]
    fn test_texture_pixel_count_does_not_wrap() {
        // 65536 * 65536 * 4 wraps to 0 in u32 arithmetic; an empty pixel
        // buffer must still be rejected for such an extent.
        let err = TextureData::new(Vec::new(), 65536, 65536).unwrap_err();
        assert!(matches!(err, AssetError::InvalidData(_)));
    }
}
