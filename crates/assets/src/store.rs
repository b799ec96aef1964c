//! Asset catalog storage.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{AssetError, AssetResult};
use crate::{MeshData, MeshId, TextureData, TextureId};

/// Narrow read capability over registered assets.
///
/// This is the interface boundary the renderer depends on: lookup by ID and
/// enumeration, nothing else. The renderer never learns how assets were
/// produced or stored.
pub trait AssetCatalog {
    /// Looks up a mesh by ID.
    fn mesh(&self, id: MeshId) -> Option<&MeshData>;

    /// Looks up a texture by ID.
    fn texture(&self, id: TextureId) -> Option<&TextureData>;

    /// Enumerates all registered meshes in ID order.
    fn meshes(&self) -> Box<dyn Iterator<Item = (MeshId, &MeshData)> + '_>;

    /// Enumerates all registered textures in ID order.
    fn textures(&self) -> Box<dyn Iterator<Item = (TextureId, &TextureData)> + '_>;
}

/// In-memory asset store with write-once registration.
///
/// IDs are caller-assigned; registering the same ID twice is an error,
/// which keeps every record immutable for the lifetime of the store.
#[derive(Default)]
pub struct AssetStore {
    meshes: BTreeMap<MeshId, MeshData>,
    textures: BTreeMap<TextureId, TextureData>,
}

impl AssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::DuplicateMesh`] if the ID is taken.
    pub fn register_mesh(&mut self, id: MeshId, mesh: MeshData) -> AssetResult<()> {
        if self.meshes.contains_key(&id) {
            return Err(AssetError::DuplicateMesh(id));
        }
        debug!(
            "Registered mesh {:?} ({} vertices, {} indices)",
            id,
            mesh.vertices.len(),
            mesh.indices.len()
        );
        self.meshes.insert(id, mesh);
        Ok(())
    }

    /// Registers a texture under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::DuplicateTexture`] if the ID is taken.
    pub fn register_texture(&mut self, id: TextureId, texture: TextureData) -> AssetResult<()> {
        if self.textures.contains_key(&id) {
            return Err(AssetError::DuplicateTexture(id));
        }
        debug!(
            "Registered texture {:?} ({}x{})",
            id, texture.width, texture.height
        );
        self.textures.insert(id, texture);
        Ok(())
    }

    /// Returns the number of registered meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Returns the number of registered textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl AssetCatalog for AssetStore {
    fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    fn meshes(&self) -> Box<dyn Iterator<Item = (MeshId, &MeshData)> + '_> {
        Box::new(self.meshes.iter().map(|(&id, data)| (id, data)))
    }

    fn textures(&self) -> Box<dyn Iterator<Item = (TextureId, &TextureData)> + '_> {
        Box::new(self.textures.iter().map(|(&id, data)| (id, data)))
    }
}
