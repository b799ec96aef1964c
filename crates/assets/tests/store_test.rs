//! Integration tests for the asset store.

use glam::{Vec2, Vec3};
use glint_assets::{
    AssetCatalog, AssetError, AssetStore, IndexData, MeshData, MeshId, TextureData, TextureId,
};
use glint_rhi::vertex::MeshVertex;

fn quad_mesh() -> MeshData {
    let vertices = vec![
        MeshVertex::new(Vec3::new(-0.5, -0.5, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
        MeshVertex::new(Vec3::new(0.5, -0.5, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
        MeshVertex::new(Vec3::new(0.5, 0.5, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
        MeshVertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
    ];
    let indices = IndexData::U16(vec![0, 1, 2, 2, 3, 0]);
    MeshData::new(vertices, indices).expect("valid quad mesh")
}

fn white_texture(size: u32) -> TextureData {
    TextureData::new(vec![255u8; (size * size * 4) as usize], size, size)
        .expect("valid white texture")
}

#[test]
fn test_register_and_lookup() {
    let mut store = AssetStore::new();

    store
        .register_mesh(MeshId(1), quad_mesh())
        .expect("first registration succeeds");
    store
        .register_texture(TextureId(1), white_texture(4))
        .expect("first registration succeeds");

    let mesh = store.mesh(MeshId(1)).expect("mesh is registered");
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);

    let texture = store.texture(TextureId(1)).expect("texture is registered");
    assert_eq!(texture.width, 4);
    assert_eq!(texture.pixels.len(), 64);

    assert!(store.mesh(MeshId(2)).is_none());
    assert!(store.texture(TextureId(2)).is_none());
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut store = AssetStore::new();

    store.register_mesh(MeshId(7), quad_mesh()).unwrap();
    let err = store.register_mesh(MeshId(7), quad_mesh()).unwrap_err();
    assert_eq!(err, AssetError::DuplicateMesh(MeshId(7)));

    store
        .register_texture(TextureId(7), white_texture(2))
        .unwrap();
    let err = store
        .register_texture(TextureId(7), white_texture(2))
        .unwrap_err();
    assert_eq!(err, AssetError::DuplicateTexture(TextureId(7)));

    // The original records survive the failed re-registration.
    assert_eq!(store.mesh_count(), 1);
    assert_eq!(store.texture_count(), 1);
}

#[test]
fn test_enumeration_is_ordered_and_complete() {
    let mut store = AssetStore::new();

    for id in [3u32, 1, 2] {
        store.register_mesh(MeshId(id), quad_mesh()).unwrap();
        store
            .register_texture(TextureId(id), white_texture(2))
            .unwrap();
    }

    let mesh_ids: Vec<MeshId> = store.meshes().map(|(id, _)| id).collect();
    assert_eq!(mesh_ids, vec![MeshId(1), MeshId(2), MeshId(3)]);

    let texture_ids: Vec<TextureId> = store.textures().map(|(id, _)| id).collect();
    assert_eq!(texture_ids, vec![TextureId(1), TextureId(2), TextureId(3)]);
}

#[test]
fn test_catalog_trait_object() {
    let mut store = AssetStore::new();
    store.register_mesh(MeshId(1), quad_mesh()).unwrap();

    // The renderer consumes the store through the capability trait only.
    let catalog: &dyn AssetCatalog = &store;
    assert!(catalog.mesh(MeshId(1)).is_some());
    assert_eq!(catalog.meshes().count(), 1);
}
