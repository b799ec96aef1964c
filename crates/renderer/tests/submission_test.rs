//! Integration tests for the draw submission surface.

use glam::{Mat4, Quat, Vec3};
use glint_assets::{MeshId, TextureId};
use glint_renderer::{CameraUbo, DrawSubmission, InstanceRecord};
use glint_scene::Camera;

fn transform_at(x: f32) -> InstanceRecord {
    InstanceRecord::new(Mat4::from_scale_rotation_translation(
        Vec3::ONE,
        Quat::IDENTITY,
        Vec3::new(x, 0.0, 0.0),
    ))
}

#[test]
fn test_submission_groups_by_mesh_and_texture() {
    let mut submission = DrawSubmission::new();

    for x in 0..10 {
        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(transform_at(x as f32));
    }
    submission
        .instances_mut(MeshId(1), TextureId(2))
        .push(transform_at(0.0));
    submission
        .instances_mut(MeshId(2), TextureId(1))
        .push(transform_at(0.0));

    assert_eq!(submission.instance_count(), 12);
    // One batch per distinct (mesh, texture) pair.
    assert_eq!(submission.non_empty().count(), 3);

    let counts: Vec<usize> = submission
        .non_empty()
        .map(|(_, records)| records.len())
        .collect();
    assert_eq!(counts, vec![10, 1, 1]);
}

#[test]
fn test_submission_is_reusable_across_frames() {
    let mut submission = DrawSubmission::new();

    submission
        .instances_mut(MeshId(1), TextureId(1))
        .push(transform_at(1.0));
    submission.clear();

    assert_eq!(submission.instance_count(), 0);
    assert_eq!(submission.non_empty().count(), 0);

    // A cleared submission accepts the next frame's instances.
    submission
        .instances_mut(MeshId(1), TextureId(1))
        .push(transform_at(2.0));
    assert_eq!(submission.instance_count(), 1);
}

#[test]
fn test_abandoned_frame_discards_submission() {
    let mut submission = DrawSubmission::new();

    // Tick 1: the scene fills the submission, but the frame is abandoned
    // before anything is drawn (out-of-date acquire, minimized window).
    // The renderer discards the submission on that path exactly as it
    // does after a successful submit.
    for x in 0..64 {
        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(transform_at(x as f32));
    }
    submission.clear();

    // Tick 2 repopulates from scratch. Were tick 1's records still
    // present, every instance would be drawn twice and the grow-only
    // batch buffers would double for good.
    for x in 0..64 {
        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(transform_at(x as f32));
    }

    assert_eq!(submission.instance_count(), 64);
    let (_, records) = submission.non_empty().next().expect("one live batch");
    assert_eq!(records.len(), 64);
}

#[test]
fn test_instance_record_matches_attribute_stride() {
    // Binding 1 carries one Mat4 per instance as four vec4 columns.
    assert_eq!(InstanceRecord::SIZE, 64);

    let record = transform_at(3.0);
    let bytes: &[u8] = bytemuck::bytes_of(&record);
    assert_eq!(bytes.len(), InstanceRecord::SIZE);
}

#[test]
fn test_camera_ubo_tracks_camera() {
    let mut camera = Camera::default();
    camera.eye = Vec3::new(0.0, 2.0, 5.0);
    camera.look_at(Vec3::ZERO);

    let ubo = CameraUbo::from_camera(&camera);

    assert_eq!(ubo.view, camera.view_matrix());
    assert_eq!(ubo.projection, camera.projection_matrix());
    assert_eq!(ubo.view_projection, ubo.projection * ubo.view);
    assert_eq!(ubo.camera_position, camera.eye);
}
