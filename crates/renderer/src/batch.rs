//! Per-frame instance batching.
//!
//! Scene code deposits one [`InstanceRecord`] per drawn object into a
//! [`DrawSubmission`], keyed by mesh and texture. Before recording, the
//! [`BatchSet`] turns the submission into device-local instance buffers: one
//! buffer pair per key, grown when needed and never shrunk, with the live
//! instance count tracked separately from the buffer capacity.
//!
//! # Capacity Policy
//!
//! Buffer capacity only grows. A frame with fewer instances than the last
//! reuses the existing buffers and just records a smaller count; a frame
//! with more instances than the capacity allows replaces the buffer pair
//! (the old pair is destroyed exactly once, through Drop). Growth is
//! computed by [`grow_capacity`], a pure function kept separate for testing.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tracing::debug;

use glint_assets::{MeshId, TextureId};
use glint_rhi::buffer::{Buffer, MemoryIntent};
use glint_rhi::device::Device;
use glint_rhi::upload::StagingUploader;
use glint_rhi::RhiResult;

use std::sync::Arc;

/// Per-instance data: one model transform.
///
/// Fed to the vertex stage through binding 1 as four vec4 attributes
/// (locations 3 through 6).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct InstanceRecord {
    /// Model matrix (object to world space).
    pub model: Mat4,
}

impl InstanceRecord {
    /// Size of one record in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a record from a model transform.
    #[inline]
    pub const fn new(model: Mat4) -> Self {
        Self { model }
    }
}

/// Batch key: which mesh drawn with which texture.
pub type BatchKey = (MeshId, TextureId);

/// Per-frame collection of instance transforms, keyed by mesh and texture.
///
/// Cleared at the start of every frame; scene code refills it before the
/// frame is drawn. Repeated calls with the same key within a frame append
/// to the same list.
#[derive(Default)]
pub struct DrawSubmission {
    instances: BTreeMap<BatchKey, Vec<InstanceRecord>>,
}

impl DrawSubmission {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all instances. Called at frame start.
    pub fn clear(&mut self) {
        for records in self.instances.values_mut() {
            records.clear();
        }
    }

    /// Returns the instance list for a mesh/texture pair, creating it empty
    /// on first reference within the frame.
    pub fn instances_mut(&mut self, mesh: MeshId, texture: TextureId) -> &mut Vec<InstanceRecord> {
        self.instances.entry((mesh, texture)).or_default()
    }

    /// Iterates over the keys with at least one instance.
    pub fn non_empty(&self) -> impl Iterator<Item = (BatchKey, &[InstanceRecord])> {
        self.instances
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(&key, records)| (key, records.as_slice()))
    }

    /// Returns the total number of instances across all keys.
    pub fn instance_count(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }
}

/// Smallest capacity a batch buffer is created with, in bytes.
const MIN_BATCH_CAPACITY: vk::DeviceSize = 64 * InstanceRecord::SIZE as vk::DeviceSize;

/// Computes the next buffer capacity for a required byte size.
///
/// Monotonic in both arguments and always at least `required`: an already
/// sufficient capacity is returned unchanged, otherwise the capacity doubles
/// until it fits.
pub fn grow_capacity(current: vk::DeviceSize, required: vk::DeviceSize) -> vk::DeviceSize {
    let mut capacity = current.max(MIN_BATCH_CAPACITY);
    while capacity < required {
        capacity *= 2;
    }
    capacity
}

/// GPU-side instance buffer pair for one batch key.
///
/// The staging buffer stays persistently mapped; the device buffer is what
/// the pipeline reads at binding 1. `count` is the number of live instances
/// this frame, `capacity` the byte size of both buffers.
pub struct InstanceBatch {
    /// Device-local buffer bound as the per-instance vertex input.
    device_buffer: Buffer,
    /// Host-visible buffer the transforms are written into each frame.
    staging_buffer: Buffer,
    /// Byte capacity of both buffers.
    capacity: vk::DeviceSize,
    /// Live instance count for the current frame.
    count: u32,
}

impl InstanceBatch {
    fn new(device: Arc<Device>, capacity: vk::DeviceSize) -> RhiResult<Self> {
        let device_buffer = Buffer::new(
            device.clone(),
            capacity,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryIntent::DeviceLocal,
        )?;
        let staging_buffer = Buffer::new(
            device,
            capacity,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryIntent::HostSequential,
        )?;

        Ok(Self {
            device_buffer,
            staging_buffer,
            capacity,
            count: 0,
        })
    }

    /// Returns the device-local instance buffer handle.
    #[inline]
    pub fn buffer_handle(&self) -> vk::Buffer {
        self.device_buffer.handle()
    }

    /// Returns the live instance count for the current frame.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the byte capacity of the buffer pair.
    #[inline]
    pub fn capacity(&self) -> vk::DeviceSize {
        self.capacity
    }
}

/// All instance batches, persisting across frames.
///
/// Counts reset each frame; buffer capacity persists and only grows.
pub struct BatchSet {
    device: Arc<Device>,
    batches: BTreeMap<BatchKey, InstanceBatch>,
    draw_calls: u32,
}

impl BatchSet {
    /// Creates an empty batch set.
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            batches: BTreeMap::new(),
            draw_calls: 0,
        }
    }

    /// Uploads a submission's transforms into device-local instance buffers.
    ///
    /// Counts from the previous frame are discarded first. For each
    /// non-empty key the buffer pair is grown if needed, the transforms are
    /// written into the mapped staging buffer, and a blocking copy moves
    /// them into the device-local buffer. Each non-empty key becomes one
    /// pending draw call.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation or the staging copy fails.
    pub fn finalize(
        &mut self,
        submission: &DrawSubmission,
        uploader: &StagingUploader,
    ) -> RhiResult<()> {
        for batch in self.batches.values_mut() {
            batch.count = 0;
        }
        self.draw_calls = 0;

        for (key, records) in submission.non_empty() {
            let required = (records.len() * InstanceRecord::SIZE) as vk::DeviceSize;

            let batch = match self.batches.entry(key) {
                Entry::Occupied(mut entry) => {
                    if required > entry.get().capacity {
                        let capacity = grow_capacity(entry.get().capacity, required);
                        debug!(
                            "Growing instance batch {:?}: {} -> {} bytes",
                            key,
                            entry.get().capacity,
                            capacity
                        );
                        // Replacing the entry drops the old pair exactly once.
                        entry.insert(InstanceBatch::new(self.device.clone(), capacity)?);
                    }
                    entry.into_mut()
                }
                Entry::Vacant(entry) => {
                    let capacity = grow_capacity(0, required);
                    entry.insert(InstanceBatch::new(self.device.clone(), capacity)?)
                }
            };

            batch
                .staging_buffer
                .write_bytes(0, bytemuck::cast_slice(records))?;
            uploader.copy_between_buffers(&batch.staging_buffer, &batch.device_buffer, required)?;

            batch.count = records.len() as u32;
            self.draw_calls += 1;
        }

        Ok(())
    }

    /// Iterates over batches with a nonzero instance count.
    pub fn live_batches(&self) -> impl Iterator<Item = (BatchKey, &InstanceBatch)> {
        self.batches
            .iter()
            .filter(|(_, batch)| batch.count > 0)
            .map(|(&key, batch)| (key, batch))
    }

    /// Returns the number of draw calls the last finalize produced.
    #[inline]
    pub fn draw_call_count(&self) -> u32 {
        self.draw_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_record_layout() {
        // One Mat4 = 64 bytes, matching the binding 1 stride.
        assert_eq!(InstanceRecord::SIZE, 64);
        assert_eq!(std::mem::align_of::<InstanceRecord>(), 16);
    }

    #[test]
    fn test_grow_capacity_is_monotonic() {
        let mut previous = 0;
        for required in [1, 100, 4096, 4097, 100_000] {
            let capacity = grow_capacity(previous, required);
            assert!(capacity >= required);
            assert!(capacity >= previous);
            previous = capacity;
        }
    }

    #[test]
    fn test_grow_capacity_keeps_sufficient_capacity() {
        let capacity = grow_capacity(0, 10 * InstanceRecord::SIZE as vk::DeviceSize);
        // Fewer instances next frame must not shrink the buffer.
        assert_eq!(grow_capacity(capacity, 64), capacity);
        assert_eq!(grow_capacity(capacity, capacity), capacity);
    }

    #[test]
    fn test_grow_capacity_doubles_until_fit() {
        assert_eq!(grow_capacity(0, 1), MIN_BATCH_CAPACITY);
        assert_eq!(
            grow_capacity(MIN_BATCH_CAPACITY, MIN_BATCH_CAPACITY + 1),
            MIN_BATCH_CAPACITY * 2
        );
        assert_eq!(
            grow_capacity(MIN_BATCH_CAPACITY, MIN_BATCH_CAPACITY * 3),
            MIN_BATCH_CAPACITY * 4
        );
    }

    #[test]
    fn test_submission_same_key_same_list() {
        let mut submission = DrawSubmission::new();

        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(InstanceRecord::new(Mat4::IDENTITY));
        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(InstanceRecord::new(Mat4::IDENTITY));

        assert_eq!(submission.instance_count(), 2);
        assert_eq!(submission.non_empty().count(), 1);
    }

    #[test]
    fn test_submission_clear_discards_counts() {
        let mut submission = DrawSubmission::new();
        submission
            .instances_mut(MeshId(1), TextureId(1))
            .push(InstanceRecord::new(Mat4::IDENTITY));
        submission.instances_mut(MeshId(2), TextureId(1));

        submission.clear();

        assert_eq!(submission.instance_count(), 0);
        assert_eq!(submission.non_empty().count(), 0);
    }

    #[test]
    fn test_submission_skips_empty_keys() {
        let mut submission = DrawSubmission::new();
        // Referencing a key without pushing creates it empty.
        submission.instances_mut(MeshId(1), TextureId(1));
        submission
            .instances_mut(MeshId(2), TextureId(2))
            .push(InstanceRecord::new(Mat4::IDENTITY));

        let live: Vec<BatchKey> = submission.non_empty().map(|(key, _)| key).collect();
        assert_eq!(live, vec![(MeshId(2), TextureId(2))]);
    }
}
