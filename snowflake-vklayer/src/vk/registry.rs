//! Layer bookkeeping for live instances and devices.

use std::hash::Hash;

use ash::vk;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::vk::key::{DeviceKey, InstanceKey};

/// What the layer remembers about an instance it helped create.
#[derive(Clone, Copy)]
pub struct InstanceRecord {
    pub instance: vk::Instance,
    pub next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    /// `None` when the next layer could not resolve it; the instance is still
    /// tracked so lookups keep working, but its destruction is not forwarded.
    pub next_destroy_instance: Option<vk::PFN_vkDestroyInstance>,
}

/// What the layer remembers about a device it helped create.
#[derive(Clone, Copy)]
pub struct DeviceRecord {
    pub device: vk::Device,
    pub owner: InstanceKey,
    pub next_get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
    pub next_destroy_device: Option<vk::PFN_vkDestroyDevice>,
    pub next_queue_present: Option<vk::PFN_vkQueuePresentKHR>,
}

/// A map from dispatch key to record, guarded by its own lock.
///
/// The lock is only ever held for the map operation itself. Lookups copy the
/// record out so no guard is alive while calling into the next layer, which
/// may re-enter the layer on the same thread.
pub struct Registry<K, R> {
    records: RwLock<IndexMap<K, R>>,
}

pub type InstanceRegistry = Registry<InstanceKey, InstanceRecord>;
pub type DeviceRegistry = Registry<DeviceKey, DeviceRecord>;

impl<K: Hash + Eq + Copy, R: Copy> Registry<K, R> {
    pub fn new() -> Self {
        Registry {
            records: RwLock::new(IndexMap::new()),
        }
    }

    pub fn insert(&self, key: K, record: R) {
        self.records.write().insert(key, record);
    }

    pub fn find(&self, key: K) -> Option<R> {
        self.records.read().get(&key).copied()
    }

    /// Remove a record, handing ownership back to the caller.
    pub fn erase(&self, key: K) -> Option<R> {
        // shift_remove keeps registration order for `first`.
        self.records.write().shift_remove(&key)
    }

    /// The oldest live record.
    pub fn first(&self) -> Option<R> {
        self.records.read().first().map(|(_, record)| *record)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<K: Hash + Eq + Copy, R: Copy> Default for Registry<K, R> {
    fn default() -> Self {
        Self::new()
    }
}
