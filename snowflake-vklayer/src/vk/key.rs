//! Opaque identity extraction.
//!
//! The loader stores a pointer to its dispatch table in the first pointer-sized
//! word of every dispatchable handle. That pointer is constant for the lifetime
//! of the object and is shared by child objects that dispatch through the same
//! table (a physical device through its instance, a queue through its device).
//! Raw handle values are not used as keys since wrapping layers may hand out
//! different values for the same object.
//!
//! [`dispatch_key`] is the only place in the crate that reads through a handle.

use std::ffi::c_void;
use std::fmt;

use ash::vk;
use ash::vk::Handle;

/// Read the dispatch pointer out of a dispatchable handle.
///
/// Returns `None` for a null handle.
///
/// # Safety
/// A non-null `handle` must be a live dispatchable handle, i.e. it must point to
/// memory whose first word is readable.
pub unsafe fn dispatch_key<H: Handle>(handle: H) -> Option<usize> {
    let object = handle.as_raw() as usize as *const *const c_void;
    if object.is_null() {
        return None;
    }
    Some(object.read() as usize)
}

/// Key into the instance registry. Physical devices resolve to the key of
/// their owning instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey(usize);

/// Key into the device registry. Queues resolve to the key of their device.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey(usize);

impl InstanceKey {
    /// # Safety
    /// See [`dispatch_key`].
    pub unsafe fn of_instance(instance: vk::Instance) -> Option<Self> {
        dispatch_key(instance).map(Self)
    }

    /// # Safety
    /// See [`dispatch_key`].
    pub unsafe fn of_physical_device(physical_device: vk::PhysicalDevice) -> Option<Self> {
        dispatch_key(physical_device).map(Self)
    }
}

impl DeviceKey {
    /// # Safety
    /// See [`dispatch_key`].
    pub unsafe fn of_device(device: vk::Device) -> Option<Self> {
        dispatch_key(device).map(Self)
    }

    /// # Safety
    /// See [`dispatch_key`].
    pub unsafe fn of_queue(queue: vk::Queue) -> Option<Self> {
        dispatch_key(queue).map(Self)
    }
}

impl fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceKey({:#x})", self.0)
    }
}

impl fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceKey({:#x})", self.0)
    }
}
