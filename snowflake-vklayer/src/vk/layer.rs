//! The layer context: bookkeeping, proc-address resolution and the lifecycle
//! hooks that keep the bookkeeping in step with the objects below us.

use std::ffi::{c_char, CStr};
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ash::vk;
use ash::vk::Handle;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::common::LayerError;
use crate::gate::{ActivationGate, DevicePolicy};
use crate::vk::chain::LinkCursor;
use crate::vk::discovery;
use crate::vk::entry::EntryPoint;
use crate::vk::key::{DeviceKey, InstanceKey};
use crate::vk::registry::{DeviceRecord, DeviceRegistry, InstanceRecord, InstanceRegistry};
use crate::vk::sys::{VkLayerDeviceCreateInfo, VkLayerInstanceCreateInfo};

pub struct Layer {
    gate: ActivationGate,
    instances: InstanceRegistry,
    devices: DeviceRegistry,
    /// The first next-layer `vkGetInstanceProcAddr` seen, for lookups made
    /// without an instance. Cleared when the last instance goes away.
    bootstrap: RwLock<Option<vk::PFN_vkGetInstanceProcAddr>>,
    /// Set once the device fallback has been announced.
    fallback_warned: AtomicBool,
    /// Presents seen; nothing is ordered against it.
    frames: AtomicU64,
}

unsafe fn load<F: Copy>(pfn: vk::PFN_vkVoidFunction) -> Option<F> {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<unsafe extern "system" fn()>());
    pfn.map(|f| mem::transmute_copy(&f))
}

/// Resolve `name` through a next-layer instance resolver.
unsafe fn load_instance_fn<F: Copy>(
    gipa: vk::PFN_vkGetInstanceProcAddr,
    instance: vk::Instance,
    name: &'static CStr,
) -> Result<F, LayerError> {
    load(gipa(instance, name.as_ptr())).ok_or(LayerError::UnresolvedDelegate(name))
}

impl Layer {
    pub fn new(gate: ActivationGate) -> Self {
        Layer {
            gate,
            instances: InstanceRegistry::new(),
            devices: DeviceRegistry::new(),
            bootstrap: RwLock::new(None),
            fallback_warned: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    pub fn gate(&self) -> &ActivationGate {
        &self.gate
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Frames presented through the layer so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// `vkGetInstanceProcAddr`.
    ///
    /// # Safety
    /// `instance` must be null or a live instance handle.
    pub unsafe fn instance_proc_addr(
        &self,
        instance: vk::Instance,
        name: &CStr,
    ) -> vk::PFN_vkVoidFunction {
        if let Some(entry) = EntryPoint::from_name(name).filter(|e| e.is_instance_local()) {
            return Some(entry.hook());
        }

        if instance.as_raw() != 0 {
            let record = InstanceKey::of_instance(instance).and_then(|key| self.instances.find(key));
            return match record {
                Some(record) => (record.next_get_instance_proc_addr)(instance, name.as_ptr()),
                None => {
                    warn!(?name, "vkGetInstanceProcAddr on an instance the layer never saw");
                    None
                }
            };
        }

        let bootstrap = *self.bootstrap.read();
        bootstrap.and_then(|gipa| gipa(instance, name.as_ptr()))
    }

    /// `vkGetDeviceProcAddr`.
    ///
    /// # Safety
    /// `device` must be null or a live device handle.
    pub unsafe fn device_proc_addr(&self, device: vk::Device, name: &CStr) -> vk::PFN_vkVoidFunction {
        let entry = EntryPoint::from_name(name);
        if let Some(entry) = entry.filter(|e| e.is_device_local()) {
            return Some(entry.hook());
        }

        let record = self.device_record(DeviceKey::of_device(device))?;
        if entry == Some(EntryPoint::QueuePresentKHR)
            && self.gate.is_active()
            && record.next_queue_present.is_some()
        {
            return Some(EntryPoint::QueuePresentKHR.hook());
        }
        (record.next_get_device_proc_addr)(device, name.as_ptr())
    }

    /// The record behind a device or queue key, falling back per the device
    /// policy when the key is unknown. Resolution and present share it so a
    /// hook handed out under the fallback can also be served by it.
    fn device_record(&self, key: Option<DeviceKey>) -> Option<DeviceRecord> {
        if let Some(record) = key.and_then(|key| self.devices.find(key)) {
            return Some(record);
        }
        match self.gate.device_policy() {
            DevicePolicy::Strict => {
                warn!(?key, "device the layer never saw");
                None
            }
            DevicePolicy::FirstRegistered => {
                let record = self.devices.first()?;
                if !self.fallback_warned.swap(true, Ordering::Relaxed) {
                    warn!("unknown device, resolving through the first registered device");
                }
                Some(record)
            }
        }
    }

    /// `vkCreateInstance`.
    ///
    /// # Safety
    /// Arguments must satisfy the `vkCreateInstance` valid usage, with the
    /// loader's link info in the `pNext` chain.
    pub unsafe fn create_instance(
        &self,
        p_create_info: *const vk::InstanceCreateInfo,
        p_allocator: *const vk::AllocationCallbacks,
        p_instance: *mut vk::Instance,
    ) -> Result<(), LayerError> {
        let create_info = p_create_info
            .as_ref()
            .ok_or(LayerError::ProtocolViolation("null pCreateInfo"))?;
        if p_instance.is_null() {
            return Err(LayerError::ProtocolViolation("null pInstance"));
        }

        let cursor = LinkCursor::<VkLayerInstanceCreateInfo>::find(create_info.p_next)?;
        let gipa = cursor.next_link()?.get_instance_proc_addr;
        let fp_create_instance: vk::PFN_vkCreateInstance =
            load_instance_fn(gipa, vk::Instance::null(), c"vkCreateInstance")?;

        cursor.advance();
        let result = fp_create_instance(p_create_info, p_allocator, p_instance);
        if result != vk::Result::SUCCESS {
            return Err(LayerError::DelegateFailure(result));
        }

        let instance = *p_instance;
        let key = InstanceKey::of_instance(instance)
            .ok_or(LayerError::ProtocolViolation("next layer returned a null instance"))?;
        // The instance exists below us from here on, so it is tracked even
        // when its destructor cannot be resolved.
        let next_destroy_instance = load(gipa(instance, c"vkDestroyInstance".as_ptr()));
        if next_destroy_instance.is_none() {
            error!(?key, "next layer has no vkDestroyInstance, destruction will not be forwarded");
        }
        let record = InstanceRecord {
            instance,
            next_get_instance_proc_addr: gipa,
            next_destroy_instance,
        };

        {
            let mut bootstrap = self.bootstrap.write();
            self.instances.insert(key, record);
            bootstrap.get_or_insert(gipa);
        }

        if self.gate.is_active() {
            info!(?key, app = %application_name(create_info), "instance created");
        }
        Ok(())
    }

    /// `vkDestroyInstance`.
    ///
    /// # Safety
    /// `instance` must be null or a live instance handle.
    pub unsafe fn destroy_instance(
        &self,
        instance: vk::Instance,
        p_allocator: *const vk::AllocationCallbacks,
    ) {
        let Some(key) = InstanceKey::of_instance(instance) else {
            return;
        };
        let Some(record) = self.instances.erase(key) else {
            error!(?key, "vkDestroyInstance on an instance the layer never saw");
            return;
        };

        {
            let mut bootstrap = self.bootstrap.write();
            if self.instances.is_empty() {
                *bootstrap = None;
            }
        }

        if self.gate.is_active() {
            info!(?key, "instance destroyed");
        }
        match record.next_destroy_instance {
            Some(next) => next(instance, p_allocator),
            None => error!(?key, "vkDestroyInstance not forwarded, next layer has none"),
        }
    }

    /// `vkCreateDevice`.
    ///
    /// # Safety
    /// Arguments must satisfy the `vkCreateDevice` valid usage, with the
    /// loader's link info in the `pNext` chain.
    pub unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        p_create_info: *const vk::DeviceCreateInfo,
        p_allocator: *const vk::AllocationCallbacks,
        p_device: *mut vk::Device,
    ) -> Result<(), LayerError> {
        // The physical device dispatches through its instance's table.
        let owner = InstanceKey::of_physical_device(physical_device)
            .ok_or(LayerError::UnknownHandle("null physical device"))?;
        let instance = self
            .instances
            .find(owner)
            .ok_or(LayerError::UnknownHandle("physical device of an unregistered instance"))?;

        let create_info = p_create_info
            .as_ref()
            .ok_or(LayerError::ProtocolViolation("null pCreateInfo"))?;
        if p_device.is_null() {
            return Err(LayerError::ProtocolViolation("null pDevice"));
        }

        let cursor = LinkCursor::<VkLayerDeviceCreateInfo>::find(create_info.p_next)?;
        let gdpa = cursor.next_link()?.get_device_proc_addr;
        let fp_create_device: vk::PFN_vkCreateDevice = load_instance_fn(
            instance.next_get_instance_proc_addr,
            instance.instance,
            c"vkCreateDevice",
        )?;

        cursor.advance();
        let result = fp_create_device(physical_device, p_create_info, p_allocator, p_device);
        if result != vk::Result::SUCCESS {
            return Err(LayerError::DelegateFailure(result));
        }

        let device = *p_device;
        let key = DeviceKey::of_device(device)
            .ok_or(LayerError::ProtocolViolation("next layer returned a null device"))?;
        let next_queue_present = if self.gate.is_active() {
            load(gdpa(device, c"vkQueuePresentKHR".as_ptr()))
        } else {
            None
        };
        let next_destroy_device = load(gdpa(device, c"vkDestroyDevice".as_ptr()));
        if next_destroy_device.is_none() {
            error!(?key, "next layer has no vkDestroyDevice, destruction will not be forwarded");
        }
        let record = DeviceRecord {
            device,
            owner,
            next_get_device_proc_addr: gdpa,
            next_destroy_device,
            next_queue_present,
        };
        self.devices.insert(key, record);

        if self.gate.is_active() {
            info!(
                ?key,
                ?owner,
                queues = create_info.queue_create_info_count,
                present = next_queue_present.is_some(),
                "device created"
            );
        }
        Ok(())
    }

    /// `vkDestroyDevice`.
    ///
    /// # Safety
    /// `device` must be null or a live device handle.
    pub unsafe fn destroy_device(&self, device: vk::Device, p_allocator: *const vk::AllocationCallbacks) {
        let Some(key) = DeviceKey::of_device(device) else {
            return;
        };
        let Some(record) = self.devices.erase(key) else {
            error!(?key, "vkDestroyDevice on a device the layer never saw");
            return;
        };

        if self.gate.is_active() {
            info!(?key, owner = ?record.owner, "device destroyed");
        }
        match record.next_destroy_device {
            Some(next) => next(device, p_allocator),
            None => error!(?key, "vkDestroyDevice not forwarded, next layer has none"),
        }
    }

    /// `vkQueuePresentKHR`. Only handed out while the layer is active.
    ///
    /// # Safety
    /// Arguments must satisfy the `vkQueuePresentKHR` valid usage.
    pub unsafe fn queue_present(
        &self,
        queue: vk::Queue,
        p_present_info: *const vk::PresentInfoKHR,
    ) -> Result<vk::Result, LayerError> {
        // Queues dispatch through their device's table.
        let fp_queue_present = self
            .device_record(DeviceKey::of_queue(queue))
            .and_then(|record| record.next_queue_present)
            .ok_or(LayerError::UnknownHandle("queue of an unregistered device"))?;

        let frame = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(present_info) = p_present_info.as_ref() {
            debug!(frame, swapchains = present_info.swapchain_count, "present");
        }
        Ok(fp_queue_present(queue, p_present_info))
    }

    /// `vkEnumerateDeviceExtensionProperties`.
    ///
    /// # Safety
    /// Arguments must satisfy the `vkEnumerateDeviceExtensionProperties` valid usage.
    pub unsafe fn enumerate_device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        p_layer_name: *const c_char,
        p_property_count: *mut u32,
        p_properties: *mut vk::ExtensionProperties,
    ) -> vk::Result {
        if !p_layer_name.is_null() {
            return discovery::enumerate_extension_properties(
                CStr::from_ptr(p_layer_name),
                p_property_count,
                p_properties,
            );
        }

        let record = InstanceKey::of_physical_device(physical_device)
            .and_then(|key| self.instances.find(key));
        let Some(record) = record else {
            warn!("vkEnumerateDeviceExtensionProperties on a physical device the layer never saw");
            return vk::Result::ERROR_LAYER_NOT_PRESENT;
        };
        let next: Result<vk::PFN_vkEnumerateDeviceExtensionProperties, _> = load_instance_fn(
            record.next_get_instance_proc_addr,
            record.instance,
            c"vkEnumerateDeviceExtensionProperties",
        );
        match next {
            Ok(next) => next(physical_device, p_layer_name, p_property_count, p_properties),
            Err(e) => e.as_vk_result(),
        }
    }
}

unsafe fn application_name(create_info: &vk::InstanceCreateInfo) -> String {
    create_info
        .p_application_info
        .as_ref()
        .filter(|app| !app.p_application_name.is_null())
        .map(|app| CStr::from_ptr(app.p_application_name).to_string_lossy().into_owned())
        .unwrap_or_default()
}
