//! Symbols the loader calls into.
//!
//! Everything here is a thin `extern "system"` shim over the process-wide
//! [`Layer`]; no error or panic crosses back into the loader.

#![allow(non_snake_case)]

use std::ffi::{c_char, CStr};
use std::sync::OnceLock;

use ash::vk;
use tracing::{debug, error};

use crate::common::into_vk_result;
use crate::gate::ActivationGate;
use crate::logging;
use crate::vk::discovery;
use crate::vk::layer::Layer;
use crate::vk::sys::{VkNegotiateLayerInterface, VkNegotiateLayerStructType};

/// Lowest (and only) loader/layer interface version spoken here.
pub const LAYER_INTERFACE_VERSION: u32 = 2;

static LAYER: OnceLock<Layer> = OnceLock::new();

/// The process-wide layer, created on first use.
pub fn context() -> &'static Layer {
    LAYER.get_or_init(|| {
        logging::init();
        Layer::new(ActivationGate::from_env())
    })
}

#[no_mangle]
pub unsafe extern "system" fn vkNegotiateLoaderLayerInterfaceVersion(
    p_version_struct: *mut VkNegotiateLayerInterface,
) -> vk::Result {
    let layer = context();
    let Some(interface) = p_version_struct.as_mut() else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    if interface.s_type != VkNegotiateLayerStructType::LAYER_NEGOTIATE_INTERFACE_STRUCT {
        error!(s_type = interface.s_type.0, "unexpected negotiation struct");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let requested = interface.loader_layer_interface_version;
    if requested < LAYER_INTERFACE_VERSION {
        error!(requested, "loader interface version too old");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    interface.loader_layer_interface_version = LAYER_INTERFACE_VERSION;
    interface.pfn_get_instance_proc_addr =
        Some(vkGetInstanceProcAddr as vk::PFN_vkGetInstanceProcAddr);
    interface.pfn_get_device_proc_addr = Some(vkGetDeviceProcAddr as vk::PFN_vkGetDeviceProcAddr);
    interface.pfn_get_physical_device_proc_addr = None;

    debug!(requested, active = layer.gate().is_active(), "negotiated loader interface");
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetInstanceProcAddr(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    context().instance_proc_addr(instance, CStr::from_ptr(p_name))
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceProcAddr(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    context().device_proc_addr(device, CStr::from_ptr(p_name))
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceLayerProperties(
    p_property_count: *mut u32,
    p_properties: *mut vk::LayerProperties,
) -> vk::Result {
    discovery::enumerate_layer_properties(p_property_count, p_properties)
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceExtensionProperties(
    p_layer_name: *const c_char,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    if p_layer_name.is_null() {
        return vk::Result::ERROR_LAYER_NOT_PRESENT;
    }
    discovery::enumerate_extension_properties(
        CStr::from_ptr(p_layer_name),
        p_property_count,
        p_properties,
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceLayerProperties(
    _physical_device: vk::PhysicalDevice,
    p_property_count: *mut u32,
    p_properties: *mut vk::LayerProperties,
) -> vk::Result {
    discovery::enumerate_layer_properties(p_property_count, p_properties)
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceExtensionProperties(
    physical_device: vk::PhysicalDevice,
    p_layer_name: *const c_char,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    context().enumerate_device_extension_properties(
        physical_device,
        p_layer_name,
        p_property_count,
        p_properties,
    )
}

pub(crate) unsafe extern "system" fn create_instance(
    p_create_info: *const vk::InstanceCreateInfo,
    p_allocator: *const vk::AllocationCallbacks,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    let result = context().create_instance(p_create_info, p_allocator, p_instance);
    if let Err(e) = &result {
        error!("vkCreateInstance: {e}");
    }
    into_vk_result(result)
}

pub(crate) unsafe extern "system" fn destroy_instance(
    instance: vk::Instance,
    p_allocator: *const vk::AllocationCallbacks,
) {
    context().destroy_instance(instance, p_allocator)
}

pub(crate) unsafe extern "system" fn create_device(
    physical_device: vk::PhysicalDevice,
    p_create_info: *const vk::DeviceCreateInfo,
    p_allocator: *const vk::AllocationCallbacks,
    p_device: *mut vk::Device,
) -> vk::Result {
    let result = context().create_device(physical_device, p_create_info, p_allocator, p_device);
    if let Err(e) = &result {
        error!("vkCreateDevice: {e}");
    }
    into_vk_result(result)
}

pub(crate) unsafe extern "system" fn destroy_device(
    device: vk::Device,
    p_allocator: *const vk::AllocationCallbacks,
) {
    context().destroy_device(device, p_allocator)
}

pub(crate) unsafe extern "system" fn queue_present_khr(
    queue: vk::Queue,
    p_present_info: *const vk::PresentInfoKHR,
) -> vk::Result {
    match context().queue_present(queue, p_present_info) {
        Ok(result) => result,
        Err(e) => {
            error!("vkQueuePresentKHR: {e}");
            e.as_vk_result()
        }
    }
}
