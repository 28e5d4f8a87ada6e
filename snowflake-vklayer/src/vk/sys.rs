//! Loader/layer interface structures from `vk_layer.h`.
//!
//! ash does not generate these since they are not part of the core registry, so
//! they are mirrored here with `#[repr(C)]` and checked against the header layout.

use std::ffi::{c_char, c_void};
use std::mem::size_of;

use ash::vk;
use static_assertions::const_assert_eq;

/// `PFN_GetPhysicalDeviceProcAddr`, same signature as `vkGetInstanceProcAddr`.
#[allow(non_camel_case_types)]
pub type PFN_GetPhysicalDeviceProcAddr =
    unsafe extern "system" fn(instance: vk::Instance, p_name: *const c_char) -> vk::PFN_vkVoidFunction;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
#[must_use]
pub struct VkNegotiateLayerStructType(pub(crate) i32);
impl VkNegotiateLayerStructType {
    #[allow(dead_code)]
    pub const LAYER_NEGOTIATE_UNINTIALIZED: Self = Self(0);
    pub const LAYER_NEGOTIATE_INTERFACE_STRUCT: Self = Self(1);
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
#[must_use]
pub struct VkLayerFunction(pub(crate) i32);
impl VkLayerFunction {
    pub const VK_LAYER_LINK_INFO: Self = Self(0);
    #[allow(dead_code)]
    pub const VK_LOADER_DATA_CALLBACK: Self = Self(1);
    #[allow(dead_code)]
    pub const VK_LOADER_LAYER_CREATE_DEVICE_CALLBACK: Self = Self(2);
    #[allow(dead_code)]
    pub const VK_LOADER_FEATURES: Self = Self(3);
}

#[repr(C)]
pub struct VkNegotiateLayerInterface {
    pub s_type: VkNegotiateLayerStructType,
    pub p_next: *mut c_void,
    pub loader_layer_interface_version: u32,
    pub pfn_get_instance_proc_addr: Option<vk::PFN_vkGetInstanceProcAddr>,
    pub pfn_get_device_proc_addr: Option<vk::PFN_vkGetDeviceProcAddr>,
    pub pfn_get_physical_device_proc_addr: Option<PFN_GetPhysicalDeviceProcAddr>,
}

#[repr(C)]
pub struct VkLayerInstanceLink {
    pub p_next: *mut VkLayerInstanceLink,
    pub pfn_next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub pfn_next_get_physical_device_proc_addr: Option<PFN_GetPhysicalDeviceProcAddr>,
}

#[repr(C)]
pub struct VkLayerDeviceLink {
    pub p_next: *mut VkLayerDeviceLink,
    pub pfn_next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub pfn_next_get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
}

/// The payload union of `VkLayerInstanceCreateInfo`. Only `p_layer_info` is read;
/// the widest member (`layerDevice`, two function pointers) fixes the size.
#[repr(C)]
#[derive(Clone, Copy)]
pub union VkLayerInstanceCreatePayload {
    pub p_layer_info: *mut VkLayerInstanceLink,
    pub pfn_set_instance_loader_data: *const c_void,
    pub layer_device: [*const c_void; 2],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union VkLayerDeviceCreatePayload {
    pub p_layer_info: *mut VkLayerDeviceLink,
    pub pfn_set_device_loader_data: *const c_void,
}

#[repr(C)]
pub struct VkLayerInstanceCreateInfo {
    pub s_type: vk::StructureType,
    pub p_next: *const c_void,
    pub function: VkLayerFunction,
    pub u: VkLayerInstanceCreatePayload,
}

#[repr(C)]
pub struct VkLayerDeviceCreateInfo {
    pub s_type: vk::StructureType,
    pub p_next: *const c_void,
    pub function: VkLayerFunction,
    pub u: VkLayerDeviceCreatePayload,
}

const PTR: usize = size_of::<*const c_void>();

const_assert_eq!(size_of::<VkLayerInstanceLink>(), 3 * PTR);
const_assert_eq!(size_of::<VkLayerDeviceLink>(), 3 * PTR);
const_assert_eq!(size_of::<VkLayerInstanceCreatePayload>(), 2 * PTR);
const_assert_eq!(size_of::<VkLayerDeviceCreatePayload>(), PTR);
const_assert_eq!(
    size_of::<VkLayerInstanceCreateInfo>(),
    size_of::<vk::BaseInStructure>() + PTR + 2 * PTR
);
const_assert_eq!(
    size_of::<VkLayerDeviceCreateInfo>(),
    size_of::<vk::BaseInStructure>() + PTR + PTR
);
