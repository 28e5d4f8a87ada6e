use std::ffi::CStr;
use std::mem;

use ash::vk;

use crate::vk::exports;

/// Every entry point the layer implements itself.
///
/// Names coming in through the proc-address resolvers are mapped onto this set
/// once; anything outside it is forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    GetInstanceProcAddr,
    GetDeviceProcAddr,
    CreateInstance,
    DestroyInstance,
    CreateDevice,
    DestroyDevice,
    EnumerateInstanceLayerProperties,
    EnumerateInstanceExtensionProperties,
    EnumerateDeviceLayerProperties,
    EnumerateDeviceExtensionProperties,
    QueuePresentKHR,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 11] = [
        EntryPoint::GetInstanceProcAddr,
        EntryPoint::GetDeviceProcAddr,
        EntryPoint::CreateInstance,
        EntryPoint::DestroyInstance,
        EntryPoint::CreateDevice,
        EntryPoint::DestroyDevice,
        EntryPoint::EnumerateInstanceLayerProperties,
        EntryPoint::EnumerateInstanceExtensionProperties,
        EntryPoint::EnumerateDeviceLayerProperties,
        EntryPoint::EnumerateDeviceExtensionProperties,
        EntryPoint::QueuePresentKHR,
    ];

    pub fn from_name(name: &CStr) -> Option<Self> {
        match name.to_bytes() {
            b"vkGetInstanceProcAddr" => Some(EntryPoint::GetInstanceProcAddr),
            b"vkGetDeviceProcAddr" => Some(EntryPoint::GetDeviceProcAddr),
            b"vkCreateInstance" => Some(EntryPoint::CreateInstance),
            b"vkDestroyInstance" => Some(EntryPoint::DestroyInstance),
            b"vkCreateDevice" => Some(EntryPoint::CreateDevice),
            b"vkDestroyDevice" => Some(EntryPoint::DestroyDevice),
            b"vkEnumerateInstanceLayerProperties" => Some(EntryPoint::EnumerateInstanceLayerProperties),
            b"vkEnumerateInstanceExtensionProperties" => {
                Some(EntryPoint::EnumerateInstanceExtensionProperties)
            }
            b"vkEnumerateDeviceLayerProperties" => Some(EntryPoint::EnumerateDeviceLayerProperties),
            b"vkEnumerateDeviceExtensionProperties" => {
                Some(EntryPoint::EnumerateDeviceExtensionProperties)
            }
            b"vkQueuePresentKHR" => Some(EntryPoint::QueuePresentKHR),
            _ => None,
        }
    }

    pub fn name(self) -> &'static CStr {
        match self {
            EntryPoint::GetInstanceProcAddr => c"vkGetInstanceProcAddr",
            EntryPoint::GetDeviceProcAddr => c"vkGetDeviceProcAddr",
            EntryPoint::CreateInstance => c"vkCreateInstance",
            EntryPoint::DestroyInstance => c"vkDestroyInstance",
            EntryPoint::CreateDevice => c"vkCreateDevice",
            EntryPoint::DestroyDevice => c"vkDestroyDevice",
            EntryPoint::EnumerateInstanceLayerProperties => c"vkEnumerateInstanceLayerProperties",
            EntryPoint::EnumerateInstanceExtensionProperties => {
                c"vkEnumerateInstanceExtensionProperties"
            }
            EntryPoint::EnumerateDeviceLayerProperties => c"vkEnumerateDeviceLayerProperties",
            EntryPoint::EnumerateDeviceExtensionProperties => c"vkEnumerateDeviceExtensionProperties",
            EntryPoint::QueuePresentKHR => c"vkQueuePresentKHR",
        }
    }

    /// Answered locally by `vkGetInstanceProcAddr` regardless of the handle.
    pub fn is_instance_local(self) -> bool {
        !matches!(self, EntryPoint::QueuePresentKHR)
    }

    /// Answered locally by `vkGetDeviceProcAddr` regardless of the handle.
    pub fn is_device_local(self) -> bool {
        matches!(self, EntryPoint::GetDeviceProcAddr | EntryPoint::DestroyDevice)
    }

    /// The layer's own implementation.
    pub fn hook(self) -> unsafe extern "system" fn() {
        unsafe {
            match self {
                EntryPoint::GetInstanceProcAddr => mem::transmute(
                    exports::vkGetInstanceProcAddr as vk::PFN_vkGetInstanceProcAddr,
                ),
                EntryPoint::GetDeviceProcAddr => {
                    mem::transmute(exports::vkGetDeviceProcAddr as vk::PFN_vkGetDeviceProcAddr)
                }
                EntryPoint::CreateInstance => {
                    mem::transmute(exports::create_instance as vk::PFN_vkCreateInstance)
                }
                EntryPoint::DestroyInstance => {
                    mem::transmute(exports::destroy_instance as vk::PFN_vkDestroyInstance)
                }
                EntryPoint::CreateDevice => {
                    mem::transmute(exports::create_device as vk::PFN_vkCreateDevice)
                }
                EntryPoint::DestroyDevice => {
                    mem::transmute(exports::destroy_device as vk::PFN_vkDestroyDevice)
                }
                EntryPoint::EnumerateInstanceLayerProperties => mem::transmute(
                    exports::vkEnumerateInstanceLayerProperties
                        as vk::PFN_vkEnumerateInstanceLayerProperties,
                ),
                EntryPoint::EnumerateInstanceExtensionProperties => mem::transmute(
                    exports::vkEnumerateInstanceExtensionProperties
                        as vk::PFN_vkEnumerateInstanceExtensionProperties,
                ),
                EntryPoint::EnumerateDeviceLayerProperties => mem::transmute(
                    exports::vkEnumerateDeviceLayerProperties
                        as vk::PFN_vkEnumerateDeviceLayerProperties,
                ),
                EntryPoint::EnumerateDeviceExtensionProperties => mem::transmute(
                    exports::vkEnumerateDeviceExtensionProperties
                        as vk::PFN_vkEnumerateDeviceExtensionProperties,
                ),
                EntryPoint::QueuePresentKHR => {
                    mem::transmute(exports::queue_present_khr as vk::PFN_vkQueuePresentKHR)
                }
            }
        }
    }
}
