//! A fake next layer for tests.
//!
//! Objects handed out by the mock are leaked: tests may keep using a handle
//! after the layer forwarded its destruction, to check what was forwarded.

use std::cell::Cell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use ash::vk;
use ash::vk::Handle;

use crate::vk::sys::{
    VkLayerDeviceCreateInfo, VkLayerDeviceCreatePayload, VkLayerDeviceLink, VkLayerFunction,
    VkLayerInstanceCreateInfo, VkLayerInstanceCreatePayload, VkLayerInstanceLink,
};

/// Application name that makes [`create_instance`] refuse.
pub const FAILING_APP: &str = "FailingApp";

/// A dispatchable object as the loader lays it out: the dispatch pointer
/// first, then whatever the driver keeps.
#[repr(C)]
pub struct MockObject {
    loader_data: *const u8,
    pub destroy_calls: AtomicU32,
    pub present_calls: AtomicU32,
}

// Only the address of `loader_data` matters; it is never dereferenced.
unsafe impl Send for MockObject {}
unsafe impl Sync for MockObject {}

impl MockObject {
    /// A new object with its own dispatch table.
    pub fn with_new_table() -> &'static MockObject {
        let table: &'static u64 = Box::leak(Box::new(0));
        Self::with_table(table as *const u64 as *const u8)
    }

    /// A child object dispatching through the same table as `parent`.
    pub fn child_of(parent: &MockObject) -> &'static MockObject {
        Self::with_table(parent.loader_data)
    }

    fn with_table(loader_data: *const u8) -> &'static MockObject {
        Box::leak(Box::new(MockObject {
            loader_data,
            destroy_calls: AtomicU32::new(0),
            present_calls: AtomicU32::new(0),
        }))
    }

    pub fn handle<H: Handle>(&'static self) -> H {
        H::from_raw(self as *const MockObject as usize as u64)
    }

    /// # Safety
    /// `handle` must have been produced by [`MockObject::handle`].
    pub unsafe fn from_handle<H: Handle>(handle: H) -> &'static MockObject {
        &*(handle.as_raw() as usize as *const MockObject)
    }

    pub fn destroyed(&self) -> u32 {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    pub fn presented(&self) -> u32 {
        self.present_calls.load(Ordering::SeqCst)
    }
}

unsafe fn void<F: Copy>(f: F) -> vk::PFN_vkVoidFunction {
    assert_eq!(mem::size_of::<F>(), mem::size_of::<unsafe extern "system" fn()>());
    Some(mem::transmute_copy(&f))
}

pub unsafe extern "system" fn get_instance_proc_addr(
    _instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkCreateInstance" => void(create_instance as vk::PFN_vkCreateInstance),
        b"vkDestroyInstance" => void(destroy_instance as vk::PFN_vkDestroyInstance),
        b"vkCreateDevice" => void(create_device as vk::PFN_vkCreateDevice),
        b"vkGetDeviceProcAddr" => void(get_device_proc_addr as vk::PFN_vkGetDeviceProcAddr),
        b"vkEnumeratePhysicalDevices" => {
            void(enumerate_physical_devices as vk::PFN_vkEnumeratePhysicalDevices)
        }
        b"vkEnumerateDeviceExtensionProperties" => void(
            enumerate_device_extension_properties as vk::PFN_vkEnumerateDeviceExtensionProperties,
        ),
        _ => None,
    }
}

/// A next layer that cannot resolve `vkDestroyInstance`.
pub unsafe extern "system" fn get_instance_proc_addr_without_destroy(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkDestroyInstance" => None,
        _ => get_instance_proc_addr(instance, p_name),
    }
}

/// A next layer that also knows `vkEnumeratePhysicalDeviceGroups`.
pub unsafe extern "system" fn get_instance_proc_addr_with_groups(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkEnumeratePhysicalDeviceGroups" => void(
            enumerate_physical_device_groups as vk::PFN_vkEnumeratePhysicalDeviceGroups,
        ),
        _ => get_instance_proc_addr(instance, p_name),
    }
}

/// A next layer that resolves nothing.
pub unsafe extern "system" fn empty_get_instance_proc_addr(
    _instance: vk::Instance,
    _name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    None
}

pub unsafe extern "system" fn get_device_proc_addr(
    _device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkGetDeviceProcAddr" => void(get_device_proc_addr as vk::PFN_vkGetDeviceProcAddr),
        b"vkDestroyDevice" => void(destroy_device as vk::PFN_vkDestroyDevice),
        b"vkQueuePresentKHR" => void(queue_present as vk::PFN_vkQueuePresentKHR),
        b"vkGetDeviceQueue" => void(get_device_queue as vk::PFN_vkGetDeviceQueue),
        _ => None,
    }
}

/// A device resolver for a device created without `VK_KHR_swapchain`.
pub unsafe extern "system" fn get_device_proc_addr_without_swapchain(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkQueuePresentKHR" => None,
        _ => get_device_proc_addr(device, p_name),
    }
}

/// A device resolver that cannot resolve `vkDestroyDevice`.
pub unsafe extern "system" fn get_device_proc_addr_without_destroy(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkDestroyDevice" => None,
        _ => get_device_proc_addr(device, p_name),
    }
}

thread_local! {
    static REUSED_TABLE: Cell<Option<&'static MockObject>> = const { Cell::new(None) };
}

/// Make the next instance created on this thread dispatch through the same
/// table as `previous`, as a driver recycling its allocation would.
pub fn reuse_table_of(previous: &'static MockObject) {
    REUSED_TABLE.with(|table| table.set(Some(previous)));
}

pub unsafe extern "system" fn create_instance(
    p_create_info: *const vk::InstanceCreateInfo,
    _p_allocator: *const vk::AllocationCallbacks,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    let app = (*p_create_info).p_application_info;
    if !app.is_null()
        && CStr::from_ptr((*app).p_application_name).to_bytes() == FAILING_APP.as_bytes()
    {
        return vk::Result::ERROR_INCOMPATIBLE_DRIVER;
    }
    let object = REUSED_TABLE
        .with(Cell::take)
        .map(MockObject::child_of)
        .unwrap_or_else(MockObject::with_new_table);
    p_instance.write(object.handle());
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn destroy_instance(
    instance: vk::Instance,
    _p_allocator: *const vk::AllocationCallbacks,
) {
    MockObject::from_handle(instance)
        .destroy_calls
        .fetch_add(1, Ordering::SeqCst);
}

/// Refuses a device without queues with `ERROR_FEATURE_NOT_PRESENT`.
pub unsafe extern "system" fn create_device(
    _physical_device: vk::PhysicalDevice,
    p_create_info: *const vk::DeviceCreateInfo,
    _p_allocator: *const vk::AllocationCallbacks,
    p_device: *mut vk::Device,
) -> vk::Result {
    if (*p_create_info).queue_create_info_count == 0 {
        return vk::Result::ERROR_FEATURE_NOT_PRESENT;
    }
    p_device.write(MockObject::with_new_table().handle());
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn destroy_device(
    device: vk::Device,
    _p_allocator: *const vk::AllocationCallbacks,
) {
    MockObject::from_handle(device)
        .destroy_calls
        .fetch_add(1, Ordering::SeqCst);
}

pub unsafe extern "system" fn queue_present(
    queue: vk::Queue,
    _p_present_info: *const vk::PresentInfoKHR,
) -> vk::Result {
    MockObject::from_handle(queue)
        .present_calls
        .fetch_add(1, Ordering::SeqCst);
    vk::Result::SUBOPTIMAL_KHR
}

pub unsafe extern "system" fn get_device_queue(
    _device: vk::Device,
    _queue_family_index: u32,
    _queue_index: u32,
    _p_queue: *mut vk::Queue,
) {
}

pub unsafe extern "system" fn enumerate_physical_devices(
    _instance: vk::Instance,
    p_physical_device_count: *mut u32,
    _p_physical_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    *p_physical_device_count = 0;
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn enumerate_physical_device_groups(
    _instance: vk::Instance,
    p_physical_device_group_count: *mut u32,
    _p_physical_device_group_properties: *mut vk::PhysicalDeviceGroupProperties,
) -> vk::Result {
    *p_physical_device_group_count = 0;
    vk::Result::SUCCESS
}

/// Reports three driver extensions without writing any.
pub unsafe extern "system" fn enumerate_device_extension_properties(
    _physical_device: vk::PhysicalDevice,
    _p_layer_name: *const c_char,
    p_property_count: *mut u32,
    _p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    *p_property_count = 3;
    vk::Result::SUCCESS
}

/// A `vkCreateInstance` call as the loader would issue it to the top layer.
pub struct InstanceCall {
    pub create_info: &'static vk::InstanceCreateInfo,
    pub link_info: *mut VkLayerInstanceCreateInfo,
    pub links: Vec<*mut VkLayerInstanceLink>,
}

impl InstanceCall {
    /// `next_layers[0]` is the layer directly below the one under test.
    pub fn new(app_name: &str, next_layers: &[vk::PFN_vkGetInstanceProcAddr]) -> Self {
        let links: Vec<*mut VkLayerInstanceLink> = next_layers
            .iter()
            .map(|&gipa| {
                Box::into_raw(Box::new(VkLayerInstanceLink {
                    p_next: ptr::null_mut(),
                    pfn_next_get_instance_proc_addr: gipa,
                    pfn_next_get_physical_device_proc_addr: None,
                }))
            })
            .collect();
        for pair in links.windows(2) {
            unsafe { (*pair[0]).p_next = pair[1] };
        }
        let link_info = Box::into_raw(Box::new(VkLayerInstanceCreateInfo {
            s_type: vk::StructureType::LOADER_INSTANCE_CREATE_INFO,
            p_next: ptr::null(),
            function: VkLayerFunction::VK_LAYER_LINK_INFO,
            u: VkLayerInstanceCreatePayload {
                p_layer_info: links.first().copied().unwrap_or(ptr::null_mut()),
            },
        }));
        Self::with_p_next(app_name, link_info as *const c_void, link_info, links)
    }

    /// A call whose `pNext` chain carries no loader link info.
    pub fn without_link_info(app_name: &str) -> Self {
        Self::with_p_next(app_name, ptr::null(), ptr::null_mut(), Vec::new())
    }

    fn with_p_next(
        app_name: &str,
        p_next: *const c_void,
        link_info: *mut VkLayerInstanceCreateInfo,
        links: Vec<*mut VkLayerInstanceLink>,
    ) -> Self {
        let app_name: &'static CStr = Box::leak(CString::new(app_name).unwrap().into_boxed_c_str());
        let app_info: &'static vk::ApplicationInfo = Box::leak(Box::new(vk::ApplicationInfo {
            p_application_name: app_name.as_ptr(),
            ..Default::default()
        }));
        let create_info = Box::leak(Box::new(vk::InstanceCreateInfo {
            p_next,
            p_application_info: app_info,
            ..Default::default()
        }));
        InstanceCall {
            create_info,
            link_info,
            links,
        }
    }

    /// The link the next layer will find at the head of the chain.
    pub fn head(&self) -> *mut VkLayerInstanceLink {
        unsafe { (*self.link_info).u.p_layer_info }
    }
}

/// A `vkCreateDevice` call as the loader would issue it to the top layer.
pub struct DeviceCall {
    pub create_info: &'static vk::DeviceCreateInfo,
    pub link_info: *mut VkLayerDeviceCreateInfo,
    pub links: Vec<*mut VkLayerDeviceLink>,
}

impl DeviceCall {
    pub fn new(
        queue_create_info_count: u32,
        next_layers: &[(vk::PFN_vkGetInstanceProcAddr, vk::PFN_vkGetDeviceProcAddr)],
    ) -> Self {
        let links: Vec<*mut VkLayerDeviceLink> = next_layers
            .iter()
            .map(|&(gipa, gdpa)| {
                Box::into_raw(Box::new(VkLayerDeviceLink {
                    p_next: ptr::null_mut(),
                    pfn_next_get_instance_proc_addr: gipa,
                    pfn_next_get_device_proc_addr: gdpa,
                }))
            })
            .collect();
        for pair in links.windows(2) {
            unsafe { (*pair[0]).p_next = pair[1] };
        }
        let link_info = Box::into_raw(Box::new(VkLayerDeviceCreateInfo {
            s_type: vk::StructureType::LOADER_DEVICE_CREATE_INFO,
            p_next: ptr::null(),
            function: VkLayerFunction::VK_LAYER_LINK_INFO,
            u: VkLayerDeviceCreatePayload {
                p_layer_info: links.first().copied().unwrap_or(ptr::null_mut()),
            },
        }));
        let create_info = Box::leak(Box::new(vk::DeviceCreateInfo {
            p_next: link_info as *const c_void,
            queue_create_info_count,
            ..Default::default()
        }));
        DeviceCall {
            create_info,
            link_info,
            links,
        }
    }

    /// The standard single-link call onto the mock driver.
    pub fn onto_mock() -> Self {
        Self::new(1, &[(get_instance_proc_addr, get_device_proc_addr)])
    }

    pub fn head(&self) -> *mut VkLayerDeviceLink {
        unsafe { (*self.link_info).u.p_layer_info }
    }
}
