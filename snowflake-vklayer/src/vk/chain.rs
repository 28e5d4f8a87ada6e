//! Walking the `pNext` chain of a create call for the loader's link info.
//!
//! The loader prepends a `VkLayer{Instance,Device}CreateInfo` tagged
//! `VK_LAYER_LINK_INFO` whose payload is a singly linked list of the layers
//! below us. Each layer pops the head before calling down so the next layer
//! finds its own link at the front.

use std::ffi::c_void;
use std::ptr::NonNull;

use ash::vk;

use crate::common::LayerError;
use crate::vk::sys::{
    VkLayerDeviceCreateInfo, VkLayerFunction, VkLayerInstanceCreateInfo,
};

/// One node of an extension chain, classified by its structure type.
#[derive(Debug)]
pub enum ChainNode {
    InstanceLoaderInfo(NonNull<VkLayerInstanceCreateInfo>),
    DeviceLoaderInfo(NonNull<VkLayerDeviceCreateInfo>),
    Foreign(vk::StructureType),
}

impl ChainNode {
    unsafe fn classify(node: NonNull<vk::BaseInStructure>) -> Self {
        match node.as_ref().s_type {
            vk::StructureType::LOADER_INSTANCE_CREATE_INFO => {
                ChainNode::InstanceLoaderInfo(node.cast())
            }
            vk::StructureType::LOADER_DEVICE_CREATE_INFO => ChainNode::DeviceLoaderInfo(node.cast()),
            other => ChainNode::Foreign(other),
        }
    }
}

/// Iterator over the nodes of a `pNext` chain.
pub struct ExtensionChain {
    next: Option<NonNull<vk::BaseInStructure>>,
}

impl ExtensionChain {
    /// # Safety
    /// `p_next` must be null or the head of a well-formed, live extension chain.
    pub unsafe fn new(p_next: *const c_void) -> Self {
        ExtensionChain {
            next: NonNull::new(p_next as *mut vk::BaseInStructure),
        }
    }
}

impl Iterator for ExtensionChain {
    type Item = ChainNode;

    fn next(&mut self) -> Option<ChainNode> {
        let node = self.next?;
        // SAFETY: upheld by the contract of `ExtensionChain::new`.
        unsafe {
            self.next = NonNull::new(node.as_ref().p_next as *mut vk::BaseInStructure);
            Some(ChainNode::classify(node))
        }
    }
}

/// Function pointers of the next layer, as read from an instance link.
#[derive(Clone, Copy)]
pub struct NextInstanceLink {
    pub get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
}

/// Function pointers of the next layer, as read from a device link.
#[derive(Clone, Copy)]
pub struct NextDeviceLink {
    pub get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
}

/// A loader create info carrying a list of layer links.
pub trait LoaderLinkInfo: Sized {
    type Next: Copy;

    fn select(node: ChainNode) -> Option<NonNull<Self>>;

    fn function(&self) -> VkLayerFunction;

    /// The entry points of the head link, if any.
    ///
    /// # Safety
    /// `self.function()` must be `VK_LAYER_LINK_INFO`.
    unsafe fn head(&self) -> Option<Self::Next>;

    /// Drop the head link from the list.
    ///
    /// # Safety
    /// `self.function()` must be `VK_LAYER_LINK_INFO`.
    unsafe fn unlink_head(&mut self);
}

impl LoaderLinkInfo for VkLayerInstanceCreateInfo {
    type Next = NextInstanceLink;

    fn select(node: ChainNode) -> Option<NonNull<Self>> {
        match node {
            ChainNode::InstanceLoaderInfo(info) => Some(info),
            _ => None,
        }
    }

    fn function(&self) -> VkLayerFunction {
        self.function
    }

    unsafe fn head(&self) -> Option<NextInstanceLink> {
        self.u.p_layer_info.as_ref().map(|head| NextInstanceLink {
            get_instance_proc_addr: head.pfn_next_get_instance_proc_addr,
        })
    }

    unsafe fn unlink_head(&mut self) {
        if let Some(head) = self.u.p_layer_info.as_ref() {
            self.u.p_layer_info = head.p_next;
        }
    }
}

impl LoaderLinkInfo for VkLayerDeviceCreateInfo {
    type Next = NextDeviceLink;

    fn select(node: ChainNode) -> Option<NonNull<Self>> {
        match node {
            ChainNode::DeviceLoaderInfo(info) => Some(info),
            _ => None,
        }
    }

    fn function(&self) -> VkLayerFunction {
        self.function
    }

    unsafe fn head(&self) -> Option<NextDeviceLink> {
        self.u.p_layer_info.as_ref().map(|head| NextDeviceLink {
            get_device_proc_addr: head.pfn_next_get_device_proc_addr,
        })
    }

    unsafe fn unlink_head(&mut self) {
        if let Some(head) = self.u.p_layer_info.as_ref() {
            self.u.p_layer_info = head.p_next;
        }
    }
}

/// The link info node found in a create call. Consumed by [`LinkCursor::advance`].
pub struct LinkCursor<'a, T: LoaderLinkInfo> {
    info: &'a mut T,
}

impl<'a, T: LoaderLinkInfo> LinkCursor<'a, T> {
    /// Find the first `VK_LAYER_LINK_INFO` node of type `T` in a `pNext` chain.
    ///
    /// # Safety
    /// `p_next` must be null or the head of a well-formed, live, writable
    /// extension chain that outlives `'a`.
    pub unsafe fn find(p_next: *const c_void) -> Result<Self, LayerError> {
        ExtensionChain::new(p_next)
            .filter_map(T::select)
            .find(|info| info.as_ref().function() == VkLayerFunction::VK_LAYER_LINK_INFO)
            .map(|info| LinkCursor { info: &mut *info.as_ptr() })
            .ok_or(LayerError::ProtocolViolation("no loader link info in pNext chain"))
    }

    /// The entry points of the layer directly below us.
    pub fn next_link(&self) -> Result<T::Next, LayerError> {
        // SAFETY: `find` only yields link info nodes.
        unsafe { self.info.head() }
            .ok_or(LayerError::ProtocolViolation("loader link info has no next link"))
    }

    /// Pop our link off the chain so the layer below finds its own at the head.
    pub fn advance(self) {
        // SAFETY: `find` only yields link info nodes.
        unsafe { self.info.unlink_head() }
    }
}
