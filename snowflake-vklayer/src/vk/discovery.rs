//! Layer and extension enumeration.

use std::ffi::{c_char, CStr};
use std::ptr;

use ash::vk;

pub const LAYER_NAME: &CStr = c"VK_LAYER_SNOWFLAKE_present";
pub const LAYER_DESCRIPTION: &CStr = c"Snowflake frame presentation observer";
pub const IMPLEMENTATION_VERSION: u32 = 1;

fn copy_into(dst: &mut [c_char], src: &CStr) {
    // Leave room for the terminator; the remainder is already zeroed.
    let bytes = src.to_bytes();
    let len = bytes.len().min(dst.len() - 1);
    for (d, &s) in dst.iter_mut().zip(&bytes[..len]) {
        *d = s as c_char;
    }
}

pub fn layer_properties() -> vk::LayerProperties {
    let mut properties = vk::LayerProperties {
        spec_version: vk::API_VERSION_1_3,
        implementation_version: IMPLEMENTATION_VERSION,
        ..Default::default()
    };
    copy_into(&mut properties.layer_name, LAYER_NAME);
    copy_into(&mut properties.description, LAYER_DESCRIPTION);
    properties
}

/// The usual two-call enumeration: a null `p_items` asks for the count,
/// otherwise up to `*p_count` items are written and `INCOMPLETE` reports a
/// short buffer.
///
/// # Safety
/// `p_count` must be valid for reads and writes; a non-null `p_items` must be
/// valid for `*p_count` writes.
pub unsafe fn enumerate<T: Copy>(items: &[T], p_count: *mut u32, p_items: *mut T) -> vk::Result {
    let Some(count) = p_count.as_mut() else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    if p_items.is_null() {
        *count = items.len() as u32;
        return vk::Result::SUCCESS;
    }

    let written = items.len().min(*count as usize);
    ptr::copy_nonoverlapping(items.as_ptr(), p_items, written);
    *count = written as u32;
    if written < items.len() {
        vk::Result::INCOMPLETE
    } else {
        vk::Result::SUCCESS
    }
}

/// # Safety
/// See [`enumerate`].
pub unsafe fn enumerate_layer_properties(
    p_property_count: *mut u32,
    p_properties: *mut vk::LayerProperties,
) -> vk::Result {
    enumerate(&[layer_properties()], p_property_count, p_properties)
}

/// Extensions provided by this layer: none. Any other layer name is not ours
/// to answer for.
///
/// # Safety
/// See [`enumerate`].
pub unsafe fn enumerate_extension_properties(
    layer_name: &CStr,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    if layer_name != LAYER_NAME {
        return vk::Result::ERROR_LAYER_NOT_PRESENT;
    }
    enumerate::<vk::ExtensionProperties>(&[], p_property_count, p_properties)
}
