//! A Vulkan layer that observes frame presentation and device lifetimes
//! while forwarding everything else to the layers below it.
//!
//! The loader finds the layer through its manifest and calls
//! `vkNegotiateLoaderLayerInterfaceVersion` first; see [`vk`] for the rest.

mod common;
mod gate;
mod logging;
pub mod vk;

pub use common::LayerError;
pub use gate::{ActivationGate, DevicePolicy};
