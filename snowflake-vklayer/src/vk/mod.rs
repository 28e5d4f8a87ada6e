mod chain;
mod discovery;
mod entry;
mod exports;
mod key;
mod layer;
mod registry;
mod sys;

#[cfg(test)]
mod mock;

pub use discovery::{LAYER_DESCRIPTION, LAYER_NAME};
pub use entry::EntryPoint;
pub use exports::{context, LAYER_INTERFACE_VERSION};
pub use key::{DeviceKey, InstanceKey};
pub use layer::Layer;
pub use registry::{DeviceRecord, InstanceRecord, Registry};
pub use sys::VkNegotiateLayerInterface;
