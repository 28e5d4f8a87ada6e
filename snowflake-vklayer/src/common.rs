use std::ffi::CStr;

use ash::vk;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerError {
    #[error("Malformed loader chain: {0}")]
    ProtocolViolation(&'static str),

    #[error("Next layer could not resolve {0:?}")]
    UnresolvedDelegate(&'static CStr),

    #[error("Handle is not known to the layer: {0}")]
    UnknownHandle(&'static str),

    #[error("Next layer failed with {0}")]
    DelegateFailure(vk::Result),
}

impl LayerError {
    /// The return code reported across the ABI for this error.
    pub fn as_vk_result(&self) -> vk::Result {
        match self {
            LayerError::ProtocolViolation(_)
            | LayerError::UnresolvedDelegate(_)
            | LayerError::UnknownHandle(_) => vk::Result::ERROR_INITIALIZATION_FAILED,
            LayerError::DelegateFailure(result) => *result,
        }
    }
}

/// Collapse a hook result into the code returned to the caller.
pub fn into_vk_result(result: Result<(), LayerError>) -> vk::Result {
    match result {
        Ok(()) => vk::Result::SUCCESS,
        Err(e) => e.as_vk_result(),
    }
}
