//! Whether the layer intercepts anything in this process.
//!
//! The layer is installed globally but only targets one process. It is active
//! when `SNOWFLAKE_LAYER_PACKAGE` names the current process.
//!
//! Everything here is read once when the layer context is created.

use std::env;
use std::fs;

pub const TARGET_PACKAGE_VAR: &str = "SNOWFLAKE_LAYER_PACKAGE";
pub const DEVICE_FALLBACK_VAR: &str = "SNOWFLAKE_LAYER_DEVICE_FALLBACK";

/// How the device resolver treats a device it has no record for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevicePolicy {
    /// Unknown devices resolve to null.
    Strict,
    /// Unknown devices borrow the resolver of the first registered device.
    /// Only correct when the application creates a single device.
    FirstRegistered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivationGate {
    active: bool,
    device_policy: DevicePolicy,
}

impl ActivationGate {
    pub const fn new(active: bool, device_policy: DevicePolicy) -> Self {
        ActivationGate {
            active,
            device_policy,
        }
    }

    pub fn from_env() -> Self {
        let process = process_identity();
        let active = matches_target(env::var(TARGET_PACKAGE_VAR).ok().as_deref(), &process);
        let device_policy = match env::var(DEVICE_FALLBACK_VAR).as_deref() {
            Ok("1") | Ok("true") => DevicePolicy::FirstRegistered,
            _ => DevicePolicy::Strict,
        };
        tracing::debug!(%process, active, ?device_policy, "activation gate evaluated");
        ActivationGate::new(active, device_policy)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn device_policy(&self) -> DevicePolicy {
        self.device_policy
    }
}

fn matches_target(target: Option<&str>, process: &str) -> bool {
    match target {
        Some(target) => !target.is_empty() && target == process,
        None => false,
    }
}

/// The name of the current process: the package name on Android, the
/// executable path elsewhere.
pub fn process_identity() -> String {
    fs::read("/proc/self/cmdline")
        .ok()
        .and_then(|cmdline| {
            let argv0 = cmdline.split(|&b| b == 0).next()?;
            (!argv0.is_empty()).then(|| String::from_utf8_lossy(argv0).into_owned())
        })
        .or_else(|| env::args().next())
        .unwrap_or_default()
}
