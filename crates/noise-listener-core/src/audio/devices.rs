use crate::{CoreResult, ListenerError};

use std::panic::Location;

use cpal::{
    Device,
    traits::{DeviceTrait, HostTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Name fragments that mark a device as a likely microphone.
const INPUT_KEYWORDS: [&str; 2] = ["mic", "input"];

/// Names of every input device on the default host.
///
/// # Errors
///
/// Returns [`ListenerError::DeviceError`] if enumeration fails.
#[track_caller]
#[instrument]
pub fn list_input_devices() -> CoreResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| ListenerError::DeviceError {
            reason: format!("Failed to enumerate input devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(devices.filter_map(|device| device_name(&device)).collect())
}

/// True if `name` looks like a microphone or line input.
pub fn is_input_like(name: &str) -> bool {
    let lower = name.to_lowercase();
    INPUT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Picks the input device to listen on.
///
/// With `preferred` set, only an exact name match is accepted. Otherwise the
/// first device whose name contains "mic" or "input" wins, falling back to
/// the host default.
///
/// # Errors
///
/// Returns [`ListenerError::DeviceError`] if a named device is missing, or
/// [`ListenerError::NoMicrophoneFound`] if the host has no input at all.
#[track_caller]
#[instrument]
pub fn find_input_device(preferred: Option<&str>) -> CoreResult<Device> {
    let host = cpal::default_host();

    let devices: Vec<Device> = host
        .input_devices()
        .map_err(|e| ListenerError::DeviceError {
            reason: format!("Failed to enumerate input devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?
        .collect();

    for (index, device) in devices.iter().enumerate() {
        debug!(index, name = ?device_name(device), "Input device");
    }

    if let Some(wanted) = preferred {
        return devices
            .into_iter()
            .find(|device| device_name(device).as_deref() == Some(wanted))
            .ok_or_else(|| ListenerError::DeviceError {
                reason: format!("Input device not found: {}", wanted),
                location: ErrorLocation::from(Location::caller()),
            });
    }

    if let Some(device) = devices
        .into_iter()
        .find(|device| device_name(device).is_some_and(|name| is_input_like(&name)))
    {
        info!(name = ?device_name(&device), "Found an input device");
        return Ok(device);
    }

    info!("No preferred input found; using default input device");
    host.default_input_device()
        .ok_or(ListenerError::NoMicrophoneFound {
            location: ErrorLocation::from(Location::caller()),
        })
}

#[allow(deprecated)]
pub(crate) fn device_name(device: &Device) -> Option<String> {
    device.name().ok()
}
