//! Batch wake coordination. Fans a wake request across registry devices,
//! collecting one result per device in a deterministic order; a single
//! failed send never aborts its siblings.

use serde::Serialize;

use crate::registry::{DeviceRegistry, RegistryError};

use super::dispatch::{WakeDispatcher, WakeResult};

/// Aggregate counts derived from the result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WakeSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct WakeMultipleResponse {
    pub results: Vec<WakeResult>,
    pub summary: WakeSummary,
    /// Requested names absent from the registry; not counted in `summary`.
    #[serde(rename = "notFound")]
    pub not_found: Vec<String>,
}

fn summarize(results: &[WakeResult]) -> WakeSummary {
    let successful = results.iter().filter(|r| r.success).count();
    WakeSummary {
        total: results.len(),
        successful,
        failed: results.len() - successful,
    }
}

/// Wake every registered device in registry list order.
pub fn wake_all(
    registry: &DeviceRegistry,
    dispatcher: &WakeDispatcher,
) -> Result<WakeMultipleResponse, RegistryError> {
    let devices = registry.list()?;
    log::info!("Waking all {} registered devices", devices.len());

    let results: Vec<WakeResult> = devices
        .iter()
        .map(|d| dispatcher.wake_mac(&d.name, &d.mac, d.broadcast.as_deref(), None))
        .collect();

    Ok(WakeMultipleResponse {
        summary: summarize(&results),
        results,
        not_found: Vec::new(),
    })
}

/// Wake the requested names in input order. Unknown names land in
/// `not_found` and are excluded from the summary counts.
pub fn wake_named(
    registry: &DeviceRegistry,
    dispatcher: &WakeDispatcher,
    names: &[String],
) -> Result<WakeMultipleResponse, RegistryError> {
    let mut results = Vec::new();
    let mut not_found = Vec::new();

    for name in names {
        match registry.get(name) {
            Ok(device) => results.push(dispatcher.wake_mac(
                &device.name,
                &device.mac,
                device.broadcast.as_deref(),
                None,
            )),
            Err(RegistryError::NotFound(_)) => not_found.push(name.clone()),
            Err(e) => return Err(e),
        }
    }

    Ok(WakeMultipleResponse {
        summary: summarize(&results),
        results,
        not_found,
    })
}
