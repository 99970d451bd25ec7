//! macOS CLI adapter: the private `airport` tool plus `networksetup`.

use std::time::Duration;

use crate::constants::timeouts;
use crate::models::{EngineError, NetworkRecord};
use crate::parsers::{parse_airport, parse_airport_current};
use crate::process;
use crate::Result;

const AIRPORT_PATH: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";
const WIFI_INTERFACE: &str = "en0";

pub(crate) struct AirportBackend;

impl AirportBackend {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl super::Backend for AirportBackend {
    fn name(&self) -> &'static str {
        "airport"
    }

    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        let out = process::run(AIRPORT_PATH, &["-s"], timeout)?;
        let records = parse_airport(&out);
        if records.is_empty() {
            return Err(EngineError::ParseFailure);
        }
        Ok(records)
    }

    fn connect(&self, ssid: &str, password: Option<&str>, timeout: Duration) -> Result<bool> {
        let mut args = vec!["-setairportnetwork", WIFI_INTERFACE, ssid];
        if let Some(pw) = password {
            args.push(pw);
        }
        // networksetup prints nothing on success and an error line on
        // failure, always exiting 0.
        let out = process::run_status("networksetup", &args, timeout)?;
        Ok(out.trim().is_empty())
    }

    fn disconnect(&self) -> Result<bool> {
        process::run_status(AIRPORT_PATH, &["-z"], timeouts::scan_timeout())?;
        Ok(true)
    }

    fn current_connection(&self) -> Option<String> {
        let out = process::run_status(
            "networksetup",
            &["-getairportnetwork", WIFI_INTERFACE],
            timeouts::scan_timeout(),
        )
        .ok()?;
        parse_airport_current(&out)
    }

    fn saved_profiles(&self) -> Result<Vec<String>> {
        let out = process::run(
            "networksetup",
            &["-listpreferredwirelessnetworks", WIFI_INTERFACE],
            timeouts::scan_timeout(),
        )?;
        // First line is a header; entries are tab-indented.
        Ok(out
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn forget(&self, ssid: &str) -> Result<bool> {
        match process::run_status(
            "networksetup",
            &["-removepreferredwirelessnetwork", WIFI_INTERFACE, ssid],
            timeouts::scan_timeout(),
        ) {
            Ok(out) => Ok(!out.contains("not found")),
            Err(EngineError::OperationFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
