//! Linux CLI adapter: `nmcli`, with `iwlist` as a scan fallback.

use std::time::Duration;

use log::debug;

use crate::constants::timeouts;
use crate::models::{EngineError, NetworkRecord};
use crate::parsers::{parse_iwlist, parse_nmcli};
use crate::process;
use crate::Result;

const LIST_ARGS: [&str; 6] = ["-t", "-f", "SSID,SIGNAL,SECURITY,ACTIVE", "device", "wifi", "list"];

pub(crate) struct NmcliBackend;

impl NmcliBackend {
    pub(crate) fn new() -> Self {
        Self
    }

    fn list(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        let out = process::run("nmcli", &LIST_ARGS, timeout)?;
        Ok(parse_nmcli(&out))
    }
}

impl super::Backend for NmcliBackend {
    fn name(&self) -> &'static str {
        "nmcli"
    }

    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        match self.list(timeout) {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => debug!("nmcli saw no networks, trying iwlist"),
            Err(e) => debug!("nmcli list failed ({e}), trying iwlist"),
        }

        let out = process::run("iwlist", &["scan"], timeout)?;
        let records = parse_iwlist(&out);
        if records.is_empty() {
            return Err(EngineError::ParseFailure);
        }
        Ok(records)
    }

    fn connect(&self, ssid: &str, password: Option<&str>, timeout: Duration) -> Result<bool> {
        let mut args = vec!["device", "wifi", "connect", ssid];
        if let Some(pw) = password {
            args.push("password");
            args.push(pw);
        }
        let out = process::run_status("nmcli", &args, timeout)?;
        // nmcli prints an error line on failure but still exits 0 in some
        // versions, so check the output too.
        Ok(!out.contains("Error"))
    }

    fn disconnect(&self) -> Result<bool> {
        let out = process::run(
            "nmcli",
            &["-t", "-f", "DEVICE,TYPE,STATE", "device"],
            timeouts::scan_timeout(),
        )?;
        for line in out.lines() {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() >= 3 && fields[1] == "wifi" && fields[2].starts_with("connected") {
                process::run_status(
                    "nmcli",
                    &["device", "disconnect", fields[0]],
                    timeouts::scan_timeout(),
                )?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn current_connection(&self) -> Option<String> {
        let records = self.list(timeouts::scan_timeout()).ok()?;
        records
            .into_iter()
            .find(|r| r.connected)
            .map(|r| r.ssid)
    }

    fn saved_profiles(&self) -> Result<Vec<String>> {
        let out = process::run(
            "nmcli",
            &["-t", "-f", "NAME,TYPE", "connection", "show"],
            timeouts::scan_timeout(),
        )?;
        Ok(out
            .lines()
            .filter_map(|line| {
                let (name, ctype) = line.split_once(':')?;
                if ctype == "802-11-wireless" && !name.is_empty() {
                    Some(name.to_string())
                } else {
                    None
                }
            })
            .collect())
    }

    fn forget(&self, ssid: &str) -> Result<bool> {
        match process::run_status(
            "nmcli",
            &["connection", "delete", "id", ssid],
            timeouts::scan_timeout(),
        ) {
            Ok(_) => Ok(true),
            Err(EngineError::OperationFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
