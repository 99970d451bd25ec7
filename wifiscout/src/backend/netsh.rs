//! Windows CLI adapter: `netsh wlan`.
//!
//! Connecting on Windows requires a registered profile, so the adapter
//! always synthesizes a profile XML, registers it through
//! `netsh wlan add profile`, and only then issues the connect.

use std::time::Duration;

use log::warn;
use uuid::Uuid;

use crate::constants::timeouts;
use crate::models::{EngineError, NetworkRecord};
use crate::parsers::{parse_netsh, parse_netsh_interfaces, parse_netsh_profiles};
use crate::process;
use crate::Result;

pub(crate) struct NetshBackend;

impl NetshBackend {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl super::Backend for NetshBackend {
    fn name(&self) -> &'static str {
        "netsh"
    }

    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        let out = process::run("netsh", &["wlan", "show", "networks", "mode=bssid"], timeout)?;
        let records = parse_netsh(&out);
        if records.is_empty() {
            return Err(EngineError::ParseFailure);
        }
        Ok(records)
    }

    fn connect(&self, ssid: &str, password: Option<&str>, timeout: Duration) -> Result<bool> {
        let xml = profile_xml(ssid, password);
        let path = std::env::temp_dir().join(format!("wifiscout-{}.xml", Uuid::new_v4()));
        std::fs::write(&path, xml)?;

        let filename_arg = format!("filename={}", path.display());
        let add = process::run_status(
            "netsh",
            &["wlan", "add", "profile", &filename_arg],
            timeouts::scan_timeout(),
        );
        // The profile XML is credentials on disk; remove it no matter how
        // the registration went.
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("could not remove profile file {}: {e}", path.display());
        }
        add?;

        std::thread::sleep(timeouts::profile_settle());

        let name_arg = format!("name={ssid}");
        let out = process::run_status("netsh", &["wlan", "connect", &name_arg], timeout)?;
        Ok(!out.contains("was not") && !out.contains("error"))
    }

    fn disconnect(&self) -> Result<bool> {
        process::run_status("netsh", &["wlan", "disconnect"], timeouts::scan_timeout())?;
        Ok(true)
    }

    fn current_connection(&self) -> Option<String> {
        let out = process::run(
            "netsh",
            &["wlan", "show", "interfaces"],
            timeouts::scan_timeout(),
        )
        .ok()?;
        parse_netsh_interfaces(&out)
    }

    fn saved_profiles(&self) -> Result<Vec<String>> {
        let out = process::run("netsh", &["wlan", "show", "profiles"], timeouts::scan_timeout())?;
        Ok(parse_netsh_profiles(&out))
    }

    fn forget(&self, ssid: &str) -> Result<bool> {
        let name_arg = format!("name={ssid}");
        match process::run_status(
            "netsh",
            &["wlan", "delete", "profile", &name_arg],
            timeouts::scan_timeout(),
        ) {
            Ok(out) => Ok(!out.contains("not found")),
            Err(EngineError::OperationFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Builds the WLAN profile XML netsh expects, open or WPA2-PSK.
fn profile_xml(ssid: &str, password: Option<&str>) -> String {
    let name = xml_escape(ssid);
    let security = match password {
        Some(pw) => format!(
            "<security>\
             <authEncryption><authentication>WPA2PSK</authentication>\
             <encryption>AES</encryption><useOneX>false</useOneX></authEncryption>\
             <sharedKey><keyType>passPhrase</keyType><protected>false</protected>\
             <keyMaterial>{}</keyMaterial></sharedKey>\
             </security>",
            xml_escape(pw)
        ),
        None => "<security>\
                 <authEncryption><authentication>open</authentication>\
                 <encryption>none</encryption><useOneX>false</useOneX></authEncryption>\
                 </security>"
            .to_string(),
    };

    format!(
        "<?xml version=\"1.0\"?>\
         <WLANProfile xmlns=\"http://www.microsoft.com/networking/WLAN/profile/v1\">\
         <name>{name}</name>\
         <SSIDConfig><SSID><name>{name}</name></SSID></SSIDConfig>\
         <connectionType>ESS</connectionType>\
         <connectionMode>manual</connectionMode>\
         <MSM>{security}</MSM>\
         </WLANProfile>"
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secured_profile_embeds_passphrase() {
        let xml = profile_xml("Home", Some("hunter2"));
        assert!(xml.contains("<name>Home</name>"));
        assert!(xml.contains("WPA2PSK"));
        assert!(xml.contains("<keyMaterial>hunter2</keyMaterial>"));
    }

    #[test]
    fn open_profile_has_no_key() {
        let xml = profile_xml("Cafe", None);
        assert!(xml.contains("<authentication>open</authentication>"));
        assert!(!xml.contains("keyMaterial"));
    }

    #[test]
    fn ssid_is_xml_escaped() {
        let xml = profile_xml("A&B <Cafe>", None);
        assert!(xml.contains("A&amp;B &lt;Cafe&gt;"));
        assert!(!xml.contains("A&B"));
    }
}
