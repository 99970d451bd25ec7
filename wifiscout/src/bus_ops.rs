//! NetworkManager operations over the system bus.
//!
//! Free async functions taking a `&zbus::Connection`; each one is a
//! complete operation the bridge can schedule. Per-object failures while
//! enumerating (a device or access point vanishing mid-walk) are skipped,
//! not propagated.

use std::collections::HashMap;
use std::time::Duration;

use futures_timer::Delay;
use log::{debug, warn};
use uuid::Uuid;
use zbus::Connection;
use zvariant::{OwnedObjectPath, Value};

use crate::constants::device_type;
use crate::models::{EngineError, NetworkRecord};
use crate::proxies::{
    NMAccessPointProxy, NMActiveConnectionProxy, NMDeviceProxy, NMProxy, NMWirelessProxy,
};
use crate::try_log;
use crate::utils::decode_ssid_lossy;
use crate::Result;

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const SETTINGS_PATH: &str = "/org/freedesktop/NetworkManager/Settings";
const SETTINGS_IFACE: &str = "org.freedesktop.NetworkManager.Settings";
const SETTINGS_CONN_IFACE: &str = "org.freedesktop.NetworkManager.Settings.Connection";

type ProfileSettings = HashMap<String, HashMap<String, zvariant::OwnedValue>>;

/// Finds the first Wi-Fi device on the system.
pub(crate) async fn find_wifi_device(
    conn: &Connection,
    nm: &NMProxy<'_>,
) -> Result<OwnedObjectPath> {
    let devices = nm.get_devices().await?;

    for dp in devices {
        let Ok(dev) = NMDeviceProxy::builder(conn).path(dp.clone())?.build().await else {
            continue;
        };
        if dev.device_type().await? == device_type::WIFI {
            return Ok(dp);
        }
    }
    Err(EngineError::OperationFailed("no Wi-Fi device".into()))
}

/// Paths of all Wi-Fi devices, for signal subscription.
pub(crate) async fn wifi_device_paths(conn: &Connection) -> Result<Vec<OwnedObjectPath>> {
    let nm = NMProxy::new(conn).await?;
    let mut out = Vec::new();
    for dp in nm.get_devices().await? {
        let Ok(dev) = NMDeviceProxy::builder(conn).path(dp.clone())?.build().await else {
            continue;
        };
        if dev.device_type().await.unwrap_or(0) == device_type::WIFI {
            out.push(dp);
        }
    }
    Ok(out)
}

/// Asks every Wi-Fi device to rescan. Best effort: a refused request
/// (NetworkManager rate-limits scans) is logged and ignored.
pub(crate) async fn request_scan(conn: &Connection) -> Result<()> {
    for dp in wifi_device_paths(conn).await? {
        let wifi = NMWirelessProxy::builder(conn).path(dp)?.build().await?;
        if let Err(e) = wifi.request_scan(HashMap::new()).await {
            debug!("scan request refused: {e}");
        }
    }
    Ok(())
}

/// Lists every visible access point as a raw network record.
///
/// One record per access point; dedup happens in the orchestrator. A
/// network is secured unless all three capability flag sets are zero.
pub(crate) async fn list_networks(conn: &Connection) -> Result<Vec<NetworkRecord>> {
    let mut records = Vec::new();

    for dp in wifi_device_paths(conn).await? {
        let wifi = NMWirelessProxy::builder(conn).path(dp)?.build().await?;
        for ap_path in wifi.get_all_access_points().await? {
            let Ok(ap) = NMAccessPointProxy::builder(conn)
                .path(ap_path)?
                .build()
                .await
            else {
                continue;
            };
            let Ok(ssid_bytes) = ap.ssid().await else {
                continue;
            };
            let ssid = decode_ssid_lossy(&ssid_bytes);
            if ssid.is_empty() {
                continue;
            }

            let strength = ap.strength().await.unwrap_or(0);
            let frequency = ap.frequency().await.unwrap_or(0);
            let flags = ap.flags().await.unwrap_or(0);
            let wpa = ap.wpa_flags().await.unwrap_or(0);
            let rsn = ap.rsn_flags().await.unwrap_or(0);
            let secured = !(wpa == 0 && rsn == 0 && flags == 0);

            records.push(
                NetworkRecord::new(ssid, i64::from(strength), frequency).secured(secured),
            );
        }
    }

    Ok(records)
}

/// SSID of the currently active Wi-Fi connection, if any.
///
/// Walks the active connections for a wireless one, resolves its access
/// point SSID, and falls back to the profile id when the specific object
/// is unset.
pub(crate) async fn current_ssid(conn: &Connection) -> Option<String> {
    let nm = try_log!(NMProxy::new(conn).await, "NM proxy");
    let active = try_log!(nm.active_connections().await, "active connections");

    for path in active {
        let Ok(ac) = NMActiveConnectionProxy::builder(conn)
            .path(path)
            .ok()?
            .build()
            .await
        else {
            continue;
        };
        let Ok(ctype) = ac.connection_type().await else {
            continue;
        };
        if !ctype.contains("wireless") {
            continue;
        }

        if let Ok(ap_path) = ac.specific_object().await
            && ap_path.as_str() != "/"
            && let Ok(ap) = NMAccessPointProxy::builder(conn)
                .path(ap_path)
                .ok()?
                .build()
                .await
            && let Ok(bytes) = ap.ssid().await
        {
            let ssid = decode_ssid_lossy(&bytes);
            if !ssid.is_empty() {
                return Some(ssid);
            }
        }

        if let Ok(id) = ac.id().await
            && !id.is_empty()
        {
            return Some(id);
        }
    }

    None
}

/// Connects to a network, creating a profile on the fly.
///
/// Prefers `AddAndActivateConnection` with a freshly built profile; if
/// that is rejected and a saved profile for the SSID exists, activates
/// the saved one instead. After the grace period the current connection
/// is re-checked, and the result reports whether we actually ended up on
/// the requested network.
pub(crate) async fn connect_network(
    conn: &Connection,
    ssid: &str,
    password: Option<&str>,
    grace: Duration,
) -> Result<bool> {
    debug!("connecting to '{ssid}' (secured: {})", password.is_some());

    let nm = NMProxy::new(conn).await?;
    let device = find_wifi_device(conn, &nm).await?;
    let ap = find_access_point(conn, &device, ssid)
        .await
        .unwrap_or_else(|| OwnedObjectPath::from(zvariant::ObjectPath::from_static_str_unchecked("/")));

    let settings = build_wifi_profile(ssid, password);

    match nm
        .add_and_activate_connection(settings, device.clone(), ap.clone())
        .await
    {
        Ok(_) => {}
        Err(e) => {
            warn!("add_and_activate failed for '{ssid}': {e}");
            let saved = saved_profile_path(conn, ssid).await?;
            match saved {
                Some(saved_path) => {
                    debug!("activating saved profile instead");
                    nm.activate_connection(saved_path, device, ap).await?;
                }
                None => return Err(e.into()),
            }
        }
    }

    Delay::new(grace).await;

    Ok(current_ssid(conn).await.as_deref() == Some(ssid))
}

/// Deactivates every active wireless connection. Returns whether any
/// connection was deactivated.
pub(crate) async fn disconnect_all(conn: &Connection) -> Result<bool> {
    let nm = NMProxy::new(conn).await?;
    let mut any = false;

    for path in nm.active_connections().await? {
        let Ok(ac) = NMActiveConnectionProxy::builder(conn)
            .path(path.clone())?
            .build()
            .await
        else {
            continue;
        };
        if ac.connection_type().await.unwrap_or_default().contains("wireless") {
            nm.deactivate_connection(path).await?;
            any = true;
        }
    }

    Ok(any)
}

/// SSIDs of all saved wireless profiles.
pub(crate) async fn saved_profile_ssids(conn: &Connection) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for (_, settings) in saved_wireless_profiles(conn).await? {
        if let Some(ssid) = profile_ssid(&settings)
            && !out.contains(&ssid)
        {
            out.push(ssid);
        }
    }
    Ok(out)
}

/// Path of the saved profile for an SSID, if one exists.
pub(crate) async fn saved_profile_path(
    conn: &Connection,
    ssid: &str,
) -> Result<Option<OwnedObjectPath>> {
    for (path, settings) in saved_wireless_profiles(conn).await? {
        if profile_ssid(&settings).as_deref() == Some(ssid) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Deletes every saved profile matching the SSID. Returns whether at
/// least one profile was deleted.
pub(crate) async fn forget_profiles(conn: &Connection, ssid: &str) -> Result<bool> {
    let mut deleted = false;

    for (path, settings) in saved_wireless_profiles(conn).await? {
        if profile_ssid(&settings).as_deref() != Some(ssid) {
            continue;
        }
        let cproxy: zbus::Proxy<'_> = zbus::proxy::Builder::new(conn)
            .destination(NM_SERVICE)?
            .path(path.clone())?
            .interface(SETTINGS_CONN_IFACE)?
            .build()
            .await?;
        match cproxy.call_method("Delete", &()).await {
            Ok(_) => {
                debug!("deleted profile {}", path.as_str());
                deleted = true;
            }
            Err(e) => warn!("could not delete profile {}: {e}", path.as_str()),
        }
    }

    Ok(deleted)
}

/// Enumerates saved profiles through the Settings interface, keeping the
/// wireless ones along with their parsed settings dictionaries.
async fn saved_wireless_profiles(
    conn: &Connection,
) -> Result<Vec<(OwnedObjectPath, ProfileSettings)>> {
    let settings: zbus::Proxy<'_> = zbus::proxy::Builder::new(conn)
        .destination(NM_SERVICE)?
        .path(SETTINGS_PATH)?
        .interface(SETTINGS_IFACE)?
        .build()
        .await?;

    let list_reply = settings.call_method("ListConnections", &()).await?;
    let paths: Vec<OwnedObjectPath> = list_reply.body().deserialize()?;

    let mut out = Vec::new();
    for path in paths {
        let cproxy: zbus::Proxy<'_> = zbus::proxy::Builder::new(conn)
            .destination(NM_SERVICE)?
            .path(path.clone())?
            .interface(SETTINGS_CONN_IFACE)?
            .build()
            .await?;

        let Ok(msg) = cproxy.call_method("GetSettings", &()).await else {
            continue;
        };
        let body = msg.body();
        let Ok(map) = body.deserialize::<ProfileSettings>() else {
            continue;
        };

        let is_wireless = map
            .get("connection")
            .and_then(|c| c.get("type"))
            .and_then(|v| <&str>::try_from(&**v).ok())
            .is_some_and(|t| t == "802-11-wireless");
        if is_wireless {
            out.push((path, map));
        }
    }

    Ok(out)
}

/// SSID recorded in a profile: the wireless section's ssid bytes, or the
/// connection id as fallback.
fn profile_ssid(settings: &ProfileSettings) -> Option<String> {
    if let Some(wifi_sec) = settings.get("802-11-wireless")
        && let Some(value) = wifi_sec.get("ssid")
        && let Ok(bytes) = <Vec<u8>>::try_from((**value).try_clone().ok()?)
    {
        let ssid = decode_ssid_lossy(&bytes);
        if !ssid.is_empty() {
            return Some(ssid);
        }
    }

    settings
        .get("connection")
        .and_then(|c| c.get("id"))
        .and_then(|v| <&str>::try_from(&**v).ok())
        .map(str::to_string)
}

/// Searches the visible access points of a device for an SSID.
async fn find_access_point(
    conn: &Connection,
    device: &OwnedObjectPath,
    target: &str,
) -> Option<OwnedObjectPath> {
    let wifi = NMWirelessProxy::builder(conn)
        .path(device.clone())
        .ok()?
        .build()
        .await
        .ok()?;

    for ap_path in wifi.get_all_access_points().await.ok()? {
        let ap = NMAccessPointProxy::builder(conn)
            .path(ap_path.clone())
            .ok()?
            .build()
            .await
            .ok()?;
        if let Ok(bytes) = ap.ssid().await
            && decode_ssid_lossy(&bytes) == target
        {
            return Some(ap_path);
        }
    }

    None
}

/// Builds the settings dictionary for `AddAndActivateConnection`.
///
/// Infrastructure-mode profile with automatic IPv4 and IPv6 left alone;
/// a WPA-PSK security section is attached when a password is supplied.
pub(crate) fn build_wifi_profile(
    ssid: &str,
    password: Option<&str>,
) -> HashMap<&'static str, HashMap<&'static str, Value<'static>>> {
    let mut settings = HashMap::new();

    let mut connection = HashMap::new();
    connection.insert("id", Value::from(ssid.to_string()));
    connection.insert("type", Value::from("802-11-wireless"));
    connection.insert("uuid", Value::from(Uuid::new_v4().to_string()));
    settings.insert("connection", connection);

    let mut wireless = HashMap::new();
    wireless.insert("ssid", Value::from(ssid.as_bytes().to_vec()));
    wireless.insert("mode", Value::from("infrastructure"));
    settings.insert("802-11-wireless", wireless);

    if let Some(psk) = password {
        let mut security = HashMap::new();
        security.insert("key-mgmt", Value::from("wpa-psk"));
        security.insert("psk", Value::from(psk.to_string()));
        settings.insert("802-11-wireless-security", security);
    }

    let mut ipv4 = HashMap::new();
    ipv4.insert("method", Value::from("auto"));
    settings.insert("ipv4", ipv4);

    let mut ipv6 = HashMap::new();
    ipv6.insert("method", Value::from("ignore"));
    settings.insert("ipv6", ipv6);

    settings
}
