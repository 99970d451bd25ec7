//! Pure text parsers for the platform Wi-Fi listing tools.
//!
//! One stateless function per tool format. Parsers never fail: output
//! that cannot be understood simply yields fewer (or zero) records, and
//! the calling adapter treats an empty result as "fall through to the
//! next tool". Raw records may contain duplicate SSIDs; dedup happens
//! later in the orchestrator.

use std::collections::HashSet;

use crate::constants::{defaults, frequency};
use crate::models::{Band, NetworkRecord};
use crate::utils::freq_from_channel;

/// Parses `nmcli -t -f SSID,SIGNAL,SECURITY,ACTIVE device wifi list`.
///
/// One network per line, colon-delimited: `SSID:SIGNAL:SECURITY[:ACTIVE]`.
/// Rows with an empty or `--` SSID are placeholders and dropped. A signal
/// field that fails to parse falls back to 50 rather than dropping the row.
pub(crate) fn parse_nmcli(output: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 3 {
            continue;
        }

        let ssid = fields[0].trim();
        if ssid.is_empty() || ssid == "--" {
            continue;
        }

        let strength = fields[1]
            .trim()
            .parse::<i64>()
            .unwrap_or(defaults::UNPARSED_SIGNAL);
        let security = fields[2].trim();
        let secured = !security.is_empty() && security != "--";
        let connected = fields.get(3).is_some_and(|f| f.trim() == "yes");

        records.push(
            NetworkRecord::new(ssid, strength, frequency::REPRESENTATIVE_2_4)
                .secured(secured)
                .connected(connected),
        );
    }

    records
}

/// Parses `iwlist scan` block output.
///
/// State machine over lines: an `ESSID:"…"` marker starts a record,
/// `Quality=a/b` computes a percentage, `Frequency:x GHz` sets the band,
/// and `Encryption key:on` marks the network secured. A record is flushed
/// when the next marker or end of input is reached.
pub(crate) fn parse_iwlist(output: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();
    let mut current: Option<NetworkRecord> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(rest) = line.split_once("ESSID:").map(|(_, r)| r) {
            if let Some(rec) = current.take()
                && !rec.ssid.is_empty()
            {
                records.push(rec);
            }
            let ssid = rest.trim().trim_matches('"');
            current = Some(NetworkRecord::new(
                ssid,
                0,
                frequency::REPRESENTATIVE_2_4,
            ));
            continue;
        }

        let Some(rec) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.split_once("Quality=").map(|(_, r)| r) {
            let ratio = rest.split_whitespace().next().unwrap_or("");
            if let Some((a, b)) = ratio.split_once('/')
                && let (Ok(a), Ok(b)) = (a.parse::<u32>(), b.parse::<u32>())
                && b > 0
            {
                // Integer rounding of 100 * a / b.
                let pct = (100 * a + b / 2) / b;
                rec.strength = pct.min(100) as u8;
            }
        } else if let Some(rest) = line.split_once("Frequency:").map(|(_, r)| r) {
            let ghz = rest.split_whitespace().next().unwrap_or("");
            if let Ok(ghz) = ghz.parse::<f64>() {
                rec.frequency_mhz = (ghz * 1000.0).round() as u32;
                rec.band = Band::from_mhz(rec.frequency_mhz);
            }
        } else if line.contains("Encryption key:on") {
            rec.secured = true;
        }
    }

    if let Some(rec) = current.take()
        && !rec.ssid.is_empty()
    {
        records.push(rec);
    }

    records
}

/// Parses `airport -s` signal-table output.
///
/// The first line is a column header and is discarded. Remaining lines are
/// whitespace-tokenized: token 0 is the SSID, token 2 a signal level in
/// dBm mapped to a percentage via `clamp(dbm + 100, 0, 100)`. Security is
/// inferred from `WPA`/`WEP` substrings; the channel token, when present,
/// resolves the band.
pub(crate) fn parse_airport(output: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();

    for line in output.lines().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }

        let ssid = tokens[0];
        let Ok(dbm) = tokens[2].parse::<i64>() else {
            continue;
        };
        let strength = (dbm + 100).clamp(0, 100);

        let freq = tokens
            .get(3)
            .and_then(|t| t.split(',').next())
            .and_then(|t| t.parse::<u32>().ok())
            .map(freq_from_channel)
            .unwrap_or(frequency::REPRESENTATIVE_2_4);

        let secured = line.contains("WPA") || line.contains("WEP");

        records.push(NetworkRecord::new(ssid, strength, freq).secured(secured));
    }

    records
}

/// Parses `netsh wlan show networks mode=bssid` profile blocks.
///
/// State machine keyed on line prefixes: an `SSID` line (never `BSSID`)
/// starts a record and flushes the previous one, deduplicating against
/// SSIDs already flushed. `Authentication` sets the secured flag,
/// `Signal` carries a trailing percentage, and a `Radio type` naming an
/// 802.11 a/ac/ax standard reclassifies the record as 5GHz. The returned
/// list is sorted by descending signal strength.
pub(crate) fn parse_netsh(output: &str) -> Vec<NetworkRecord> {
    let mut records: Vec<NetworkRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<NetworkRecord> = None;

    let mut flush = |rec: Option<NetworkRecord>, records: &mut Vec<NetworkRecord>| {
        if let Some(rec) = rec
            && !rec.ssid.is_empty()
            && seen.insert(rec.ssid.clone())
        {
            records.push(rec);
        }
    };

    for line in output.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key.starts_with("SSID") && !key.starts_with("BSSID") {
            flush(current.take(), &mut records);
            current = Some(NetworkRecord::new(
                value,
                0,
                frequency::REPRESENTATIVE_2_4,
            ));
            continue;
        }

        let Some(rec) = current.as_mut() else {
            continue;
        };

        if key == "Authentication" {
            rec.secured = !value.contains("Open");
        } else if key == "Signal" {
            if let Ok(pct) = value.trim_end_matches('%').parse::<i64>() {
                rec.strength = pct.clamp(0, 100) as u8;
            }
        } else if key == "Radio type" && value.contains("802.11a") {
            // Matches 802.11a, 802.11ac, and 802.11ax; b/g/n stay 2.4GHz.
            rec.frequency_mhz = frequency::REPRESENTATIVE_5;
            rec.band = Band::Band5GHz;
        }
    }

    flush(current.take(), &mut records);

    records.sort_by(|a, b| b.strength.cmp(&a.strength));
    records
}

/// Extracts the connected SSID from `netsh wlan show interfaces` output.
pub(crate) fn parse_netsh_interfaces(output: &str) -> Option<String> {
    for line in output.lines() {
        let line = line.trim();
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key == "SSID" && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// Extracts saved profile names from `netsh wlan show profiles` output.
pub(crate) fn parse_netsh_profiles(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once(':')?;
            if key.contains("Profile") && !value.trim().is_empty() {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Extracts the connected SSID from `networksetup -getairportnetwork`.
pub(crate) fn parse_airport_current(output: &str) -> Option<String> {
    let line = output.lines().next()?;
    if line.contains("not associated") {
        return None;
    }
    let (_, ssid) = line.split_once(':')?;
    let ssid = ssid.trim();
    if ssid.is_empty() {
        None
    } else {
        Some(ssid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- nmcli ---------------------------------------------------------------

    #[test]
    fn nmcli_drops_placeholder_rows() {
        let out = "NetA:80:WPA2:yes\nNetB:40::no\n--:10::no\n";
        let records = parse_nmcli(out);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].ssid, "NetA");
        assert_eq!(records[0].strength, 80);
        assert!(records[0].secured);
        assert!(records[0].connected);

        assert_eq!(records[1].ssid, "NetB");
        assert_eq!(records[1].strength, 40);
        assert!(!records[1].secured);
        assert!(!records[1].connected);
    }

    #[test]
    fn nmcli_unparseable_signal_defaults_to_fifty() {
        let records = parse_nmcli("NetC:abc:WPA1:no\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strength, 50);
    }

    #[test]
    fn nmcli_skips_short_rows_and_empty_ssids() {
        let records = parse_nmcli("onlyone\n:50:WPA2:no\nOk:60:WPA2\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Ok");
        assert!(!records[0].connected, "missing ACTIVE field means not connected");
    }

    #[test]
    fn nmcli_empty_output() {
        assert!(parse_nmcli("").is_empty());
    }

    // -- iwlist --------------------------------------------------------------

    const IWLIST_SAMPLE: &str = r#"wlan0     Scan completed :
          Cell 01 - Address: AA:BB:CC:DD:EE:01
                    ESSID:"HomeNet"
                    Frequency:2.437 GHz (Channel 6)
                    Quality=30/70  Signal level=-80 dBm
                    Encryption key:on
          Cell 02 - Address: AA:BB:CC:DD:EE:02
                    ESSID:"OpenCafe"
                    Frequency:5.18 GHz (Channel 36)
                    Quality=60/70  Signal level=-50 dBm
                    Encryption key:off
"#;

    #[test]
    fn iwlist_quality_ratio_rounds() {
        let records = parse_iwlist(IWLIST_SAMPLE);
        assert_eq!(records.len(), 2);
        // round(100 * 30 / 70) = 43
        assert_eq!(records[0].strength, 43);
        assert_eq!(records[1].strength, 86);
    }

    #[test]
    fn iwlist_encryption_and_band() {
        let records = parse_iwlist(IWLIST_SAMPLE);
        assert!(records[0].secured);
        assert_eq!(records[0].band, Band::Band2_4GHz);
        assert!(!records[1].secured);
        assert_eq!(records[1].band, Band::Band5GHz);
        assert_eq!(records[1].frequency_mhz, 5180);
    }

    #[test]
    fn iwlist_flushes_last_record_at_eof() {
        let out = "ESSID:\"Solo\"\nQuality=70/70\n";
        let records = parse_iwlist(out);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Solo");
        assert_eq!(records[0].strength, 100);
    }

    #[test]
    fn iwlist_skips_hidden_ssids() {
        let out = "ESSID:\"\"\nQuality=50/70\nESSID:\"Visible\"\n";
        let records = parse_iwlist(out);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Visible");
    }

    // -- airport -------------------------------------------------------------

    const AIRPORT_SAMPLE: &str = "\
                            SSID BSSID             RSSI CHANNEL HT CC SECURITY (auth/unicast/group)
                      CoffeeShop aa:bb:cc:dd:ee:01 -45  6       Y  US WPA2(PSK/AES/AES)
                         OpenNet aa:bb:cc:dd:ee:02 -70  36,+1   Y  US NONE
                          OldNet aa:bb:cc:dd:ee:03 -90  11      N  US WEP
";

    #[test]
    fn airport_converts_dbm_to_percent() {
        let records = parse_airport(AIRPORT_SAMPLE);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].strength, 55); // -45 + 100
        assert_eq!(records[1].strength, 30);
        assert_eq!(records[2].strength, 10);
    }

    #[test]
    fn airport_security_from_substrings() {
        let records = parse_airport(AIRPORT_SAMPLE);
        assert!(records[0].secured);
        assert!(!records[1].secured);
        assert!(records[2].secured, "WEP counts as secured");
    }

    #[test]
    fn airport_band_from_channel_token() {
        let records = parse_airport(AIRPORT_SAMPLE);
        assert_eq!(records[0].band, Band::Band2_4GHz);
        assert_eq!(records[1].band, Band::Band5GHz);
    }

    #[test]
    fn airport_header_only_is_empty() {
        let records = parse_airport("SSID BSSID RSSI CHANNEL\n");
        assert!(records.is_empty());
    }

    #[test]
    fn airport_clamps_extreme_dbm() {
        let out = "header\nLoud x 20 6 Y US NONE\nDead x -130 6 Y US NONE\n";
        let records = parse_airport(out);
        assert_eq!(records[0].strength, 100);
        assert_eq!(records[1].strength, 0);
    }

    // -- netsh ---------------------------------------------------------------

    const NETSH_SAMPLE: &str = "\
Interface name : Wi-Fi
There are 3 networks currently visible.

SSID 1 : HomeNet
    Network type            : Infrastructure
    Authentication          : WPA2-Personal
    Encryption              : CCMP
    BSSID 1                 : d8:32:14:b0:a0:3e
         Signal             : 62%
         Radio type         : 802.11n

SSID 2 : FastNet
    Network type            : Infrastructure
    Authentication          : WPA2-Personal
    Encryption              : CCMP
    Signal                  : 91%
    Radio type              : 802.11ac

SSID 3 : Lobby
    Network type            : Infrastructure
    Authentication          : Open
    Encryption              : None
    Signal                  : 40%
    Radio type              : 802.11g
";

    #[test]
    fn netsh_parses_blocks_and_sorts_by_strength() {
        let records = parse_netsh(NETSH_SAMPLE);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ssid, "FastNet");
        assert_eq!(records[0].strength, 91);
        assert_eq!(records[1].ssid, "HomeNet");
        assert_eq!(records[2].ssid, "Lobby");
    }

    #[test]
    fn netsh_authentication_open_means_unsecured() {
        let records = parse_netsh(NETSH_SAMPLE);
        let lobby = records.iter().find(|r| r.ssid == "Lobby").unwrap();
        assert!(!lobby.secured);
        let home = records.iter().find(|r| r.ssid == "HomeNet").unwrap();
        assert!(home.secured);
    }

    #[test]
    fn netsh_radio_type_reclassifies_band() {
        let records = parse_netsh(NETSH_SAMPLE);
        let fast = records.iter().find(|r| r.ssid == "FastNet").unwrap();
        assert_eq!(fast.band, Band::Band5GHz);
        assert_eq!(fast.frequency_mhz, 5180);
        let home = records.iter().find(|r| r.ssid == "HomeNet").unwrap();
        assert_eq!(home.band, Band::Band2_4GHz);
    }

    #[test]
    fn netsh_bssid_lines_do_not_start_records() {
        let records = parse_netsh(NETSH_SAMPLE);
        assert!(records.iter().all(|r| !r.ssid.contains("d8:32")));
    }

    #[test]
    fn netsh_duplicate_ssids_flush_once() {
        let out = "\
SSID 1 : Twin
    Authentication          : WPA2-Personal
    Signal                  : 80%
SSID 2 : Twin
    Authentication          : Open
    Signal                  : 20%
";
        let records = parse_netsh(out);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strength, 80, "first flushed record wins");
    }

    #[test]
    fn netsh_empty_and_garbage_output() {
        assert!(parse_netsh("").is_empty());
        assert!(parse_netsh("no networks are visible right now\n").is_empty());
    }

    #[test]
    fn netsh_interfaces_extracts_current_ssid() {
        let out = "\
There is 1 interface on the system:

    Name                   : Wi-Fi
    State                  : connected
    SSID                   : HomeNet
    BSSID                  : d8:32:14:b0:a0:3e
";
        assert_eq!(parse_netsh_interfaces(out), Some("HomeNet".to_string()));
    }

    #[test]
    fn netsh_interfaces_disconnected() {
        let out = "    Name  : Wi-Fi\n    State : disconnected\n";
        assert_eq!(parse_netsh_interfaces(out), None);
    }

    #[test]
    fn netsh_profiles_list() {
        let out = "\
Profiles on interface Wi-Fi:

User profiles
-------------
    All User Profile     : HomeNet
    All User Profile     : Work
";
        assert_eq!(parse_netsh_profiles(out), vec!["HomeNet", "Work"]);
    }

    // -- networksetup --------------------------------------------------------

    #[test]
    fn airport_current_connected() {
        let out = "Current Wi-Fi Network: CoffeeShop\n";
        assert_eq!(parse_airport_current(out), Some("CoffeeShop".to_string()));
    }

    #[test]
    fn airport_current_not_associated() {
        let out = "You are not associated with an AirPort network.\n";
        assert_eq!(parse_airport_current(out), None);
    }
}
