//! Dedup and ranking of raw scan records.
//!
//! A single scan often sights the same network several times (one record
//! per access point). This module reduces that raw list to one record per
//! SSID and orders the result deterministically. Both stages are pure;
//! they are re-run from scratch on every scan.

use std::collections::HashMap;

use crate::models::NetworkRecord;

/// Collapses duplicate SSID sightings and ranks the result.
///
/// Within an SSID group exactly one record survives: the one with the
/// highest strength, first-seen winning ties. The `connected` flag is
/// re-derived from `current`, so at most one record carries it. Ordering:
/// the connected network first if present, then descending strength;
/// equal strengths keep their first-seen relative order.
pub(crate) fn dedup_and_rank(raw: Vec<NetworkRecord>, current: Option<&str>) -> Vec<NetworkRecord> {
    let mut out: Vec<NetworkRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for rec in raw {
        match index.get(&rec.ssid) {
            Some(&i) => {
                if rec.strength > out[i].strength {
                    out[i] = rec;
                }
            }
            None => {
                index.insert(rec.ssid.clone(), out.len());
                out.push(rec);
            }
        }
    }

    for rec in &mut out {
        rec.connected = current == Some(rec.ssid.as_str());
    }

    // Stable sort keeps first-seen order within equal keys.
    out.sort_by(|a, b| {
        b.connected
            .cmp(&a.connected)
            .then(b.strength.cmp(&a.strength))
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ssid: &str, strength: i64) -> NetworkRecord {
        NetworkRecord::new(ssid, strength, 2412)
    }

    #[test]
    fn no_two_records_share_an_ssid() {
        let raw = vec![rec("A", 10), rec("B", 20), rec("A", 30), rec("B", 5)];
        let out = dedup_and_rank(raw, None);
        assert_eq!(out.len(), 2);
        let mut ssids: Vec<_> = out.iter().map(|r| r.ssid.as_str()).collect();
        ssids.sort_unstable();
        assert_eq!(ssids, vec!["A", "B"]);
    }

    #[test]
    fn retained_record_has_max_strength() {
        let raw = vec![rec("Mesh", 42), rec("Mesh", 88), rec("Mesh", 61)];
        let out = dedup_and_rank(raw, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].strength, 88);
    }

    #[test]
    fn ties_keep_first_seen() {
        let first = rec("Net", 50).secured(true);
        let second = rec("Net", 50).secured(false);
        let out = dedup_and_rank(vec![first, second], None);
        assert_eq!(out.len(), 1);
        assert!(out[0].secured, "first-seen record should win the tie");
    }

    #[test]
    fn connected_network_ranks_first() {
        let raw = vec![rec("Strong", 95), rec("Home", 40), rec("Weak", 10)];
        let out = dedup_and_rank(raw, Some("Home"));
        assert_eq!(out[0].ssid, "Home");
        assert!(out[0].connected);
        assert!(out[1..].iter().all(|r| !r.connected));
        assert_eq!(out[1].ssid, "Strong");
        assert_eq!(out[2].ssid, "Weak");
    }

    #[test]
    fn others_sorted_by_descending_strength() {
        let raw = vec![rec("a", 10), rec("b", 90), rec("c", 50)];
        let out = dedup_and_rank(raw, None);
        let strengths: Vec<_> = out.iter().map(|r| r.strength).collect();
        assert_eq!(strengths, vec![90, 50, 10]);
    }

    #[test]
    fn stale_connected_flags_are_cleared() {
        let raw = vec![rec("Old", 70).connected(true), rec("New", 30)];
        let out = dedup_and_rank(raw, Some("New"));
        let old = out.iter().find(|r| r.ssid == "Old").unwrap();
        let new = out.iter().find(|r| r.ssid == "New").unwrap();
        assert!(!old.connected);
        assert!(new.connected);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(dedup_and_rank(Vec::new(), Some("X")).is_empty());
    }
}
