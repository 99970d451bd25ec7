//! Small conversion helpers shared by parsers and bus operations.

use crate::constants::frequency;

/// Decode SSID bytes permissively: invalid UTF-8 sequences are replaced
/// rather than rejected, since access points may advertise arbitrary bytes.
pub(crate) fn decode_ssid_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Converts a Wi-Fi channel number to a center frequency in MHz.
///
/// Channels 1-13 map into the 2.4GHz band, channel 14 is the Japanese
/// special case, and anything higher is treated as a 5GHz channel.
pub(crate) fn freq_from_channel(channel: u32) -> u32 {
    match channel {
        1..=13 => frequency::BAND_2_4_START + (channel - 1) * frequency::CHANNEL_SPACING,
        14 => frequency::BAND_2_4_CH14,
        _ => frequency::BAND_5_START + channel * frequency::CHANNEL_SPACING,
    }
}

/// Macro to convert Result to Option with error logging.
/// Usage: `try_log!(result, "context message")`
#[macro_export]
macro_rules! try_log {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {:?}", $context, e);
                return None;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_utf8() {
        assert_eq!(decode_ssid_lossy(b"MyNetwork"), "MyNetwork");
        assert_eq!(decode_ssid_lossy("café".as_bytes()), "café");
        assert_eq!(decode_ssid_lossy(b""), "");
    }

    #[test]
    fn decode_invalid_utf8_is_replaced_not_dropped() {
        let decoded = decode_ssid_lossy(&[0x4e, 0x65, 0x74, 0xff]);
        assert!(decoded.starts_with("Net"));
        assert_eq!(decoded.chars().count(), 4);
    }

    #[test]
    fn freq_from_channel_2_4ghz() {
        assert_eq!(freq_from_channel(1), 2412);
        assert_eq!(freq_from_channel(6), 2437);
        assert_eq!(freq_from_channel(13), 2472);
        assert_eq!(freq_from_channel(14), 2484);
    }

    #[test]
    fn freq_from_channel_5ghz() {
        assert_eq!(freq_from_channel(36), 5180);
        assert_eq!(freq_from_channel(149), 5745);
    }
}
