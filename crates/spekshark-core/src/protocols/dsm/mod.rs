//! Spektrum DSM serial telemetry protocol family.
//!
//! Four protocol variants exist on the wire, distinguished by modulation
//! (DSM2/DSMX) and frame rate; what matters for channel decoding is only
//! the resolution class (1024 or 2048 steps), which fully determines the
//! channel word bit layout.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::DsmError;
pub use parser::decode_packet;

/// Channel word resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Res1024,
    Res2048,
}

/// Closed set of DSM protocol variants.
///
/// The two DSMX variants and the 11 ms DSM2 variant share an identical
/// channel layout; they differ only in identity.
///
/// # Examples
/// ```
/// use spekshark_core::{ProtocolVariant, Resolution};
///
/// assert_eq!(ProtocolVariant::Dsm2At22ms.resolution(), Resolution::Res1024);
/// assert_eq!(ProtocolVariant::from_system_byte(0xA2), Some(ProtocolVariant::DsmxAt22ms));
/// assert_eq!(ProtocolVariant::from_system_byte(0xFF), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// DSM2, 22 ms frame rate, 1024-step resolution.
    #[serde(rename = "dsm2-22ms-1024")]
    Dsm2At22ms,
    /// DSM2, 11 ms frame rate, 2048-step resolution.
    #[serde(rename = "dsm2-11ms-2048")]
    Dsm2At11ms,
    /// DSMX, 22 ms frame rate, 2048-step resolution.
    #[serde(rename = "dsmx-22ms-2048")]
    DsmxAt22ms,
    /// DSMX, 11 ms frame rate, 2048-step resolution.
    #[serde(rename = "dsmx-11ms-2048")]
    DsmxAt11ms,
}

impl ProtocolVariant {
    /// Resolution class, which selects the channel word bit layout.
    pub fn resolution(self) -> Resolution {
        match self {
            ProtocolVariant::Dsm2At22ms => Resolution::Res1024,
            ProtocolVariant::Dsm2At11ms
            | ProtocolVariant::DsmxAt22ms
            | ProtocolVariant::DsmxAt11ms => Resolution::Res2048,
        }
    }

    /// Look up the protocol identity an internal receiver reports in its
    /// system byte. Unrecognized values yield `None`.
    pub fn from_system_byte(byte: u8) -> Option<Self> {
        match byte {
            layout::SYSTEM_DSM2_1024 => Some(ProtocolVariant::Dsm2At22ms),
            layout::SYSTEM_DSM2_2048 => Some(ProtocolVariant::Dsm2At11ms),
            layout::SYSTEM_DSMX_22MS => Some(ProtocolVariant::DsmxAt22ms),
            layout::SYSTEM_DSMX_11MS => Some(ProtocolVariant::DsmxAt11ms),
            _ => None,
        }
    }

    /// Human-readable label matching the receiver documentation.
    pub fn label(self) -> &'static str {
        match self {
            ProtocolVariant::Dsm2At22ms => "DSM2 22ms 1024",
            ProtocolVariant::Dsm2At11ms => "DSM2 11ms 2048",
            ProtocolVariant::DsmxAt22ms => "DSMX 22ms 2048",
            ProtocolVariant::DsmxAt11ms => "DSMX 11ms 2048",
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the analyzed receiver is wired.
///
/// Internal receivers report fades in one byte plus a system byte;
/// external (remote) receivers report a 16-bit fades count and no
/// in-band protocol identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverType {
    Internal,
    External,
}

/// Resolve a channel id against the fixed 12-name table.
///
/// # Examples
/// ```
/// use spekshark_core::channel_name;
///
/// assert_eq!(channel_name(0), "Throttle");
/// assert_eq!(channel_name(11), "Aux 7");
/// assert_eq!(channel_name(15), "NOT_IDENTIFIED");
/// ```
pub fn channel_name(id: u8) -> &'static str {
    layout::CHANNEL_NAMES
        .get(usize::from(id))
        .copied()
        .unwrap_or(layout::UNKNOWN_CHANNEL_NAME)
}
