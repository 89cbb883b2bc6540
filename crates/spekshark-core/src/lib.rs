//! SpekShark core library for post-mortem Spektrum serial telemetry analysis.
//!
//! This crate implements the offline analysis pipeline used by the CLI:
//! frame sources feed the analysis layer, which drives the DSM packet
//! decoder (layout/reader/parser) and collects the decoded records into a
//! deterministic report. Decoding is byte-oriented and side-effect free;
//! all I/O is isolated in `source` modules and the calibration file
//! loader. Protocol bit layouts are captured in `protocols::dsm::layout`
//! so the parser stays minimal and consistent with the receiver
//! datasheet.
//!
//! Invariants:
//! - Report record order is deterministic: header records first, then the
//!   seven channel slots in transmission order, packet by packet.
//! - Packet framing is reconstructed statefully from inter-frame timing;
//!   a gap above 2 ms flushes the pending buffer as `err` records.
//! - Calibration tables are immutable after construction and a missing
//!   entry is an expected state, not an error.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use spekshark_core::{ProtocolVariant, ReceiverType, SessionOptions, analyze_csv_file};
//!
//! let options = SessionOptions {
//!     receiver_type: ReceiverType::Internal,
//!     fallback_protocol: ProtocolVariant::Dsm2At22ms,
//!     calibration: None,
//! };
//! let report = analyze_csv_file(Path::new("capture.csv"), &options)?;
//! println!("report version: {}", report.report_version);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod calibration;
mod protocols;
mod source;

pub use analysis::{
    AnalysisError, FrameAggregator, SessionOptions, analyze_csv_file, analyze_source,
};
pub use calibration::{CalibrationEntry, CalibrationTable};
pub use protocols::dsm::{
    DsmError, ProtocolVariant, ReceiverType, Resolution, channel_name, decode_packet,
};
pub use source::{ByteFrame, CsvFileSource, FrameSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Start/end timestamp pair (seconds into the capture) carried by every
/// decoded record.
///
/// # Examples
/// ```
/// use spekshark_core::RecordSpan;
///
/// let span = RecordSpan { start: 0.010, end: 0.01008 };
/// assert!(span.end > span.start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordSpan {
    /// Start time of the first frame covered by the record.
    pub start: f64,
    /// End time of the last frame covered by the record.
    pub end: f64,
}

/// One decoded output record, tagged by kind.
///
/// Channel readings come in two kinds: `channel_base` when no calibrated
/// percentage is available and `channel_extended` when one is. Resync
/// losses surface as bare `err` records spanning each discarded frame.
///
/// # Examples
/// ```
/// use spekshark_core::{OutputRecord, RecordSpan};
///
/// let record = OutputRecord::Fades {
///     span: RecordSpan { start: 0.0, end: 0.00008 },
///     fades: 5,
/// };
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["kind"], "fades");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputRecord {
    /// Receiver fade counter from the packet header.
    Fades {
        span: RecordSpan,
        /// 8-bit count for internal receivers, 16-bit for external ones.
        fades: u16,
    },
    /// System byte interpretation (internal receivers only).
    System {
        span: RecordSpan,
        /// Protocol identity decoded from the system byte, if recognized.
        protocol: Option<ProtocolVariant>,
        /// Whether the decoded identity equals the configured fallback.
        matches_configured: bool,
    },
    /// Channel reading without a calibrated percentage.
    ChannelBase {
        span: RecordSpan,
        /// Slot position within the packet (0..=6), transmission order.
        slot: u8,
        channel_id: u8,
        /// Resolved channel name, or the placeholder for unknown ids.
        name: String,
        position: u16,
        /// Phase bit; present for 2048-resolution protocols only.
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<u8>,
    },
    /// Channel reading with a calibrated percentage.
    ChannelExtended {
        span: RecordSpan,
        slot: u8,
        channel_id: u8,
        name: String,
        position: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<u8>,
        /// Calibrated position, rounded to two decimal places.
        percent: f64,
    },
    /// Frame discarded during packet resynchronization.
    Err { span: RecordSpan },
}

impl OutputRecord {
    /// Span covered by this record.
    pub fn span(&self) -> RecordSpan {
        match self {
            OutputRecord::Fades { span, .. }
            | OutputRecord::System { span, .. }
            | OutputRecord::ChannelBase { span, .. }
            | OutputRecord::ChannelExtended { span, .. }
            | OutputRecord::Err { span } => *span,
        }
    }
}

/// Aggregated analysis report with deterministic record ordering.
///
/// # Examples
/// ```
/// use spekshark_core::{ProtocolVariant, ReceiverType, SessionOptions, make_stub_report};
///
/// let options = SessionOptions {
///     receiver_type: ReceiverType::Internal,
///     fallback_protocol: ProtocolVariant::Dsm2At22ms,
///     calibration: None,
/// };
/// let report = make_stub_report("capture.csv", 123, &options);
/// assert_eq!(report.report_version, spekshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,
    /// Session configuration the records were decoded under.
    pub session: SessionInfo,

    /// Optional capture summary (absent until a stream was consumed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Decoded records in emission order.
    pub records: Vec<OutputRecord>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "spekshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Echo of the session configuration used for decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Configured receiver wiring (internal or external/remote).
    pub receiver_type: ReceiverType,
    /// Protocol used when no identity can be decoded in-band.
    pub fallback_protocol: ProtocolVariant,
    /// Number of channels with a calibration entry (0 when none loaded).
    pub calibrated_channels: usize,
}

/// Basic capture summary (timestamps may be absent for empty captures).
///
/// # Examples
/// ```
/// use spekshark_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     frames_total: 16,
///     packets_total: 1,
///     err_frames: 0,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total byte-frame count observed in the capture.
    pub frames_total: u64,
    /// Number of complete 16-frame packets decoded.
    pub packets_total: u64,
    /// Number of frames flushed as `err` records during resync.
    pub err_frames: u64,
    /// RFC3339 timestamp of the first frame (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last frame (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Build a stub report with base fields filled and no records.
///
/// # Examples
/// ```
/// use spekshark_core::{ProtocolVariant, ReceiverType, SessionOptions, make_stub_report};
///
/// let options = SessionOptions {
///     receiver_type: ReceiverType::External,
///     fallback_protocol: ProtocolVariant::DsmxAt11ms,
///     calibration: None,
/// };
/// let report = make_stub_report("capture.csv", 64, &options);
/// assert!(report.records.is_empty());
/// assert_eq!(report.session.calibrated_channels, 0);
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64, options: &SessionOptions) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "spekshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        session: SessionInfo {
            receiver_type: options.receiver_type,
            fallback_protocol: options.fallback_protocol,
            calibrated_channels: options
                .calibration
                .as_ref()
                .map(|table| table.len())
                .unwrap_or(0),
        },
        capture_summary: None,
        records: vec![],
    }
}
