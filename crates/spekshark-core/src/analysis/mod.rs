use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::calibration::CalibrationTable;
use crate::protocols::dsm::{DsmError, ProtocolVariant, ReceiverType};
use crate::source::{ByteFrame, CsvFileSource, FrameSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, OutputRecord, Report, make_stub_report};

mod aggregator;

pub use aggregator::FrameAggregator;

/// Configuration one decoding session runs under.
///
/// The calibration table is optional; without one every channel reading
/// is emitted as a base record.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub receiver_type: ReceiverType,
    pub fallback_protocol: ProtocolVariant,
    pub calibration: Option<CalibrationTable>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Decode error: {0}")]
    Decode(#[from] DsmError),
}

/// Analyze a CSV capture export on disk.
pub fn analyze_csv_file(path: &Path, options: &SessionOptions) -> Result<Report, AnalysisError> {
    let source = CsvFileSource::open(path)?;
    analyze_source(path, source, options)
}

/// Run one decoding session over an arbitrary frame source.
///
/// Records are appended in emission order: packet N is fully emitted (or
/// flushed as `err` records) before packet N+1 accumulates.
pub fn analyze_source<S: FrameSource>(
    path: &Path,
    mut source: S,
    options: &SessionOptions,
) -> Result<Report, AnalysisError> {
    let input_bytes = path.metadata().map(|meta| meta.len()).unwrap_or(0);
    let mut report = make_stub_report(&path.display().to_string(), input_bytes, options);

    let mut aggregator = FrameAggregator::new(options.clone());
    let mut frames_total = 0u64;
    let mut packets_total = 0u64;
    let mut err_frames = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut records = Vec::new();

    while let Some(frame) = source.next_frame()? {
        frames_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, &frame);

        let emitted = aggregator.ingest(frame)?;
        for record in &emitted {
            match record {
                // Every decoded packet carries exactly one fades record.
                OutputRecord::Fades { .. } => packets_total += 1,
                OutputRecord::Err { .. } => err_frames += 1,
                _ => {}
            }
        }
        records.extend(emitted);
    }

    report.capture_summary = Some(CaptureSummary {
        frames_total,
        packets_total,
        err_frames,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.records = records;
    Ok(report)
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, frame: &ByteFrame) {
    if first.is_none_or(|existing| frame.start < existing) {
        *first = Some(frame.start);
    }
    if last.is_none_or(|existing| frame.end > existing) {
        *last = Some(frame.end);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use super::{ts_to_rfc3339, update_ts_bounds};
    use crate::source::ByteFrame;

    #[test]
    fn ts_bounds_track_min_start_and_max_end() {
        let mut first = None;
        let mut last = None;
        let frame = ByteFrame {
            byte: 0,
            start: 1.0,
            end: 1.1,
        };
        update_ts_bounds(&mut first, &mut last, &frame);
        assert_eq!(first, Some(1.0));
        assert_eq!(last, Some(1.1));

        let later = ByteFrame {
            byte: 0,
            start: 2.0,
            end: 2.1,
        };
        update_ts_bounds(&mut first, &mut last, &later);
        assert_eq!(first, Some(1.0));
        assert_eq!(last, Some(2.1));
    }

    #[test]
    fn ts_to_rfc3339_renders_seconds() {
        assert_eq!(ts_to_rfc3339(None), None);
        let rendered = ts_to_rfc3339(Some(1.5)).unwrap();
        assert!(rendered.starts_with("1970-01-01T00:00:01.5"));
    }
}
