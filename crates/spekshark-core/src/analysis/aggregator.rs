use crate::protocols::dsm::{DsmError, decode_packet, layout};
use crate::source::ByteFrame;
use crate::{OutputRecord, RecordSpan};

use super::SessionOptions;

/// Stateful packet framer for one analysis session.
///
/// The aggregator owns all mutable session state (pending buffer and the
/// running end-of-frame clock); one instance must not be shared across
/// independent sessions. Frames are consumed one at a time in timestamp
/// order, and the inter-frame gap is the only framing signal: a gap above
/// [`layout::MAX_FRAME_GAP_S`] means the stream was joined mid-packet, so
/// everything pending is flushed as `err` records and framing restarts at
/// the current frame.
pub struct FrameAggregator {
    options: SessionOptions,
    last_end_time: Option<f64>,
    pending: Vec<ByteFrame>,
}

impl FrameAggregator {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            last_end_time: None,
            pending: Vec::with_capacity(layout::PACKET_FRAMES),
        }
    }

    /// Consume one byte-frame; returns the records it completed, if any.
    ///
    /// Empty for the first 15 frames of a healthy packet; one full
    /// packet's records on the 16th; one `err` record per flushed frame
    /// after a framing loss.
    pub fn ingest(&mut self, frame: ByteFrame) -> Result<Vec<OutputRecord>, DsmError> {
        let gap = self.advance_clock(&frame);

        if gap > layout::MAX_FRAME_GAP_S {
            let errors = self
                .pending
                .drain(..)
                .map(|pending| OutputRecord::Err {
                    span: RecordSpan {
                        start: pending.start,
                        end: pending.end,
                    },
                })
                .collect();
            // The triggering frame opens the next candidate packet.
            self.pending.push(frame);
            return Ok(errors);
        }

        self.pending.push(frame);
        if self.pending.len() == layout::PACKET_FRAMES {
            let frames = std::mem::take(&mut self.pending);
            return decode_packet(
                &frames,
                self.options.receiver_type,
                self.options.fallback_protocol,
                self.options.calibration.as_ref(),
            );
        }
        Ok(Vec::new())
    }

    /// Number of frames buffered for the packet in flight.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Gap since the previous frame's end; zero by convention on the
    /// first frame of a session. The clock must advance before the
    /// framing decision so the next gap measures against this frame.
    fn advance_clock(&mut self, frame: &ByteFrame) -> f64 {
        let last = self.last_end_time.unwrap_or(frame.start);
        self.last_end_time = Some(frame.end);
        frame.start - last
    }
}

#[cfg(test)]
mod tests {
    use super::FrameAggregator;
    use crate::analysis::SessionOptions;
    use crate::protocols::dsm::{ProtocolVariant, ReceiverType};
    use crate::source::ByteFrame;
    use crate::OutputRecord;

    const PITCH: f64 = 0.0001;
    const BYTE_TIME: f64 = 0.00008;

    fn options() -> SessionOptions {
        SessionOptions {
            receiver_type: ReceiverType::Internal,
            fallback_protocol: ProtocolVariant::Dsm2At22ms,
            calibration: None,
        }
    }

    fn frames_at(t0: f64, bytes: &[u8]) -> Vec<ByteFrame> {
        bytes
            .iter()
            .enumerate()
            .map(|(i, &byte)| ByteFrame {
                byte,
                start: t0 + i as f64 * PITCH,
                end: t0 + i as f64 * PITCH + BYTE_TIME,
            })
            .collect()
    }

    fn internal_packet() -> Vec<u8> {
        let mut bytes = vec![5, 0x01];
        for slot in 0..7u16 {
            bytes.extend_from_slice(&((slot << 10) | (100 * slot + 50)).to_be_bytes());
        }
        bytes
    }

    #[test]
    fn sixteen_contiguous_frames_yield_one_packet() {
        let mut agg = FrameAggregator::new(options());
        let mut records = Vec::new();
        for frame in frames_at(0.01, &internal_packet()) {
            records.extend(agg.ingest(frame).unwrap());
        }

        assert_eq!(records.len(), 9);
        assert!(matches!(records[0], OutputRecord::Fades { fades: 5, .. }));
        assert!(
            !records
                .iter()
                .any(|record| matches!(record, OutputRecord::Err { .. }))
        );
        assert_eq!(agg.pending_len(), 0);
    }

    #[test]
    fn gap_flushes_pending_frames_as_errors() {
        let mut agg = FrameAggregator::new(options());
        let stray = frames_at(0.001, &[0xFF, 0x00, 0x12, 0x34, 0x56]);
        for frame in &stray {
            assert!(agg.ingest(*frame).unwrap().is_empty());
        }
        assert_eq!(agg.pending_len(), 5);

        // 10 ms later: framing was lost; all five become err records.
        let packet = frames_at(0.011, &internal_packet());
        let flushed = agg.ingest(packet[0]).unwrap();
        assert_eq!(flushed.len(), 5);
        for (record, frame) in flushed.iter().zip(&stray) {
            match record {
                OutputRecord::Err { span } => {
                    assert!((span.start - frame.start).abs() < 1e-12);
                    assert!((span.end - frame.end).abs() < 1e-12);
                }
                other => panic!("expected err record, got {other:?}"),
            }
        }
        // The triggering frame was kept, not discarded.
        assert_eq!(agg.pending_len(), 1);

        // The remaining 15 frames complete the packet.
        let mut records = Vec::new();
        for frame in &packet[1..] {
            records.extend(agg.ingest(*frame).unwrap());
        }
        assert_eq!(records.len(), 9);
    }

    #[test]
    fn gap_with_empty_buffer_emits_nothing() {
        let mut agg = FrameAggregator::new(options());
        let first = frames_at(0.01, &internal_packet());
        for frame in first {
            agg.ingest(frame).unwrap();
        }
        // Next packet starts 22 ms later; nothing is pending, so the
        // large gap produces zero err records.
        let second = frames_at(0.032, &internal_packet());
        let mut records = Vec::new();
        for frame in second {
            records.extend(agg.ingest(frame).unwrap());
        }
        assert_eq!(records.len(), 9);
        assert!(
            !records
                .iter()
                .any(|record| matches!(record, OutputRecord::Err { .. }))
        );
    }

    #[test]
    fn first_frame_gap_is_zero_by_convention() {
        let mut agg = FrameAggregator::new(options());
        // A session starting at an arbitrary large timestamp must not
        // trigger a flush on its first frame.
        let frame = ByteFrame {
            byte: 5,
            start: 1234.5,
            end: 1234.50008,
        };
        assert!(agg.ingest(frame).unwrap().is_empty());
        assert_eq!(agg.pending_len(), 1);
    }

    #[test]
    fn exact_two_ms_gap_does_not_flush() {
        let mut agg = FrameAggregator::new(options());
        // Timestamps chosen so the gap is exactly the 2 ms threshold;
        // only strictly greater gaps flush.
        let first = ByteFrame {
            byte: 0,
            start: 0.0,
            end: 0.0,
        };
        agg.ingest(first).unwrap();
        let second = ByteFrame {
            byte: 0,
            start: 0.002,
            end: 0.00208,
        };
        assert!(agg.ingest(second).unwrap().is_empty());
        assert_eq!(agg.pending_len(), 2);
    }

    #[test]
    fn near_threshold_gap_does_not_flush() {
        let mut agg = FrameAggregator::new(options());
        let first = ByteFrame {
            byte: 0,
            start: 0.0,
            end: 0.00008,
        };
        agg.ingest(first).unwrap();
        // 1.9 ms of silence is still in tolerance; only gaps above 2 ms flush.
        let second = ByteFrame {
            byte: 0,
            start: 0.00198,
            end: 0.00206,
        };
        assert!(agg.ingest(second).unwrap().is_empty());
        assert_eq!(agg.pending_len(), 2);
    }
}
