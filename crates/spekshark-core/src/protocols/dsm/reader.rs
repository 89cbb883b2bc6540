use crate::RecordSpan;
use crate::source::ByteFrame;

use super::error::DsmError;

/// Safe access to the frames of one candidate packet.
pub struct PacketReader<'a> {
    frames: &'a [ByteFrame],
}

impl<'a> PacketReader<'a> {
    pub fn new(frames: &'a [ByteFrame]) -> Self {
        Self { frames }
    }

    pub fn require_exact(&self, expected: usize) -> Result<(), DsmError> {
        if self.frames.len() != expected {
            return Err(DsmError::WrongFrameCount {
                expected,
                actual: self.frames.len(),
            });
        }
        Ok(())
    }

    pub fn byte(&self, index: usize) -> Result<u8, DsmError> {
        self.frame(index).map(|frame| frame.byte)
    }

    /// Concatenate two consecutive frames big-endian into a channel word.
    pub fn pair_u16_be(&self, first: usize) -> Result<u16, DsmError> {
        let high = self.byte(first)?;
        let low = self.byte(first + 1)?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Span from the start of `first` to the end of `last`.
    pub fn span(&self, first: usize, last: usize) -> Result<RecordSpan, DsmError> {
        Ok(RecordSpan {
            start: self.frame(first)?.start,
            end: self.frame(last)?.end,
        })
    }

    fn frame(&self, index: usize) -> Result<&ByteFrame, DsmError> {
        self.frames.get(index).ok_or(DsmError::FrameOutOfRange {
            index,
            len: self.frames.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PacketReader;
    use crate::protocols::dsm::error::DsmError;
    use crate::source::ByteFrame;

    fn frames(bytes: &[u8]) -> Vec<ByteFrame> {
        bytes
            .iter()
            .enumerate()
            .map(|(i, &byte)| ByteFrame {
                byte,
                start: i as f64 * 0.0001,
                end: i as f64 * 0.0001 + 0.00008,
            })
            .collect()
    }

    #[test]
    fn pairs_are_big_endian() {
        let frames = frames(&[0x0D, 0x5E]);
        let reader = PacketReader::new(&frames);
        assert_eq!(reader.pair_u16_be(0).unwrap(), 0x0D5E);
    }

    #[test]
    fn span_covers_both_frames() {
        let frames = frames(&[0, 0]);
        let reader = PacketReader::new(&frames);
        let span = reader.span(0, 1).unwrap();
        assert!((span.start - 0.0).abs() < 1e-12);
        assert!((span.end - 0.00018).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_access_is_reported() {
        let frames = frames(&[0]);
        let reader = PacketReader::new(&frames);
        let err = reader.byte(1).unwrap_err();
        assert!(matches!(err, DsmError::FrameOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn require_exact_checks_length() {
        let frames = frames(&[0; 15]);
        let reader = PacketReader::new(&frames);
        let err = reader.require_exact(16).unwrap_err();
        assert!(matches!(
            err,
            DsmError::WrongFrameCount {
                expected: 16,
                actual: 15
            }
        ));
    }
}
