use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::source::{ByteFrame, FrameSource, SourceError};

use super::error::CsvSourceError;
use super::layout;
use super::reader::{has_min_columns, is_header_row, parse_data_byte, parse_seconds, split_row};

pub struct CsvFileSource {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    past_header: bool,
}

impl CsvFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            past_header: false,
        })
    }

    fn parse_row(&self, row: &str) -> Result<ByteFrame, CsvSourceError> {
        let fields = split_row(row);
        if !has_min_columns(&fields) {
            return Err(self.row_error(format!(
                "expected at least {} columns, got {}",
                layout::MIN_COLUMNS,
                fields.len()
            )));
        }

        let start = parse_seconds(fields[layout::START_TIME_COLUMN])
            .ok_or_else(|| self.row_error("invalid start_time"))?;
        let end = parse_seconds(fields[layout::END_TIME_COLUMN])
            .ok_or_else(|| self.row_error("invalid end_time"))?;
        if end < start {
            return Err(self.row_error("end_time precedes start_time"));
        }
        let byte = parse_data_byte(fields[layout::DATA_COLUMN])
            .ok_or_else(|| self.row_error("invalid data byte"))?;

        Ok(ByteFrame { byte, start, end })
    }

    fn row_error(&self, message: impl Into<String>) -> CsvSourceError {
        CsvSourceError::Row {
            line: self.line_no,
            message: message.into(),
        }
    }
}

impl FrameSource for CsvFileSource {
    fn next_frame(&mut self) -> Result<Option<ByteFrame>, SourceError> {
        loop {
            let row = match self.lines.next() {
                Some(row) => row.map_err(CsvSourceError::Io)?,
                None => return Ok(None),
            };
            self.line_no += 1;

            if row.trim().is_empty() {
                continue;
            }
            // Only the first non-blank row may be a header.
            let first_row = !self.past_header;
            self.past_header = true;
            if first_row && is_header_row(&row) {
                continue;
            }
            return self
                .parse_row(&row)
                .map(Some)
                .map_err(SourceError::from);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::CsvFileSource;
    use crate::source::{FrameSource, SourceError};

    fn source_from(contents: &str) -> (NamedTempFile, CsvFileSource) {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write csv");
        file.flush().expect("flush csv");
        let source = CsvFileSource::open(file.path()).expect("open csv");
        (file, source)
    }

    #[test]
    fn reads_frames_and_skips_header() {
        let (_file, mut source) = source_from(
            "start_time,end_time,data\n0.010,0.01008,0x05\n0.0101,0.01018,1\n",
        );

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.byte, 0x05);
        assert!((first.start - 0.010).abs() < 1e-12);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.byte, 1);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn skips_header_after_leading_blank_lines() {
        let (_file, mut source) =
            source_from("\n\nstart_time,end_time,data\n0.010,0.01008,0x05\n");
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.byte, 0x05);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn header_row_is_only_tolerated_once() {
        // A header-like row after real data is a parse error, not a skip.
        let (_file, mut source) = source_from("0.0,0.1,0x01\nstart_time,end_time,data\n");
        source.next_frame().unwrap();
        assert!(matches!(source.next_frame(), Err(SourceError::Csv(_))));
    }

    #[test]
    fn skips_blank_lines() {
        let (_file, mut source) = source_from("0.0,0.1,0x01\n\n0.2,0.3,0x02\n");
        assert_eq!(source.next_frame().unwrap().unwrap().byte, 0x01);
        assert_eq!(source.next_frame().unwrap().unwrap().byte, 0x02);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_data_byte_with_line_number() {
        let (_file, mut source) = source_from("0.0,0.1,0x01\n0.2,0.3,banana\n");
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        match err {
            SourceError::Csv(message) => {
                assert!(message.contains("line 2"), "got: {message}");
                assert!(message.contains("invalid data byte"), "got: {message}");
            }
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_reversed_timestamps() {
        let (_file, mut source) = source_from("0.5,0.1,0x01\n");
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, SourceError::Csv(_)));
    }

    #[test]
    fn rejects_short_rows() {
        let (_file, mut source) = source_from("0.0,0.1\n");
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, SourceError::Csv(_)));
    }
}
