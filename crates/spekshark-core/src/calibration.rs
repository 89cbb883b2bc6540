//! Per-channel calibration tables.
//!
//! A table maps a channel id (kept in its textual form, exactly as it
//! appears in the calibration file) to a min/mid/max raw-position triple
//! and turns raw stick positions into percentages. Tables are built once
//! at session start and never mutated afterwards; a missing entry is an
//! expected state, not an error.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Calibration triple for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationEntry {
    min: i32,
    mid: Option<i32>,
    max: i32,
}

impl CalibrationEntry {
    pub fn new(min: i32, mid: Option<i32>, max: i32) -> Self {
        Self { min, mid, max }
    }

    /// Percentage for a raw position, rounded to two decimal places.
    ///
    /// With a mid point the denominator switches at the mid while the
    /// numerator keeps measuring from `min` in both branches; this
    /// mirrors the established file format semantics even though it
    /// makes the mapping discontinuous at the mid point. A degenerate
    /// denominator yields `None` instead of dividing by zero.
    ///
    /// # Examples
    /// ```
    /// use spekshark_core::CalibrationEntry;
    ///
    /// let entry = CalibrationEntry::new(100, None, 900);
    /// assert_eq!(entry.percent(500), Some(50.0));
    /// assert_eq!(entry.percent(100), Some(0.0));
    /// assert_eq!(entry.percent(900), Some(100.0));
    /// ```
    pub fn percent(&self, position: u16) -> Option<f64> {
        let position = i32::from(position);
        let denominator = match self.mid {
            Some(mid) if position <= mid => mid - self.min,
            _ => self.max - self.min,
        };
        if denominator == 0 {
            return None;
        }
        let percent = f64::from(position - self.min) / f64::from(denominator) * 100.0;
        Some(round2(percent))
    }
}

/// Immutable channel-id to calibration-entry mapping.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    entries: HashMap<String, CalibrationEntry>,
}

impl CalibrationTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, CalibrationEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse calibration lines, skipping malformed ones individually.
    ///
    /// Accepted forms per line: `channel_id,min,max` or
    /// `channel_id,min,mid,max` (extra trailing fields are ignored).
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, io::Error> {
        let mut entries = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if let Some((key, entry)) = parse_line(&line) {
                entries.insert(key, entry);
            }
        }
        Ok(Self { entries })
    }

    /// Load a calibration file from disk.
    pub fn load(path: &Path) -> Result<Self, io::Error> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn entry(&self, channel_id: &str) -> Option<&CalibrationEntry> {
        self.entries.get(channel_id)
    }

    /// Percentage for a channel's raw position, when an entry exists and
    /// its range is usable.
    pub fn percent_for(&self, channel_id: u8, position: u16) -> Option<f64> {
        self.entry(&channel_id.to_string())
            .and_then(|entry| entry.percent(position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(String, CalibrationEntry)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let key = *fields.first()?;
    if key.is_empty() {
        return None;
    }
    let entry = match fields.len() {
        3 => CalibrationEntry::new(fields[1].parse().ok()?, None, fields[2].parse().ok()?),
        4.. => CalibrationEntry::new(
            fields[1].parse().ok()?,
            Some(fields[2].parse().ok()?),
            fields[3].parse().ok()?,
        ),
        _ => return None,
    };
    Some((key.to_string(), entry))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
