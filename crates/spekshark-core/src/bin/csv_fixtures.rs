//! Regenerates the CSV capture fixtures under `tests/fixtures`.
//!
//! Run from the workspace root:
//! `cargo run -p spekshark-core --bin csv_fixtures`

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

// Timing of a 125 kBd serial byte: 80 us on the wire, 100 us pitch.
const PITCH_S: f64 = 0.0001;
const BYTE_TIME_S: f64 = 0.00008;

const SYSTEM_DSM2_1024: u8 = 0x01;

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/fixtures");
    write_two_packets(&root)?;
    write_resync(&root)?;
    Ok(())
}

/// Two clean back-to-back packets, 22 ms apart, internal DSM2 1024.
fn write_two_packets(root: &Path) -> Result<(), String> {
    let mut csv = String::from("start_time,end_time,data\n");
    push_rows(&mut csv, 0.010, &internal_packet(5, 50));
    push_rows(&mut csv, 0.032, &internal_packet(6, 51));
    write_fixture(&root.join("two_packets.csv"), &csv)
}

/// Five stray frames joined mid-packet, then one clean packet.
fn write_resync(root: &Path) -> Result<(), String> {
    let mut csv = String::from("start_time,end_time,data\n");
    push_rows(&mut csv, 0.001, &[0xFF, 0x00, 0x12, 0x34, 0x56]);
    push_rows(&mut csv, 0.011, &internal_packet(7, 50));
    write_fixture(&root.join("resync.csv"), &csv)
}

/// 16 packet bytes: fades, DSM2-1024 system byte, then 7 channel words
/// carrying channel id == slot and position `base + 100 * slot`.
fn internal_packet(fades: u8, base_position: u16) -> Vec<u8> {
    let mut bytes = vec![fades, SYSTEM_DSM2_1024];
    for slot in 0..7u16 {
        let word = (slot << 10) | (base_position + 100 * slot);
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes
}

fn push_rows(csv: &mut String, t0: f64, bytes: &[u8]) {
    for (i, byte) in bytes.iter().enumerate() {
        let start = t0 + i as f64 * PITCH_S;
        let end = start + BYTE_TIME_S;
        let _ = writeln!(csv, "{start:.6},{end:.6},0x{byte:02X}");
    }
}

fn write_fixture(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create {}: {e}", parent.display()))?;
    }
    fs::write(path, contents).map_err(|e| format!("write {}: {e}", path.display()))
}
