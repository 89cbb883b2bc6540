//! CSV capture source implementation.
//!
//! This module provides a `FrameSource` backed by a logic-analyzer CSV
//! export of an already-decoded async serial stream. Each row carries one
//! payload byte with its start/end timestamps; an optional header row is
//! tolerated. File I/O and row parsing live here, emitting byte-frames
//! for the analysis pipeline.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::CsvFileSource;
