//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: bit masks, shifts and table constants (source of truth)
//! - `reader`: safe frame access and span conventions
//! - `parser`: packet interpretation built on the reader
//!
//! Only the Spektrum DSM family is implemented today.

pub mod dsm;
