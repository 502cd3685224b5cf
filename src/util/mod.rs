//! Utility modules.

pub mod varint;
