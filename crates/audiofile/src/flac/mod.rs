//! Parse FLAC metadata.

pub mod blockread;
pub mod blocks;
pub mod errors;

/// The four bytes every flac stream starts with
pub const FLAC_MAGIC: [u8; 4] = [0x66, 0x4C, 0x61, 0x43];
