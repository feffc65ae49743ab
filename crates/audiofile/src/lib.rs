#![warn(missing_docs)]

//! Read and write FLAC metadata blocks,
//! and map them to and from a [`record::MetadataRecord`].

pub mod common;
pub mod flac;
pub mod record;
