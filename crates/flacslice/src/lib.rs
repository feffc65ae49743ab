#![warn(missing_docs)]

//! Decode sample ranges from flac files,
//! and encode sample buffers into new flac files.
//!
//! Most users want [`api::load`] and [`api::save`].

pub mod api;
pub mod decode;
pub mod encode;
pub mod errors;
pub mod layout;
pub mod window;
