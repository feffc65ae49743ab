//! Types shared by all audio formats

pub mod picturetype;
pub mod vorbiscomment;
