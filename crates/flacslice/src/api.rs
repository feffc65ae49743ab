//! The host-facing entry points.
//!
//! These take plain option structs with sensible defaults,
//! and hand off to [`crate::decode`] and [`crate::encode`].

use flacslice_audiofile::record::MetadataRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::{
	decode::{decode_file, DecodeOutcome},
	encode::{encode, SampleView},
	errors::{InitError, SaveError},
	window::SampleInterval,
};

/// Options for [`load`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
	/// The first inter-channel sample to decode
	pub start_sample: u64,

	/// How many samples to decode. 0 means "to the end of the stream".
	pub num_samples: u64,

	/// If true, only read metadata. No frames are decoded.
	pub metadata_only: bool,
}

impl LoadOptions {
	/// The interval these options request
	pub fn interval(&self) -> SampleInterval {
		SampleInterval::new(self.start_sample, self.num_samples)
	}
}

/// Options for [`save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
	/// Samples per second, in Hz
	pub sample_rate: u32,

	/// Bits per sample in the output stream
	pub bits_per_sample: u8,

	/// Compression level, 0 to 8
	pub compression_level: i64,

	/// If true, decode the encoded stream and compare it
	/// to the input before writing anything.
	pub verify: bool,
}

impl Default for SaveOptions {
	fn default() -> Self {
		Self {
			sample_rate: 44100,
			bits_per_sample: 16,
			compression_level: 5,
			verify: true,
		}
	}
}

/// Decode a range of samples and all metadata from the flac file at `path`.
///
/// Corrupt audio frames do not produce an error:
/// decoding stops, and [`DecodeOutcome::is_truncated`] is set.
pub fn load(path: &Path, options: &LoadOptions) -> Result<DecodeOutcome, InitError> {
	let outcome = decode_file(path, options.interval(), options.metadata_only)?;

	info!(
		message = "Loaded flac",
		?path,
		frames = outcome.samples.as_ref().map(|s| s.frames()),
		state = ?outcome.state,
		truncated = outcome.is_truncated()
	);

	return Ok(outcome);
}

/// Encode `view` (shaped `[frames, channels]`) into a new flac file at `path`.
///
/// If `metadata` is given, its comments and pictures are written to the file.
/// Its streaminfo and opaque blocks are ignored.
pub fn save(
	path: &Path,
	view: &SampleView<'_>,
	metadata: Option<&MetadataRecord>,
	options: &SaveOptions,
) -> Result<(), SaveError> {
	encode(path, view, options, metadata)?;
	info!(message = "Saved flac", ?path, shape = ?view.shape);
	return Ok(());
}
