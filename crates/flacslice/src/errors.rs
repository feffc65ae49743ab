//! Errors produced while decoding and encoding

use flacslice_audiofile::flac::{blockread::FlacBlockReaderError, errors::FlacEncodeError};
use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// An error we encounter before any audio is processed.
/// Nothing is decoded and nothing is written if we get one of these.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum InitError {
	#[error("could not open flac stream")]
	Open(#[source] std::io::Error),

	#[error("could not read flac metadata")]
	Metadata(#[from] FlacBlockReaderError),

	#[error("flac stream has no streaminfo block")]
	NoStreaminfo,

	#[error("codec could not open flac stream")]
	Codec(#[source] SymphoniaError),

	#[error("flac stream has no audio track")]
	NoTrack,

	#[error("could not create output file")]
	CreateOutput(#[source] std::io::Error),
}

/// A corrupt or unreadable audio frame.
/// Decoding stops when we get one of these,
/// and returns what was decoded so far.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum BitstreamError {
	#[error("could not read frame")]
	Read(#[source] SymphoniaError),

	#[error("could not decode frame")]
	Decode(#[source] SymphoniaError),

	#[error("could not seek")]
	Seek(#[source] SymphoniaError),

	#[error("could not reopen stream")]
	Reopen(#[source] Box<InitError>),

	#[error("decoder produced samples that aren't 32-bit integers")]
	SampleFormat,

	#[error("frame has {got} channels, stream has {expected}")]
	ChannelMismatch { expected: usize, got: usize },

	#[error("frame has a bad layout")]
	Layout(#[from] LayoutError),
}

/// A precondition of a layout conversion was violated
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
	#[error("a sample buffer must have at least one channel")]
	NoChannels,

	#[error("channel {channel} has {len} samples, expected {expected}")]
	UnequalPlanes {
		channel: usize,
		len: usize,
		expected: usize,
	},

	#[error("buffer of {len} samples can't be split into {channels} channels")]
	RaggedBuffer { len: usize, channels: usize },

	#[error("range {start}..{end} is outside a plane of {len} samples")]
	BadRange { start: usize, end: usize, len: usize },
}

/// A sample buffer isn't shaped like `frames x channels`
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
	#[error("sample buffer must have 2 dimensions, got {0}")]
	Rank(usize),

	#[error("sample buffer has no channels")]
	NoChannels,

	#[error("sample buffer has {got} elements, shape needs {expected}")]
	LengthMismatch { expected: usize, got: usize },
}

/// A sample buffer's elements can't be encoded
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot encode samples of type {0}, expected an integer type")]
pub struct TypeError(pub &'static str);

/// A compression level outside `0..=8`
#[derive(Debug, Error, PartialEq, Eq)]
#[error("compression level {0} is outside 0..=8")]
pub struct CompressionLevelError(pub i64);

/// An error while encoding or verifying a stream
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum EncodeError {
	#[error("cannot encode {channels} channels of {bits_per_sample}-bit audio at {sample_rate}Hz")]
	UnsupportedFormat {
		sample_rate: u32,
		bits_per_sample: u8,
		channels: usize,
	},

	#[error("sample {index} doesn't fit in {bits_per_sample} bits")]
	SampleOutOfRange { index: usize, bits_per_sample: u8 },

	#[error("bad encoder config: {0}")]
	Config(String),

	#[error("encoder failed: {0}")]
	Codec(String),

	#[error("could not encode metadata block")]
	Metadata(#[from] FlacEncodeError),

	#[error("bad sample layout")]
	Layout(#[from] LayoutError),

	#[error("io error while writing flac")]
	Io(#[from] std::io::Error),

	#[error("could not decode encoded stream")]
	VerifyInit(#[source] InitError),

	#[error("encoded stream is corrupt")]
	VerifyTruncated,

	#[error("encoded stream has {got} samples, expected {expected}")]
	VerifyLength { expected: usize, got: usize },

	#[error("encoded stream differs from input at sample {index}")]
	VerifyMismatch { index: usize },
}

/// Any error from [`crate::api::save`]
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SaveError {
	#[error("bad compression level")]
	Level(#[from] CompressionLevelError),

	#[error("bad sample buffer shape")]
	Shape(#[from] ShapeError),

	#[error("bad sample buffer type")]
	Type(#[from] TypeError),

	#[error("could not start encoding")]
	Init(#[from] InitError),

	#[error("could not encode")]
	Encode(#[from] EncodeError),
}
