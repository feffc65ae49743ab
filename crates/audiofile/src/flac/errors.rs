//! FLAC errors
use crate::common::{
	picturetype::PictureTypeError,
	vorbiscomment::{VorbisCommentDecodeError, VorbisCommentEncodeError},
};
use std::string::FromUtf8Error;
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum FlacDecodeError {
	/// FLAC does not start with 0x66 0x4C 0x61 0x43
	#[error("flac signature is missing or malformed")]
	BadMagicBytes,

	/// The first metablock isn't StreamInfo
	#[error("first metablock isn't streaminfo")]
	BadFirstBlock,

	/// We got an invalid metadata block type
	#[error("invalid flac metablock type {0}")]
	BadMetablockType(u8),

	/// We encountered an i/o error while processing
	#[error("io error while reading flac")]
	IoError(#[from] std::io::Error),

	/// We could not parse a vorbis comment
	#[error("error while decoding vorbis comment")]
	VorbisComment(#[from] VorbisCommentDecodeError),

	/// We tried to decode a string, but found invalid UTF-8
	#[error("error while decoding string")]
	FailedStringDecode(#[from] FromUtf8Error),

	/// We tried to read a block, but it was malformed.
	#[error("malformed flac block")]
	MalformedBlock,

	/// The stream ended before the last metadata block
	#[error("flac stream ended inside its metadata")]
	TruncatedMetadata,

	/// We tried to decode a bad picture type
	#[error("bad picture type")]
	PictureTypeError(#[from] PictureTypeError),
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum FlacEncodeError {
	/// We encountered an i/o error while processing
	#[error("io error while encoding block")]
	IoError(#[from] std::io::Error),

	/// This block doesn't fit in a flac metablock
	#[error("block body is {0} bytes, larger than a flac metablock allows")]
	BlockTooLarge(u64),

	/// A field of this block is too long to encode
	#[error("block field is too long to encode")]
	FieldTooLong,
}

impl From<VorbisCommentEncodeError> for FlacEncodeError {
	fn from(value: VorbisCommentEncodeError) -> Self {
		match value {
			VorbisCommentEncodeError::IoError(e) => e.into(),
			VorbisCommentEncodeError::TooLong => Self::FieldTooLong,
		}
	}
}
