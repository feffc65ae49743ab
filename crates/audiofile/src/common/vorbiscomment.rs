//! Decode and write Vorbis comment blocks

use smartstring::{LazyCompact, SmartString};
use std::{
	io::{Cursor, Read, Write},
	string::FromUtf8Error,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum VorbisCommentDecodeError {
	/// We encountered an IoError while processing a block
	#[error("io error while reading vorbis comments")]
	IoError(#[from] std::io::Error),

	/// We tried to decode a string, but got invalid data
	#[error("string decode error while reading vorbis comments")]
	FailedStringDecode(#[from] FromUtf8Error),

	/// The comment we're reading is invalid
	#[error("malformed comment data")]
	MalformedData,
}

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum VorbisCommentEncodeError {
	/// We encountered an IoError while processing a block
	#[error("io error while writing vorbis comments")]
	IoError(#[from] std::io::Error),

	/// A string is too long to be stored in a vorbis comment
	#[error("string is too long for a vorbis comment")]
	TooLong,
}

/// A decoded vorbis comment block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VorbisComment {
	/// This comment's vendor string
	pub vendor: SmartString<LazyCompact>,

	/// List of (key, value), in stream order.
	/// Repeated keys are allowed!
	pub comments: Vec<(SmartString<LazyCompact>, SmartString<LazyCompact>)>,
}

/// Read one length-prefixed byte string.
/// Checks the length against the remaining data before allocating.
#[expect(clippy::map_err_ignore)]
fn read_bytes(d: &mut Cursor<&[u8]>) -> Result<Vec<u8>, VorbisCommentDecodeError> {
	let mut block = [0u8; 4];

	d.read_exact(&mut block)
		.map_err(|_| VorbisCommentDecodeError::MalformedData)?;

	let length = usize::try_from(u32::from_le_bytes(block))
		.map_err(|_| VorbisCommentDecodeError::MalformedData)?;

	let remaining = d.get_ref().len().saturating_sub(
		usize::try_from(d.position()).map_err(|_| VorbisCommentDecodeError::MalformedData)?,
	);
	if length > remaining {
		return Err(VorbisCommentDecodeError::MalformedData);
	}

	let mut text = vec![0u8; length];
	d.read_exact(&mut text)?;
	return Ok(text);
}

#[expect(clippy::map_err_ignore)]
fn write_string(target: &mut impl Write, s: &str) -> Result<(), VorbisCommentEncodeError> {
	let len = u32::try_from(s.len()).map_err(|_| VorbisCommentEncodeError::TooLong)?;
	target.write_all(&len.to_le_bytes())?;
	target.write_all(s.as_bytes())?;
	return Ok(());
}

impl VorbisComment {
	/// Try to decode the given data as a vorbis comment block.
	///
	/// Each entry is split on its first `=`.
	/// Entries without an `=` and entries that aren't utf-8 are skipped.
	pub fn decode(data: &[u8]) -> Result<Self, VorbisCommentDecodeError> {
		let mut d = Cursor::new(data);

		let vendor = String::from_utf8(read_bytes(&mut d)?)?;

		let mut block = [0u8; 4];
		#[expect(clippy::map_err_ignore)]
		d.read_exact(&mut block)
			.map_err(|_| VorbisCommentDecodeError::MalformedData)?;
		let n_comments = u32::from_le_bytes(block);

		let mut comments = Vec::new();
		for i in 0..n_comments {
			let comment = match String::from_utf8(read_bytes(&mut d)?) {
				Ok(x) => x,
				Err(error) => {
					debug!(
						message = "Skipping vorbis comment that isn't utf-8",
						index = i,
						%error
					);
					continue;
				}
			};

			match comment.split_once('=') {
				Some((key, value)) => comments.push((key.into(), value.into())),
				None => {
					debug!(
						message = "Skipping vorbis comment without `=`",
						index = i,
						%comment
					);
				}
			}
		}

		Ok(Self {
			vendor: vendor.into(),
			comments,
		})
	}

	/// Get the number of bytes that `encode()` will write.
	pub fn get_len(&self) -> u64 {
		let mut sum: u64 = 4 + self.vendor.len() as u64;
		sum += 4;

		for (key, value) in &self.comments {
			// `key=value`, with a length prefix
			sum += 4 + key.len() as u64 + 1 + value.len() as u64;
		}

		return sum;
	}

	/// Try to encode this vorbis comment
	#[expect(clippy::map_err_ignore)]
	pub fn encode(&self, target: &mut impl Write) -> Result<(), VorbisCommentEncodeError> {
		write_string(target, &self.vendor)?;

		let n = u32::try_from(self.comments.len()).map_err(|_| VorbisCommentEncodeError::TooLong)?;
		target.write_all(&n.to_le_bytes())?;

		for (key, value) in &self.comments {
			write_string(target, &format!("{key}={value}"))?;
		}

		return Ok(());
	}
}
