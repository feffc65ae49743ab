//! FLAC metablock headers.

use crate::flac::errors::{FlacDecodeError, FlacEncodeError};

/// The largest body a metablock header can describe
pub const MAX_METABLOCK_LEN: u32 = 0x00FF_FFFF;

/// A type of flac metadata block
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FlacMetablockType {
	Streaminfo,
	Padding,
	Application,
	Seektable,
	VorbisComment,
	Cuesheet,
	Picture,

	/// A reserved block type this crate doesn't know how to parse.
	/// Holds the raw type code, 7..=126.
	Unknown(u8),
}

impl FlacMetablockType {
	/// Decode a block type from the first byte of a header.
	/// The `is_last` bit is ignored.
	pub fn from_id(id: u8) -> Result<Self, FlacDecodeError> {
		return Ok(match id & 0b0111_1111 {
			0 => FlacMetablockType::Streaminfo,
			1 => FlacMetablockType::Padding,
			2 => FlacMetablockType::Application,
			3 => FlacMetablockType::Seektable,
			4 => FlacMetablockType::VorbisComment,
			5 => FlacMetablockType::Cuesheet,
			6 => FlacMetablockType::Picture,
			// 127 is forbidden, it would look like a frame sync code
			127 => return Err(FlacDecodeError::BadMetablockType(127)),
			x => FlacMetablockType::Unknown(x),
		});
	}

	/// The 7-bit type code of this block
	pub fn to_id(&self) -> u8 {
		match self {
			FlacMetablockType::Streaminfo => 0,
			FlacMetablockType::Padding => 1,
			FlacMetablockType::Application => 2,
			FlacMetablockType::Seektable => 3,
			FlacMetablockType::VorbisComment => 4,
			FlacMetablockType::Cuesheet => 5,
			FlacMetablockType::Picture => 6,
			FlacMetablockType::Unknown(x) => *x & 0b0111_1111,
		}
	}
}

/// The header of a flac metadata block
#[derive(Debug, Clone)]
pub struct FlacMetablockHeader {
	/// The type of block this is
	pub block_type: FlacMetablockType,

	/// The length of this block, in bytes
	/// (not including this header)
	pub length: u32,

	/// If true, this is the last metadata block
	pub is_last: bool,
}

impl FlacMetablockHeader {
	/// Try to decode the given bytes as a flac metablock header
	pub fn decode(header: &[u8]) -> Result<Self, FlacDecodeError> {
		if header.len() != 4 {
			return Err(FlacDecodeError::MalformedBlock);
		}

		return Ok(Self {
			block_type: FlacMetablockType::from_id(header[0])?,
			length: u32::from_be_bytes([0, header[1], header[2], header[3]]),
			is_last: header[0] & 0b1000_0000 == 0b1000_0000,
		});
	}

	/// Make a header for a block body of `length` bytes.
	/// Fails if `length` doesn't fit in 24 bits.
	pub fn new(
		block_type: FlacMetablockType,
		length: u64,
		is_last: bool,
	) -> Result<Self, FlacEncodeError> {
		let length = u32::try_from(length)
			.ok()
			.filter(|x| *x <= MAX_METABLOCK_LEN)
			.ok_or(FlacEncodeError::BlockTooLarge(length))?;

		return Ok(Self {
			block_type,
			length,
			is_last,
		});
	}

	/// Try to encode this header
	pub fn encode(&self, target: &mut impl std::io::Write) -> Result<(), FlacEncodeError> {
		if self.length > MAX_METABLOCK_LEN {
			return Err(FlacEncodeError::BlockTooLarge(self.length.into()));
		}

		let mut block_type = self.block_type.to_id();
		if self.is_last {
			block_type |= 0b1000_0000;
		};

		let x = self.length.to_be_bytes();
		target.write_all(&[block_type, x[1], x[2], x[3]])?;

		return Ok(());
	}
}
