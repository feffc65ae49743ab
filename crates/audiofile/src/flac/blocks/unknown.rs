use std::fmt::Debug;

use crate::flac::errors::{FlacDecodeError, FlacEncodeError};

use super::{FlacMetablockEncode, FlacMetablockHeader, FlacMetablockType};

/// A metadata block with a reserved type code.
/// Its bytes are kept as-is and never interpreted.
#[derive(Clone, PartialEq, Eq)]
pub struct FlacUnknownBlock {
	/// The raw block type, 7..=126
	pub type_code: u8,

	/// The block body
	pub data: Vec<u8>,
}

impl Debug for FlacUnknownBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacUnknownBlock")
			.field("type_code", &self.type_code)
			.field("data_len", &self.data.len())
			.finish()
	}
}

impl FlacUnknownBlock {
	/// Wrap the body of a block with type `type_code`.
	/// This cannot implement [`super::FlacMetablockDecode`],
	/// since it needs to know its type code.
	pub fn decode(type_code: u8, data: &[u8]) -> Result<Self, FlacDecodeError> {
		if type_code <= 6 || type_code >= 127 {
			return Err(FlacDecodeError::BadMetablockType(type_code));
		}

		Ok(Self {
			type_code,
			data: data.into(),
		})
	}
}

impl FlacMetablockEncode for FlacUnknownBlock {
	fn get_len(&self) -> u64 {
		self.data.len().try_into().unwrap_or(u64::MAX)
	}

	fn encode(
		&self,
		is_last: bool,
		with_header: bool,
		target: &mut impl std::io::Write,
	) -> Result<(), FlacEncodeError> {
		if with_header {
			let header = FlacMetablockHeader::new(
				FlacMetablockType::Unknown(self.type_code),
				self.get_len(),
				is_last,
			)?;
			header.encode(target)?;
		}

		target.write_all(&self.data)?;
		return Ok(());
	}
}

/// A block of a known type whose body could not be parsed.
/// Its bytes are kept as-is, so the rest of the stream's metadata is still usable.
#[derive(Clone, PartialEq, Eq)]
pub struct FlacMalformedBlock {
	/// The type this block claims to be
	pub block_type: FlacMetablockType,

	/// The block body
	pub data: Vec<u8>,
}

impl Debug for FlacMalformedBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacMalformedBlock")
			.field("block_type", &self.block_type)
			.field("data_len", &self.data.len())
			.finish()
	}
}

impl FlacMetablockEncode for FlacMalformedBlock {
	fn get_len(&self) -> u64 {
		self.data.len().try_into().unwrap_or(u64::MAX)
	}

	fn encode(
		&self,
		is_last: bool,
		with_header: bool,
		target: &mut impl std::io::Write,
	) -> Result<(), FlacEncodeError> {
		if with_header {
			let header = FlacMetablockHeader::new(self.block_type, self.get_len(), is_last)?;
			header.encode(target)?;
		}

		target.write_all(&self.data)?;
		return Ok(());
	}
}
