use std::io::Read;

use crate::flac::errors::{FlacDecodeError, FlacEncodeError};

use super::{FlacMetablockDecode, FlacMetablockEncode, FlacMetablockHeader, FlacMetablockType};

/// A padding block in a FLAC file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacPaddingBlock {
	/// The length of this padding, in bytes.
	pub size: usize,
}

impl FlacMetablockDecode for FlacPaddingBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		// Padding content is meaningless, even if it isn't zero.
		Ok(Self { size: data.len() })
	}
}

impl FlacMetablockEncode for FlacPaddingBlock {
	fn get_len(&self) -> u64 {
		self.size.try_into().unwrap_or(u64::MAX)
	}

	fn encode(
		&self,
		is_last: bool,
		with_header: bool,
		target: &mut impl std::io::Write,
	) -> Result<(), FlacEncodeError> {
		if with_header {
			let header =
				FlacMetablockHeader::new(FlacMetablockType::Padding, self.get_len(), is_last)?;
			header.encode(target)?;
		}

		std::io::copy(&mut std::io::repeat(0u8).take(self.get_len()), target)?;

		return Ok(());
	}
}
