use std::fmt::Debug;

use crate::flac::errors::{FlacDecodeError, FlacEncodeError};

use super::{FlacMetablockDecode, FlacMetablockEncode, FlacMetablockHeader, FlacMetablockType};

/// A cuesheet block in a flac file.
/// We don't parse this block, we only carry its bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct FlacCuesheetBlock {
	/// The raw cuesheet
	pub data: Vec<u8>,
}

impl Debug for FlacCuesheetBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacCuesheetBlock")
			.field("data_len", &self.data.len())
			.finish()
	}
}

impl FlacMetablockDecode for FlacCuesheetBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		Ok(Self { data: data.into() })
	}
}

impl FlacMetablockEncode for FlacCuesheetBlock {
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
			let header =
				FlacMetablockHeader::new(FlacMetablockType::Cuesheet, self.get_len(), is_last)?;
			header.encode(target)?;
		}

		target.write_all(&self.data)?;
		return Ok(());
	}
}
