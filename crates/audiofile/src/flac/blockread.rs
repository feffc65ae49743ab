//! Read FLAC metadata blocks without touching audio frames.

use std::{
	collections::VecDeque,
	io::{Cursor, Read, Write},
};
use thiserror::Error;
use tracing::{trace, warn};

use super::{
	blocks::{
		FlacApplicationBlock, FlacCommentBlock, FlacCuesheetBlock, FlacMalformedBlock,
		FlacMetablockDecode, FlacMetablockEncode, FlacMetablockHeader, FlacMetablockType,
		FlacPaddingBlock, FlacPictureBlock, FlacSeektableBlock, FlacStreaminfoBlock,
		FlacUnknownBlock,
	},
	errors::{FlacDecodeError, FlacEncodeError},
	FLAC_MAGIC,
};

enum FlacBlockType {
	MagicBits {
		data: [u8; 4],
		left_to_read: usize,
	},
	MetablockHeader {
		is_first: bool,
		data: [u8; 4],
		left_to_read: usize,
	},
	MetaBlock {
		header: FlacMetablockHeader,
		data: Vec<u8>,
	},
}

/// A decoded flac metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FlacBlock {
	Streaminfo(FlacStreaminfoBlock),
	Picture(FlacPictureBlock),
	Padding(FlacPaddingBlock),
	Application(FlacApplicationBlock),
	SeekTable(FlacSeektableBlock),
	VorbisComment(FlacCommentBlock),
	CueSheet(FlacCuesheetBlock),

	/// A block with a reserved type code.
	/// Never parsed, never mistaken for another kind.
	Unknown(FlacUnknownBlock),

	/// A block whose body didn't parse as its declared type
	Malformed(FlacMalformedBlock),
}

impl FlacBlock {
	/// Encode this block
	pub fn encode(
		&self,
		is_last: bool,
		with_header: bool,
		target: &mut impl Write,
	) -> Result<(), FlacEncodeError> {
		match self {
			Self::Streaminfo(b) => b.encode(is_last, with_header, target),
			Self::SeekTable(b) => b.encode(is_last, with_header, target),
			Self::Picture(b) => b.encode(is_last, with_header, target),
			Self::Padding(b) => b.encode(is_last, with_header, target),
			Self::Application(b) => b.encode(is_last, with_header, target),
			Self::VorbisComment(b) => b.encode(is_last, with_header, target),
			Self::CueSheet(b) => b.encode(is_last, with_header, target),
			Self::Unknown(b) => b.encode(is_last, with_header, target),
			Self::Malformed(b) => b.encode(is_last, with_header, target),
		}
	}

	/// Get the number of bytes in this block's body
	pub fn get_len(&self) -> u64 {
		match self {
			Self::Streaminfo(b) => b.get_len(),
			Self::SeekTable(b) => b.get_len(),
			Self::Picture(b) => b.get_len(),
			Self::Padding(b) => b.get_len(),
			Self::Application(b) => b.get_len(),
			Self::VorbisComment(b) => b.get_len(),
			Self::CueSheet(b) => b.get_len(),
			Self::Unknown(b) => b.get_len(),
			Self::Malformed(b) => b.get_len(),
		}
	}

	/// The type of this block
	pub fn block_type(&self) -> FlacMetablockType {
		match self {
			Self::Streaminfo(_) => FlacMetablockType::Streaminfo,
			Self::SeekTable(_) => FlacMetablockType::Seektable,
			Self::Picture(_) => FlacMetablockType::Picture,
			Self::Padding(_) => FlacMetablockType::Padding,
			Self::Application(_) => FlacMetablockType::Application,
			Self::VorbisComment(_) => FlacMetablockType::VorbisComment,
			Self::CueSheet(_) => FlacMetablockType::Cuesheet,
			Self::Unknown(b) => FlacMetablockType::Unknown(b.type_code),
			Self::Malformed(b) => b.block_type,
		}
	}

	/// Try to decode the given data as a block
	pub fn decode(block_type: FlacMetablockType, data: &[u8]) -> Result<Self, FlacDecodeError> {
		Ok(match block_type {
			FlacMetablockType::Streaminfo => {
				FlacBlock::Streaminfo(FlacStreaminfoBlock::decode(data)?)
			}
			FlacMetablockType::Application => {
				FlacBlock::Application(FlacApplicationBlock::decode(data)?)
			}
			FlacMetablockType::Cuesheet => FlacBlock::CueSheet(FlacCuesheetBlock::decode(data)?),
			FlacMetablockType::Padding => FlacBlock::Padding(FlacPaddingBlock::decode(data)?),
			FlacMetablockType::Picture => FlacBlock::Picture(FlacPictureBlock::decode(data)?),
			FlacMetablockType::Seektable => FlacBlock::SeekTable(FlacSeektableBlock::decode(data)?),
			FlacMetablockType::VorbisComment => {
				FlacBlock::VorbisComment(FlacCommentBlock::decode(data)?)
			}
			FlacMetablockType::Unknown(x) => FlacBlock::Unknown(FlacUnknownBlock::decode(x, data)?),
		})
	}

	/// Decode the given data as a block,
	/// keeping it as a [`FlacBlock::Malformed`] if its body doesn't parse.
	pub fn decode_or_keep(block_type: FlacMetablockType, data: &[u8]) -> Self {
		match Self::decode(block_type, data) {
			Ok(b) => b,
			Err(error) => {
				warn!(
					message = "Keeping malformed metablock as opaque bytes",
					?block_type,
					length = data.len(),
					%error
				);

				FlacBlock::Malformed(FlacMalformedBlock {
					block_type,
					data: data.into(),
				})
			}
		}
	}
}

/// An error produced by a [`FlacBlockReader`]
#[derive(Debug, Error)]
pub enum FlacBlockReaderError {
	/// Could not decode flac data
	#[error("decode error while reading flac blocks")]
	DecodeError(#[from] FlacDecodeError),

	/// Tried to push data to a finished reader.
	#[error("flac block reader is already finished")]
	AlreadyFinished,
}

/// A buffered flac metadata reader.
/// Use `push_data` to add flac data into this struct,
/// use `pop_block` to read flac blocks.
///
/// This reader stops at the end of the last metadata block.
/// Any data after that point (i.e, audio frames) is ignored.
pub struct FlacBlockReader {
	// The block we're currently reading.
	// If this is `None`, we've read the last metadata block.
	current_block: Option<FlacBlockType>,

	// Blocks we've read go here
	output_blocks: VecDeque<FlacBlock>,

	// Total number of bytes consumed
	consumed: u64,
}

impl Default for FlacBlockReader {
	fn default() -> Self {
		Self::new()
	}
}

impl FlacBlockReader {
	/// Pop the next block we've read, if any.
	pub fn pop_block(&mut self) -> Option<FlacBlock> {
		self.output_blocks.pop_front()
	}

	/// If true, this reader has read every metadata block.
	pub fn is_done(&self) -> bool {
		self.current_block.is_none()
	}

	/// If true, this reader has at least one block ready to pop.
	/// Calling `pop_block` will return `Some(_)` if this is true.
	pub fn has_block(&self) -> bool {
		!self.output_blocks.is_empty()
	}

	/// The number of stream bytes this reader has consumed.
	/// Once `is_done()`, this is the offset of the first audio frame.
	pub fn consumed(&self) -> u64 {
		self.consumed
	}

	/// Make a new [`FlacBlockReader`].
	pub fn new() -> Self {
		Self {
			current_block: Some(FlacBlockType::MagicBits {
				data: [0; 4],
				left_to_read: 4,
			}),

			output_blocks: VecDeque::new(),
			consumed: 0,
		}
	}

	/// Pass the given data through this block extractor.
	/// Decoded blocks are stored in an internal buffer,
	/// and should be accessed through `pop_block`.
	pub fn push_data(&mut self, buf: &[u8]) -> Result<(), FlacBlockReaderError> {
		let mut buf = Cursor::new(buf);
		let mut last_read_size = 1;

		if self.current_block.is_none() {
			return Err(FlacBlockReaderError::AlreadyFinished);
		}

		while last_read_size != 0 {
			let Some(current) = self.current_block.as_mut() else {
				// Last metadata block is done, the rest of `buf` is audio.
				break;
			};

			match current {
				FlacBlockType::MagicBits { data, left_to_read } => {
					last_read_size = buf
						.read(&mut data[4 - *left_to_read..4])
						.map_err(FlacDecodeError::from)?;
					*left_to_read -= last_read_size;

					if *left_to_read == 0 {
						if *data != FLAC_MAGIC {
							return Err(FlacDecodeError::BadMagicBytes.into());
						};

						self.current_block = Some(FlacBlockType::MetablockHeader {
							is_first: true,
							data: [0; 4],
							left_to_read: 4,
						})
					}
				}

				FlacBlockType::MetablockHeader {
					is_first,
					data,
					left_to_read,
				} => {
					last_read_size = buf
						.read(&mut data[4 - *left_to_read..4])
						.map_err(FlacDecodeError::from)?;
					*left_to_read -= last_read_size;

					if *left_to_read == 0 {
						let header = FlacMetablockHeader::decode(data)?;
						if *is_first && !matches!(header.block_type, FlacMetablockType::Streaminfo)
						{
							return Err(FlacDecodeError::BadFirstBlock.into());
						}

						self.current_block = Some(FlacBlockType::MetaBlock {
							header,
							data: Vec::new(),
						})
					}
				}

				FlacBlockType::MetaBlock { header, data } => {
					let have = data.len() as u64;
					last_read_size = buf
						.by_ref()
						.take(u64::from(header.length).saturating_sub(have))
						.read_to_end(data)
						.map_err(FlacDecodeError::from)?;

					if data.len() as u64 == u64::from(header.length) {
						trace!(
							message = "Read metablock",
							block_type = ?header.block_type,
							length = header.length,
							is_last = header.is_last
						);

						self.output_blocks
							.push_back(FlacBlock::decode_or_keep(header.block_type, data));

						// Start next block
						if header.is_last {
							self.current_block = None;
						} else {
							self.current_block = Some(FlacBlockType::MetablockHeader {
								is_first: false,
								data: [0; 4],
								left_to_read: 4,
							})
						}
					}
				}
			}

			self.consumed += last_read_size as u64;
		}

		return Ok(());
	}

	/// Finish reading data.
	/// This tells the reader that it has received the entire stream.
	///
	/// Returns an error if the stream ended before its last metadata block.
	pub fn finish(&mut self) -> Result<(), FlacBlockReaderError> {
		match self.current_block {
			None => return Ok(()),
			Some(FlacBlockType::MagicBits { .. }) => {
				return Err(FlacDecodeError::BadMagicBytes.into())
			}
			Some(_) => return Err(FlacDecodeError::TruncatedMetadata.into()),
		}
	}
}

/// Read all metadata blocks from `read`.
/// `read` should provide a flac stream from its first byte.
///
/// Reading stops as soon as the last metadata block is found,
/// audio frames are never read.
pub fn read_metablocks<R: Read>(mut read: R) -> Result<Vec<FlacBlock>, FlacBlockReaderError> {
	let mut reader = FlacBlockReader::new();
	let mut out = Vec::new();
	let mut buf = vec![0u8; 64 * 1024];

	while !reader.is_done() {
		let n = read.read(&mut buf).map_err(FlacDecodeError::from)?;
		if n == 0 {
			break;
		}

		reader.push_data(&buf[..n])?;
		while let Some(b) = reader.pop_block() {
			out.push(b);
		}
	}

	reader.finish()?;
	return Ok(out);
}

#[cfg(test)]
mod tests {
	use paste::paste;
	use rand::Rng;
	use sha2::{Digest, Sha256};
	use std::ops::Range;

	use super::*;
	use crate::flac::tests::{manifest, FlacTestCase};

	fn get_case(test_name: &str) -> FlacTestCase {
		manifest()
			.into_iter()
			.find(|x| x.name == test_name)
			.unwrap()
	}

	fn read_stream(
		file_data: &[u8],
		fragment_size_range: Option<Range<usize>>,
	) -> (Vec<FlacBlock>, u64) {
		let mut reader = FlacBlockReader::new();
		let mut out_blocks = Vec::new();

		// Push data to the reader, in parts or as a whole.
		if let Some(fragment_size_range) = fragment_size_range {
			let mut head = 0;
			while head < file_data.len() && !reader.is_done() {
				let mut frag_size = rand::thread_rng().gen_range(fragment_size_range.clone());
				if head + frag_size > file_data.len() {
					frag_size = file_data.len() - head;
				}
				reader
					.push_data(&file_data[head..head + frag_size])
					.unwrap();
				head += frag_size;
			}
		} else {
			reader.push_data(file_data).unwrap();
		}

		reader.finish().unwrap();
		while let Some(b) = reader.pop_block() {
			out_blocks.push(b)
		}

		return (out_blocks, reader.consumed());
	}

	fn test_blockread(test_name: &str, fragment_size_range: Option<Range<usize>>) {
		let x = get_case(test_name);
		let file_data = x.stream_bytes();

		let (out_blocks, consumed) = read_stream(&file_data, fragment_size_range);

		assert_eq!(out_blocks, x.blocks, "Blocks didn't match");
		assert_eq!(
			consumed,
			x.metadata_len(),
			"Reader didn't stop at the first audio frame"
		);
	}

	fn test_identical(test_name: &str, fragment_size_range: Option<Range<usize>>) {
		let x = get_case(test_name);
		let file_data = x.stream_bytes();

		let (out_blocks, consumed) = read_stream(&file_data, fragment_size_range);

		let mut out = Vec::new();
		out.write_all(&FLAC_MAGIC).unwrap();
		for (i, b) in out_blocks.iter().enumerate() {
			b.encode(i == out_blocks.len() - 1, true, &mut out).unwrap();
		}
		let consumed = usize::try_from(consumed).unwrap();
		out.extend(&file_data[consumed..]);

		let mut hasher = Sha256::new();
		hasher.update(&out);
		let result = format!("{:x}", hasher.finalize());

		let mut hasher = Sha256::new();
		hasher.update(&file_data);
		let expected = format!("{:x}", hasher.finalize());

		assert_eq!(result, expected, "Output hash doesn't match");
	}

	// Helper macros to generate tests
	macro_rules! gen_tests {
		( $test_name:ident ) => {
			paste! {
				#[test]
				pub fn [<blockread_whole_ $test_name>]() {
					test_blockread(stringify!($test_name), None)
				}

				#[test]
				pub fn [<blockread_small_ $test_name>]() {
					for _ in 0..5 {
						test_blockread(stringify!($test_name), Some(1..256))
					}
				}

				#[test]
				pub fn [<blockread_large_ $test_name>]() {
					for _ in 0..5 {
						test_blockread(stringify!($test_name), Some(5_000..100_000))
					}
				}

				#[test]
				pub fn [<identical_small_ $test_name>]() {
					for _ in 0..5 {
						test_identical(stringify!($test_name), Some(1..256))
					}
				}
			}
		};
	}

	gen_tests!(only_streaminfo);
	gen_tests!(tagged);
	gen_tests!(everything);
	gen_tests!(large_picture);
	gen_tests!(malformed);

	#[test]
	fn bad_magic() {
		let mut reader = FlacBlockReader::new();
		let res = reader.push_data(b"RIFF0000");
		assert!(matches!(
			res,
			Err(FlacBlockReaderError::DecodeError(
				FlacDecodeError::BadMagicBytes
			))
		));
	}

	#[test]
	fn bad_first_block() {
		let mut data = FLAC_MAGIC.to_vec();
		// A last padding block, no streaminfo
		data.extend([0x81, 0, 0, 0]);

		let mut reader = FlacBlockReader::new();
		assert!(matches!(
			reader.push_data(&data),
			Err(FlacBlockReaderError::DecodeError(
				FlacDecodeError::BadFirstBlock
			))
		));
	}

	#[test]
	fn truncated_metadata() {
		let data = get_case("tagged").stream_bytes();
		let cut = usize::try_from(get_case("tagged").metadata_len()).unwrap() - 3;

		let res = read_metablocks(&data[..cut]);
		assert!(matches!(
			res,
			Err(FlacBlockReaderError::DecodeError(
				FlacDecodeError::TruncatedMetadata
			))
		));

		let res = read_metablocks(&data[..0]);
		assert!(matches!(
			res,
			Err(FlacBlockReaderError::DecodeError(
				FlacDecodeError::BadMagicBytes
			))
		));
	}

	#[test]
	fn push_after_done() {
		let data = get_case("only_streaminfo").stream_bytes();
		let mut reader = FlacBlockReader::new();
		reader.push_data(&data).unwrap();
		assert!(reader.is_done());
		assert!(matches!(
			reader.push_data(&data),
			Err(FlacBlockReaderError::AlreadyFinished)
		));
	}

	#[test]
	fn read_metablocks_stops_early() {
		let x = get_case("everything");
		let data = x.stream_bytes();
		let mut cursor = Cursor::new(&data);

		let blocks = read_metablocks(&mut cursor).unwrap();
		assert_eq!(blocks, x.blocks);
	}

	#[test]
	fn malformed_bodies_are_kept() {
		let x = get_case("malformed");
		let blocks = read_metablocks(Cursor::new(x.stream_bytes())).unwrap();

		assert_eq!(blocks.len(), 5);
		assert!(matches!(blocks[0], FlacBlock::Streaminfo(_)));
		assert!(matches!(blocks[2], FlacBlock::VorbisComment(_)));
		assert!(matches!(blocks[4], FlacBlock::Padding(_)));

		match &blocks[1] {
			FlacBlock::Malformed(b) => {
				assert_eq!(b.block_type, FlacMetablockType::Picture);
				assert_eq!(b.data, vec![0xFF; 12]);
			}
			_ => panic!("expected a malformed block"),
		}
		assert_eq!(blocks[3].block_type(), FlacMetablockType::VorbisComment);
		assert!(matches!(blocks[3], FlacBlock::Malformed(_)));
	}

	#[test]
	fn decode_or_keep_parses_good_bodies() {
		let mut data = Vec::new();
		FlacPaddingBlock { size: 3 }
			.encode(false, false, &mut data)
			.unwrap();

		assert_eq!(
			FlacBlock::decode_or_keep(FlacMetablockType::Padding, &data),
			FlacBlock::Padding(FlacPaddingBlock { size: 3 })
		);
	}
}
