//! A generic, serializable view of flac metadata.
//!
//! [`blocks_to_record`] and [`record_to_blocks`] convert between
//! a stream's metadata blocks and a [`MetadataRecord`].
//! Records never borrow from the blocks they were made from.

use flacslice_util::MimeType;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use tracing::trace;

use crate::{
	common::{picturetype::PictureType, vorbiscomment::VorbisComment},
	flac::{
		blockread::FlacBlock,
		blocks::{FlacCommentBlock, FlacPictureBlock, FlacStreaminfoBlock},
	},
};

/// Stream parameters from a STREAMINFO block.
/// This is derived by the encoder and is never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct StreamInfoRecord {
	pub min_blocksize: u32,
	pub max_blocksize: u32,
	pub min_framesize: u32,
	pub max_framesize: u32,
	pub sample_rate: u32,
	pub channels: u8,
	pub bits_per_sample: u8,

	/// Zero if unknown
	pub total_samples: u64,

	/// Lowercase hex md5 of the unencoded audio
	pub md5: String,
}

impl From<&FlacStreaminfoBlock> for StreamInfoRecord {
	fn from(value: &FlacStreaminfoBlock) -> Self {
		Self {
			min_blocksize: value.min_block_size,
			max_blocksize: value.max_block_size,
			min_framesize: value.min_frame_size,
			max_framesize: value.max_frame_size,
			sample_rate: value.sample_rate,
			channels: value.channels,
			bits_per_sample: value.bits_per_sample,
			total_samples: value.total_samples,
			md5: value
				.md5_signature
				.iter()
				.map(|x| format!("{x:02x}"))
				.join(""),
		}
	}
}

/// A vorbis comment: a vendor string and ordered `(key, value)` pairs.
/// Keys may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VorbisCommentRecord {
	/// The vendor string. Empty if not given.
	#[serde(default)]
	pub vendor: String,

	/// Comment entries, in stream order
	#[serde(default)]
	pub entries: Vec<(String, String)>,
}

impl VorbisCommentRecord {
	/// Get all values of `key`, ignoring key case.
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.entries
			.iter()
			.filter(move |(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v.as_str())
	}
}

/// A picture block
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PictureRecord {
	pub picture_type: PictureType,
	pub mime_type: MimeType,

	#[serde(default)]
	pub description: String,

	#[serde(default)]
	pub width: u32,

	#[serde(default)]
	pub height: u32,

	#[serde(default)]
	pub depth: u32,

	#[serde(default)]
	pub colors: u32,

	#[serde_as(as = "Base64")]
	pub data: Vec<u8>,
}

impl From<&FlacPictureBlock> for PictureRecord {
	fn from(value: &FlacPictureBlock) -> Self {
		Self {
			picture_type: value.picture_type,
			mime_type: value.mime.clone(),
			description: value.description.clone(),
			width: value.width,
			height: value.height,
			depth: value.bit_depth,
			colors: value.color_count,
			data: value.img_data.clone(),
		}
	}
}

impl From<&PictureRecord> for FlacPictureBlock {
	fn from(value: &PictureRecord) -> Self {
		Self {
			picture_type: value.picture_type,
			mime: value.mime_type.clone(),
			description: value.description.clone(),
			width: value.width,
			height: value.height,
			bit_depth: value.depth,
			color_count: value.colors,
			img_data: value.data.clone(),
		}
	}
}

/// A block we don't expose the contents of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueBlockRecord {
	/// The block's 7-bit type code
	pub type_code: u8,

	/// The length of this block's body, in bytes
	pub length: u64,
}

/// All the metadata in a flac stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
	/// Stream parameters, if a STREAMINFO block was found
	#[serde(default)]
	pub streaminfo: Option<StreamInfoRecord>,

	/// The stream's vorbis comment, if any
	#[serde(default)]
	pub vorbis_comment: Option<VorbisCommentRecord>,

	/// Every picture block, in stream order
	#[serde(default)]
	pub pictures: Vec<PictureRecord>,

	/// Blocks of other kinds, in stream order
	#[serde(default)]
	pub other_blocks: Vec<OpaqueBlockRecord>,
}

impl MetadataRecord {
	/// Add one block to this record.
	/// Singleton kinds replace any previous value.
	pub fn push_block(&mut self, block: &FlacBlock) {
		match block {
			FlacBlock::Streaminfo(s) => self.streaminfo = Some(s.into()),

			FlacBlock::VorbisComment(c) => {
				self.vorbis_comment = Some(VorbisCommentRecord {
					vendor: c.comment.vendor.to_string(),
					entries: c
						.comment
						.comments
						.iter()
						.map(|(k, v)| (k.to_string(), v.to_string()))
						.collect(),
				})
			}

			FlacBlock::Picture(p) => self.pictures.push(p.into()),

			FlacBlock::Padding(_)
			| FlacBlock::Application(_)
			| FlacBlock::SeekTable(_)
			| FlacBlock::CueSheet(_)
			| FlacBlock::Unknown(_)
			| FlacBlock::Malformed(_) => {
				let type_code = block.block_type().to_id();
				trace!(
					message = "Keeping opaque block",
					type_code,
					length = block.get_len()
				);

				self.other_blocks.push(OpaqueBlockRecord {
					type_code,
					length: block.get_len(),
				})
			}
		}
	}
}

/// Convert an ordered list of metadata blocks into a record.
pub fn blocks_to_record(blocks: &[FlacBlock]) -> MetadataRecord {
	let mut record = MetadataRecord::default();
	for b in blocks {
		record.push_block(b);
	}
	return record;
}

/// Convert a record into metadata blocks that may be written to a new stream.
///
/// This makes a vorbis comment block iff `record.vorbis_comment` is `Some`,
/// and one picture block for each picture. STREAMINFO and opaque blocks
/// are never produced.
pub fn record_to_blocks(record: &MetadataRecord) -> Vec<FlacBlock> {
	let mut out = Vec::new();

	if let Some(vc) = &record.vorbis_comment {
		out.push(FlacBlock::VorbisComment(FlacCommentBlock {
			comment: VorbisComment {
				vendor: vc.vendor.as_str().into(),
				comments: vc
					.entries
					.iter()
					.map(|(k, v)| (k.as_str().into(), v.as_str().into()))
					.collect(),
			},
		}));
	}

	for p in &record.pictures {
		out.push(FlacBlock::Picture(p.into()));
	}

	return out;
}
