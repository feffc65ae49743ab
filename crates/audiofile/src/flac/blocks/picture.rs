use flacslice_util::MimeType;
use std::{
	fmt::Debug,
	io::{Cursor, Read},
};

use crate::{
	common::picturetype::PictureType,
	flac::errors::{FlacDecodeError, FlacEncodeError},
};

use super::{FlacMetablockDecode, FlacMetablockEncode, FlacMetablockHeader, FlacMetablockType};

/// A picture metablock in a flac file
#[derive(Clone, PartialEq, Eq)]
pub struct FlacPictureBlock {
	/// The type of this picture
	pub picture_type: PictureType,

	/// The format of this picture
	pub mime: MimeType,

	/// The description of this picture
	pub description: String,

	/// The width of this picture, in px
	pub width: u32,

	/// The height of this picture, in px
	pub height: u32,

	/// The bit depth of this picture
	pub bit_depth: u32,

	/// The color count of this picture (if indexed)
	pub color_count: u32,

	/// The image data
	pub img_data: Vec<u8>,
}

impl Debug for FlacPictureBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacPicture")
			.field("type", &self.picture_type)
			.field("mime", &self.mime)
			.field("img_len", &self.img_data.len())
			.finish()
	}
}

/// Read a big-endian length, then that many bytes.
#[expect(clippy::map_err_ignore)]
fn read_sized(d: &mut Cursor<&[u8]>) -> Result<Vec<u8>, FlacDecodeError> {
	let mut block = [0u8; 4];
	d.read_exact(&mut block)
		.map_err(|_| FlacDecodeError::MalformedBlock)?;

	let length =
		usize::try_from(u32::from_be_bytes(block)).map_err(|_| FlacDecodeError::MalformedBlock)?;
	let position = usize::try_from(d.position()).map_err(|_| FlacDecodeError::MalformedBlock)?;
	if length > d.get_ref().len().saturating_sub(position) {
		return Err(FlacDecodeError::MalformedBlock);
	}

	let mut out = vec![0u8; length];
	d.read_exact(&mut out)
		.map_err(|_| FlacDecodeError::MalformedBlock)?;
	return Ok(out);
}

#[expect(clippy::map_err_ignore)]
fn read_u32(d: &mut Cursor<&[u8]>) -> Result<u32, FlacDecodeError> {
	let mut block = [0u8; 4];
	d.read_exact(&mut block)
		.map_err(|_| FlacDecodeError::MalformedBlock)?;
	return Ok(u32::from_be_bytes(block));
}

#[expect(clippy::map_err_ignore)]
fn write_sized(target: &mut impl std::io::Write, data: &[u8]) -> Result<(), FlacEncodeError> {
	let len = u32::try_from(data.len()).map_err(|_| FlacEncodeError::FieldTooLong)?;
	target.write_all(&len.to_be_bytes())?;
	target.write_all(data)?;
	return Ok(());
}

impl FlacMetablockDecode for FlacPictureBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		let mut d = Cursor::new(data);

		let picture_type = PictureType::from_idx(read_u32(&mut d)?)?;

		// Image format
		let mime = String::from_utf8(read_sized(&mut d)?)?.into();

		// Image description
		let description = String::from_utf8(read_sized(&mut d)?)?;

		let width = read_u32(&mut d)?;
		let height = read_u32(&mut d)?;
		let bit_depth = read_u32(&mut d)?;

		// Color count for indexed images
		let color_count = read_u32(&mut d)?;

		let img_data = read_sized(&mut d)?;

		Ok(Self {
			picture_type,
			mime,
			description,
			width,
			height,
			bit_depth,
			color_count,
			img_data,
		})
	}
}

impl FlacMetablockEncode for FlacPictureBlock {
	fn get_len(&self) -> u64 {
		(4 + (4 + self.mime.to_string().len())
			+ (4 + self.description.len())
			+ 4 + 4 + 4 + 4
			+ (4 + self.img_data.len()))
		.try_into()
		.unwrap_or(u64::MAX)
	}

	fn encode(
		&self,
		is_last: bool,
		with_header: bool,
		target: &mut impl std::io::Write,
	) -> Result<(), FlacEncodeError> {
		if with_header {
			let header =
				FlacMetablockHeader::new(FlacMetablockType::Picture, self.get_len(), is_last)?;
			header.encode(target)?;
		}

		target.write_all(&self.picture_type.to_idx().to_be_bytes())?;

		write_sized(target, self.mime.to_string().as_bytes())?;
		write_sized(target, self.description.as_bytes())?;

		target.write_all(&self.width.to_be_bytes())?;
		target.write_all(&self.height.to_be_bytes())?;
		target.write_all(&self.bit_depth.to_be_bytes())?;
		target.write_all(&self.color_count.to_be_bytes())?;

		write_sized(target, &self.img_data)?;

		return Ok(());
	}
}

#[cfg(test)]
mod tests {
	use sha2::{Digest, Sha256};

	use super::*;

	fn test_picture() -> FlacPictureBlock {
		FlacPictureBlock {
			picture_type: PictureType::ABrightColoredFish,
			mime: MimeType::Other("image/x-fish".into()),
			description: "lorem".into(),
			width: 1920,
			height: 1080,
			bit_depth: 24,
			color_count: 0,
			img_data: (0..=255u8).cycle().take(10_000).collect(),
		}
	}

	#[test]
	fn picture_roundtrip() {
		let p = test_picture();

		let mut out = Vec::new();
		p.encode(true, true, &mut out).unwrap();
		assert_eq!(out.len() as u64, p.get_len() + 4);
		assert_eq!(out[0], 0x86);

		let d = FlacPictureBlock::decode(&out[4..]).unwrap();
		assert_eq!(d, p);

		let mut a = Sha256::new();
		a.update(&d.img_data);
		let mut b = Sha256::new();
		b.update(&p.img_data);
		assert_eq!(a.finalize(), b.finalize());
	}

	#[test]
	fn bad_lengths() {
		let p = test_picture();
		let mut out = Vec::new();
		p.encode(false, false, &mut out).unwrap();

		// Cut off the image data
		assert!(matches!(
			FlacPictureBlock::decode(&out[..out.len() - 1]),
			Err(FlacDecodeError::MalformedBlock)
		));

		// Claim a huge mime string
		let mut bad = out.clone();
		bad[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
		assert!(matches!(
			FlacPictureBlock::decode(&bad),
			Err(FlacDecodeError::MalformedBlock)
		));
	}

	#[test]
	fn bad_type() {
		let mut out = Vec::new();
		test_picture().encode(false, false, &mut out).unwrap();
		out[0..4].copy_from_slice(&99u32.to_be_bytes());
		assert!(matches!(
			FlacPictureBlock::decode(&out),
			Err(FlacDecodeError::PictureTypeError(_))
		));
	}
}
