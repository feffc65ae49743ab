//! Encode a sample buffer into a flac file.

use flacslice_audiofile::{
	flac::blockread::FlacBlock,
	record::{record_to_blocks, MetadataRecord},
};
use std::{fs::File, io::BufWriter, path::Path};
use tracing::{debug, warn};

use crate::{
	api::SaveOptions,
	errors::{CompressionLevelError, EncodeError, InitError, SaveError, ShapeError, TypeError},
	layout::interleaved_to_planar,
};

mod flacenc_encoder;
pub use flacenc_encoder::FlacencEncoder;

//
// MARK: Sample buffers
//

/// A borrowed slice of samples of any numeric type
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub enum SampleSlice<'a> {
	I8(&'a [i8]),
	I16(&'a [i16]),
	I32(&'a [i32]),
	I64(&'a [i64]),
	U8(&'a [u8]),
	U16(&'a [u16]),
	U32(&'a [u32]),
	U64(&'a [u64]),
	F32(&'a [f32]),
	F64(&'a [f64]),
}

macro_rules! sample_slice_from {
	( $( $variant:ident => $t:ty ),* ) => {
		$(
			impl<'a> From<&'a [$t]> for SampleSlice<'a> {
				fn from(value: &'a [$t]) -> Self {
					Self::$variant(value)
				}
			}
		)*
	};
}

sample_slice_from!(
	I8 => i8,
	I16 => i16,
	I32 => i32,
	I64 => i64,
	U8 => u8,
	U16 => u16,
	U32 => u32,
	U64 => u64,
	F32 => f32,
	F64 => f64
);

impl SampleSlice<'_> {
	/// The number of elements in this slice
	pub fn len(&self) -> usize {
		match self {
			Self::I8(x) => x.len(),
			Self::I16(x) => x.len(),
			Self::I32(x) => x.len(),
			Self::I64(x) => x.len(),
			Self::U8(x) => x.len(),
			Self::U16(x) => x.len(),
			Self::U32(x) => x.len(),
			Self::U64(x) => x.len(),
			Self::F32(x) => x.len(),
			Self::F64(x) => x.len(),
		}
	}

	/// True if this slice has no elements
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The name of this slice's element type
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::I8(_) => "i8",
			Self::I16(_) => "i16",
			Self::I32(_) => "i32",
			Self::I64(_) => "i64",
			Self::U8(_) => "u8",
			Self::U16(_) => "u16",
			Self::U32(_) => "u32",
			Self::U64(_) => "u64",
			Self::F32(_) => "f32",
			Self::F64(_) => "f64",
		}
	}

	/// Copy these samples into `i32`s.
	///
	/// Wider types are truncated to their low 32 bits.
	/// Floating-point samples are rejected.
	pub fn to_i32(&self) -> Result<Vec<i32>, TypeError> {
		Ok(match self {
			Self::I8(x) => x.iter().map(|s| i32::from(*s)).collect(),
			Self::I16(x) => x.iter().map(|s| i32::from(*s)).collect(),
			Self::I32(x) => x.to_vec(),
			Self::I64(x) => x.iter().map(|s| *s as i32).collect(),
			Self::U8(x) => x.iter().map(|s| i32::from(*s)).collect(),
			Self::U16(x) => x.iter().map(|s| i32::from(*s)).collect(),
			Self::U32(x) => x.iter().map(|s| *s as i32).collect(),
			Self::U64(x) => x.iter().map(|s| *s as i32).collect(),
			Self::F32(_) | Self::F64(_) => return Err(TypeError(self.type_name())),
		})
	}
}

/// A 2D sample buffer, shaped `[frames, channels]`
/// and stored in row-major (interleaved) order.
#[derive(Debug, Clone, Copy)]
pub struct SampleView<'a> {
	/// The shape of this buffer
	pub shape: &'a [usize],

	/// The samples in this buffer
	pub data: SampleSlice<'a>,
}

impl<'a> SampleView<'a> {
	/// Make a new view
	pub fn new(shape: &'a [usize], data: impl Into<SampleSlice<'a>>) -> Self {
		Self {
			shape,
			data: data.into(),
		}
	}

	/// Check this view's shape.
	/// Returns `(frames, channels)`.
	pub fn validate(&self) -> Result<(usize, usize), ShapeError> {
		let &[frames, channels] = self.shape else {
			return Err(ShapeError::Rank(self.shape.len()));
		};

		if channels == 0 {
			return Err(ShapeError::NoChannels);
		}

		let expected = frames.saturating_mul(channels);
		if self.data.len() != expected {
			return Err(ShapeError::LengthMismatch {
				expected,
				got: self.data.len(),
			});
		}

		return Ok((frames, channels));
	}
}

/// Keep the low `bits_per_sample` bits of each sample, sign-extended.
/// This is an `as` cast to a `bits_per_sample`-wide integer.
pub fn wrap_to_bits(samples: &mut [i32], bits_per_sample: u8) {
	let shift = 32u32.saturating_sub(u32::from(bits_per_sample));
	for s in samples {
		*s = (*s << shift) >> shift;
	}
}

//
// MARK: Compression
//

/// A flac compression level, from 0 (fastest) to 8 (smallest)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
	/// The largest compression level
	pub const MAX: u8 = 8;

	/// This level as an integer
	pub fn get(&self) -> u8 {
		self.0
	}

	/// The fixed block size used at this level
	pub fn block_size(&self) -> usize {
		if self.0 <= 2 {
			1152
		} else {
			4096
		}
	}

	/// The maximum LPC order at this level.
	/// `None` if this level only uses fixed predictors.
	pub fn lpc_order(&self) -> Option<usize> {
		match self.0 {
			0..=2 => None,
			3 => Some(6),
			4..=6 => Some(8),
			_ => Some(12),
		}
	}

	/// If true, try mid-side stereo at this level
	pub fn use_midside(&self) -> bool {
		self.0 >= 1
	}
}

impl Default for CompressionLevel {
	fn default() -> Self {
		Self(5)
	}
}

impl TryFrom<i64> for CompressionLevel {
	type Error = CompressionLevelError;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		u8::try_from(value)
			.ok()
			.filter(|x| *x <= Self::MAX)
			.map(Self)
			.ok_or(CompressionLevelError(value))
	}
}

//
// MARK: Encoder
//

/// An encoder that takes a whole planar buffer at once
pub trait PlanarEncoder {
	/// Take ownership of metadata blocks to write into the stream.
	/// Must be called before `process`.
	fn attach_metadata(&mut self, blocks: Vec<FlacBlock>);

	/// Encode every sample. `planes` has one array per channel.
	fn process(&mut self, planes: &[Vec<i32>]) -> Result<(), EncodeError>;

	/// Flush and close the output.
	/// This must be called even if `process` fails.
	fn finish(&mut self) -> Result<(), EncodeError>;
}

/// Encode `view` into a new flac file at `path`.
///
/// Everything that can be checked without touching the file system
/// is checked before `path` is created.
pub fn encode(
	path: &Path,
	view: &SampleView<'_>,
	options: &SaveOptions,
	metadata: Option<&MetadataRecord>,
) -> Result<(), SaveError> {
	let level = CompressionLevel::try_from(options.compression_level)?;
	let (frames, channels) = view.validate()?;
	let mut samples = view.data.to_i32()?;
	let encoder_config = flacenc_encoder::make_config(level, options, channels)?;
	wrap_to_bits(&mut samples, options.bits_per_sample);
	let planes = interleaved_to_planar(&samples, channels).map_err(EncodeError::from)?;
	drop(samples);

	let blocks = metadata.map(record_to_blocks).unwrap_or_default();

	debug!(
		message = "Encoding",
		?path,
		frames,
		channels,
		level = level.get(),
		n_blocks = blocks.len(),
		verify = options.verify
	);

	let file = File::create(path).map_err(InitError::CreateOutput)?;
	let mut encoder = FlacencEncoder::new(BufWriter::new(file), encoder_config, options);
	encoder.attach_metadata(blocks);

	let processed = encoder.process(&planes);
	let finished = encoder.finish();

	if let Err(error) = &processed {
		warn!(message = "Encoding failed, output is empty", ?path, %error);
	}

	processed?;
	finished?;
	return Ok(());
}
