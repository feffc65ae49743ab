use flacenc::{
	bitsink::ByteSink,
	component::{BitRepr, MetadataBlockData},
	config,
	error::{Verified, Verify},
	source::MemSource,
};
use flacslice_audiofile::flac::{blockread::FlacBlock, blocks::FlacMetablockHeader};
use std::{io::Write, sync::Arc};
use tracing::{debug, trace};

use super::{CompressionLevel, PlanarEncoder};
use crate::{
	api::SaveOptions,
	decode::decode_bytes,
	errors::EncodeError,
	layout::planar_to_interleaved,
	window::SampleInterval,
};

/// Make a flacenc config for the given compression level
pub(super) fn make_config(
	level: CompressionLevel,
	options: &SaveOptions,
	channels: usize,
) -> Result<Verified<config::Encoder>, EncodeError> {
	if !(4..=24).contains(&options.bits_per_sample)
		|| !(1..=655_350).contains(&options.sample_rate)
		|| channels > 8
	{
		return Err(EncodeError::UnsupportedFormat {
			sample_rate: options.sample_rate,
			bits_per_sample: options.bits_per_sample,
			channels,
		});
	}

	let mut config = config::Encoder::default();
	config.block_size = level.block_size();

	config.stereo_coding.use_midside = level.use_midside();
	config.stereo_coding.use_leftside = level.use_midside();
	config.stereo_coding.use_rightside = level.use_midside();

	match level.lpc_order() {
		None => config.subframe_coding.use_lpc = false,
		Some(order) => {
			config.subframe_coding.use_lpc = true;
			config.subframe_coding.qlpc.lpc_order = order;
		}
	}

	return config
		.into_verified()
		.map_err(|(_, e)| EncodeError::Config(e.to_string()));
}

/// Compute the md5 signature flac stores in STREAMINFO.
/// Samples are hashed as interleaved little-endian integers,
/// each `ceil(bits_per_sample / 8)` bytes wide.
pub(crate) fn md5_digest(interleaved: &[i32], bits_per_sample: u8) -> [u8; 16] {
	let width = usize::from(bits_per_sample.div_ceil(8)).clamp(1, 4);
	let mut context = md5::Context::new();
	let mut buf = Vec::with_capacity(4096 * width);

	for chunk in interleaved.chunks(4096) {
		buf.clear();
		for s in chunk {
			buf.extend_from_slice(&s.to_le_bytes()[..width]);
		}
		context.consume(&buf);
	}

	return context.compute().0;
}

/// Find the first sample that doesn't fit in `bits_per_sample` signed bits
pub(crate) fn first_out_of_range(interleaved: &[i32], bits_per_sample: u8) -> Option<usize> {
	let bits = u32::from(bits_per_sample).clamp(1, 32);
	let max = (1i64 << (bits - 1)) - 1;
	let min = -(1i64 << (bits - 1));

	interleaved
		.iter()
		.position(|s| !(min..=max).contains(&i64::from(*s)))
}

/// A [`PlanarEncoder`] backed by `flacenc`.
///
/// The whole stream is encoded (and verified) in memory.
/// Nothing is written to `target` unless that succeeds.
pub struct FlacencEncoder<W: Write> {
	target: W,
	config: Verified<config::Encoder>,
	sample_rate: u32,
	bits_per_sample: u8,
	verify: bool,

	metadata: Vec<FlacBlock>,
	encoded: Option<Arc<[u8]>>,
	finished: bool,
}

impl<W: Write> FlacencEncoder<W> {
	/// Make a new encoder that writes to `target`
	pub fn new(target: W, config: Verified<config::Encoder>, options: &SaveOptions) -> Self {
		Self {
			target,
			config,
			sample_rate: options.sample_rate,
			bits_per_sample: options.bits_per_sample,
			verify: options.verify,

			metadata: Vec::new(),
			encoded: None,
			finished: false,
		}
	}

	/// Get this encoder's target
	pub fn into_inner(self) -> W {
		self.target
	}

	/// Decode `encoded` and make sure it matches `expected`
	fn verify(encoded: Arc<[u8]>, expected: &[i32]) -> Result<(), EncodeError> {
		let outcome = decode_bytes(encoded, SampleInterval::default(), false)
			.map_err(EncodeError::VerifyInit)?;

		if outcome.is_truncated() {
			return Err(EncodeError::VerifyTruncated);
		}

		let got = outcome.samples.map(|b| b.samples).unwrap_or_default();
		if got.len() != expected.len() {
			return Err(EncodeError::VerifyLength {
				expected: expected.len(),
				got: got.len(),
			});
		}

		if let Some(index) = got.iter().zip(expected).position(|(a, b)| a != b) {
			return Err(EncodeError::VerifyMismatch { index });
		}

		return Ok(());
	}
}

impl<W: Write> PlanarEncoder for FlacencEncoder<W> {
	fn attach_metadata(&mut self, blocks: Vec<FlacBlock>) {
		self.metadata = blocks;
	}

	fn process(&mut self, planes: &[Vec<i32>]) -> Result<(), EncodeError> {
		let channels = planes.len();
		let frames = planes.first().map_or(0, Vec::len);
		let interleaved = planar_to_interleaved(planes, frames)?;

		// flacenc never returns if it gets a sample it can't represent
		if let Some(index) = first_out_of_range(&interleaved, self.bits_per_sample) {
			return Err(EncodeError::SampleOutOfRange {
				index,
				bits_per_sample: self.bits_per_sample,
			});
		}

		let source = MemSource::from_samples(
			&interleaved,
			channels,
			usize::from(self.bits_per_sample),
			self.sample_rate as usize,
		);

		let mut stream =
			flacenc::encode_with_fixed_block_size(&self.config, source, self.config.block_size)
				.map_err(|e| EncodeError::Codec(e.to_string()))?;

		// flacenc takes the minimum block size from the last frame, which may be short.
		// The minimum must exclude the last frame.
		let block_size = self.config.block_size;
		let info = stream.stream_info_mut();
		info.set_md5_digest(&md5_digest(&interleaved, self.bits_per_sample));
		info.set_block_sizes(block_size, block_size)
			.map_err(|e| EncodeError::Codec(e.to_string()))?;

		for block in std::mem::take(&mut self.metadata) {
			let block_type = block.block_type();

			// Make sure this block fits in a metablock
			FlacMetablockHeader::new(block_type, block.get_len(), false)?;

			let mut body = Vec::new();
			block.encode(false, false, &mut body)?;
			trace!(message = "Attaching block", ?block_type, len = body.len());

			let data = MetadataBlockData::new_unknown(block_type.to_id(), &body)
				.map_err(|e| EncodeError::Codec(e.to_string()))?;
			stream.add_metadata_block(data);
		}

		let mut sink = ByteSink::new();
		stream
			.write(&mut sink)
			.map_err(|e| EncodeError::Codec(e.to_string()))?;
		let encoded: Arc<[u8]> = Arc::from(sink.as_slice());

		debug!(
			message = "Encoded stream",
			frames,
			channels,
			bytes = encoded.len()
		);

		if self.verify {
			Self::verify(encoded.clone(), &interleaved)?;
			debug!(message = "Verified stream", frames, channels);
		}

		self.encoded = Some(encoded);
		return Ok(());
	}

	fn finish(&mut self) -> Result<(), EncodeError> {
		if self.finished {
			return Ok(());
		}
		self.finished = true;

		if let Some(encoded) = self.encoded.take() {
			self.target.write_all(&encoded)?;
		}

		self.target.flush()?;
		return Ok(());
	}
}
