//! Decode a range of samples from a flac stream.
//!
//! Metadata is read by [`flacslice_audiofile`]. Audio frames come from a
//! [`FrameSource`], which wraps an external frame decoder.

use flacslice_audiofile::{
	flac::blockread::{read_metablocks, FlacBlock},
	record::{blocks_to_record, MetadataRecord},
};
use serde::Serialize;
use std::{fs::File, io::BufReader, path::Path, sync::Arc};
use symphonia::core::{errors::Error as SymphoniaError, io::MediaSource};
use tracing::{debug, trace, warn};

use crate::{
	errors::{BitstreamError, InitError},
	layout::{extend_interleaved, AudioBuffer},
	window::{FrameAction, ResolvedInterval, SampleInterval},
};

mod symphonia_frames;
pub use symphonia_frames::{MediaOpener, SymphoniaFrames};

//
// MARK: Types
//

/// Stream parameters, as declared by a stream's STREAMINFO block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFormat {
	/// Number of channels, 1 to 8
	pub channels: u8,

	/// Bits per sample, 4 to 32
	pub bits_per_sample: u8,

	/// Samples per second, in Hz
	pub sample_rate: u32,

	/// Total inter-channel samples. Zero if unknown.
	pub total_samples: u64,
}

/// The state of a [`RangeDecoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodeState {
	/// We haven't read stream metadata yet
	AwaitingMetadata,

	/// We're decoding audio frames
	StreamingFrames,

	/// We reached the end of the stream, or didn't need to decode frames
	Completed,

	/// We stopped early, since the requested interval is complete
	Aborted,

	/// We stopped because of a bitstream error.
	/// Samples are truncated.
	Errored,
}

impl DecodeState {
	/// Is this a state decoding can end in?
	pub fn is_finished(&self) -> bool {
		matches!(self, Self::Completed | Self::Aborted | Self::Errored)
	}

	/// Is this [`DecodeState::Errored`]?
	pub fn is_errored(&self) -> bool {
		matches!(self, Self::Errored)
	}
}

/// A decoded audio frame, in planar layout
#[derive(Debug)]
pub struct PlanarFrame<'a> {
	/// The absolute index of this frame's first sample
	pub first_sample: u64,

	/// One plane per channel.
	/// All planes have the same length.
	pub planes: &'a [Vec<i32>],
}

impl PlanarFrame<'_> {
	/// The number of inter-channel samples in this frame
	pub fn len(&self) -> usize {
		self.planes.first().map_or(0, Vec::len)
	}

	/// True if this frame has no samples
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Something that produces decoded flac frames in stream order
pub trait FrameSource {
	/// Move to the frame that contains sample `sample`.
	/// Returns the first sample of that frame.
	fn seek(&mut self, sample: u64) -> Result<u64, BitstreamError>;

	/// Go back to the start of the stream
	fn rewind(&mut self) -> Result<(), BitstreamError>;

	/// Decode the next frame.
	/// Returns `None` at the end of the stream.
	fn next_frame(&mut self) -> Result<Option<PlanarFrame<'_>>, BitstreamError>;
}

/// The result of a decode
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
	/// Decoded samples.
	/// `None` if we only asked for metadata.
	pub samples: Option<AudioBuffer>,

	/// The stream's format
	pub format: StreamFormat,

	/// All metadata in this stream
	pub metadata: MetadataRecord,

	/// The state decoding ended in
	pub state: DecodeState,

	/// The number of frames the decoder produced
	pub frames_decoded: u64,
}

impl DecodeOutcome {
	/// If true, a bitstream error stopped decoding early.
	/// `samples` holds everything decoded before the error.
	pub fn is_truncated(&self) -> bool {
		self.state.is_errored()
	}
}

//
// MARK: RangeDecoder
//

/// Pulls frames from a [`FrameSource`] and keeps the samples
/// inside a [`ResolvedInterval`].
pub struct RangeDecoder<S: FrameSource> {
	source: S,
	channels: usize,
	interval: ResolvedInterval,
	state: DecodeState,
	frames_decoded: u64,

	// If true, STREAMINFO declares this stream's length,
	// and running out of frames early means it was cut.
	length_known: bool,

	// One past the last sample we've decoded
	position: u64,
}

impl<S: FrameSource> RangeDecoder<S> {
	/// Make a new decoder.
	/// Stream metadata must already be known.
	pub fn new(source: S, format: &StreamFormat, interval: ResolvedInterval) -> Self {
		Self {
			source,
			channels: usize::from(format.channels),
			interval,
			state: DecodeState::AwaitingMetadata,
			frames_decoded: 0,
			length_known: format.total_samples != 0,
			position: 0,
		}
	}

	/// The current state of this decoder
	pub fn state(&self) -> DecodeState {
		self.state
	}

	/// The number of frames this decoder has read
	pub fn frames_decoded(&self) -> u64 {
		self.frames_decoded
	}

	/// Get this decoder's frame source
	pub fn into_source(self) -> S {
		self.source
	}

	fn start(&mut self) -> Result<(), BitstreamError> {
		self.state = DecodeState::StreamingFrames;

		if self.interval.start == 0 {
			return Ok(());
		}

		match self.source.seek(self.interval.start) {
			Ok(at) => {
				debug!(
					message = "Seeked to frame",
					seek_to = self.interval.start,
					frame_start = at
				);
			}

			Err(error) => {
				warn!(
					message = "Seek failed, decoding from start of stream",
					seek_to = self.interval.start,
					%error
				);
				self.source.rewind()?;
			}
		}

		return Ok(());
	}

	/// Process one frame, and return the state we should move to.
	fn step(&mut self, out: &mut Vec<i32>) -> Result<DecodeState, BitstreamError> {
		let Some(frame) = self.source.next_frame()? else {
			if self.length_known && !self.interval.reached_end(self.position) {
				warn!(
					message = "Stream ended before its declared length",
					position = self.position,
					end = ?self.interval.end
				);
				return Ok(DecodeState::Errored);
			}

			return Ok(DecodeState::Completed);
		};
		self.frames_decoded += 1;

		if frame.planes.len() != self.channels {
			return Err(BitstreamError::ChannelMismatch {
				expected: self.channels,
				got: frame.planes.len(),
			});
		}

		let first = frame.first_sample;
		let n = frame.len();
		self.position = first.saturating_add(n as u64);
		let action = self.interval.clip_frame(first, n);
		trace!(message = "Read frame", first, n, ?action);

		match action {
			FrameAction::Skip => {}
			FrameAction::AppendAndContinue(range) => extend_interleaved(frame.planes, range, out)?,
			FrameAction::AppendAndStop(range) => {
				extend_interleaved(frame.planes, range, out)?;
				return Ok(DecodeState::Aborted);
			}
		}

		if self.interval.reached_end(self.position) {
			return Ok(DecodeState::Aborted);
		}

		return Ok(DecodeState::StreamingFrames);
	}

	/// Decode until the interval is complete, the stream ends,
	/// or we encounter a bitstream error.
	pub fn run(&mut self) -> AudioBuffer {
		let mut out = Vec::with_capacity(self.interval.capacity_hint(self.channels));

		if self.interval.is_empty() {
			self.state = DecodeState::Completed;
			return AudioBuffer {
				channels: self.channels,
				samples: out,
			};
		}

		if let Err(error) = self.start() {
			warn!(message = "Could not start decoding", %error);
			self.state = DecodeState::Errored;
		}

		while !self.state.is_finished() {
			self.state = match self.step(&mut out) {
				Ok(s) => s,
				Err(error) => {
					warn!(
						message = "Bitstream error, returning partial result",
						%error,
						frames_decoded = self.frames_decoded,
						samples_kept = out.len()
					);
					DecodeState::Errored
				}
			};
		}

		debug!(
			message = "Finished decoding",
			state = ?self.state,
			frames_decoded = self.frames_decoded,
			samples_kept = out.len()
		);

		return AudioBuffer {
			channels: self.channels,
			samples: out,
		};
	}
}

//
// MARK: Entry points
//

/// Read all metadata blocks from a stream and build its format
fn read_header(read: impl std::io::Read) -> Result<(StreamFormat, MetadataRecord), InitError> {
	let blocks = read_metablocks(read)?;

	let format = blocks
		.iter()
		.find_map(|b| match b {
			FlacBlock::Streaminfo(s) => Some(StreamFormat {
				channels: s.channels,
				bits_per_sample: s.bits_per_sample,
				sample_rate: s.sample_rate,
				total_samples: s.total_samples,
			}),
			_ => None,
		})
		.ok_or(InitError::NoStreaminfo)?;

	return Ok((format, blocks_to_record(&blocks)));
}

/// Decode a stream provided by `open`.
///
/// `open` may be called more than once,
/// and must return a new reader at the start of the stream each time.
pub fn decode_with<R, F>(
	open: F,
	interval: SampleInterval,
	metadata_only: bool,
) -> Result<DecodeOutcome, InitError>
where
	R: MediaSource + 'static,
	F: Fn() -> std::io::Result<R> + Send + Sync + 'static,
{
	let (format, metadata) = read_header(BufReader::new(open().map_err(InitError::Open)?))?;
	let resolved = interval.resolve(format.total_samples);

	debug!(
		message = "Read stream metadata",
		?format,
		?interval,
		?resolved,
		metadata_only
	);

	if metadata_only {
		return Ok(DecodeOutcome {
			samples: None,
			format,
			metadata,
			state: DecodeState::Completed,
			frames_decoded: 0,
		});
	}

	if resolved.is_empty() {
		return Ok(DecodeOutcome {
			samples: Some(AudioBuffer::empty(usize::from(format.channels))),
			format,
			metadata,
			state: DecodeState::Completed,
			frames_decoded: 0,
		});
	}

	let opener: MediaOpener =
		Arc::new(move || -> std::io::Result<Box<dyn MediaSource>> { Ok(Box::new(open()?)) });
	let source = match SymphoniaFrames::open(opener, &format) {
		Ok(x) => x,

		// Symphonia can't open a stream without audio frames
		Err(InitError::Codec(SymphoniaError::IoError(e)))
			if e.kind() == std::io::ErrorKind::UnexpectedEof =>
		{
			let state = if format.total_samples == 0 {
				DecodeState::Completed
			} else {
				warn!(
					message = "Stream has no audio frames",
					total_samples = format.total_samples
				);
				DecodeState::Errored
			};

			return Ok(DecodeOutcome {
				samples: Some(AudioBuffer::empty(usize::from(format.channels))),
				format,
				metadata,
				state,
				frames_decoded: 0,
			});
		}

		Err(e) => return Err(e),
	};
	let mut decoder = RangeDecoder::new(source, &format, resolved);
	let samples = decoder.run();

	return Ok(DecodeOutcome {
		samples: Some(samples),
		format,
		metadata,
		state: decoder.state(),
		frames_decoded: decoder.frames_decoded(),
	});
}

/// Decode the flac file at `path`
pub fn decode_file(
	path: &Path,
	interval: SampleInterval,
	metadata_only: bool,
) -> Result<DecodeOutcome, InitError> {
	let path = path.to_owned();
	return decode_with(move || File::open(&path), interval, metadata_only);
}

/// Decode a flac stream held in memory
pub fn decode_bytes(
	data: Arc<[u8]>,
	interval: SampleInterval,
	metadata_only: bool,
) -> Result<DecodeOutcome, InitError> {
	return decode_with(
		move || Ok(std::io::Cursor::new(data.clone())),
		interval,
		metadata_only,
	);
}
