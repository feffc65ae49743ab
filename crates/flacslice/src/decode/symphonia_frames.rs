use std::sync::Arc;
use symphonia::core::{
	audio::{AudioBufferRef, Signal},
	codecs::{Decoder, DecoderOptions},
	errors::Error as SymphoniaError,
	formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
	io::{MediaSource, MediaSourceStream},
	meta::MetadataOptions,
	probe::Hint,
};
use tracing::{debug, trace};

use super::{FrameSource, PlanarFrame, StreamFormat};
use crate::errors::{BitstreamError, InitError};

/// Opens a new reader at the start of a flac stream
pub type MediaOpener = Arc<dyn Fn() -> std::io::Result<Box<dyn MediaSource>> + Send + Sync>;

/// A [`FrameSource`] backed by symphonia's flac reader and decoder
pub struct SymphoniaFrames {
	opener: MediaOpener,
	reader: Box<dyn FormatReader>,
	decoder: Box<dyn Decoder>,
	track_id: u32,

	/// Symphonia scales samples to fill an i32.
	/// We shift them back by this many bits.
	shift: u32,

	/// Planes of the last decoded frame
	planes: Vec<Vec<i32>>,
}

impl SymphoniaFrames {
	fn open_reader(
		opener: &MediaOpener,
	) -> Result<(Box<dyn FormatReader>, Box<dyn Decoder>, u32), InitError> {
		let source = opener().map_err(InitError::Open)?;
		let stream = MediaSourceStream::new(source, Default::default());

		let mut hint = Hint::new();
		hint.with_extension("flac");

		let detected = symphonia::default::get_probe()
			.format(
				&hint,
				stream,
				&FormatOptions::default(),
				&MetadataOptions::default(),
			)
			.map_err(InitError::Codec)?;

		let reader = detected.format;
		let track = reader.default_track().ok_or(InitError::NoTrack)?;
		let track_id = track.id;

		let decoder = symphonia::default::get_codecs()
			.make(&track.codec_params, &DecoderOptions::default())
			.map_err(InitError::Codec)?;

		return Ok((reader, decoder, track_id));
	}

	/// Open a stream.
	/// `format` should come from the stream's STREAMINFO block.
	pub fn open(opener: MediaOpener, format: &StreamFormat) -> Result<Self, InitError> {
		let (reader, decoder, track_id) = Self::open_reader(&opener)?;
		debug!(message = "Opened frame decoder", track_id, ?format);

		Ok(Self {
			opener,
			reader,
			decoder,
			track_id,
			shift: u32::from(32u8.saturating_sub(format.bits_per_sample)),
			planes: Vec::new(),
		})
	}
}

impl FrameSource for SymphoniaFrames {
	fn seek(&mut self, sample: u64) -> Result<u64, BitstreamError> {
		let seeked = self
			.reader
			.seek(
				SeekMode::Accurate,
				SeekTo::TimeStamp {
					ts: sample,
					track_id: self.track_id,
				},
			)
			.map_err(BitstreamError::Seek)?;

		self.decoder.reset();
		return Ok(seeked.actual_ts);
	}

	fn rewind(&mut self) -> Result<(), BitstreamError> {
		let (reader, decoder, track_id) =
			Self::open_reader(&self.opener).map_err(|e| BitstreamError::Reopen(Box::new(e)))?;

		self.reader = reader;
		self.decoder = decoder;
		self.track_id = track_id;
		return Ok(());
	}

	fn next_frame(&mut self) -> Result<Option<PlanarFrame<'_>>, BitstreamError> {
		let packet = loop {
			let packet = match self.reader.next_packet() {
				Ok(p) => p,

				// This is how symphonia reports the end of a stream
				Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
					trace!(message = "Reached end of stream");
					return Ok(None);
				}

				// The track list changed. Flac streams have one track,
				// so there's nothing after this.
				Err(SymphoniaError::ResetRequired) => return Ok(None),

				Err(e) => return Err(BitstreamError::Read(e)),
			};

			if packet.track_id() == self.track_id {
				break packet;
			}
		};

		let decoded = self
			.decoder
			.decode(&packet)
			.map_err(BitstreamError::Decode)?;

		let AudioBufferRef::S32(buf) = decoded else {
			return Err(BitstreamError::SampleFormat);
		};

		let channels = buf.spec().channels.count();
		let shift = self.shift;
		self.planes.resize_with(channels, Vec::new);
		for (c, plane) in self.planes.iter_mut().enumerate() {
			plane.clear();
			plane.extend(buf.chan(c).iter().map(|s| s >> shift));
		}

		return Ok(Some(PlanarFrame {
			first_sample: packet.ts(),
			planes: &self.planes,
		}));
	}
}
