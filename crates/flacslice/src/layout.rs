//! Conversions between interleaved and planar sample layouts.
//!
//! Interleaved buffers are frame-major: all channels of sample 0,
//! then all channels of sample 1, and so on.
//! Planar buffers hold one contiguous array per channel.

use serde::Serialize;
use std::ops::Range;

use crate::errors::LayoutError;

/// An interleaved buffer of decoded samples.
/// Each sample is sign-extended into an `i32`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioBuffer {
	/// The number of channels in this buffer
	pub channels: usize,

	/// Interleaved samples.
	/// Always a multiple of `channels` long.
	pub samples: Vec<i32>,
}

impl AudioBuffer {
	/// Make an empty buffer
	pub fn empty(channels: usize) -> Self {
		Self {
			channels,
			samples: Vec::new(),
		}
	}

	/// The number of inter-channel samples in this buffer
	pub fn frames(&self) -> usize {
		self.samples.len().checked_div(self.channels).unwrap_or(0)
	}

	/// The shape of this buffer, as `[frames, channels]`
	pub fn shape(&self) -> [usize; 2] {
		[self.frames(), self.channels]
	}

	/// Get all channels of the `i`th sample
	pub fn frame(&self, i: usize) -> Option<&[i32]> {
		self.samples
			.get(i * self.channels..(i + 1) * self.channels)
			.filter(|_| self.channels != 0)
	}

	/// Split this buffer into one array per channel
	pub fn to_planar(&self) -> Result<Vec<Vec<i32>>, LayoutError> {
		interleaved_to_planar(&self.samples, self.channels)
	}
}

fn check_planes<T, P: AsRef<[T]>>(planes: &[P], frames: usize) -> Result<(), LayoutError> {
	if planes.is_empty() {
		return Err(LayoutError::NoChannels);
	}

	for (channel, p) in planes.iter().enumerate() {
		let len = p.as_ref().len();
		if len != frames {
			return Err(LayoutError::UnequalPlanes {
				channel,
				len,
				expected: frames,
			});
		}
	}

	return Ok(());
}

/// Split an interleaved buffer into `channels` planes
pub fn interleaved_to_planar<T: Copy>(
	buf: &[T],
	channels: usize,
) -> Result<Vec<Vec<T>>, LayoutError> {
	if channels == 0 {
		return Err(LayoutError::NoChannels);
	}

	if buf.len() % channels != 0 {
		return Err(LayoutError::RaggedBuffer {
			len: buf.len(),
			channels,
		});
	}

	let frames = buf.len().checked_div(channels).unwrap_or(0);
	let mut planes: Vec<Vec<T>> = (0..channels).map(|_| Vec::with_capacity(frames)).collect();

	for frame in buf.chunks_exact(channels) {
		for (plane, s) in planes.iter_mut().zip(frame) {
			plane.push(*s);
		}
	}

	return Ok(planes);
}

/// Merge `planes`, each `frames` samples long, into one interleaved buffer
pub fn planar_to_interleaved<T: Copy, P: AsRef<[T]>>(
	planes: &[P],
	frames: usize,
) -> Result<Vec<T>, LayoutError> {
	check_planes(planes, frames)?;

	let mut out = Vec::with_capacity(frames * planes.len());
	extend_interleaved(planes, 0..frames, &mut out)?;
	return Ok(out);
}

/// Interleave `range` of every plane onto the end of `out`.
/// All planes must have the same length.
pub fn extend_interleaved<T: Copy, P: AsRef<[T]>>(
	planes: &[P],
	range: Range<usize>,
	out: &mut Vec<T>,
) -> Result<(), LayoutError> {
	let frames = planes.first().map_or(0, |p| p.as_ref().len());
	check_planes(planes, frames)?;

	if range.start > range.end || range.end > frames {
		return Err(LayoutError::BadRange {
			start: range.start,
			end: range.end,
			len: frames,
		});
	}

	out.reserve(range.len() * planes.len());
	for i in range {
		for p in planes {
			out.push(p.as_ref()[i]);
		}
	}

	return Ok(());
}
