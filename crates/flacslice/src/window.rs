//! Sample intervals and frame clipping.
//!
//! A decoder hands us whole frames. [`ResolvedInterval::clip_frame`] decides
//! which part of each frame we keep, and when we may stop decoding.

use serde::Serialize;
use std::ops::Range;

/// A requested range of inter-channel samples.
/// A `length` of zero means "to the end of the stream".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleInterval {
	/// The first sample we want
	pub start: u64,

	/// How many samples we want, or 0 for all
	pub length: u64,
}

impl SampleInterval {
	/// Make a new [`SampleInterval`]
	pub fn new(start: u64, length: u64) -> Self {
		Self { start, length }
	}

	/// Resolve this interval against a stream with `total_samples` samples.
	/// `total_samples == 0` means the stream length is unknown.
	pub fn resolve(&self, total_samples: u64) -> ResolvedInterval {
		if total_samples == 0 {
			return ResolvedInterval {
				start: self.start,
				end: (self.length != 0).then(|| self.start.saturating_add(self.length)),
			};
		}

		let start = self.start.min(total_samples);
		let end = if self.length == 0 {
			total_samples
		} else {
			self.start.saturating_add(self.length).min(total_samples)
		};

		return ResolvedInterval {
			start,
			end: Some(end.max(start)),
		};
	}
}

/// A [`SampleInterval`] with a known end.
/// Always satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedInterval {
	/// The first sample we keep
	pub start: u64,

	/// One past the last sample we keep.
	/// `None` if we keep everything until the stream ends.
	pub end: Option<u64>,
}

/// What to do with a decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
	/// This frame is outside the interval
	Skip,

	/// Keep this range of the frame and keep decoding
	AppendAndContinue(Range<usize>),

	/// Keep this range of the frame. The interval is complete.
	AppendAndStop(Range<usize>),
}

impl ResolvedInterval {
	/// The number of samples in this interval, if it is bounded
	pub fn len(&self) -> Option<u64> {
		self.end.map(|e| e - self.start)
	}

	/// True if this interval contains no samples
	pub fn is_empty(&self) -> bool {
		self.len() == Some(0)
	}

	/// True if decoding up to (but not including) `position`
	/// covers this entire interval.
	pub fn reached_end(&self, position: u64) -> bool {
		self.end.is_some_and(|e| position >= e)
	}

	/// How many samples (across all channels) we expect to keep.
	/// Zero if this interval is unbounded.
	pub fn capacity_hint(&self, channels: usize) -> usize {
		self.len()
			.and_then(|l| usize::try_from(l).ok())
			.map_or(0, |l| l.saturating_mul(channels))
	}

	/// Clip a frame of `n` samples starting at absolute sample `first`.
	/// Returned ranges index samples inside the frame.
	pub fn clip_frame(&self, first: u64, n: usize) -> FrameAction {
		let n64 = n as u64;
		let past_frame = first.saturating_add(n64);

		if n == 0 || past_frame <= self.start || self.reached_end(first) {
			return FrameAction::Skip;
		}

		// Both of these are smaller than `n`, so they fit in a usize.
		let head = usize::try_from(self.start.saturating_sub(first)).unwrap_or(n);
		let tail = match self.end {
			Some(e) if e < past_frame => usize::try_from(e - first).unwrap_or(n),
			_ => n,
		};

		if self.reached_end(past_frame) {
			return FrameAction::AppendAndStop(head..tail);
		} else {
			return FrameAction::AppendAndContinue(head..tail);
		}
	}
}
