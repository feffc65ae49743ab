use flacslice::{
	api::{load, save, LoadOptions, SaveOptions},
	decode::DecodeState,
	encode::SampleView,
	errors::{EncodeError, InitError, SaveError},
};
use flacslice_audiofile::{
	common::picturetype::PictureType,
	record::{MetadataRecord, PictureRecord, VorbisCommentRecord},
};
use flacslice_util::MimeType;
use paste::paste;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FRAMES: usize = 20_000;
const CHANNELS: usize = 2;

/// Make an interleaved random walk.
/// These compress like real audio.
fn random_signal(frames: usize, channels: usize, bits_per_sample: u8) -> Vec<i32> {
	let max = (1i32 << (bits_per_sample - 1)) - 1;
	let mut rng = rand::thread_rng();
	let mut x = vec![0i32; channels];
	let mut out = Vec::with_capacity(frames * channels);

	for _ in 0..frames {
		for c in x.iter_mut() {
			*c = (*c + rng.gen_range(-300..=300)).clamp(-max, max);
			out.push(*c);
		}
	}

	out
}

fn save_signal(dir: &TempDir, name: &str, data: &[i32]) -> PathBuf {
	let path = dir.path().join(name);
	save(
		&path,
		&SampleView::new(&[FRAMES, CHANNELS], data),
		None,
		&SaveOptions::default(),
	)
	.unwrap();
	path
}

fn load_range(path: &Path, start_sample: u64, num_samples: u64) -> flacslice::decode::DecodeOutcome {
	load(
		path,
		&LoadOptions {
			start_sample,
			num_samples,
			metadata_only: false,
		},
	)
	.unwrap()
}

fn tagged_record() -> MetadataRecord {
	MetadataRecord {
		vorbis_comment: Some(VorbisCommentRecord {
			vendor: "flacslice test".into(),
			entries: vec![
				("TITLE".into(), "Song".into()),
				("ARTIST".into(), "A".into()),
				("ARTIST".into(), "B".into()),
				("COMMENT".into(), "x=y".into()),
			],
		}),
		pictures: vec![PictureRecord {
			picture_type: PictureType::FrontCover,
			mime_type: MimeType::Png,
			description: "cover".into(),
			width: 16,
			height: 16,
			depth: 24,
			colors: 0,
			data: (0..5000u32).map(|x| (x % 251) as u8).collect(),
		}],
		..Default::default()
	}
}

#[test]
fn default_roundtrip() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert!(!out.is_truncated());
	assert_eq!(out.format.channels, 2);
	assert_eq!(out.format.bits_per_sample, 16);
	assert_eq!(out.format.sample_rate, 44100);
	assert_eq!(out.format.total_samples, FRAMES as u64);

	let samples = out.samples.unwrap();
	assert_eq!(samples.shape(), [FRAMES, CHANNELS]);
	assert_eq!(samples.samples, data);

	let streaminfo = out.metadata.streaminfo.unwrap();
	assert_eq!(streaminfo.total_samples, FRAMES as u64);
	assert!(out.metadata.vorbis_comment.is_none());
	assert!(out.metadata.pictures.is_empty());
}

#[test]
fn one_second_roundtrip() {
	// 44100 frames don't fill the last block at any level
	let dir = TempDir::new().unwrap();
	let data = random_signal(44_100, 2, 16);

	for (level, verify) in [(5, true), (0, true), (8, false)] {
		let path = dir.path().join(format!("{level}.flac"));
		save(
			&path,
			&SampleView::new(&[44_100, 2], &data[..]),
			None,
			&SaveOptions {
				compression_level: level,
				verify,
				..Default::default()
			},
		)
		.unwrap();

		let out = load(&path, &LoadOptions::default()).unwrap();
		assert!(!out.is_truncated());
		assert_eq!(out.format.total_samples, 44_100);
		assert_eq!(out.samples.unwrap().samples, data);

		let tail = load_range(&path, 44_000, 0);
		assert!(!tail.is_truncated());
		assert_eq!(tail.samples.unwrap().samples, data[88_000..]);
	}
}

#[test]
fn zero_frames() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("a.flac");
	let data: [i16; 0] = [];
	save(
		&path,
		&SampleView::new(&[0, 2], &data[..]),
		Some(&tagged_record()),
		&SaveOptions::default(),
	)
	.unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert!(!out.is_truncated());
	assert_eq!(out.state, DecodeState::Completed);
	assert_eq!(out.format.channels, 2);
	assert_eq!(out.format.total_samples, 0);
	assert_eq!(out.metadata.vorbis_comment, tagged_record().vorbis_comment);

	let samples = out.samples.unwrap();
	assert_eq!(samples.frames(), 0);
	assert_eq!(samples.channels, 2);
}

#[test]
fn out_of_range_samples_wrap() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("a.flac");
	let mut data = random_signal(8192, 2, 16);
	data[10] = 40_000;
	data[11] = -40_000;
	data[12] = 65_535;

	save(
		&path,
		&SampleView::new(&[8192, 2], &data[..]),
		None,
		&SaveOptions::default(),
	)
	.unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	let samples = out.samples.unwrap().samples;
	assert_eq!(samples[10..13], [-25_536, 25_536, -1]);
	assert_eq!(samples[..10], data[..10]);
	assert_eq!(samples[13..], data[13..]);
}

#[test]
fn roundtrip_without_verify() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(3000, 1, 16);
	let path = dir.path().join("a.flac");

	save(
		&path,
		&SampleView::new(&[3000, 1], &data[..]),
		None,
		&SaveOptions {
			verify: false,
			compression_level: 0,
			..Default::default()
		},
	)
	.unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert_eq!(out.samples.unwrap().samples, data);
}

#[test]
fn narrow_and_wide_inputs() {
	let dir = TempDir::new().unwrap();

	// 8-bit audio from i8 samples
	let data = random_signal(4000, 2, 8);
	let narrow: Vec<i8> = data.iter().map(|x| *x as i8).collect();
	let path = dir.path().join("8.flac");
	save(
		&path,
		&SampleView::new(&[4000, 2], &narrow[..]),
		None,
		&SaveOptions {
			bits_per_sample: 8,
			..Default::default()
		},
	)
	.unwrap();
	let out = load(&path, &LoadOptions::default()).unwrap();
	assert_eq!(out.format.bits_per_sample, 8);
	assert_eq!(out.samples.unwrap().samples, data);

	// 24-bit audio from i64 samples
	let data = random_signal(4000, 2, 24);
	let wide: Vec<i64> = data.iter().map(|x| i64::from(*x)).collect();
	let path = dir.path().join("24.flac");
	save(
		&path,
		&SampleView::new(&[4000, 2], &wide[..]),
		None,
		&SaveOptions {
			bits_per_sample: 24,
			sample_rate: 96000,
			..Default::default()
		},
	)
	.unwrap();
	let out = load(&path, &LoadOptions::default()).unwrap();
	assert_eq!(out.format.bits_per_sample, 24);
	assert_eq!(out.format.sample_rate, 96000);
	assert_eq!(out.samples.unwrap().samples, data);
}

//
// MARK: Ranges
//

/// A range decode must match the same slice of a full decode
fn check_range(start: u64, length: u64) {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);

	let out = load_range(&path, start, length);
	assert!(!out.is_truncated());

	let first = usize::try_from(start).unwrap().min(FRAMES);
	let last = if length == 0 {
		FRAMES
	} else {
		usize::try_from(start + length).unwrap().min(FRAMES)
	};

	let samples = out.samples.unwrap();
	assert_eq!(samples.channels, CHANNELS);
	assert_eq!(samples.frames(), last - first);
	assert_eq!(samples.samples, data[first * CHANNELS..last * CHANNELS]);
}

macro_rules! gen_range_tests {
	( $( $name:ident: ($start:expr, $length:expr) ),* ) => {
		$(
			paste! {
				#[test]
				fn [<range_ $name>]() {
					check_range($start, $length)
				}
			}
		)*
	};
}

gen_range_tests!(
	head: (0, 10),
	first_block: (0, 4096),
	across_blocks: (4000, 200),
	unaligned: (4097, 1000),
	to_end: (5000, 0),
	one_sample: (12_345, 1),
	overhang: (19_990, 100),
	last_sample: (19_999, 1)
);

#[test]
fn random_ranges() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);
	let mut rng = rand::thread_rng();

	for _ in 0..10 {
		let start = rng.gen_range(0..FRAMES);
		let length = rng.gen_range(1..=FRAMES - start);

		let out = load_range(&path, start as u64, length as u64);
		let samples = out.samples.unwrap();
		assert_eq!(
			samples.samples,
			data[start * CHANNELS..(start + length) * CHANNELS]
		);
	}
}

#[test]
fn start_at_or_past_end() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);

	for start in [FRAMES as u64, FRAMES as u64 + 1000] {
		let out = load_range(&path, start, 5);
		assert_eq!(out.state, DecodeState::Completed);
		assert_eq!(out.frames_decoded, 0);

		let samples = out.samples.unwrap();
		assert_eq!(samples.frames(), 0);
		assert_eq!(samples.channels, CHANNELS);
	}
}

#[test]
fn stops_early() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);

	let full = load(&path, &LoadOptions::default()).unwrap();
	let head = load_range(&path, 0, 100);

	assert_eq!(head.state, DecodeState::Aborted);
	assert_eq!(head.frames_decoded, 1);
	assert!(head.frames_decoded < full.frames_decoded);
}

#[test]
fn truncated_file() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = save_signal(&dir, "a.flac", &data);

	let bytes = std::fs::read(&path).unwrap();
	let cut = dir.path().join("cut.flac");
	std::fs::write(&cut, &bytes[..bytes.len() >> 1]).unwrap();

	// Missing frames are not an error. We get what we can decode.
	let out = load(&cut, &LoadOptions::default()).unwrap();
	assert!(out.is_truncated());
	assert_eq!(out.state, DecodeState::Errored);
	let samples = out.samples.unwrap();
	assert!(samples.frames() < FRAMES);
	assert_eq!(samples.samples, data[..samples.samples.len()]);
}

//
// MARK: Metadata
//

#[test]
fn metadata_only() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let path = dir.path().join("a.flac");
	let record = tagged_record();
	save(
		&path,
		&SampleView::new(&[FRAMES, CHANNELS], &data[..]),
		Some(&record),
		&SaveOptions::default(),
	)
	.unwrap();

	let full = load(&path, &LoadOptions::default()).unwrap();
	let meta = load(
		&path,
		&LoadOptions {
			metadata_only: true,
			..Default::default()
		},
	)
	.unwrap();

	assert!(meta.samples.is_none());
	assert_eq!(meta.frames_decoded, 0);
	assert_eq!(meta.format, full.format);
	assert_eq!(meta.metadata, full.metadata);
}

#[test]
fn tags_survive_roundtrip() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(5000, 1, 16);
	let path = dir.path().join("a.flac");
	let record = tagged_record();
	save(
		&path,
		&SampleView::new(&[5000, 1], &data[..]),
		Some(&record),
		&SaveOptions::default(),
	)
	.unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	let comments = out.metadata.vorbis_comment.unwrap();
	assert_eq!(comments, record.vorbis_comment.clone().unwrap());
	assert_eq!(comments.get_all("ARTIST").collect::<Vec<_>>(), ["A", "B"]);

	assert_eq!(out.metadata.pictures.len(), 1);
	let picture = &out.metadata.pictures[0];
	assert_eq!(picture.picture_type, PictureType::FrontCover);
	assert_eq!(picture.mime_type, MimeType::Png);
	assert_eq!(
		Sha256::digest(&picture.data),
		Sha256::digest(&record.pictures[0].data)
	);

	// Samples are untouched by metadata
	assert_eq!(out.samples.unwrap().samples, data);
}

/// The offset of the first copy of `needle` in `haystack`
fn find(haystack: &[u8], needle: &[u8]) -> usize {
	haystack
		.windows(needle.len())
		.position(|w| w == needle)
		.unwrap()
}

#[test]
fn bad_comment_entry_is_skipped() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(5000, 1, 16);
	let path = dir.path().join("a.flac");
	let mut record = tagged_record();
	record
		.vorbis_comment
		.as_mut()
		.unwrap()
		.entries
		.push(("ARTIST".into(), "ZZZZ".into()));
	save(
		&path,
		&SampleView::new(&[5000, 1], &data[..]),
		Some(&record),
		&SaveOptions::default(),
	)
	.unwrap();

	let mut bytes = std::fs::read(&path).unwrap();
	let at = find(&bytes, b"ARTIST=ZZZZ");
	bytes[at + 8] = 0xFF;
	std::fs::write(&path, &bytes).unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert_eq!(
		out.metadata.vorbis_comment,
		tagged_record().vorbis_comment,
		"only the bad entry should be dropped"
	);
	assert_eq!(out.metadata.pictures.len(), 1);
	assert_eq!(out.samples.unwrap().samples, data);
}

#[test]
fn bad_picture_is_opaque() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(5000, 1, 16);
	let path = dir.path().join("a.flac");
	let record = tagged_record();
	save(
		&path,
		&SampleView::new(&[5000, 1], &data[..]),
		Some(&record),
		&SaveOptions::default(),
	)
	.unwrap();

	// Picture type, then mime length, then mime
	let mut bytes = std::fs::read(&path).unwrap();
	let at = find(&bytes, b"image/png") - 8;
	assert_eq!(bytes[at..at + 4], [0, 0, 0, 3]);
	bytes[at..at + 4].fill(0xFF);
	std::fs::write(&path, &bytes).unwrap();

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert!(out.metadata.pictures.is_empty());
	assert_eq!(out.metadata.vorbis_comment, record.vorbis_comment);

	let opaque = out
		.metadata
		.other_blocks
		.iter()
		.find(|b| b.type_code == 6)
		.unwrap();
	assert!(opaque.length > 5000);
	assert_eq!(out.samples.unwrap().samples, data);
}

#[test]
fn mime_string_is_kept() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(1000, 1, 16);
	let path = dir.path().join("a.flac");
	let mut record = tagged_record();
	record.pictures[0].mime_type = MimeType::from("image/jpg");
	save(
		&path,
		&SampleView::new(&[1000, 1], &data[..]),
		Some(&record),
		&SaveOptions::default(),
	)
	.unwrap();

	let bytes = std::fs::read(&path).unwrap();
	assert!(bytes.windows(9).any(|w| w == b"image/jpg"));

	let out = load(&path, &LoadOptions::default()).unwrap();
	assert_eq!(out.metadata.pictures[0].mime_type.to_string(), "image/jpg");
	assert_eq!(out.metadata.pictures, record.pictures);
}

#[test]
fn slice_keeps_tags() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(FRAMES, CHANNELS, 16);
	let src = dir.path().join("src.flac");
	save(
		&src,
		&SampleView::new(&[FRAMES, CHANNELS], &data[..]),
		Some(&tagged_record()),
		&SaveOptions::default(),
	)
	.unwrap();

	let part = load_range(&src, 1000, 3000);
	let samples = part.samples.unwrap();
	let dst = dir.path().join("dst.flac");
	save(
		&dst,
		&SampleView::new(&samples.shape(), &samples.samples[..]),
		Some(&part.metadata),
		&SaveOptions::default(),
	)
	.unwrap();

	let out = load(&dst, &LoadOptions::default()).unwrap();
	assert_eq!(out.format.total_samples, 3000);
	assert_eq!(out.metadata.vorbis_comment, part.metadata.vorbis_comment);
	assert_eq!(out.metadata.pictures, part.metadata.pictures);
	assert_eq!(out.samples.unwrap().samples, data[2000..8000]);
}

//
// MARK: Errors
//

#[test]
fn missing_file() {
	let dir = TempDir::new().unwrap();
	let res = load(&dir.path().join("nothing.flac"), &LoadOptions::default());
	assert!(matches!(res, Err(InitError::Open(_))));
}

#[test]
fn not_a_flac_file() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("a.flac");
	std::fs::write(&path, b"RIFF....WAVEfmt ").unwrap();

	let res = load(&path, &LoadOptions::default());
	assert!(matches!(res, Err(InitError::Metadata(_))));
}

#[test]
fn bad_compression_level() {
	let dir = TempDir::new().unwrap();
	let data = random_signal(100, 1, 16);

	for level in [-1, 9, 100] {
		let path = dir.path().join(format!("{level}.flac"));
		let res = save(
			&path,
			&SampleView::new(&[100, 1], &data[..]),
			None,
			&SaveOptions {
				compression_level: level,
				..Default::default()
			},
		);

		assert!(matches!(res, Err(SaveError::Level(_))));
		assert!(!path.exists());
	}
}

#[test]
fn bad_buffers_make_no_file() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("a.flac");
	let data = [0i16; 10];

	let res = save(&path, &SampleView::new(&[10], &data[..]), None, &SaveOptions::default());
	assert!(matches!(res, Err(SaveError::Shape(_))));
	assert!(!path.exists());

	let res = save(&path, &SampleView::new(&[3, 3], &data[..]), None, &SaveOptions::default());
	assert!(matches!(res, Err(SaveError::Shape(_))));
	assert!(!path.exists());

	let floats = [0.5f32; 10];
	let res = save(&path, &SampleView::new(&[5, 2], &floats[..]), None, &SaveOptions::default());
	assert!(matches!(res, Err(SaveError::Type(_))));
	assert!(!path.exists());

	let res = save(
		&path,
		&SampleView::new(&[5, 2], &data[..]),
		None,
		&SaveOptions {
			bits_per_sample: 32,
			..Default::default()
		},
	);
	assert!(matches!(
		res,
		Err(SaveError::Encode(EncodeError::UnsupportedFormat { .. }))
	));
	assert!(!path.exists());
}

#[test]
fn unwritable_output() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("no_such_dir").join("a.flac");
	let data = random_signal(100, 1, 16);

	let res = save(&path, &SampleView::new(&[100, 1], &data[..]), None, &SaveOptions::default());
	assert!(matches!(res, Err(SaveError::Init(InitError::CreateOutput(_)))));
}
