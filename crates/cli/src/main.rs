use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use flacslice::{
	api::{load, save, LoadOptions, SaveOptions},
	decode::{DecodeOutcome, DecodeState, StreamFormat},
	encode::SampleView,
	layout::AudioBuffer,
};
use flacslice_audiofile::record::MetadataRecord;
use flacslice_util::{load_env, LoadedEnv};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod config;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Print a flac file's format and metadata as json
	Info { file: PathBuf },

	/// Copy a range of samples and all tags into a new flac file
	Slice {
		input: PathBuf,
		output: PathBuf,

		/// The first sample to copy
		#[arg(long, default_value_t = 0)]
		start: u64,

		/// The number of samples to copy. 0 copies to the end.
		#[arg(long, default_value_t = 0)]
		length: u64,

		/// Compression level, 0 to 8
		#[arg(long)]
		level: Option<i64>,

		/// Don't check the output file
		#[arg(long)]
		no_verify: bool,
	},

	/// Print decoded samples as json
	Dump {
		file: PathBuf,

		/// The first sample to print
		#[arg(long, default_value_t = 0)]
		start: u64,

		/// The number of samples to print. 0 prints to the end.
		#[arg(long, default_value_t = 0)]
		length: u64,
	},
}

#[derive(Debug, Serialize)]
struct InfoOutput<'a> {
	format: &'a StreamFormat,
	metadata: &'a MetadataRecord,
}

#[derive(Debug, Serialize)]
struct DumpOutput<'a> {
	state: DecodeState,
	truncated: bool,
	frames_decoded: u64,
	channels: usize,
	frames: usize,

	/// Interleaved samples
	samples: &'a [i32],
}

#[expect(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	return Ok(());
}

fn load_range(path: &Path, start_sample: u64, num_samples: u64) -> Result<DecodeOutcome> {
	let outcome = load(
		path,
		&LoadOptions {
			start_sample,
			num_samples,
			metadata_only: false,
		},
	)
	.with_context(|| format!("could not load {}", path.display()))?;

	if outcome.is_truncated() {
		warn!(
			message = "Stream is corrupt, output is truncated",
			?path,
			frames_decoded = outcome.frames_decoded
		);
	}

	return Ok(outcome);
}

fn info_cmd(file: &Path) -> Result<()> {
	let outcome = load(
		file,
		&LoadOptions {
			metadata_only: true,
			..Default::default()
		},
	)
	.with_context(|| format!("could not load {}", file.display()))?;

	return print_json(&InfoOutput {
		format: &outcome.format,
		metadata: &outcome.metadata,
	});
}

fn slice_cmd(
	input: &Path,
	output: &Path,
	start: u64,
	length: u64,
	options: &SaveOptions,
) -> Result<()> {
	let outcome = load_range(input, start, length)?;
	let samples = outcome
		.samples
		.unwrap_or_else(|| AudioBuffer::empty(usize::from(outcome.format.channels)));

	let shape = samples.shape();
	save(
		output,
		&SampleView::new(&shape, &samples.samples[..]),
		Some(&outcome.metadata),
		&SaveOptions {
			sample_rate: outcome.format.sample_rate,
			bits_per_sample: outcome.format.bits_per_sample,
			..*options
		},
	)
	.with_context(|| format!("could not save {}", output.display()))?;

	info!(
		message = "Wrote slice",
		?input,
		?output,
		start,
		frames = samples.frames()
	);

	return Ok(());
}

fn dump_cmd(file: &Path, start: u64, length: u64) -> Result<()> {
	let outcome = load_range(file, start, length)?;
	let truncated = outcome.is_truncated();
	let samples = outcome
		.samples
		.unwrap_or_else(|| AudioBuffer::empty(usize::from(outcome.format.channels)));

	return print_json(&DumpOutput {
		state: outcome.state,
		truncated,
		frames_decoded: outcome.frames_decoded,
		channels: samples.channels,
		frames: samples.frames(),
		samples: &samples.samples,
	});
}

fn main() -> Result<()> {
	let cli = Args::parse();

	let config_res = match load_env::<CliConfig>() {
		Ok(x) => x,

		#[expect(clippy::print_stdout)]
		Err(err) => {
			println!("Error while loading .env: {err}");
			std::process::exit(1);
		}
	};

	let config = config_res.get_config().clone();

	tracing_subscriber::fmt()
		.with_env_filter(config.flacslice_loglevel.get_config())
		.without_time()
		.with_ansi(true)
		.init();

	// Do this now, logging wasn't available earlier
	match config_res {
		LoadedEnv::FoundFile { config, path } => {
			info!(message = "Loaded config from .env", ?path, ?config);
		}
		LoadedEnv::OnlyVars(config) => {
			info!(
				message = "No `.env` found, loaded config from environment",
				?config
			);
		}
	};

	match cli.command {
		Commands::Info { file } => info_cmd(&file)?,

		Commands::Slice {
			input,
			output,
			start,
			length,
			level,
			no_verify,
		} => {
			let options = SaveOptions {
				compression_level: level.unwrap_or(config.flacslice_compression_level),
				verify: config.flacslice_verify && !no_verify,
				..Default::default()
			};

			slice_cmd(&input, &output, start, length, &options)?
		}

		Commands::Dump {
			file,
			start,
			length,
		} => dump_cmd(&file, start, length)?,
	}

	return Ok(());
}
