use serde::Deserialize;
use std::{fmt::Display, str::FromStr};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trace => write!(f, "trace"),
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warn => write!(f, "warn"),
			Self::Error => write!(f, "error"),
		}
	}
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingPreset {
	#[default]
	Default,
	Verbose,
	Develop,
	Trace,
}

impl LoggingPreset {
	pub fn get_config(&self) -> LoggingConfig {
		match self {
			Self::Default => LoggingConfig {
				other: LogLevel::Warn,
				codec: LogLevel::Warn,

				cli: LogLevel::Info,
				decode: LogLevel::Info,
				encode: LogLevel::Info,
				audiofile: LogLevel::Warn,
			},

			Self::Verbose => LoggingConfig {
				other: LogLevel::Warn,
				codec: LogLevel::Warn,

				cli: LogLevel::Debug,
				decode: LogLevel::Debug,
				encode: LogLevel::Debug,
				audiofile: LogLevel::Info,
			},

			Self::Develop => LoggingConfig {
				other: LogLevel::Debug,
				codec: LogLevel::Warn,

				cli: LogLevel::Trace,
				decode: LogLevel::Debug,
				encode: LogLevel::Trace,
				audiofile: LogLevel::Debug,
			},

			Self::Trace => LoggingConfig {
				other: LogLevel::Trace,
				codec: LogLevel::Trace,

				cli: LogLevel::Trace,
				decode: LogLevel::Trace,
				encode: LogLevel::Trace,
				audiofile: LogLevel::Trace,
			},
		}
	}
}

pub struct LoggingConfig {
	other: LogLevel,
	codec: LogLevel,

	cli: LogLevel,
	decode: LogLevel,
	encode: LogLevel,
	audiofile: LogLevel,
}

impl LoggingConfig {
	fn directives(&self) -> String {
		[
			//
			// External codec crates
			//
			format!("symphonia_core={}", self.codec),
			format!("symphonia_bundle_flac={}", self.codec),
			format!("flacenc={}", self.codec),
			//
			// Our crates
			//
			format!("flacslice::decode={}", self.decode),
			format!("flacslice::encode={}", self.encode),
			format!("flacslice={}", self.decode),
			format!("flacslice_audiofile={}", self.audiofile),
			format!("flacslice_cli={}", self.cli),
			self.other.to_string(),
		]
		.join(",")
	}
}

impl From<LoggingConfig> for EnvFilter {
	fn from(value: LoggingConfig) -> Self {
		EnvFilter::from_str(&value.directives())
			.unwrap_or_else(|_| EnvFilter::new(value.other.to_string()))
	}
}
