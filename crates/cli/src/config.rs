use flacslice_util::logging::LoggingPreset;
use serde::Deserialize;

/// Note that the field of this struct are not capitalized.
/// Envy is case-insensitive, and expects Rust fields to be snake_case.
#[derive(Debug, Deserialize, Clone)]
pub struct CliConfig {
	/// The logging level to run with
	#[serde(default)]
	pub flacslice_loglevel: LoggingPreset,

	/// The compression level to encode with,
	/// if none is given on the command line.
	#[serde(default = "CliConfig::default_compression_level")]
	pub flacslice_compression_level: i64,

	/// If true, check every file we encode
	/// by decoding it again.
	#[serde(default = "CliConfig::default_verify")]
	pub flacslice_verify: bool,
}

impl CliConfig {
	fn default_compression_level() -> i64 {
		5
	}

	fn default_verify() -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use flacslice_util::from_vars;

	use super::*;

	#[test]
	fn defaults() {
		let config: CliConfig = from_vars(Vec::new()).unwrap();
		assert_eq!(config.flacslice_loglevel, LoggingPreset::Default);
		assert_eq!(config.flacslice_compression_level, 5);
		assert!(config.flacslice_verify);
	}

	#[test]
	fn from_env() {
		let config: CliConfig = from_vars(vec![
			("FLACSLICE_LOGLEVEL".to_owned(), "Develop".to_owned()),
			("FLACSLICE_COMPRESSION_LEVEL".to_owned(), "8".to_owned()),
			("FLACSLICE_VERIFY".to_owned(), "false".to_owned()),
		])
		.unwrap();

		assert_eq!(config.flacslice_loglevel, LoggingPreset::Develop);
		assert_eq!(config.flacslice_compression_level, 8);
		assert!(!config.flacslice_verify);
	}
}
