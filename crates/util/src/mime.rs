use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use tracing::debug;

/// A media type, conveniently parsed
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, Clone, SerializeDisplay, DeserializeFromStr)]
pub enum MimeType {
	/// A mimetype we didn't recognize.
	/// This keeps the exact string we were given.
	Other(String),

	/// An empty mime string.
	/// Flac pictures may leave this blank.
	Empty,

	/// A flac picture that stores a url instead of image data.
	Url,

	/// An unstructured binary blob
	/// Use this whenever a mime type is unknown
	Blob,

	// Images
	Png,
	Jpg,
	Gif,
	Avif,
	Webp,
	Bmp,

	// Audio
	Flac,
}

impl FromStr for MimeType {
	// Must match `display` below, with exactly one string per variant.
	// Aliases like `image/jpg` stay `Other`.

	type Err = std::convert::Infallible;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"" => Self::Empty,
			"-->" => Self::Url,
			"application/octet-stream" => Self::Blob,
			"image/png" => Self::Png,
			"image/jpeg" => Self::Jpg,
			"image/gif" => Self::Gif,
			"image/avif" => Self::Avif,
			"image/webp" => Self::Webp,
			"image/bmp" => Self::Bmp,
			"audio/flac" => Self::Flac,
			_ => {
				debug!(message = "Encountered unknown mimetype", mime_string = s);
				Self::Other(s.into())
			}
		})
	}
}

impl Display for MimeType {
	/// Get a string representation of this mimetype.
	///
	/// The following always holds
	/// ```notrust
	/// // x: MimeType
	/// MimeType::from(x.to_string()) == x
	/// ```
	///
	/// So does this:
	/// ```notrust
	/// // y: &str
	/// MimeType::from(y).to_string() == y
	/// ```
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty => write!(f, ""),
			Self::Url => write!(f, "-->"),
			Self::Blob => write!(f, "application/octet-stream"),

			Self::Png => write!(f, "image/png"),
			Self::Jpg => write!(f, "image/jpeg"),
			Self::Gif => write!(f, "image/gif"),
			Self::Avif => write!(f, "image/avif"),
			Self::Webp => write!(f, "image/webp"),
			Self::Bmp => write!(f, "image/bmp"),

			Self::Flac => write!(f, "audio/flac"),
			Self::Other(x) => write!(f, "{}", x),
		}
	}
}

impl From<String> for MimeType {
	fn from(value: String) -> Self {
		match Self::from_str(&value) {
			Ok(x) => x,
			Err(x) => match x {},
		}
	}
}

impl From<&str> for MimeType {
	fn from(value: &str) -> Self {
		match Self::from_str(value) {
			Ok(x) => x,
			Err(x) => match x {},
		}
	}
}

impl MimeType {
	/// Try to guess a file's mime type from its extension.
	/// `ext` should NOT start with a dot.
	pub fn from_extension(ext: &str) -> Option<Self> {
		Some(match ext {
			"flac" => Self::Flac,
			"png" => Self::Png,
			"jpg" | "jpeg" => Self::Jpg,
			"gif" => Self::Gif,
			"avif" => Self::Avif,
			"webp" => Self::Webp,
			"bmp" => Self::Bmp,
			_ => {
				debug!(
					message = "Could not determine mime type from extension",
					extension = ext
				);
				return None;
			}
		})
	}
}
