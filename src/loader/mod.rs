//! Document loading.
//!
//! A [`DocumentLoader`] turns a declared [`SourceKind`] and a [`DocumentInput`] into a single
//! text blob. URL sources are fetched directly, byte-stream sources are first written to a scoped
//! temporary file because the extraction routines work on paths.
use std::{
	fmt::{Debug, Display},
	io::{self, Read, Write},
	marker::PhantomData,
	path::{Path, PathBuf},
	str::FromStr,
	time::Duration,
};

use clap::{builder::PossibleValue, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace};

use crate::{
	types::{ChatError, Result},
	Config,
};

mod pdf;
pub mod site;
mod tabular;
mod text;
pub mod video;

/// The kinds of sources a document can be loaded from.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum SourceKind {
	Site,
	Video,
	Pdf,
	Csv,
	Text,
}

impl SourceKind {
	pub const ALL: [SourceKind; 5] = [Self::Site, Self::Video, Self::Pdf, Self::Csv, Self::Text];

	/// Get the kind name, as shown to users and embedded in the prompt.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Site => "Site",
			Self::Video => "Video",
			Self::Pdf => "Pdf",
			Self::Csv => "Csv",
			Self::Text => "Text",
		}
	}

	/// Whether the kind is loaded from a URL rather than from a byte stream.
	pub fn is_url(&self) -> bool {
		matches!(self, Self::Site | Self::Video)
	}

	/// Extension of the temporary file a byte-stream kind is written to.
	pub fn extension(&self) -> Option<&'static str> {
		match self {
			Self::Pdf => Some(".pdf"),
			Self::Csv => Some(".csv"),
			Self::Text => Some(".txt"),
			Self::Site | Self::Video => None,
		}
	}

	/// Extraction routine of a byte-stream kind.
	fn file_extractor(&self) -> Option<fn(&Path) -> Result<String>> {
		match self {
			Self::Pdf => Some(pdf::extract),
			Self::Csv => Some(tabular::extract),
			Self::Text => Some(text::extract),
			Self::Site | Self::Video => None,
		}
	}
}

impl Display for SourceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

impl FromStr for SourceKind {
	type Err = ChatError;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"site" => Ok(Self::Site),
			"video" | "youtube" => Ok(Self::Video),
			"pdf" => Ok(Self::Pdf),
			"csv" => Ok(Self::Csv),
			"text" | "txt" => Ok(Self::Text),
			_ => Err(ChatError::UnsupportedSourceKind(s.to_string())),
		}
	}
}

/// Clap value enum implementation for argument parsing.
impl ValueEnum for SourceKind {
	fn value_variants<'a>() -> &'a [Self] {
		&Self::ALL
	}

	fn to_possible_value(&self) -> Option<PossibleValue> {
		Some(match self {
			Self::Site => PossibleValue::new("site"),
			Self::Video => PossibleValue::new("video").alias("youtube"),
			Self::Pdf => PossibleValue::new("pdf"),
			Self::Csv => PossibleValue::new("csv"),
			Self::Text => PossibleValue::new("text").alias("txt"),
		})
	}
}

/// Raw input of a document: a URL for [`SourceKind::Site`] and [`SourceKind::Video`], a
/// readable byte stream for every other kind.
pub enum DocumentInput {
	Url(String),
	Bytes(Box<dyn Read + Send>),
}

impl DocumentInput {
	pub fn bytes(reader: impl Read + Send + 'static) -> Self {
		Self::Bytes(Box::new(reader))
	}
}

impl Debug for DocumentInput {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
			Self::Bytes(_) => f.write_str("Bytes(..)"),
		}
	}
}

/// Extracted text of a source along with its declared kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
	kind: SourceKind,
	content: String,
}

impl Document {
	pub fn new(kind: SourceKind, content: String) -> Self {
		Self { kind, content }
	}

	pub fn kind(&self) -> SourceKind {
		self.kind
	}

	pub fn content(&self) -> &str {
		&self.content
	}
}

/// Loads documents for a [`Config`].
///
/// Temporary files for byte-stream kinds are created in `temp_dir`, one per [`Self::load`] call,
/// and are gone by the time the call returns.
#[derive(Debug, Clone)]
pub struct DocumentLoader<T: Config> {
	temp_dir: PathBuf,
	_phantom: PhantomData<T>,
}

impl<T: Config> Default for DocumentLoader<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Config> DocumentLoader<T> {
	/// Loader using the system temporary directory.
	pub fn new() -> Self {
		Self::with_temp_dir(std::env::temp_dir())
	}

	pub fn with_temp_dir(temp_dir: impl Into<PathBuf>) -> Self {
		Self { temp_dir: temp_dir.into(), _phantom: PhantomData }
	}

	pub fn temp_dir(&self) -> &Path {
		&self.temp_dir
	}

	/// Extract the text of `input` according to `kind`.
	///
	/// Fails with [`ChatError::DocumentExtraction`] when the input does not match the kind, the
	/// extraction routine fails or it yields nothing but whitespace.
	#[instrument(skip(self), fields(temp_dir = %self.temp_dir.display()))]
	pub async fn load(&self, kind: SourceKind, input: DocumentInput) -> Result<Document> {
		let content = match (kind, input) {
			(SourceKind::Site, DocumentInput::Url(url)) =>
				site::extract(&self.http_client()?, &url).await?,
			(SourceKind::Video, DocumentInput::Url(url)) =>
				video::extract(&self.http_client()?, &url, T::TRANSCRIPT_LANGUAGES).await?,
			(kind, DocumentInput::Bytes(reader)) => self.load_file(kind, reader).await?,
			(kind, DocumentInput::Url(url)) => {
				error!("{} sources are uploaded files, got url {}", kind, url);
				return Err(ChatError::DocumentExtraction(format!(
					"{} sources must be uploaded as a file, not a url",
					kind
				)))
			},
		};

		if content.trim().is_empty() {
			error!("{} source yielded no text", kind);
			return Err(ChatError::DocumentExtraction(format!("no text found in {} source", kind)))
		}

		debug!("Loaded {} document with {} bytes of text", kind, content.len());

		Ok(Document::new(kind, content))
	}

	/// Parses `kind` before loading, for callers holding the kind as a plain string.
	pub async fn load_named(&self, kind: &str, input: DocumentInput) -> Result<Document> {
		let kind = kind.parse::<SourceKind>().map_err(|e| {
			error!("{}", e);
			e
		})?;

		self.load(kind, input).await
	}

	/// Runs the extractor of a byte-stream `kind` on `reader`.
	async fn load_file(&self, kind: SourceKind, reader: Box<dyn Read + Send>) -> Result<String> {
		let (Some(extension), Some(extract)) = (kind.extension(), kind.file_extractor()) else {
			error!("{} sources are urls, got a byte stream", kind);
			return Err(ChatError::DocumentExtraction(format!(
				"{} sources must be given as a url, not a file",
				kind
			)))
		};

		self.extract_via_temp_file(kind, extension, extract, reader).await
	}

	/// Materializes `reader` to a temporary file and runs `extract` on it.
	///
	/// Copy and extraction run on the blocking pool. The temporary file is owned by that task
	/// and dropped when it ends, whether the extractor returns or panics.
	async fn extract_via_temp_file(
		&self,
		kind: SourceKind,
		extension: &str,
		extract: fn(&Path) -> Result<String>,
		mut reader: Box<dyn Read + Send>,
	) -> Result<String> {
		let mut temp = tempfile::Builder::new()
			.prefix("doc-chat-")
			.suffix(extension)
			.tempfile_in(&self.temp_dir)
			.map_err(|e| {
				error!("Failed to create temporary file in {}: {}", self.temp_dir.display(), e);
				ChatError::DocumentExtraction(format!("failed to create temporary file: {}", e))
			})?;

		tokio::task::spawn_blocking(move || {
			let written = io::copy(&mut reader, temp.as_file_mut())
				.and_then(|written| temp.as_file_mut().flush().map(|_| written))
				.map_err(|e| {
					error!("Failed to write upload to {}: {}", temp.path().display(), e);
					ChatError::DocumentExtraction(format!("failed to read upload: {}", e))
				})?;

			trace!("Wrote {} bytes to {}", written, temp.path().display());

			extract(temp.path())
		})
		.await
		.map_err(|e| {
			error!("{} extraction task did not complete: {}", kind, e);
			ChatError::DocumentExtraction(format!("{} extraction aborted: {}", kind, e))
		})?
	}

	fn http_client(&self) -> Result<reqwest::Client> {
		reqwest::Client::builder()
			.user_agent(T::USER_AGENT)
			.timeout(Duration::from_secs(T::HTTP_TIMEOUT_SECS))
			.build()
			.map_err(|e| {
				error!("Failed to build http client: {}", e);
				ChatError::DocumentExtraction(format!("failed to build http client: {}", e))
			})
	}
}
