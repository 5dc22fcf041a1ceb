use std::path::Path;

use tracing::{error, trace};

use crate::types::{ChatError, Result};

/// Content of the UTF-8 text file at `path`, untouched.
pub(super) fn extract(path: &Path) -> Result<String> {
	trace!("Reading text file {}", path.display());

	let bytes = std::fs::read(path).map_err(|e| {
		error!("Failed to read {}: {}", path.display(), e);
		ChatError::DocumentExtraction(format!("failed to read text file: {}", e))
	})?;

	String::from_utf8(bytes).map_err(|e| {
		error!("{} is not valid UTF-8: {}", path.display(), e);
		ChatError::DocumentExtraction("text file is not valid UTF-8".to_string())
	})
}
