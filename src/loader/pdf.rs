use std::path::Path;

use tracing::{error, trace};

use crate::types::{ChatError, Result};

/// Text of every page of the PDF at `path`.
pub(super) fn extract(path: &Path) -> Result<String> {
	trace!("Extracting pdf text from {}", path.display());

	pdf_extract::extract_text(path).map_err(|e| {
		error!("Failed to extract pdf text from {}: {}", path.display(), e);
		ChatError::DocumentExtraction(format!("unreadable pdf: {}", e))
	})
}
