use std::path::Path;

use tracing::{error, trace};

use crate::types::{ChatError, Result};

/// Renders every record of the CSV file at `path` as a block of `header: value` lines.
///
/// Blocks are separated by a blank line. Records longer than the header row are cut to the
/// header's width.
pub(super) fn extract(path: &Path) -> Result<String> {
	trace!("Reading csv file {}", path.display());

	let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path).map_err(|e| {
		error!("Failed to open csv {}: {}", path.display(), e);
		ChatError::DocumentExtraction(format!("failed to open csv: {}", e))
	})?;

	let headers = reader
		.headers()
		.map_err(|e| {
			error!("Failed to read csv headers from {}: {}", path.display(), e);
			ChatError::DocumentExtraction(format!("failed to read csv headers: {}", e))
		})?
		.clone();

	reader
		.records()
		.map(|record| {
			let record = record.map_err(|e| {
				error!("Bad csv record in {}: {}", path.display(), e);
				ChatError::DocumentExtraction(format!("bad csv record: {}", e))
			})?;

			Ok(headers
				.iter()
				.zip(record.iter())
				.map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
				.collect::<Vec<_>>()
				.join("\n"))
		})
		.collect::<Result<Vec<_>>>()
		.map(|blocks| blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn short_records_keep_their_fields() {
		let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
		write!(file, "a,b,c\n1,2\n4,5,6,7\n").unwrap();

		let text = extract(file.path()).unwrap();

		assert_eq!(text, "a: 1\nb: 2\n\na: 4\nb: 5\nc: 6");
	}

	#[test]
	fn header_only_is_empty() {
		let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
		write!(file, "a,b\n").unwrap();

		assert_eq!(extract(file.path()).unwrap(), "");
	}
}
