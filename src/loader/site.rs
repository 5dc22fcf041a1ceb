use scraper::{Html, Node};
use tracing::{debug, error, instrument, warn};

use crate::types::{ChatError, Result};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "template"];

/// Fetch `url` and return the text of the page.
///
/// Error statuses are not rejected as long as there is a body to read. Bot challenges answer
/// with 403 or 503 and their text still has to reach the prompt.
#[instrument(skip(client))]
pub(super) async fn extract(client: &reqwest::Client, url: &str) -> Result<String> {
	let res = client.get(url).send().await.map_err(|e| {
		error!("Failed to fetch {}: {}", url, e);
		ChatError::DocumentExtraction(format!("failed to fetch site: {}", e))
	})?;

	if !res.status().is_success() {
		warn!("{} answered {}, reading the page anyway", url, res.status());
	}

	let html = res.text().await.map_err(|e| {
		error!("Failed to read body of {}: {}", url, e);
		ChatError::DocumentExtraction(format!("failed to read site: {}", e))
	})?;

	debug!("Fetched {} bytes of html from {}", html.len(), url);

	Ok(html_to_text(&html))
}

/// Text of an html document, title and `noscript` fallbacks included, one line per non-blank
/// text node with inner whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
	text_lines(&Html::parse_document(html)).join("\n")
}

fn text_lines(document: &Html) -> Vec<String> {
	let mut lines = vec![];

	for node in document.root_element().descendants() {
		let Node::Text(text) = node.value() else { continue };

		let hidden = node.ancestors().any(|ancestor| {
			ancestor.value().as_element().is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
		});
		if hidden {
			continue
		}

		let in_noscript = node.parent().is_some_and(|parent| {
			parent.value().as_element().is_some_and(|el| el.name() == "noscript")
		});

		if in_noscript {
			// Parsed with scripting on, so the content is raw markup.
			lines.extend(text_lines(&Html::parse_fragment(text)));
			continue
		}

		let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
		if !line.is_empty() {
			lines.push(line);
		}
	}

	lines
}

#[cfg(test)]
mod tests {
	use tokio::{
		io::{AsyncReadExt, AsyncWriteExt},
		net::TcpListener,
	};

	use super::*;

	const CHALLENGE_PAGE: &str = r#"<!DOCTYPE html><html lang="en-US"><head><title>Just a moment...</title><meta http-equiv="Content-Type" content="text/html; charset=UTF-8"><meta name="robots" content="noindex,nofollow"><style>*{box-sizing:border-box;margin:0;padding:0}</style><script>(function(){window._cf_chl_opt={cvId:'3',cType:'managed'};})();</script></head><body class="no-js"><div class="main-wrapper" role="main"><div class="main-content"><noscript><div class="h2"><span id="challenge-error-text">Enable JavaScript and cookies to continue</span></div></noscript></div></div><script>(function(){var a=document.createElement('script');})();</script></body></html>"#;

	#[test]
	fn skips_scripts_and_styles() {
		let html = r#"<!doctype html>
			<html>
				<head><title>Planos</title><style>p { color: red }</style></head>
				<body>
					<h1>Plano   de saúde</h1>
					<script>var x = "hidden";</script>
					<p>Consultas e <b>exames</b> inclusos.</p>
					<template><p>Not rendered</p></template>
				</body>
			</html>"#;

		assert_eq!(html_to_text(html), "Planos\nPlano de saúde\nConsultas e\nexames\ninclusos.");
	}

	#[test]
	fn challenge_page_keeps_title_and_noscript_text() {
		assert_eq!(
			html_to_text(CHALLENGE_PAGE),
			"Just a moment...\nEnable JavaScript and cookies to continue"
		);
	}

	#[test]
	fn empty_page_is_empty() {
		assert_eq!(html_to_text("<html><body>   </body></html>"), "");
	}

	#[tokio::test]
	async fn challenge_status_still_yields_text() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			let (mut socket, _) = listener.accept().await.unwrap();
			let mut buf = [0u8; 4096];
			let _ = socket.read(&mut buf).await.unwrap();

			let res = format!(
				"HTTP/1.1 403 Forbidden\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
				CHALLENGE_PAGE.len(),
				CHALLENGE_PAGE
			);
			socket.write_all(res.as_bytes()).await.unwrap();
		});

		let client = reqwest::Client::builder().no_proxy().build().unwrap();
		let text = extract(&client, &format!("http://{}/", addr)).await.unwrap();

		assert!(text.contains("Just a moment..."));
		assert!(text.contains("Enable JavaScript and cookies to continue"));
	}
}
