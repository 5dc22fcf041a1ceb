use std::error::Error;

use clap::Parser;
use doc_chat::{Provider, SourceKind};
use repl::Repl;
use tracing::{info, Level};
use tracing_subscriber::fmt;

mod repl;

/// Chat with a web page, video transcript, PDF, CSV or text file.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
	/// Kind of the source to chat about.
	#[arg(value_enum)]
	source_kind: SourceKind,
	/// Url of the site or video, or path of the pdf, csv or text file.
	input: String,
	/// Hosted LLM provider.
	#[arg(long, value_enum, default_value = "openai")]
	provider: Provider,
	/// Model to use. Defaults to the first model of the provider.
	#[arg(long)]
	model: Option<String>,
	/// Api key of the provider. Asked for when missing.
	#[arg(long)]
	api_key: Option<String>,
	/// Log level
	#[arg(long, default_value = "warn")]
	log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let args = Args::parse();

	// Logs go to stderr so they never interleave with a streamed reply.
	let subscriber = fmt::Subscriber::builder()
		.with_max_level(args.log_level)
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	info!(task = "tracing_setup", result = "success", "tracing successfully set up");

	Repl::new(args)?.run().await
}
