use tracing::{debug, info, instrument, warn};

use crate::{
	llm::{ChatModel, ReplyStream},
	loader::{DocumentInput, DocumentLoader, SourceKind},
	memory::Message,
	prompt::PromptTemplate,
	provider::{resolve, Provider},
	types::Result,
	Config,
};

/// Everything needed to start a chat, as collected by the presentation layer.
#[derive(Debug)]
pub struct SessionRequest {
	pub provider: String,
	pub model: String,
	pub api_key: String,
	pub source_kind: String,
	pub input: DocumentInput,
}

/// A prompt with one embedded document, bound to a provider client.
///
/// Sessions are never modified, loading another document means creating another session.
#[derive(Debug)]
pub struct ChatSession {
	prompt: PromptTemplate,
	model: Box<dyn ChatModel>,
}

impl ChatSession {
	/// Load the requested document and bind its prompt to a new client.
	///
	/// The provider, model and credential are checked before the document is fetched so that a
	/// typo does not cost a download.
	#[instrument(skip_all, fields(provider = %request.provider, model = %request.model, kind = %request.source_kind))]
	pub async fn create<T: Config>(loader: &DocumentLoader<T>, request: SessionRequest) -> Result<Self> {
		let provider = resolve(&request.provider)?;
		let kind = request.source_kind.parse::<SourceKind>()?;
		let model = provider.make_client::<T>(&request.model, &request.api_key)?;

		let document = loader.load(kind, request.input).await?;
		let prompt = PromptTemplate::from_document(&document);

		warn_on_oversized_prompt(&prompt, provider, &request.model);

		info!("Chat session ready with {} document on {} {}", kind, provider, request.model);

		Ok(Self::from_parts(prompt, model))
	}

	/// Bind an already assembled prompt to any [`ChatModel`].
	pub fn from_parts(prompt: PromptTemplate, model: Box<dyn ChatModel>) -> Self {
		Self { prompt, model }
	}

	pub fn prompt(&self) -> &PromptTemplate {
		&self.prompt
	}

	/// Identifier of the bound model.
	pub fn model(&self) -> &str {
		self.model.model()
	}

	/// Stream the reply to `message` given the prior `history`.
	pub async fn stream(&self, message: &str, history: &[Message]) -> Result<ReplyStream> {
		debug!("Streaming reply with {} history messages", history.len());

		self.model.stream(self.prompt.render(history, message)).await
	}
}

/// The document is embedded as-is, an oversized one only shows up as a provider error, so warn
/// ahead of time.
fn warn_on_oversized_prompt(prompt: &PromptTemplate, provider: Provider, model: &str) {
	if let (Some(tokens), Some(max)) = (prompt.tokens(), provider.context_tokens(model)) {
		debug!("System prompt uses about {} of {} tokens", tokens, max);

		if tokens > max {
			warn!(
				"System prompt has about {} tokens which exceeds the {} token context of {} {}",
				tokens, max, provider, model
			);
		}
	}
}
