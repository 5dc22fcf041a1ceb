use std::{fmt::Debug, pin::Pin};

use async_openai::{
	config::OpenAIConfig,
	error::OpenAIError,
	types::{
		ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
		ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
		CreateChatCompletionRequestArgs, Role,
	},
	Client,
};
use async_trait::async_trait;
use futures::{future, Stream, StreamExt, TryStreamExt};
use tracing::{debug, error, instrument, trace};

use crate::types::{ChatError, Result, WrapperRole};

/// Lazy, single-pass sequence of reply fragments.
///
/// The consumer concatenates the fragments into the reply. Once an `Err` is yielded the reply is
/// unusable.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One message of a rendered prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptMessage {
	pub role: WrapperRole,
	pub content: String,
}

impl PromptMessage {
	pub fn new(role: Role, content: impl Into<String>) -> Self {
		Self { role: WrapperRole::Role(role), content: content.into() }
	}
}

/// A chat-completion client bound to one model and one credential.
#[async_trait]
pub trait ChatModel: Debug + Send + Sync {
	/// Identifier of the bound model.
	fn model(&self) -> &str;

	/// Start streaming the reply to `msgs`.
	///
	/// Errors raised before the first fragment (bad request, rejected credentials) are returned
	/// directly, later ones are yielded by the stream.
	async fn stream(&self, msgs: Vec<PromptMessage>) -> Result<ReplyStream>;
}

/// Client for any provider exposing the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAiCompatible {
	client: Client<OpenAIConfig>,
	api_base: String,
	model: String,
	temperature: Option<f32>,
}

impl Debug for OpenAiCompatible {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		// The client holds the api key, keep it out of logs.
		f.debug_struct("OpenAiCompatible")
			.field("api_base", &self.api_base)
			.field("model", &self.model)
			.field("temperature", &self.temperature)
			.finish()
	}
}

impl OpenAiCompatible {
	pub fn new(
		api_base: &str,
		api_key: &str,
		model: impl Into<String>,
		temperature: Option<f32>,
	) -> Self {
		let config = OpenAIConfig::new().with_api_base(api_base).with_api_key(api_key);

		Self {
			client: Client::with_config(config),
			api_base: api_base.to_string(),
			model: model.into(),
			temperature,
		}
	}

	/// Build the request messages to prompt the provider with.
	fn build_messages(msgs: Vec<PromptMessage>) -> Result<Vec<ChatCompletionRequestMessage>> {
		msgs.into_iter()
			.map(|msg| {
				let built: std::result::Result<ChatCompletionRequestMessage, OpenAIError> =
					match Role::from(msg.role) {
						Role::System => ChatCompletionRequestSystemMessageArgs::default()
							.content(msg.content)
							.build()
							.map(Into::into),
						Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
							.content(msg.content)
							.build()
							.map(Into::into),
						_ => ChatCompletionRequestUserMessageArgs::default()
							.content(msg.content)
							.build()
							.map(Into::into),
					};

				built.map_err(|e| {
					error!("Failed to build chat completion request message: {}", e);
					ChatError::StreamFailure(e.to_string())
				})
			})
			.collect()
	}
}

#[async_trait]
impl ChatModel for OpenAiCompatible {
	fn model(&self) -> &str {
		&self.model
	}

	#[instrument(skip(self, msgs), fields(model = %self.model, messages = msgs.len()))]
	async fn stream(&self, msgs: Vec<PromptMessage>) -> Result<ReplyStream> {
		let mut request = CreateChatCompletionRequestArgs::default();
		request.model(self.model.clone()).messages(Self::build_messages(msgs)?);

		if let Some(temperature) = self.temperature {
			request.temperature(temperature);
		}

		let request = request.build().map_err(|e| {
			error!("Failed to build chat completion request: {}", e);
			ChatError::StreamFailure(e.to_string())
		})?;

		trace!("Prompting {}", self.model);

		let response = self.client.chat().create_stream(request).await.map_err(|e| {
			error!("Failed to prompt {}: {}", self.model, e);
			ChatError::StreamFailure(e.to_string())
		})?;

		debug!("Reply stream opened for {}", self.model);

		let stream = response
			.map(|chunk| match chunk {
				Ok(chunk) => Ok(chunk
					.choices
					.into_iter()
					.filter_map(|choice| choice.delta.content)
					.collect::<String>()),
				Err(e) => {
					error!("Reply stream failed: {}", e);
					Err(ChatError::StreamFailure(e.to_string()))
				},
			})
			.try_filter(|fragment| future::ready(!fragment.is_empty()));

		Ok(Box::pin(stream))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_messages_keep_order_and_roles() {
		let msgs = OpenAiCompatible::build_messages(vec![
			PromptMessage::new(Role::System, "rules"),
			PromptMessage::new(Role::Assistant, "hello"),
			PromptMessage::new(Role::User, "question"),
		])
		.unwrap();

		assert_eq!(msgs.len(), 3);
		assert!(matches!(msgs[0], ChatCompletionRequestMessage::System(_)));
		assert!(matches!(msgs[1], ChatCompletionRequestMessage::Assistant(_)));
		assert!(matches!(msgs[2], ChatCompletionRequestMessage::User(_)));
	}

	#[test]
	fn debug_hides_api_key() {
		let client = OpenAiCompatible::new("https://api.example.com/v1", "sk-secret", "m", None);

		let debug = format!("{:?}", client);
		assert!(debug.contains("https://api.example.com/v1"));
		assert!(!debug.contains("sk-secret"));
	}
}
