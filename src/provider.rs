//! Static registry of the hosted LLM providers and their selectable models.
use std::{fmt::Display, str::FromStr};

use clap::{builder::PossibleValue, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
	llm::{ChatModel, OpenAiCompatible},
	types::{ChatError, Result},
	Config,
};

/// Tokens are an LLM concept which represent normally a third of a word (or 75%).
pub type Tokens = usize;

/// The hosted providers that are available to use.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Provider {
	OpenAi,
	Groq,
}

/// Look up a provider by name.
pub fn resolve(name: &str) -> Result<Provider> {
	name.parse::<Provider>()
}

impl Provider {
	pub const ALL: [Provider; 2] = [Self::OpenAi, Self::Groq];

	/// Get the provider name.
	pub fn name(&self) -> &'static str {
		match self {
			Self::OpenAi => "OpenAi",
			Self::Groq => "Groq",
		}
	}

	/// Base url of the provider's OpenAI-compatible API.
	pub fn api_base(&self) -> &'static str {
		match self {
			Self::OpenAi => "https://api.openai.com/v1",
			Self::Groq => "https://api.groq.com/openai/v1",
		}
	}

	/// Model identifiers that can be selected for this provider.
	pub fn models(&self) -> &'static [&'static str] {
		match self {
			Self::OpenAi => &["gpt-4o-mini", "gpt-4o", "o1-preview", "o1-mini"],
			Self::Groq => &["llama-3.1-70b-versatile", "gemma2-9b-it", "mixtral-8x7b-32768"],
		}
	}

	/// Maximum number of tokens that can be processed at once by `model`.
	pub fn context_tokens(&self, model: &str) -> Option<Tokens> {
		match (self, model) {
			(Self::OpenAi, "gpt-4o-mini" | "gpt-4o" | "o1-preview" | "o1-mini") => Some(128_000),
			(Self::Groq, "llama-3.1-70b-versatile") => Some(131_072),
			(Self::Groq, "gemma2-9b-it") => Some(8_192),
			(Self::Groq, "mixtral-8x7b-32768") => Some(32_768),
			_ => None,
		}
	}

	/// Build a streaming chat client for `model` authenticated with `api_key`.
	///
	/// Fails with [`ChatError::ProviderInitialization`] for a blank key or a model this provider
	/// does not list.
	pub fn make_client<T: Config>(&self, model: &str, api_key: &str) -> Result<Box<dyn ChatModel>> {
		if api_key.trim().is_empty() {
			error!("Missing api key for {}", self);
			return Err(ChatError::ProviderInitialization(format!("missing api key for {}", self)))
		}

		if !self.models().contains(&model) {
			error!("Model {} is not offered by {}", model, self);
			return Err(ChatError::ProviderInitialization(format!(
				"model {} is not offered by {}, choose one of: {}",
				model,
				self,
				self.models().join(", ")
			)))
		}

		debug!("Building {} client for {}", self, model);

		Ok(Box::new(OpenAiCompatible::new(self.api_base(), api_key.trim(), model, T::TEMPERATURE)))
	}
}

impl Display for Provider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

impl FromStr for Provider {
	type Err = ChatError;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"openai" => Ok(Self::OpenAi),
			"groq" => Ok(Self::Groq),
			_ => Err(ChatError::UnknownProvider(s.to_string())),
		}
	}
}

/// Clap value enum implementation for argument parsing.
impl ValueEnum for Provider {
	fn value_variants<'a>() -> &'a [Self] {
		&Self::ALL
	}

	fn to_possible_value(&self) -> Option<PossibleValue> {
		Some(match self {
			Self::OpenAi => PossibleValue::new("openai"),
			Self::Groq => PossibleValue::new("groq"),
		})
	}
}
