use std::fmt::Display;

use async_openai::types::Role;
use serde::{Deserialize, Serialize};

pub const SYSTEM_ROLE: &str = "system";
pub const ASSISTANT_ROLE: &str = "assistant";
pub const USER_ROLE: &str = "user";

/// Wrapped [`Role`] for custom implementations.
///
/// Conversation memory only ever stores [`Role::Assistant`] and [`Role::User`] messages, the
/// system role is reserved for the rendered prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WrapperRole {
	Role(Role),
}

impl Default for WrapperRole {
	fn default() -> Self {
		Self::Role(Role::User)
	}
}

impl From<WrapperRole> for Role {
	fn from(role: WrapperRole) -> Self {
		match role {
			WrapperRole::Role(role) => role,
		}
	}
}

impl From<&WrapperRole> for &'static str {
	fn from(role: &WrapperRole) -> Self {
		match role {
			WrapperRole::Role(Role::System) => SYSTEM_ROLE,
			WrapperRole::Role(Role::Assistant) => ASSISTANT_ROLE,
			WrapperRole::Role(Role::User) => USER_ROLE,
			WrapperRole::Role(_) => USER_ROLE,
		}
	}
}

/// Every way a chat turn, a session initialization or a document load can fail.
///
/// None of these are retried, they are all surfaced to whoever drives the [`crate::SessionContext`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
	/// The declared source kind is not one of [`crate::SourceKind`].
	UnsupportedSourceKind(String),
	/// The provider name is not in the registry.
	UnknownProvider(String),
	/// Bad credentials or model identifier while building the provider client.
	ProviderInitialization(String),
	/// A message was sent before any session was created.
	SessionNotInitialized,
	/// The extraction routine failed or returned nothing usable.
	DocumentExtraction(String),
	/// Network or provider error while the reply was streaming.
	StreamFailure(String),
	/// The caller cancelled the reply stream.
	Cancelled,
}

impl Display for ChatError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UnsupportedSourceKind(kind) => write!(f, "Unsupported source kind: {}", kind),
			Self::UnknownProvider(name) => write!(f, "Unknown provider: {}", name),
			Self::ProviderInitialization(msg) =>
				write!(f, "Failed to initialize provider client: {}", msg),
			Self::SessionNotInitialized =>
				write!(f, "No chat session, load a document and start the chat first"),
			Self::DocumentExtraction(msg) => write!(f, "Failed to extract document: {}", msg),
			Self::StreamFailure(msg) => write!(f, "Reply stream failed: {}", msg),
			Self::Cancelled => write!(f, "Reply stream cancelled"),
		}
	}
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn role_names() {
		assert_eq!(<&'static str>::from(&WrapperRole::Role(Role::Assistant)), ASSISTANT_ROLE);
		assert_eq!(<&'static str>::from(&WrapperRole::default()), USER_ROLE);
	}

	#[test]
	fn errors_render_for_users() {
		assert_eq!(
			ChatError::UnknownProvider("ProviderA".into()).to_string(),
			"Unknown provider: ProviderA"
		);
		assert!(ChatError::SessionNotInitialized.to_string().contains("start the chat"));
	}
}
