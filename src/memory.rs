use async_openai::types::Role;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::WrapperRole;

/// A single message of the conversation.
///
/// Messages are immutable once built, the fields are only readable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
	role: WrapperRole,
	content: String,
	timestamp: String,
}

impl Message {
	pub fn assistant(content: impl Into<String>) -> Self {
		Self::new(Role::Assistant, content.into())
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self::new(Role::User, content.into())
	}

	fn new(role: Role, content: String) -> Self {
		Self {
			role: WrapperRole::Role(role),
			content,
			timestamp: chrono::Utc::now().to_rfc3339(),
		}
	}

	pub fn role(&self) -> &WrapperRole {
		&self.role
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	/// RFC 3339 creation time.
	pub fn timestamp(&self) -> &str {
		&self.timestamp
	}

	pub fn is_user(&self) -> bool {
		self.role == WrapperRole::Role(Role::User)
	}
}

/// Append-only conversation history.
///
/// Always holds at least the greeting it was created with. There is no size bound and nothing
/// is ever evicted, the history grows for as long as the owning session lives.
#[derive(Clone, Debug)]
pub struct ConversationMemory {
	greeting: String,
	messages: Vec<Message>,
}

impl ConversationMemory {
	pub fn new(greeting: impl Into<String>) -> Self {
		let greeting = greeting.into();
		let messages = vec![Message::assistant(greeting.clone())];

		Self { greeting, messages }
	}

	pub fn append(&mut self, message: Message) {
		trace!("Appending {:?} message to conversation", message.role());

		self.messages.push(message);
	}

	/// Every message in chronological order, greeting first.
	pub fn all(&self) -> &[Message] {
		&self.messages
	}

	/// Drops the whole history and seeds the greeting again.
	pub fn reset(&mut self) {
		self.messages.clear();
		self.messages.push(Message::assistant(self.greeting.clone()));
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	/// Whether no message is held. The greeting makes this false after `new` and `reset`.
	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_with_greeting() {
		let memory = ConversationMemory::new("Hi there");

		assert_eq!(memory.len(), 1);
		assert_eq!(memory.all()[0].content(), "Hi there");
		assert!(!memory.all()[0].is_user());
	}

	#[test]
	fn reset_keeps_only_greeting() {
		let mut memory = ConversationMemory::new("Hi there");
		memory.append(Message::user("one"));
		memory.append(Message::assistant("two"));
		memory.append(Message::user("three"));

		memory.reset();

		assert_eq!(memory.len(), 1);
		assert!(!memory.is_empty());
		assert_eq!(memory.all()[0].content(), "Hi there");
		assert_eq!(memory.all()[0].role(), &WrapperRole::Role(Role::Assistant));
	}

	#[test]
	fn append_after_reset_is_chronological() {
		let mut memory = ConversationMemory::new("greeting");
		memory.append(Message::user("stale"));
		memory.reset();

		memory.append(Message::user("Hi"));
		memory.append(Message::assistant("Hello"));

		let contents = memory.all().iter().map(Message::content).collect::<Vec<_>>();
		assert_eq!(contents, vec!["greeting", "Hi", "Hello"]);
		assert!(memory.all()[1].is_user());
		assert!(!memory.all()[2].is_user());
	}

	#[test]
	fn duplicates_are_kept() {
		let mut memory = ConversationMemory::new("greeting");
		memory.append(Message::user("same"));
		memory.append(Message::user("same"));

		assert_eq!(memory.len(), 3);
	}
}
