use std::sync::Mutex;

use async_openai::types::Role;
use lazy_static::lazy_static;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::{error, trace};

use crate::{
	llm::PromptMessage,
	loader::{Document, SourceKind},
	memory::Message,
	provider::Tokens,
};

/// Text of a bot-challenge page, which a site fetch returns instead of the real content.
pub const CHALLENGE_MARKER: &str = "Just a moment...Enable JavaScript and cookies to continue";

lazy_static! {
	/// Encoder used to estimate prompt sizes. Exact counts differ slightly between models.
	static ref BPE: Mutex<Option<CoreBPE>> = Mutex::new(
		cl100k_base().map_err(|e| error!("Failed to load token encoder: {}", e)).ok()
	);
}

/// Prompt bound to one document: the fixed instructions with the document embedded, followed
/// by the conversation history and the new user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
	system: String,
}

impl PromptTemplate {
	/// Embed `text` and its source `kind` verbatim into the instructions.
	///
	/// Nothing is validated or truncated, a very large document produces a very large prompt.
	pub fn assemble(kind: SourceKind, text: &str) -> Self {
		let system = format!(
			"You are a friendly assistant called Chat Otimize.
You must not store or repeat sensitive information such as names, tax or identity document \
numbers, birth dates, addresses or any other data that identifies the people or companies found \
in the source or document shared with you.
You have access to the following information from a {kind} document:

####
{text}
####

Base your answers on the information provided.
Whenever there is a $ in your output, replace it with S.
If the document information is something like \"{marker}\", suggest that the user load Chat \
Otimize again.",
			kind = kind,
			text = text,
			marker = CHALLENGE_MARKER,
		);

		trace!("Assembled system prompt: {}", system);

		Self { system }
	}

	pub fn from_document(document: &Document) -> Self {
		Self::assemble(document.kind(), document.content())
	}

	/// The instructions with the document embedded.
	pub fn system(&self) -> &str {
		&self.system
	}

	/// Fill the history and user message slots.
	///
	/// Yields the instructions, then every history message in order, then `input`.
	pub fn render(&self, history: &[Message], input: &str) -> Vec<PromptMessage> {
		let mut msgs = Vec::with_capacity(history.len() + 2);

		msgs.push(PromptMessage::new(Role::System, self.system.clone()));
		msgs.extend(
			history
				.iter()
				.map(|msg| PromptMessage { role: msg.role().clone(), content: msg.content().to_string() }),
		);
		msgs.push(PromptMessage::new(Role::User, input));

		msgs
	}

	/// Estimated number of tokens in the instructions, `None` when no encoder is available.
	pub fn tokens(&self) -> Option<Tokens> {
		let bpe = BPE.lock().ok()?;

		bpe.as_ref().map(|bpe| bpe.encode_with_special_tokens(&self.system).len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::WrapperRole;

	#[test]
	fn embeds_kind_and_text() {
		let prompt = PromptTemplate::assemble(SourceKind::Text, "Hello world");

		assert!(prompt.system().contains("from a Text document"));
		assert!(prompt.system().contains("####\nHello world\n####"));
	}

	#[test]
	fn carries_the_fixed_instructions() {
		let prompt = PromptTemplate::assemble(SourceKind::Site, "anything");

		assert!(prompt.system().contains(CHALLENGE_MARKER));
		assert!(prompt.system().contains("replace it with S"));
		assert!(prompt.system().contains("birth dates"));
	}

	#[test]
	fn text_is_embedded_verbatim() {
		let text = "price: $10 {placeholder} ####\n\ttabs";
		let prompt = PromptTemplate::assemble(SourceKind::Csv, text);

		assert!(prompt.system().contains(text));
	}

	#[test]
	fn render_orders_system_history_input() {
		let prompt = PromptTemplate::assemble(SourceKind::Pdf, "doc");
		let history = vec![Message::assistant("greeting"), Message::user("Hi"), Message::assistant("Hello")];

		let msgs = prompt.render(&history, "next");

		assert_eq!(msgs.len(), 5);
		assert_eq!(msgs[0].role, WrapperRole::Role(Role::System));
		assert_eq!(msgs[0].content, prompt.system());
		assert_eq!(
			msgs[1..4].iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
			vec!["greeting", "Hi", "Hello"]
		);
		assert_eq!(msgs[2].role, WrapperRole::Role(Role::User));
		assert_eq!(msgs[4], PromptMessage::new(Role::User, "next"));
	}

	#[test]
	fn bigger_documents_cost_more_tokens() {
		let small = PromptTemplate::assemble(SourceKind::Text, "short");
		let big = PromptTemplate::assemble(SourceKind::Text, &"many words here ".repeat(200));

		assert!(small.tokens().unwrap() < big.tokens().unwrap());
	}
}
