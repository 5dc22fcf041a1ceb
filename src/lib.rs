//! Chat with a single document through a hosted LLM.
//!
//! A document (web page, video transcript, PDF, CSV or text file) is loaded once, its text is
//! embedded verbatim into a system prompt and every user turn streams a reply from the selected
//! provider, with the conversation history kept in memory for the lifetime of the
//! [`SessionContext`].
//!
//! The pieces, leaves first:
//!
//! - [`DocumentLoader`] turns a [`SourceKind`] and a [`DocumentInput`] into a [`Document`].
//! - [`Provider`] is the static registry of hosted providers and their models, and builds the
//!   [`ChatModel`] client for one of them.
//! - [`PromptTemplate`] embeds the document into the fixed instructions.
//! - [`ChatSession`] binds a prompt to a client.
//! - [`ConversationMemory`] is the append-only history, seeded with a greeting.
//! - [`SessionContext`] owns all of the above for one user and drives each turn.
//!
//! Tunables that do not change at runtime are supplied through the [`Config`] trait.
//!
//! # Example
//!
//! ```ignore
//! use doc_chat::{DefaultConfig, DocumentInput, SessionContext, SessionRequest};
//!
//! #[tokio::main]
//! async fn main() -> doc_chat::Result<()> {
//!     let mut ctx = SessionContext::<DefaultConfig>::new();
//!
//!     ctx.initialize(SessionRequest {
//!         provider: "Groq".to_string(),
//!         model: "gemma2-9b-it".to_string(),
//!         api_key: "gsk_...".to_string(),
//!         source_kind: "Site".to_string(),
//!         input: DocumentInput::Url("https://example.com".to_string()),
//!     })
//!     .await?;
//!
//!     let reply = ctx
//!         .send("What is this page about?".to_string(), None, |chunk| print!("{chunk}"))
//!         .await?;
//!
//!     println!("\n{} messages so far, last reply has {} chars", ctx.messages().len(), reply.len());
//!     Ok(())
//! }
//! ```

pub mod architecture;
pub mod context;
pub mod llm;
pub mod loader;
pub mod memory;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod types;

#[cfg(test)]
mod mock;

pub use context::{SessionContext, SessionRequest};
pub use llm::{ChatModel, OpenAiCompatible, PromptMessage, ReplyStream};
pub use loader::{Document, DocumentInput, DocumentLoader, SourceKind};
pub use memory::{ConversationMemory, Message};
pub use prompt::PromptTemplate;
pub use provider::{resolve, Provider};
pub use session::ChatSession;
pub use types::{ChatError, Result};

/// Greeting seeded into every fresh or reset conversation.
pub const DEFAULT_GREETING: &str = "Hello! I am Chat Otimize, ask me anything about the loaded document.";

/// The main configuration parameters for a [`SessionContext`].
///
/// Every constant has a default, so most applications only need
///
/// ```ignore
/// struct MyApp;
/// impl doc_chat::Config for MyApp {}
/// ```
pub trait Config: Send + Sync + 'static {
	/// Assistant message every conversation starts with, and returns to on reset.
	///
	/// Defaults to [`DEFAULT_GREETING`]
	const GREETING: &'static str = DEFAULT_GREETING;
	/// The sampling temperature sent to the provider. `None` leaves the provider default in
	/// place, which is required by models that reject the parameter.
	///
	/// Defaults to `None`
	const TEMPERATURE: Option<f32> = None;
	/// Caption languages to look for when loading a video transcript, in order of preference.
	/// When none match, the first caption track of the video is used.
	///
	/// Defaults to `["pt", "en"]`
	const TRANSCRIPT_LANGUAGES: &'static [&'static str] = &["pt", "en"];
	/// `User-Agent` header used when fetching sites and videos.
	const USER_AGENT: &'static str =
		"Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
	/// Timeout, in seconds, of a single document fetch.
	///
	/// Defaults to `30`
	const HTTP_TIMEOUT_SECS: u64 = 30;
}

/// [`Config`] with every default in place.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultConfig;

impl Config for DefaultConfig {}
