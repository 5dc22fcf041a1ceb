use std::collections::HashMap;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
	loader::DocumentLoader,
	memory::{ConversationMemory, Message},
	provider::{resolve, Provider},
	session::ChatSession,
	types::{ChatError, Result},
	Config,
};

pub use crate::session::SessionRequest;

/// All state of one user's interaction: the current [`ChatSession`], the conversation and the
/// api keys typed so far.
///
/// Created when the interaction starts and dropped when it ends. Nothing in here is shared with
/// other contexts.
pub struct SessionContext<T: Config> {
	loader: DocumentLoader<T>,
	session: Option<ChatSession>,
	memory: ConversationMemory,
	api_keys: HashMap<Provider, String>,
}

impl<T: Config> Default for SessionContext<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Config> SessionContext<T> {
	pub fn new() -> Self {
		Self::with_loader(DocumentLoader::new())
	}

	pub fn with_loader(loader: DocumentLoader<T>) -> Self {
		Self {
			loader,
			session: None,
			memory: ConversationMemory::new(T::GREETING),
			api_keys: HashMap::new(),
		}
	}

	/// Create a new [`ChatSession`] and make it the current one.
	///
	/// The api key is remembered for the provider even if the session fails to start. On
	/// failure the previous session, if any, stays current. The conversation is kept either way.
	#[instrument(skip_all)]
	pub async fn initialize(&mut self, request: SessionRequest) -> Result<()> {
		if let Ok(provider) = resolve(&request.provider) {
			self.remember_api_key(provider, request.api_key.clone());
		}

		let session = ChatSession::create(&self.loader, request).await.map_err(|e| {
			error!("Failed to start chat session: {}", e);
			e
		})?;

		self.install(session);

		Ok(())
	}

	/// Replace the current session wholesale.
	pub fn install(&mut self, session: ChatSession) {
		if self.session.replace(session).is_some() {
			info!("Replaced current chat session");
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.session.is_some()
	}

	pub fn session(&self) -> Option<&ChatSession> {
		self.session.as_ref()
	}

	/// The conversation in chronological order, greeting first.
	pub fn messages(&self) -> &[Message] {
		self.memory.all()
	}

	/// Forget the conversation, leaving only the greeting. The session is kept.
	pub fn reset_history(&mut self) {
		debug!("Resetting conversation of {} messages", self.memory.len());

		self.memory.reset();
	}

	pub fn remember_api_key(&mut self, provider: Provider, api_key: String) {
		self.api_keys.insert(provider, api_key);
	}

	/// Last api key entered for `provider`.
	pub fn api_key(&self, provider: Provider) -> Option<&str> {
		self.api_keys.get(&provider).map(String::as_str)
	}

	/// Send `input` and stream the reply, handing every fragment to `on_chunk` as it arrives.
	///
	/// The user message and the complete reply are added to the conversation only once the
	/// stream has finished. A stream failure or a cancellation through `cancel` leaves the
	/// conversation exactly as it was.
	#[instrument(skip_all, fields(history = self.memory.len()))]
	pub async fn send<F>(
		&mut self,
		input: String,
		cancel: Option<&CancellationToken>,
		mut on_chunk: F,
	) -> Result<String>
	where
		F: FnMut(&str) + Send,
	{
		let session = self.session.as_ref().ok_or_else(|| {
			warn!("Message sent before a chat session was started");
			ChatError::SessionNotInitialized
		})?;

		let mut stream = session.stream(&input, self.memory.all()).await?;
		let mut reply = String::new();

		loop {
			let next = match cancel {
				Some(token) => tokio::select! {
					biased;
					_ = token.cancelled() => {
						warn!("Reply cancelled after {} bytes, discarding it", reply.len());
						return Err(ChatError::Cancelled)
					},
					next = stream.next() => next,
				},
				None => stream.next().await,
			};

			match next {
				Some(Ok(fragment)) => {
					on_chunk(&fragment);
					reply.push_str(&fragment);
				},
				Some(Err(e)) => {
					error!("Reply failed after {} bytes, discarding it: {}", reply.len(), e);
					return Err(e)
				},
				None => break,
			}
		}

		debug!("Reply complete with {} bytes", reply.len());

		self.memory.append(Message::user(input));
		self.memory.append(Message::assistant(reply.clone()));

		Ok(reply)
	}
}
