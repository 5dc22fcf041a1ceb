use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::{
	llm::{ChatModel, PromptMessage, ReplyStream},
	types::{ChatError, Result},
	Config,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockConfig;
impl Config for MockConfig {
	const GREETING: &'static str = "Mock greeting";
}

/// How a [`MockLlm`] reply ends once its fragments are out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEnding {
	Complete,
	/// Yield a [`ChatError::StreamFailure`] like a dropped connection.
	Fail,
	/// Never yield again.
	Hang,
}

/// Scripted [`ChatModel`] which replies with the same fragments to every prompt and records the
/// prompts it receives.
#[derive(Debug, Clone)]
pub struct MockLlm {
	pub fragments: Vec<&'static str>,
	pub ending: MockEnding,
	pub prompts: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl MockLlm {
	pub fn new(fragments: Vec<&'static str>, ending: MockEnding) -> Self {
		Self { fragments, ending, prompts: Arc::new(Mutex::new(vec![])) }
	}

	pub fn replying(fragments: Vec<&'static str>) -> Self {
		Self::new(fragments, MockEnding::Complete)
	}

	pub fn last_prompt(&self) -> Option<Vec<PromptMessage>> {
		self.prompts.lock().unwrap().last().cloned()
	}
}

#[async_trait]
impl ChatModel for MockLlm {
	fn model(&self) -> &str {
		"mock-llm"
	}

	async fn stream(&self, msgs: Vec<PromptMessage>) -> Result<ReplyStream> {
		self.prompts.lock().unwrap().push(msgs);

		let fragments = stream::iter(
			self.fragments.clone().into_iter().map(|fragment| Ok(fragment.to_string())),
		);

		Ok(match self.ending {
			MockEnding::Complete => fragments.boxed(),
			MockEnding::Fail => fragments
				.chain(stream::once(async {
					Err(ChatError::StreamFailure("connection reset by peer".to_string()))
				}))
				.boxed(),
			MockEnding::Hang => fragments.chain(stream::pending()).boxed(),
		})
	}
}
