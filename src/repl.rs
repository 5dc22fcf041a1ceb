//! Terminal front-end: collects the session configuration, prints the conversation and streams
//! replies as they arrive.
use std::{
	error::Error,
	fs::File,
	io::{self, Write},
};

use doc_chat::{
	ChatError, DefaultConfig, DocumentInput, Provider, SessionContext, SessionRequest, SourceKind,
};
use rustyline::{error::ReadlineError, DefaultEditor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::Args;

const HELP: &str = "Commands:
  /reset                    clear the conversation
  /reload                   load the source again and start a new chat
  /use <provider> [model]   switch provider and model, then reload
  /history                  print the conversation
  /help                     show this help
  /quit                     leave";

pub struct Repl {
	editor: DefaultEditor,
	ctx: SessionContext<DefaultConfig>,
	source_kind: SourceKind,
	input: String,
	provider: Provider,
	model: String,
}

impl Repl {
	pub fn new(args: Args) -> Result<Self, Box<dyn Error>> {
		let mut ctx = SessionContext::new();
		if let Some(api_key) = args.api_key {
			ctx.remember_api_key(args.provider, api_key);
		}

		let model = args.model.unwrap_or_else(|| args.provider.models()[0].to_string());

		Ok(Self {
			editor: DefaultEditor::new()?,
			ctx,
			source_kind: args.source_kind,
			input: args.input,
			provider: args.provider,
			model,
		})
	}

	pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
		println!("{}\n", HELP);

		self.reload().await?;
		self.print_history();

		loop {
			let line = match self.editor.readline("you> ") {
				Ok(line) => line,
				Err(ReadlineError::Interrupted) => continue,
				Err(ReadlineError::Eof) => break,
				Err(e) => return Err(e.into()),
			};

			let line = line.trim();
			if line.is_empty() {
				continue
			}
			self.editor.add_history_entry(line)?;

			let mut words = line.split_whitespace();
			match words.next() {
				Some("/quit" | "/exit") => break,
				Some("/help") => println!("{}", HELP),
				Some("/history") => self.print_history(),
				Some("/reset") => {
					self.ctx.reset_history();
					self.print_history();
				},
				Some("/reload") => self.reload().await?,
				Some("/use") => match words.next().map(str::parse::<Provider>) {
					Some(Ok(provider)) => {
						self.provider = provider;
						self.model = words
							.next()
							.map(str::to_string)
							.unwrap_or_else(|| provider.models()[0].to_string());
						self.reload().await?;
					},
					Some(Err(e)) => println!("{}", e),
					None => println!("usage: /use <provider> [model]"),
				},
				Some(command) if command.starts_with('/') => println!("unknown command {}", command),
				_ => self.send(line.to_string()).await?,
			}
		}

		Ok(())
	}

	/// Load the source and start a new chat with the current provider and model.
	async fn reload(&mut self) -> Result<(), Box<dyn Error>> {
		let api_key = match self.ctx.api_key(self.provider) {
			Some(key) => key.to_string(),
			None => match typed_api_key(self.editor.readline(&format!("{} api key: ", self.provider)))? {
				Some(key) => key,
				None => {
					println!("no api key given, use /reload to try again\n");
					return Ok(())
				},
			},
		};

		let input = if self.source_kind.is_url() {
			DocumentInput::Url(self.input.clone())
		} else {
			match File::open(&self.input) {
				Ok(file) => DocumentInput::bytes(file),
				Err(e) => {
					error!("Failed to open {}: {}", self.input, e);
					println!("cannot open {}: {}", self.input, e);
					return Ok(())
				},
			}
		};

		println!("loading {} {} with {} {}...", self.source_kind, self.input, self.provider, self.model);

		let request = SessionRequest {
			provider: self.provider.name().to_string(),
			model: self.model.clone(),
			api_key,
			source_kind: self.source_kind.name().to_string(),
			input,
		};

		match self.ctx.initialize(request).await {
			Ok(()) => println!("ready, ask away\n"),
			Err(e) => println!("{}\nfix the problem and /reload\n", e),
		}

		Ok(())
	}

	async fn send(&mut self, line: String) -> Result<(), Box<dyn Error>> {
		let cancel = CancellationToken::new();
		let ctrl_c = {
			let cancel = cancel.clone();
			tokio::spawn(async move {
				if tokio::signal::ctrl_c().await.is_ok() {
					cancel.cancel();
				}
			})
		};

		print!("assistant> ");
		io::stdout().flush()?;

		let res = self
			.ctx
			.send(line, Some(&cancel), |chunk| {
				print!("{}", chunk);
				let _ = io::stdout().flush();
			})
			.await;

		ctrl_c.abort();

		match res {
			Ok(reply) => {
				debug!("Reply of {} bytes recorded", reply.len());
				println!("\n");
			},
			Err(ChatError::SessionNotInitialized) => println!("\n{}, use /reload\n", ChatError::SessionNotInitialized),
			Err(e) => println!("\n[{}] the message was not recorded, send it again\n", e),
		}

		Ok(())
	}

	fn print_history(&self) {
		for message in self.ctx.messages() {
			let who = if message.is_user() { "you" } else { "assistant" };
			println!("{}> {}\n", who, message.content());
		}
	}
}

/// Key typed at the api key prompt. `None` when the prompt was left with Ctrl-C or Ctrl-D.
fn typed_api_key(line: rustyline::Result<String>) -> Result<Option<String>, ReadlineError> {
	match line {
		Ok(key) => Ok(Some(key.trim().to_string())),
		Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
		Err(e) => Err(e),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn api_key_prompt_survives_interrupt() {
		assert_eq!(typed_api_key(Err(ReadlineError::Interrupted)).unwrap(), None);
		assert_eq!(typed_api_key(Err(ReadlineError::Eof)).unwrap(), None);
		assert_eq!(typed_api_key(Ok(" gsk_1 \n".to_string())).unwrap().as_deref(), Some("gsk_1"));
	}

	#[test]
	fn api_key_prompt_passes_other_errors_on() {
		let res = typed_api_key(Err(ReadlineError::Io(io::Error::new(io::ErrorKind::Other, "tty gone"))));

		assert!(res.is_err());
	}
}
