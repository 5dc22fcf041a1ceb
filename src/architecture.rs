/// The following diagram shows how a front-end drives the library, from picking a document to
/// streaming a reply.
///
/// Only [`SessionContext`](crate::SessionContext) and [`ChatSession`](crate::ChatSession) are
/// expanded to show the steps of their main operations.
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph TB
///     subgraph Front-end
///         repl[REPL]
///     end
///     repl-- SessionRequest --> initialize
///     repl-- user message --> send
///     subgraph Doc Chat
///         subgraph SessionContext
///             initialize-- create --> create
///             send-- prompt and history --> stream
///             send-- complete turn --> memory[ConversationMemory]
///         end
///         subgraph ChatSession
///             create-- resolve --> provider[Provider]
///             create-- fetch or extract --> loader[DocumentLoader]
///             create-- embed document --> prompt[PromptTemplate]
///             stream
///         end
///         provider-- make_client --> chat_model>ChatModel]
///         stream --> chat_model
///         loader --> site[Site]
///         loader --> video[Video transcript]
///         loader --> files[PDF / CSV / Text]
///     end
///     chat_model-. impl .- openai_compatible[OpenAiCompatible]
///     openai_compatible --> openai[OpenAI]
///     openai_compatible --> groq[Groq]
/// ```
///
/// A front-end owns one [`SessionContext`](crate::SessionContext) per user. Starting a chat hands
/// it a [`SessionRequest`](crate::SessionRequest), which builds a new
/// [`ChatSession`](crate::ChatSession) around the loaded document. Every message is then streamed
/// back fragment by fragment and recorded only once the reply is complete.
///
/// Both hosted providers speak the OpenAI chat completions protocol, so a single
/// [`ChatModel`](crate::ChatModel) implementation serves them by switching the api base.
pub struct Diagram;
