//! Agent Loop
//!
//! The control core: after each model response, decide whether to execute
//! tools and resume, or terminate and yield the final message. One turn owns
//! its conversation exclusively and runs on a single sequential control
//! path; only the gateway call and tool invocations suspend.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{AgentError, Result};
use crate::gateway::{ChatModel, Completion, GenerationOptions};
use crate::invoker::invoke_all;
use crate::message::{Conversation, Message, Role};
use crate::tool::{ToolObservation, ToolRegistry};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a ReAct agent. Please respond to the user's query to the best of your ability! \
     Use the available tools when a question calls for them, then synthesize the observations \
     into a concise, accurate answer.";

/// Position of the state machine, recomputed from the conversation tail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// A fresh model invocation is due
    Running,
    /// The newest assistant message carries pending tool calls
    AwaitingTools,
    /// The newest assistant message carries none; the turn is over
    Done,
}

impl LoopState {
    /// Transition function, evaluated against the most recent message
    pub fn classify(last: Option<&Message>) -> Self {
        match last {
            Some(message) if message.role == Role::Assistant => {
                if message.tool_calls.is_empty() {
                    LoopState::Done
                } else {
                    LoopState::AwaitingTools
                }
            }
            _ => LoopState::Running,
        }
    }
}

/// Cooperative cancellation signal, checked between iterations and before
/// each gateway call. A call already in flight is not interrupted.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt supplied to the gateway on every call
    pub system_prompt: String,

    /// Maximum model/tool iterations before the turn is abandoned
    pub max_iterations: usize,

    /// Gateway attempts per iteration, including the first
    pub max_attempts: usize,

    /// Base delay between gateway retries; doubles per attempt
    pub retry_backoff: Duration,

    /// Upper bound on one gateway call
    pub gateway_timeout: Duration,

    /// Upper bound on one tool invocation
    pub tool_timeout: Duration,

    /// Generation options
    pub generation: GenerationOptions,
}

impl AgentConfig {
    pub fn new(generation: GenerationOptions) -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            gateway_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            generation,
        }
    }
}

/// Per-turn options
#[derive(Clone, Debug, Default)]
pub struct TurnOptions {
    /// Cancellation signal for this turn
    pub cancel: CancelToken,

    /// Receives every message as it is appended, for progress display
    pub progress: Option<mpsc::UnboundedSender<Message>>,
}

/// Lazy, finite sequence of messages produced by one turn
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// The main Agent struct
pub struct Agent {
    gateway: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(gateway: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }

    /// Run one turn to its terminal assistant message
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        input: impl Into<String>,
    ) -> Result<Message> {
        self.run_turn(conversation, input, TurnOptions::default())
            .await
    }

    /// Run one turn with explicit cancellation and progress options
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: impl Into<String>,
        opts: TurnOptions,
    ) -> Result<Message> {
        let user = Message::user(input);
        self.emit(&opts, &user);
        conversation.append(user);

        let mut iterations = 0;

        loop {
            if opts.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(AgentError::LoopBound(self.config.max_iterations));
            }

            let completion = self.generate_with_retry(conversation, &opts.cancel).await?;
            let assistant = completion.into_message();
            self.emit(&opts, &assistant);
            conversation.append(assistant.clone());

            match LoopState::classify(conversation.last()) {
                LoopState::Done => {
                    tracing::debug!(iterations, "turn complete");
                    return Ok(assistant);
                }
                LoopState::AwaitingTools => {
                    tracing::debug!(calls = assistant.tool_calls.len(), "executing tool calls");
                    let observations = invoke_all(
                        &self.tools,
                        &assistant.tool_calls,
                        self.config.tool_timeout,
                    )
                    .await;

                    let batch: Vec<Message> = observations
                        .into_iter()
                        .map(ToolObservation::into_message)
                        .collect();
                    for message in &batch {
                        self.emit(&opts, message);
                    }
                    conversation.append_batch(batch);
                }
                LoopState::Running => {}
            }
        }
    }

    /// Run a turn on a fresh conversation, returning the final content
    pub async fn ask(&self, input: &str) -> Result<String> {
        let mut conversation = Conversation::new();
        self.run(&mut conversation, input)
            .await
            .map(|message| message.content)
    }

    /// Run one turn as a stream of messages, each yielded as soon as it is
    /// appended. The stream is finite and not restartable; a turn-level
    /// failure arrives as the final item.
    pub fn run_stream(
        self: Arc<Self>,
        mut conversation: Conversation,
        input: impl Into<String>,
    ) -> TurnStream {
        let (tx, rx) = mpsc::unbounded_channel::<Result<Message>>();
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Message>();
        let input = input.into();

        tokio::spawn(async move {
            let forward = tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(message) = progress_rx.recv().await {
                    if forward.send(Ok(message)).is_err() {
                        break;
                    }
                }
            });

            let opts = TurnOptions {
                cancel: CancelToken::new(),
                progress: Some(progress_tx),
            };
            let outcome = self.run_turn(&mut conversation, input, opts).await;

            let _ = forwarder.await;
            if let Err(err) = outcome {
                let _ = tx.send(Err(err));
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    /// The tool registry this agent dispatches against
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn emit(&self, opts: &TurnOptions, message: &Message) {
        if let Some(progress) = &opts.progress {
            let _ = progress.send(message.clone());
        }
    }

    async fn generate_with_retry(
        &self,
        conversation: &Conversation,
        cancel: &CancelToken,
    ) -> Result<Completion> {
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            attempt += 1;

            let call = self.gateway.generate(
                &self.config.system_prompt,
                conversation,
                self.tools.schemas(),
                &self.config.generation,
            );

            let result = match tokio::time::timeout(self.config.gateway_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(AgentError::GatewayUnavailable(format!(
                    "no response within {}s",
                    self.config.gateway_timeout.as_secs()
                ))),
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.config.retry_backoff * 2u32.pow(attempt as u32 - 1);
                    tracing::warn!(
                        %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying gateway call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
