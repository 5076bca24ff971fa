
use ensemble_model::{
    ChatMessage, CompletionProvider, ProviderError, Usage,
};

use crate::agent::Agent;
use crate::context::{ACTIVE_AGENT_KEY, Context};
use crate::gateway::CompletionClient;
use crate::tool::Executor;

/// The default ceiling on rounds per run.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// The outcome of one full run.
#[derive(Debug)]
pub struct RunResponse {
    /// The messages produced since the caller's input.
    pub messages: Vec<ChatMessage>,
    /// The active agent when the run ended.
    pub agent: Agent,
    /// The merged context when the run ended.
    pub context: Context,
    /// Aggregate usage of the whole run.
    pub usage: Usage,
}

/// The outcome of one round: one completion request plus the tool
/// executions it triggered.
#[derive(Debug)]
pub struct Turn {
    /// The messages produced during this round, the raw assistant
    /// message first.
    pub messages: Vec<ChatMessage>,
    /// The active agent after this round.
    pub agent: Agent,
    /// The merged context after this round.
    pub context: Context,
    /// Usage added during this round.
    pub usage: Usage,
    /// Whether the run reached a terminal condition in this round.
    pub done: bool,
}

/// The run loop driving multi-round interactions between the model
/// and a set of cooperating agents.
///
/// Each round submits the active agent's instructions plus the full
/// history to the completion engine, executes whatever tools the model
/// requested, and then either continues with the same agent, switches
/// to a handed-off agent, or halts. One runner processes one
/// interaction at a time, strictly sequentially; callers needing
/// concurrent conversations run independent runs.
#[derive(Clone)]
pub struct Runner {
    client: CompletionClient,
    max_turns: usize,
}

impl Runner {
    /// Creates a runner backed by the given completion provider.
    #[inline]
    pub fn new<P: CompletionProvider + 'static>(provider: P) -> Self {
        Self {
            client: CompletionClient::new(provider),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Sets the ceiling on rounds per run.
    ///
    /// The ceiling is a hard guard against runaway tool-calling loops;
    /// reaching it is a normal terminal condition, not an error.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Executes exactly one round and reports whether the run reached
    /// a terminal condition.
    ///
    /// The caller owns the history: the returned messages have not
    /// been appended anywhere yet.
    pub async fn run_turn(
        &self,
        agent: Agent,
        history: &[ChatMessage],
        context: Context,
    ) -> Result<Turn, Box<dyn ProviderError>> {
        let completion =
            self.client.fetch_response(&agent, history, &context).await?;
        let mut usage = completion.usage;
        let requests = completion.message.tool_calls.clone();
        let mut messages = vec![completion.message];

        if requests.is_empty() {
            debug!("{}: no tool calls, finishing", agent.name());
            return Ok(Turn {
                messages,
                agent,
                context,
                usage,
                done: true,
            });
        }

        // Let tools identify the speaker without receiving the agent
        // object itself.
        let mut context = context;
        context.insert(ACTIVE_AGENT_KEY, agent.name());

        let executor = Executor::with_tools(agent.tools());
        let batch = executor.execute(&requests, &context).await;
        messages.extend(batch.messages);
        usage += batch.usage;

        // A handoff still updates the active agent even when the same
        // batch signaled a stop; the stop only ends the run.
        let agent = batch.handoff.unwrap_or(agent);

        Ok(Turn {
            messages,
            agent,
            context: batch.context,
            usage,
            done: batch.stop,
        })
    }

    /// Drives rounds until the model stops requesting tools, a tool
    /// signals a stop, or the turn ceiling is reached.
    ///
    /// Transport and engine errors propagate to the caller and end the
    /// run with no partial response; individual tool failures never
    /// do, they are absorbed into the transcript.
    pub async fn run(
        &self,
        agent: Agent,
        history: Vec<ChatMessage>,
        context: Context,
    ) -> Result<RunResponse, Box<dyn ProviderError>> {
        let initial_len = history.len();
        let mut history = history;
        let mut agent = agent;
        let mut context = context;
        let mut usage = Usage::default();
        let mut turns = 0;

        loop {
            // Guard before the round starts: a ceiling of zero must
            // not issue a single completion request.
            if turns >= self.max_turns {
                debug!("turn ceiling reached after {turns} rounds");
                break;
            }

            let turn =
                self.run_turn(agent.clone(), &history, context).await?;
            history.extend(turn.messages);
            context = turn.context;
            usage += turn.usage;
            if turn.agent.name() != agent.name() {
                debug!(
                    "active agent switched: {} -> {}",
                    agent.name(),
                    turn.agent.name()
                );
            }
            agent = turn.agent;

            if turn.done {
                break;
            }
            turns += 1;
        }

        Ok(RunResponse {
            messages: history.split_off(initial_len),
            agent,
            context,
            usage,
        })
    }
}
