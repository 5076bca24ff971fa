//! Tool call supports.

mod error;
mod executor;
pub(crate) mod object;
mod schema;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::agent::Agent;
use crate::context::Context;
use ensemble_model::Usage;
pub use error::{Error, ErrorKind};
pub(crate) use executor::Executor;
pub(crate) use object::ToolObject;
pub use schema::{FunctionTool, ParamKind, Parameter, compile_schema};

/// The result of a tool call.
pub type ToolResult = Result<ToolOutcome, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not
/// maintain any internal state. Session state belongs in the shared
/// [`Context`], which the executor injects on every call; it never
/// appears in the schema the model sees.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input and the current context.
    ///
    /// This method must return a future that is fully independent of
    /// `self` and `ctx`; clone whatever the future needs up front.
    fn execute(
        &self,
        input: Self::Input,
        ctx: &Context,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// The value a tool call resolved to.
///
/// Tools may answer in three shapes; the executor normalizes all of
/// them into a [`ToolEnvelope`] in one place, so nothing downstream
/// ever has to check the shape again.
#[derive(Debug)]
pub enum ToolOutcome {
    /// A full result envelope.
    Envelope(ToolEnvelope),
    /// A handoff to another agent.
    Handoff(Agent),
    /// A plain value, stringified into the transcript.
    Value(Value),
}

impl ToolOutcome {
    /// Creates an outcome carrying plain text.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        ToolOutcome::Value(Value::String(text.into()))
    }

    /// Normalizes this outcome into an envelope.
    pub(crate) fn into_envelope(self) -> ToolEnvelope {
        match self {
            ToolOutcome::Envelope(envelope) => envelope,
            ToolOutcome::Handoff(agent) => {
                let value =
                    serde_json::json!({ "assistant": agent.name() })
                        .to_string();
                ToolEnvelope::value(value).with_handoff(agent)
            }
            ToolOutcome::Value(value) => {
                ToolEnvelope::value(stringify(value))
            }
        }
    }
}

impl From<ToolEnvelope> for ToolOutcome {
    #[inline]
    fn from(envelope: ToolEnvelope) -> Self {
        ToolOutcome::Envelope(envelope)
    }
}

impl From<Agent> for ToolOutcome {
    #[inline]
    fn from(agent: Agent) -> Self {
        ToolOutcome::Handoff(agent)
    }
}

impl From<Value> for ToolOutcome {
    #[inline]
    fn from(value: Value) -> Self {
        ToolOutcome::Value(value)
    }
}

impl From<String> for ToolOutcome {
    #[inline]
    fn from(text: String) -> Self {
        ToolOutcome::Value(Value::String(text))
    }
}

impl From<&str> for ToolOutcome {
    #[inline]
    fn from(text: &str) -> Self {
        ToolOutcome::Value(Value::String(text.to_owned()))
    }
}

/// The normalized result of one tool call.
#[derive(Debug, Default)]
pub struct ToolEnvelope {
    /// The display value appended to the transcript.
    pub value: String,
    /// A patch to shallow-merge into the running context.
    pub context_patch: Option<Context>,
    /// The agent to hand control to.
    pub handoff: Option<Agent>,
    /// Whether the run should halt after this call.
    pub stop: bool,
    /// Usage consumed by nested completion calls inside the tool.
    pub usage: Usage,
}

impl ToolEnvelope {
    /// Creates an envelope with the given display value.
    #[inline]
    pub fn value<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Attaches a context patch.
    #[inline]
    pub fn with_context_patch(mut self, patch: Context) -> Self {
        self.context_patch = Some(patch);
        self
    }

    /// Hands control to another agent.
    #[inline]
    pub fn with_handoff(mut self, agent: Agent) -> Self {
        self.handoff = Some(agent);
        self
    }

    /// Signals the run to halt after this call.
    #[inline]
    pub fn with_stop(mut self) -> Self {
        self.stop = true;
        self
    }

    /// Records usage consumed inside the tool.
    #[inline]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Stringifies a plain tool return value.
///
/// Strings pass through unquoted; everything else is rendered as JSON.
fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
