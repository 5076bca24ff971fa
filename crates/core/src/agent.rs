mod builder;

use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use ensemble_model::ToolChoice;

use crate::context::Context;
use crate::tool::ToolObject;
pub use builder::AgentBuilder;

/// The system instructions of an agent.
///
/// Instructions are either static text, or a pure function of the
/// current context, recomputed on every completion request. Either way
/// the agent itself is never mutated to change them.
#[derive(Clone)]
pub enum Instructions {
    /// Fixed instruction text.
    Static(String),
    /// Instructions computed from the current context.
    Dynamic(Arc<dyn Fn(&Context) -> String + Send + Sync>),
}

impl Instructions {
    /// Returns the effective instruction text for the given context.
    #[inline]
    pub fn effective<'a>(&'a self, ctx: &Context) -> Cow<'a, str> {
        match self {
            Instructions::Static(text) => Cow::Borrowed(text),
            Instructions::Dynamic(f) => Cow::Owned(f(ctx)),
        }
    }
}

impl Debug for Instructions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instructions::Static(text) => {
                f.debug_tuple("Static").field(text).finish()
            }
            Instructions::Dynamic(_) => {
                f.debug_tuple("Dynamic").field(&"<fn>").finish()
            }
        }
    }
}

/// A named role with its own instructions and a bounded set of
/// callable tools.
///
/// An agent is immutable during a round. Handoffs swap the active
/// agent wholesale; nothing ever mutates an agent in place, so a
/// single agent value can be shared between runs.
#[derive(Clone)]
pub struct Agent {
    pub(crate) name: String,
    pub(crate) model: String,
    pub(crate) instructions: Instructions,
    pub(crate) tools: Vec<Arc<dyn ToolObject>>,
    pub(crate) tool_choice: Option<ToolChoice>,
    pub(crate) parallel_tool_calls: bool,
    pub(crate) max_retries: u32,
}

impl Agent {
    /// Returns the name of this agent.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the model identifier this agent completes with.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the instructions of this agent.
    #[inline]
    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// Returns the tool-selection policy of this agent, if any.
    #[inline]
    pub fn tool_choice(&self) -> Option<ToolChoice> {
        self.tool_choice
    }

    /// Returns whether this agent allows multiple tool calls per
    /// round.
    #[inline]
    pub fn parallel_tool_calls(&self) -> bool {
        self.parallel_tool_calls
    }

    /// Returns the retry budget of this agent.
    ///
    /// The core itself never retries transport failures; the budget is
    /// carried for callers that wrap the completion boundary with
    /// their own retry layer.
    #[inline]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(crate) fn tools(&self) -> &[Arc<dyn ToolObject>] {
        &self.tools
    }
}

impl Debug for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools.len())
            .field("tool_choice", &self.tool_choice)
            .field("parallel_tool_calls", &self.parallel_tool_calls)
            .finish_non_exhaustive()
    }
}
