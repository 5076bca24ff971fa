use std::sync::Arc;

use ensemble_model::ToolChoice;

use super::{Agent, Instructions};
use crate::context::Context;
use crate::tool::object::AnyTool;
use crate::tool::{FunctionTool, Tool};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_INSTRUCTIONS: &str = "You are a helpful agent.";

/// [`Agent`] builder.
pub struct AgentBuilder {
    name: String,
    model: String,
    instructions: Instructions,
    tools: Vec<Arc<dyn super::ToolObject>>,
    tool_choice: Option<ToolChoice>,
    parallel_tool_calls: bool,
    max_retries: u32,
}

impl AgentBuilder {
    /// Creates a new builder for an agent with the given name.
    #[inline]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            model: DEFAULT_MODEL.to_owned(),
            instructions: Instructions::Static(
                DEFAULT_INSTRUCTIONS.to_owned(),
            ),
            tools: vec![],
            tool_choice: None,
            parallel_tool_calls: true,
            max_retries: 0,
        }
    }

    /// Sets the model identifier to complete with.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sets static instruction text.
    #[inline]
    pub fn with_instructions<S: Into<String>>(
        mut self,
        instructions: S,
    ) -> Self {
        self.instructions = Instructions::Static(instructions.into());
        self
    }

    /// Sets instructions computed from the current context on every
    /// completion request.
    #[inline]
    pub fn with_dynamic_instructions(
        mut self,
        f: impl Fn(&Context) -> String + Send + Sync + 'static,
    ) -> Self {
        self.instructions = Instructions::Dynamic(Arc::new(f));
        self
    }

    /// Registers a typed tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(AnyTool(tool)));
        self
    }

    /// Registers a function tool.
    #[inline]
    pub fn with_function(mut self, tool: FunctionTool) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Sets the tool-selection policy.
    #[inline]
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Sets whether the model may issue multiple tool calls per round.
    #[inline]
    pub fn with_parallel_tool_calls(mut self, allowed: bool) -> Self {
        self.parallel_tool_calls = allowed;
        self
    }

    /// Sets the retry budget carried by the agent.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            name: self.name,
            model: self.model,
            instructions: self.instructions,
            tools: self.tools,
            tool_choice: self.tool_choice,
            parallel_tool_calls: self.parallel_tool_calls,
            max_retries: self.max_retries,
        }
    }
}
