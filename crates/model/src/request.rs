use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{ChatMessage, Role};
use crate::usage::Usage;

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most completion engines, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

/// The tool-selection policy for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    Auto,
    /// The model must not call any tool.
    None,
    /// The model must call at least one tool.
    Required,
}

/// A request to be sent to the completion engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// The model identifier to complete with.
    pub model: String,
    /// The input messages, system instructions first.
    pub messages: Vec<ChatMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ToolSchema>,
    /// The tool-selection policy. Should be `None` when `tools` is
    /// empty.
    pub tool_choice: Option<ToolChoice>,
    /// Whether the model may issue multiple tool calls per response.
    /// Should be `None` when `tools` is empty.
    pub parallel_tool_calls: Option<bool>,
}

/// A response from the completion engine.
///
/// Carries exactly one assistant message, which in turn may carry zero
/// or more tool-call requests.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// The assistant message produced by the engine.
    pub message: ChatMessage,
    /// Tokens consumed by this request.
    pub usage: Usage,
}

impl Completion {
    /// Creates a completion from an assistant message and its usage.
    ///
    /// Panics in debug builds if the message is not assistant-role.
    #[inline]
    pub fn new(message: ChatMessage, usage: Usage) -> Self {
        debug_assert_eq!(message.role, Role::Assistant);
        Self { message, usage }
    }
}
