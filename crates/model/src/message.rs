use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// A user input.
    User,
    /// A model output, possibly carrying tool-call requests.
    Assistant,
    /// The result of one tool call.
    Tool,
}

/// Describes a tool call request from the model.
///
/// Each request is consumed exactly once by the executor, producing
/// exactly one tool message carrying the same `id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The argument payload to pass to the tool.
    pub arguments: Value,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role this entry is tagged with.
    pub role: Role,
    /// The textual content of the entry.
    pub content: String,
    /// Name of the agent that produced this entry, for assistant
    /// messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Tool-call requests carried by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The originating request id, for tool messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// The name of the tool that produced this entry, for tool
    /// messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            sender: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content.into())
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Creates a tool message for the request with the given id.
    #[inline]
    pub fn tool<I, N, S>(id: I, name: N, content: S) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut msg = Self::new(Role::Tool, content.into());
        msg.tool_call_id = Some(id.into());
        msg.tool_name = Some(name.into());
        msg
    }

    /// Annotates this message with the name of the agent that
    /// produced it.
    #[inline]
    pub fn with_sender<S: Into<String>>(mut self, sender: S) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Attaches tool-call requests to this message.
    #[inline]
    pub fn with_tool_calls(
        mut self,
        tool_calls: impl Into<Vec<ToolCallRequest>>,
    ) -> Self {
        self.tool_calls = tool_calls.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let msg = ChatMessage::assistant("Let me check.")
            .with_sender("Triage")
            .with_tool_calls([ToolCallRequest {
                id: "tool:1".to_owned(),
                name: "lookup".to_owned(),
                arguments: json!({ "key": "order" }),
            }]);

        let serialized = serde_json::to_string(&msg).unwrap();
        let deserialized: ChatMessage =
            serde_json::from_str(&serialized).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let msg = ChatMessage::user("Hi");
        let serialized = serde_json::to_value(&msg).unwrap();
        assert_eq!(serialized, json!({ "role": "user", "content": "Hi" }));
    }
}
