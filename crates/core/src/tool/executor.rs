use std::collections::HashMap;
use std::sync::Arc;

use ensemble_model::{ChatMessage, ToolCallRequest, Usage};
use tracing::Instrument;

use crate::agent::Agent;
use crate::context::Context;
use crate::tool::{Error, ToolObject};

/// The output of one tool batch.
pub(crate) struct Batch {
    /// One tool message per attempted request, failures included.
    pub messages: Vec<ChatMessage>,
    /// The working context with every patch of the batch merged in.
    pub context: Context,
    /// The pending handoff, if any tool signaled one.
    pub handoff: Option<Agent>,
    /// Whether a tool signaled the run to halt.
    pub stop: bool,
    /// Aggregate usage of the batch.
    pub usage: Usage,
}

/// An executor that handles tool call requests from the model.
///
/// Requests are processed strictly in received order, one at a time:
/// later calls in a batch may depend on context mutated by earlier
/// ones, so the batch is never fanned out.
pub(crate) struct Executor {
    tools: HashMap<String, Arc<dyn ToolObject>>,
}

impl Executor {
    pub fn with_tools(tools: &[Arc<dyn ToolObject>]) -> Self {
        let mut tool_map = HashMap::with_capacity(tools.len());
        for tool in tools {
            let name = tool.name();
            tool_map.insert(name.to_owned(), Arc::clone(tool));
        }
        let tools = tool_map;
        Self { tools }
    }

    pub async fn execute(
        &self,
        requests: &[ToolCallRequest],
        context: &Context,
    ) -> Batch {
        let span = debug_span!("tool executor");
        self.execute_inner(requests, context).instrument(span).await
    }

    async fn execute_inner(
        &self,
        requests: &[ToolCallRequest],
        context: &Context,
    ) -> Batch {
        let mut messages = Vec::with_capacity(requests.len());
        let mut working = context.clone();
        let mut handoff = None;
        let mut stop = false;
        let mut usage = Usage::default();

        for req in requests {
            let Some(tool) = self.tools.get(&req.name) else {
                let err = Error::not_found()
                    .with_reason(format!("tool \"{}\" not found.", req.name));
                warn!("tool call {} failed: {}", req.id, err.reason());
                messages.push(ChatMessage::tool(
                    &req.id,
                    &req.name,
                    format!("Error: {}", err.reason()),
                ));
                continue;
            };

            trace!(
                "executing a tool ({}) with args: {:?}",
                req.id, req.arguments
            );
            let envelope = match tool
                .execute(req.arguments.clone(), &working)
                .await
            {
                Ok(outcome) => outcome.into_envelope(),
                Err(err) => {
                    warn!("tool call {} failed: {}", req.id, err.reason());
                    messages.push(ChatMessage::tool(
                        &req.id,
                        &req.name,
                        format!("Error: {}", err.reason()),
                    ));
                    continue;
                }
            };

            messages.push(ChatMessage::tool(
                &req.id,
                &req.name,
                envelope.value,
            ));
            // Merge immediately so later calls in this batch observe
            // the patch.
            if let Some(patch) = &envelope.context_patch {
                working.merge(patch);
            }
            usage += envelope.usage;
            if let Some(agent) = envelope.handoff {
                debug!("tool call {} handed off to {}", req.id, agent.name());
                handoff = Some(agent);
            }
            if envelope.stop {
                // The remaining requests in the batch are not executed
                // and produce no tool messages.
                stop = true;
                break;
            }
        }

        Batch {
            messages,
            context: working,
            handoff,
            stop,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::agent::AgentBuilder;
    use crate::tool::{
        Error, ErrorKind, Tool, ToolEnvelope, ToolOutcome, ToolResult,
    };

    static EMPTY_SCHEMA: &Value = &Value::Null;

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = Value;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            input: Value,
            _ctx: &Context,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            std::future::ready(Ok(ToolOutcome::Value(input)))
        }
    }

    struct FailingTool;

    impl Tool for FailingTool {
        type Input = Value;

        fn name(&self) -> &str {
            "fail"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            _input: Value,
            _ctx: &Context,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            std::future::ready(Err(
                Error::execution_error().with_reason("boom")
            ))
        }
    }

    fn request(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    fn executor_with(agent: &Agent) -> Executor {
        Executor::with_tools(agent.tools())
    }

    #[tokio::test]
    async fn test_one_message_per_request() {
        let agent = AgentBuilder::new("Test")
            .with_tool(EchoTool)
            .with_tool(FailingTool)
            .build();
        let executor = executor_with(&agent);

        let requests = [
            request("tool:1", "echo", json!("hello")),
            request("tool:2", "fail", json!({})),
            request("tool:3", "missing", json!({})),
        ];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert_eq!(batch.messages.len(), 3);
        assert_eq!(batch.messages[0].tool_call_id.as_deref(), Some("tool:1"));
        assert_eq!(batch.messages[0].content, "hello");
        assert_eq!(batch.messages[1].tool_call_id.as_deref(), Some("tool:2"));
        assert!(batch.messages[1].content.contains("boom"));
        assert_eq!(batch.messages[2].tool_call_id.as_deref(), Some("tool:3"));
        assert!(batch.messages[2].content.contains("not found"));
        assert!(!batch.stop);
        assert!(batch.handoff.is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_not_found() {
        let agent = AgentBuilder::new("Test").with_tool(EchoTool).build();
        let executor = executor_with(&agent);

        let requests = [request("tool:1", "missing", json!({}))];
        let batch = executor.execute(&requests, &Context::new()).await;

        // The message text is the not-found error's reason.
        let err = Error::not_found()
            .with_reason("tool \"missing\" not found.");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(batch.messages.len(), 1);
        assert_eq!(
            batch.messages[0].content,
            format!("Error: {}", err.reason())
        );
    }

    #[tokio::test]
    async fn test_patches_apply_in_request_order() {
        struct PatchTool;

        impl Tool for PatchTool {
            type Input = Value;

            fn name(&self) -> &str {
                "patch"
            }

            fn description(&self) -> &str {
                "Writes its arguments into the context"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                input: Value,
                _ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                let patch: Context = input
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
                    .into();
                std::future::ready(Ok(ToolEnvelope::value("ok")
                    .with_context_patch(patch)
                    .into()))
            }
        }

        let agent =
            AgentBuilder::new("Test").with_tool(PatchTool).build();
        let executor = executor_with(&agent);

        let requests = [
            request("tool:1", "patch", json!({ "x": 1 })),
            request("tool:2", "patch", json!({ "x": 2 })),
        ];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert_eq!(batch.context.get("x"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_later_calls_observe_earlier_patches() {
        struct WriteTool;

        impl Tool for WriteTool {
            type Input = Value;

            fn name(&self) -> &str {
                "write"
            }

            fn description(&self) -> &str {
                "Writes a marker into the context"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                _input: Value,
                _ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                let mut patch = Context::new();
                patch.insert("marker", true);
                std::future::ready(Ok(ToolEnvelope::value("ok")
                    .with_context_patch(patch)
                    .into()))
            }
        }

        struct ReadTool;

        impl Tool for ReadTool {
            type Input = Value;

            fn name(&self) -> &str {
                "read"
            }

            fn description(&self) -> &str {
                "Reads the marker from the context"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                _input: Value,
                ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                let seen = ctx.get("marker").is_some();
                std::future::ready(Ok(ToolOutcome::text(format!(
                    "marker: {seen}"
                ))))
            }
        }

        let agent = AgentBuilder::new("Test")
            .with_tool(WriteTool)
            .with_tool(ReadTool)
            .build();
        let executor = executor_with(&agent);

        let requests = [
            request("tool:1", "write", json!({})),
            request("tool:2", "read", json!({})),
        ];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert_eq!(batch.messages[1].content, "marker: true");
    }

    #[tokio::test]
    async fn test_stop_halts_the_batch() {
        struct StopTool;

        impl Tool for StopTool {
            type Input = Value;

            fn name(&self) -> &str {
                "stop"
            }

            fn description(&self) -> &str {
                "Halts the run"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                _input: Value,
                _ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                std::future::ready(Ok(ToolEnvelope::value("halting")
                    .with_stop()
                    .into()))
            }
        }

        let agent = AgentBuilder::new("Test")
            .with_tool(EchoTool)
            .with_tool(StopTool)
            .build();
        let executor = executor_with(&agent);

        let requests = [
            request("tool:1", "echo", json!("first")),
            request("tool:2", "stop", json!({})),
            request("tool:3", "echo", json!("never")),
        ];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert!(batch.stop);
        assert_eq!(batch.messages.len(), 2);
        assert_eq!(batch.messages[1].content, "halting");
    }

    #[tokio::test]
    async fn test_handoff_is_latched() {
        struct TransferTool;

        impl Tool for TransferTool {
            type Input = Value;

            fn name(&self) -> &str {
                "transfer"
            }

            fn description(&self) -> &str {
                "Hands off to the next stage"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                _input: Value,
                _ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                let stage2 = AgentBuilder::new("Stage2").build();
                std::future::ready(Ok(stage2.into()))
            }
        }

        let agent =
            AgentBuilder::new("Test").with_tool(TransferTool).build();
        let executor = executor_with(&agent);

        let requests = [request("tool:1", "transfer", json!({}))];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert_eq!(batch.handoff.unwrap().name(), "Stage2");
        assert_eq!(batch.messages[0].content, r#"{"assistant":"Stage2"}"#);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported() {
        #[derive(serde::Deserialize)]
        struct StrictInput {
            #[allow(dead_code)]
            count: u64,
        }

        struct StrictTool;

        impl Tool for StrictTool {
            type Input = StrictInput;

            fn name(&self) -> &str {
                "strict"
            }

            fn description(&self) -> &str {
                "Requires a numeric count"
            }

            fn parameter_schema(&self) -> &Value {
                EMPTY_SCHEMA
            }

            fn execute(
                &self,
                _input: StrictInput,
                _ctx: &Context,
            ) -> impl Future<Output = ToolResult> + Send + 'static {
                std::future::ready(Ok(ToolOutcome::text("ok")))
            }
        }

        let agent =
            AgentBuilder::new("Test").with_tool(StrictTool).build();
        let executor = executor_with(&agent);

        let requests =
            [request("tool:1", "strict", json!({ "count": "three" }))];
        let batch = executor.execute(&requests, &Context::new()).await;

        assert_eq!(batch.messages.len(), 1);
        assert!(batch.messages[0].content.starts_with("Error:"));
    }
}
