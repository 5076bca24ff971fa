use std::fmt::{self, Debug, Formatter};
use std::future::ready;
use std::pin::Pin;

use serde_json::{Map, Value, json};

use crate::context::Context;
use crate::tool::object::ToolObject;
use crate::tool::ToolResult;

/// The declared type of one tool parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// A text parameter.
    String,
    /// An integer parameter.
    Integer,
    /// A floating-point parameter.
    Number,
    /// A boolean parameter.
    Boolean,
    /// A list parameter.
    Array,
    /// A nested object parameter.
    Object,
    /// The shared session context.
    ///
    /// Parameters of this kind never reach the model: the executor
    /// injects the live context instead, so the compiler excludes them
    /// from the exposed schema and the required list.
    Context,
    /// A type the compiler cannot map precisely. Compiled as a
    /// permissive string field rather than failing.
    Other(String),
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String | ParamKind::Other(_) => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
            // Handled by the exclusion path in `compile_schema`.
            ParamKind::Context => "object",
        }
    }
}

/// The declaration of one tool parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    description: Option<String>,
    required: bool,
}

impl Parameter {
    /// Declares a required parameter with the given name and kind.
    #[inline]
    pub fn new<S: Into<String>>(name: S, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: true,
        }
    }

    /// Declares the parameter that receives the shared context.
    #[inline]
    pub fn context() -> Self {
        Self::new("context", ParamKind::Context)
    }

    /// Marks this parameter as optional.
    #[inline]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a description shown to the model.
    #[inline]
    pub fn with_description<S: Into<String>>(
        mut self,
        description: S,
    ) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Compiles a declarative parameter list into a JSON schema object.
///
/// Context parameters are excluded from both the properties and the
/// required list, and unmappable kinds degrade to permissive string
/// fields. Compilation never fails for a structurally valid list.
pub fn compile_schema(params: &[Parameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        if param.kind == ParamKind::Context {
            continue;
        }
        let mut property = Map::new();
        property
            .insert("type".to_owned(), json!(param.kind.json_type()));
        if let Some(description) = &param.description {
            property.insert("description".to_owned(), json!(description));
        }
        properties.insert(param.name.clone(), Value::Object(property));
        if param.required {
            required.push(param.name.clone());
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

type Handler = Box<dyn Fn(Value, &Context) -> ToolResult + Send + Sync>;

/// A tool defined by a plain function over the raw argument payload.
///
/// This is the lightweight counterpart of the typed [`Tool`] trait:
/// the schema comes from a declarative parameter list instead of the
/// input type, and the handler receives the arguments as JSON plus the
/// injected context.
///
/// [`Tool`]: crate::tool::Tool
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    handler: Handler,
}

impl FunctionTool {
    /// Creates a function tool, compiling its schema once.
    pub fn new<N, D, F>(
        name: N,
        description: D,
        params: &[Parameter],
        handler: F,
    ) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(Value, &Context) -> ToolResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: compile_schema(params),
            handler: Box::new(handler),
        }
    }
}

impl Debug for FunctionTool {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl ToolObject for FunctionTool {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn execute(
        &self,
        arguments: Value,
        ctx: &Context,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        Box::pin(ready((self.handler)(arguments, ctx)))
    }
}
