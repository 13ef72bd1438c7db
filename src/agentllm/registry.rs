//! Function registry: the catalogue of callables an agent may invoke.
//!
//! The registry is the core of the function-calling mechanism.  It maps stable string
//! names to a description, a JSON-schema parameter object, and the actual handler, and it
//! renders the catalogue in the provider-neutral form that adapters translate onto the
//! wire.
//!
//! # Declaring parameters
//!
//! Rust has no runtime signature reflection, so parameter schemas are either supplied as an
//! explicit JSON-schema object or derived from a declared [`ParamSpec`] list.  The declared
//! form mirrors a function signature: each parameter names its Rust type and the schema
//! type is derived from it ([`ParamKind::from_type_name`]); `Option<T>` parameters and
//! parameters with a default are left out of `required`.
//!
//! ```rust
//! use agentllm::registry::{sync_handler, FunctionRegistry, ParamSpec};
//!
//! let mut registry = FunctionRegistry::new();
//! registry
//!     .register(
//!         "get_customer",
//!         "根据名称获取顾客信息",
//!         vec![ParamSpec::of("name", "String")],
//!         sync_handler(|args| {
//!             let name = args["name"].as_str().unwrap_or_default();
//!             Ok(serde_json::json!({"name": name, "id": 123}))
//!         }),
//!     )
//!     .unwrap();
//!
//! assert!(registry.has("get_customer"));
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::agentllm::error::AgentError;

/// Type alias for the boxed future a handler returns.
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, Box<dyn Error + Send + Sync>>> + Send>>;

/// Type alias for a registered tool implementation.
///
/// Handlers receive the decoded argument object (name-based binding: pull fields by
/// parameter name) and may perform I/O before resolving.
pub type FunctionHandler = Arc<dyn Fn(serde_json::Value) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure or fn into a [`FunctionHandler`].
pub fn async_handler<F, Fut>(f: F) -> FunctionHandler
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, Box<dyn Error + Send + Sync>>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

/// Wrap a synchronous closure or fn into a [`FunctionHandler`].
pub fn sync_handler<F>(f: F) -> FunctionHandler
where
    F: Fn(serde_json::Value) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(move |args| {
        let result = f(args);
        Box::pin(async move { result })
    })
}

/// JSON-schema parameter types understood by the function-calling protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    /// The JSON-schema `type` string for this kind.
    pub fn as_json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }

    /// Map a declared Rust type name to a schema kind.
    ///
    /// Unknown types default to `String`, which is lossy but keeps the schema valid.
    /// `Option<T>` is not handled here; see [`ParamSpec::of`].
    pub fn from_type_name(type_name: &str) -> ParamKind {
        let name = type_name.trim().trim_start_matches('&').trim();
        match name {
            "String" | "str" => return ParamKind::String,
            "f32" | "f64" => return ParamKind::Number,
            "bool" => return ParamKind::Boolean,
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => return ParamKind::Integer,
            _ => {}
        }
        if name.starts_with("Vec<") || (name.starts_with('[') && name.ends_with(']')) {
            ParamKind::Array
        } else if name.contains("Map<") {
            ParamKind::Object
        } else {
            ParamKind::String
        }
    }
}

/// A declared parameter of a registered function.
///
/// Mirrors one entry of a function signature.  Parameters are required unless they carry a
/// default value or were declared with an `Option<T>` type.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

impl ParamSpec {
    /// Declare a required parameter of the given kind.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        ParamSpec {
            name: name.into(),
            kind,
            description: None,
            required: true,
            default: None,
        }
    }

    /// Declare a parameter from its Rust type name, e.g. `"String"`, `"i64"`,
    /// `"Option<String>"`.
    ///
    /// An `Option<T>` wrapper marks the parameter optional and derives the kind from `T`.
    pub fn of(name: impl Into<String>, rust_type: &str) -> Self {
        let trimmed = rust_type.trim();
        if let Some(inner) = trimmed
            .strip_prefix("Option<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let mut spec = Self::new(name, ParamKind::from_type_name(inner));
            spec.required = false;
            spec
        } else {
            Self::new(name, ParamKind::from_type_name(trimmed))
        }
    }

    /// Add a human readable description that surfaces in the generated schema.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the parameter optional without a default value.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Provide a default value.  A parameter with a default is never required.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }
}

/// Build a JSON-schema object from a declared parameter list.
///
/// Produces `{"type":"object","properties":{...},"required":[...]}`; the `required` array
/// is omitted when empty.
pub fn schema_from_params(params: &[ParamSpec]) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required: Vec<serde_json::Value> = Vec::new();

    for param in params {
        let mut info = serde_json::Map::new();
        info.insert(
            "type".to_string(),
            serde_json::Value::String(param.kind.as_json_type().to_string()),
        );
        if let Some(description) = &param.description {
            info.insert(
                "description".to_string(),
                serde_json::Value::String(description.clone()),
            );
        }
        if let Some(default) = &param.default {
            info.insert("default".to_string(), default.clone());
        }
        if param.required {
            required.push(serde_json::Value::String(param.name.clone()));
        }
        properties.insert(param.name.clone(), serde_json::Value::Object(info));
    }

    let mut schema = serde_json::Map::new();
    schema.insert(
        "type".to_string(),
        serde_json::Value::String("object".to_string()),
    );
    schema.insert(
        "properties".to_string(),
        serde_json::Value::Object(properties),
    );
    if !required.is_empty() {
        schema.insert("required".to_string(), serde_json::Value::Array(required));
    }
    serde_json::Value::Object(schema)
}

/// A stored registry entry: metadata plus the optional handler.
#[derive(Clone)]
pub struct FunctionDefinition {
    /// Unique name the LLM uses to call the function.
    pub name: String,
    /// Free text that helps the LLM decide when to call.
    pub description: String,
    /// JSON-schema object describing the accepted arguments.
    pub parameters: serde_json::Value,
    /// The implementation.  `None` for schema-only registrations; executing such an entry
    /// fails with [`AgentError::ToolNotImplemented`].
    pub handler: Option<FunctionHandler>,
}

impl std::fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("handler", &self.handler.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Provider-neutral catalogue entry handed to adapters.
///
/// Adapters translate this onto the wire: OpenAI-style as
/// `{"type":"function","function":{...}}`, Anthropic-style with `parameters` renamed to
/// `input_schema`.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Registry mapping function names to their definitions.
///
/// Names are unique within a registry; re-registering a name replaces the previous entry
/// and logs a warning.  Enumeration via [`list`](FunctionRegistry::list) preserves
/// registration order.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDefinition>,
    order: Vec<String>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, deriving the parameter schema from the declared list.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: FunctionHandler,
    ) -> Result<(), AgentError> {
        let parameters = schema_from_params(&params);
        self.register_with_schema(name, description, parameters, handler)
    }

    /// Register a function with an explicit JSON-schema parameter object.
    pub fn register_with_schema(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        handler: FunctionHandler,
    ) -> Result<(), AgentError> {
        self.register_definition(FunctionDefinition {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Some(handler),
        })
    }

    /// Insert a complete definition, possibly without a handler.
    pub fn register_definition(&mut self, definition: FunctionDefinition) -> Result<(), AgentError> {
        if definition.name.is_empty() {
            return Err(AgentError::Configuration(
                "function name must not be empty".to_string(),
            ));
        }
        if self.functions.contains_key(&definition.name) {
            log::warn!(
                "Function {} already registered, overwriting",
                definition.name
            );
        } else {
            self.order.push(definition.name.clone());
        }
        self.functions.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    /// Whether a function with this name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Enumerate all registered functions in provider-neutral form, in registration order.
    pub fn list(&self) -> Vec<FunctionSpec> {
        self.order
            .iter()
            .filter_map(|name| self.functions.get(name))
            .map(|def| FunctionSpec {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            })
            .collect()
    }
}
