// MCP tool definitions and the registry that turns tool calls into argv

use crate::protocol::ToolSchema;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// JSON type a tool parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// How a parameter appears on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgStyle {
    /// The bare value
    Positional,
    /// `--flag value`, or just `--flag` for a true boolean
    Flag(String),
}

/// One entry of a tool's parameter schema
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub style: ArgStyle,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required: false,
            default: None,
            style: ArgStyle::Positional,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.style = ArgStyle::Flag(flag.into());
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match self.param_type {
            ParamType::String => json_schema_string(&self.description),
            ParamType::Number => json_schema_number(&self.description),
            ParamType::Integer => json_schema_integer(&self.description),
            ParamType::Boolean => json_schema_boolean(&self.description),
        };
        if let (Some(default), Some(obj)) = (&self.default, schema.as_object_mut()) {
            obj.insert("default".to_string(), default.clone());
        }
        schema
    }

    fn render(&self, value: &Value, argv: &mut Vec<String>) {
        match (&self.style, value) {
            (ArgStyle::Flag(flag), Value::Bool(enabled)) => {
                if *enabled {
                    argv.push(flag.clone());
                }
            }
            (ArgStyle::Flag(flag), value) => {
                argv.push(flag.clone());
                argv.push(render_value(value));
            }
            (ArgStyle::Positional, value) => argv.push(render_value(value)),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A named, schema-described operation backed by a subcommand of the external program
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Subcommand tokens placed right after the program name
    pub subcommand: Vec<String>,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, subcommand: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subcommand: subcommand.iter().map(|s| s.to_string()).collect(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Get the tool schema for MCP
    pub fn schema(&self) -> ToolSchema {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.json_schema()))
            .collect();
        let required = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: json_schema_object(Value::Object(properties), required),
        }
    }
}

/// Why a tool call could not be turned into an invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Arguments for {tool} must be an object")]
    InvalidArguments { tool: String },

    #[error("Missing required parameter '{param}' for {tool}")]
    MissingParameter { tool: String, param: String },

    #[error("Parameter '{param}' for {tool} must be of type {expected}")]
    TypeMismatch {
        tool: String,
        param: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool {0} is already registered")]
    DuplicateTool(String),
}

/// Static catalog of tools, read-only once the server starts
pub struct ToolRegistry {
    program: String,
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Empty registry whose tools invoke `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Register a tool
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        if self.index.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateTool(tool.name));
        }
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All tools in registration order
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` against the tool's schema and render the full argv
    pub fn build_invocation(&self, name: &str, arguments: &Value) -> Result<Vec<String>, ValidationError> {
        let tool = self
            .lookup(name)
            .ok_or_else(|| ValidationError::UnknownTool(name.to_string()))?;

        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ValidationError::InvalidArguments {
                    tool: tool.name.clone(),
                })
            }
        };

        for key in args.keys() {
            if !tool.parameters.iter().any(|p| &p.name == key) {
                tracing::debug!("Ignoring undeclared argument '{}' for {}", key, tool.name);
            }
        }

        let mut argv = Vec::with_capacity(1 + tool.subcommand.len() + tool.parameters.len() * 2);
        argv.push(self.program.clone());
        argv.extend(tool.subcommand.iter().cloned());

        for param in &tool.parameters {
            let supplied = args.get(&param.name).filter(|v| !v.is_null());
            let value = match (supplied, &param.default) {
                (Some(value), _) => {
                    if !param.param_type.accepts(value) {
                        return Err(ValidationError::TypeMismatch {
                            tool: tool.name.clone(),
                            param: param.name.clone(),
                            expected: param.param_type.as_str(),
                        });
                    }
                    value
                }
                (None, _) if param.required => {
                    return Err(ValidationError::MissingParameter {
                        tool: tool.name.clone(),
                        param: param.name.clone(),
                    });
                }
                (None, Some(default)) => default,
                (None, None) => continue,
            };
            param.render(value, &mut argv);
        }

        Ok(argv)
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}
