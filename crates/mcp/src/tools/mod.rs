mod catalog;
mod registry;

pub use catalog::{builtin_registry, builtin_tools};
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, ArgStyle, ParamSpec, ParamType, RegistryError, ToolDefinition,
    ToolRegistry, ValidationError,
};
