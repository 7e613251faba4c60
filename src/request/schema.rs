use jsonschema::JSONSchema;
use serde_json::Value;

use crate::request::read::ArgumentFileError;

/// included argument set schema
static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/argument_sets.json"));

pub fn load_schema() -> Result<JSONSchema, ArgumentFileError> {
    let schema_json: Value = serde_json::from_str(SCHEMA)
        .map_err(|err| ArgumentFileError::Schema(err.to_string()))?;
    compile_schema(&schema_json)
}

fn compile_schema(schema: &Value) -> Result<JSONSchema, ArgumentFileError> {
    JSONSchema::options()
        .compile(schema)
        .map_err(|err| ArgumentFileError::Schema(err.to_string()))
}
