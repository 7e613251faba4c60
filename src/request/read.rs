use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::request::argument_set::ArgumentSet;
use crate::request::schema::load_schema;

#[derive(Debug, Error)]
pub enum ArgumentFileError {
    #[error("can't read argument file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("argument file is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("argument file fails validation:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("can't deserialise argument sets: {0}")]
    Deserialise(#[source] serde_json::Error),

    #[error("invalid argument set schema: {0}")]
    Schema(String),
}

/// A JSON file holding one array of arguments per task, e.g. `[[1, 2], [3, 4, 5]]`
pub struct ArgumentFile {
    pub path: PathBuf,
    pub compiled_schema: JSONSchema,
}

impl ArgumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ArgumentFileError> {
        Ok(ArgumentFile { path: path.into(), compiled_schema: load_schema()? })
    }

    pub fn read(&self) -> Result<ArgumentSet, ArgumentFileError> {
        let json: Value = self.parse_untyped_json()?;

        match self.validate(&json) {
            Ok(_) => {
                info!("Argument file is valid");
                self.parse_json(json)
            }
            Err(err) => {
                warn!("Argument file fails validation");
                Err(err)
            }
        }
    }

    fn validate(&self, json: &Value) -> Result<(), ArgumentFileError> {
        info!("Validating argument sets against JSON schema");
        self.compiled_schema.validate(json).map_err(|errors| {
            let messages = errors
                .map(|err| format!("{}: {}", err.instance_path, err))
                .collect();
            ArgumentFileError::Validation(messages)
        })
    }

    fn read_file(&self) -> Result<String, ArgumentFileError> {
        let path: &Path = self.path.as_path();
        info!("Reading argument sets at {}", path.display());
        fs::read_to_string(path).map_err(|source| {
            warn!("Can't read argument file at path {}: {}", path.display(), source);
            ArgumentFileError::Read { path: self.path.clone(), source }
        })
    }

    fn parse_json(&self, value: Value) -> Result<ArgumentSet, ArgumentFileError> {
        info!("Deserialising valid JSON into argument sets");
        serde_json::from_value::<ArgumentSet>(value).map_err(ArgumentFileError::Deserialise)
    }

    fn parse_untyped_json(&self) -> Result<Value, ArgumentFileError> {
        let json_string = self.read_file()?;
        serde_json::from_str::<Value>(&json_string).map_err(ArgumentFileError::Decode)
    }
}

/// Read and validate an argument set file
pub fn read_argument_sets(path: &Path) -> Result<ArgumentSet, ArgumentFileError> {
    ArgumentFile::new(path)?.read()
}
