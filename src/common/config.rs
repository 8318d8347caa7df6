//! Substitution config file handling
//!
//! The config is a flat `key: value` mapping used to fill `$key`
//! placeholders in scenario files before anything is sent.

use serde_json::{Map, Value};
use std::path::Path;

use super::{Error, Result};

/// Flat key/value mapping used for static substitution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Load a config mapping from a file
    ///
    /// `.toml` files are parsed as TOML, everything else as YAML (which
    /// also accepts JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let value: Value = if is_toml {
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?
        };

        Self::from_value(value).map_err(|e| match e {
            Error::ConfigParse(msg) => Error::ConfigParse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Build a config from an already parsed value
    ///
    /// An empty document is treated as an empty mapping.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(Error::ConfigParse(format!(
                "top level must be a mapping of key/value pairs, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Look up a config value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The underlying mapping
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_keeps_types() {
        let file = write_temp(".yaml", "BASE_URL: http://localhost:8080\nRETRIES: 3\nDEBUG: true\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.get("BASE_URL"), Some(&json!("http://localhost:8080")));
        assert_eq!(config.get("RETRIES"), Some(&json!(3)));
        assert_eq!(config.get("DEBUG"), Some(&json!(true)));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_load_toml() {
        let file = write_temp(".toml", "token = \"abc\"\nlimit = 10\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.get("token"), Some(&json!("abc")));
        assert_eq!(config.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_empty_file_is_empty_config() {
        let file = write_temp(".yaml", "");
        let config = Config::load(file.path()).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        let err = Config::from_value(json!(["a", "b"])).unwrap_err();
        assert!(err.to_string().contains("a sequence"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
