//! Format-specific decoding of a discovered config file.
//!
//! INI keys outside any section land at the top level and `[section]` blocks
//! become nested mappings; every INI scalar is a string, left for the
//! normalizer to coerce. JSON and JSON5 decode directly into a mapping.

use super::discover::{ConfigFormat, DiscoveredFile};
use crate::error::ConfigError;
use ini::Ini;
use serde_json::{Map, Value};

/// Decode `file` into a top-level configuration mapping.
///
/// Any read or parse failure is fatal and carries the original failure
/// message. The executable `config.js` format is rejected outright.
pub fn parse_config_file(file: &DiscoveredFile) -> Result<Map<String, Value>, ConfigError> {
    if file.format == ConfigFormat::Executable {
        return Err(ConfigError::ExecutableConfig {
            path: file.path.clone(),
        });
    }

    let raw = std::fs::read_to_string(&file.path).map_err(|e| ConfigError::Read {
        path: file.path.clone(),
        source: e,
    })?;

    if file.format == ConfigFormat::Ini {
        parse_ini(&raw, file)
    } else {
        parse_json5(&raw, file)
    }
}

fn parse_ini(raw: &str, file: &DiscoveredFile) -> Result<Map<String, Value>, ConfigError> {
    let ini = Ini::load_from_str(raw).map_err(|e| ConfigError::Parse {
        path: file.path.clone(),
        message: e.to_string(),
    })?;

    let mut map = Map::new();
    for (section, props) in ini.iter() {
        match section {
            None => {
                for (key, value) in props.iter() {
                    map.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
            Some(name) => {
                let entry = map
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = entry {
                    for (key, value) in props.iter() {
                        nested.insert(key.to_string(), Value::String(value.to_string()));
                    }
                }
            }
        }
    }
    Ok(map)
}

fn parse_json5(raw: &str, file: &DiscoveredFile) -> Result<Map<String, Value>, ConfigError> {
    match json5::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConfigError::Parse {
            path: file.path.clone(),
            message: "expected an object at the top level".to_string(),
        }),
        Err(e) => Err(ConfigError::Parse {
            path: file.path.clone(),
            message: e.to_string(),
        }),
    }
}
