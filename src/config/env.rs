//! Environment variable overlay.
//!
//! Variables prefixed `MM_` map onto config keys:
//! `MM_CLOSE_MESSAGE` -> `closeMessage`,
//! `MM_COMMAND_ALIASES__MV` -> `commandAliases.mv`.
//! Only the first `__` becomes a path separator; this gives a single level of
//! nesting and is a documented limitation. Values containing `||` split into
//! a string array. The overlay takes its variables as explicit pairs so tests
//! can inject them; the resolver feeds it the process environment.

use regex_lite::{Captures, Regex};
use serde_json::{Map, Value};

/// Prefix that marks an environment variable as a config override.
pub const ENV_KEY_PREFIX: &str = "MM_";

/// Overlay `MM_`-prefixed variables onto `config`, overwriting any values the
/// file parser produced for the same keys. Returns how many values were
/// applied.
///
/// An unprefixed `PORT` variable overlays the `port` key when `MM_PORT` is
/// not set.
pub fn apply_env_overrides(config: &mut Map<String, Value>, vars: &[(String, String)]) -> usize {
    let mut applied = 0;

    for (name, value) in vars {
        let Some(rest) = name.strip_prefix(ENV_KEY_PREFIX) else {
            continue;
        };
        config.insert(env_key_to_config_key(rest), env_value(value));
        applied += 1;
    }

    // Special case: allow the common "PORT" variable without the prefix
    let has_mm_port = vars
        .iter()
        .any(|(name, value)| name == "MM_PORT" && !value.is_empty());
    if !has_mm_port
        && let Some((_, port)) = vars.iter().find(|(name, _)| name == "PORT")
        && !port.is_empty()
    {
        config.insert("port".to_string(), Value::String(port.clone()));
        applied += 1;
    }

    applied
}

/// Transform the remainder of a variable name (after `MM_`) into a config
/// key: lowercase, camelize `snake_case` segments, then turn the first `__`
/// into a `.`.
///
/// Camelization scans left to right without overlapping, so a one-letter
/// segment can shadow the next boundary (`A_B_C` -> `aB_c`); kept as-is for
/// compatibility with existing deployments.
pub fn env_key_to_config_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cameled = match Regex::new(r"([a-z])_([a-z])") {
        Ok(re) => re
            .replace_all(&lowered, |caps: &Captures| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned(),
        Err(_) => lowered,
    };
    cameled.replacen("__", ".", 1)
}

fn env_value(raw: &str) -> Value {
    if raw.contains("||") {
        Value::Array(
            raw.split("||")
                .map(|part| Value::String(part.to_string()))
                .collect(),
        )
    } else {
        Value::String(raw.to_string())
    }
}
