//! Post-merge normalization and validation.
//!
//! A fixed, ordered rule sequence; order matters because later rules depend
//! on earlier ones having run (array wrapping before greeting expansion,
//! numeric coercion before the boolean pass, every coercion before the
//! required check).
//!
//! The string-to-boolean and string-to-number coercions are a deliberate
//! compatibility feature for text-based config formats: INI has no native
//! boolean or number types, so `on`/`off`/`1`/`0` and numeric strings arrive
//! here as strings.

use crate::error::ConfigError;
use serde_json::{Map, Number, Value, json};
use tracing::warn;

/// Options that must resolve to a truthy value after normalization.
pub const REQUIRED_OPTIONS: &[&str] = &["token", "mailGuildId", "mainGuildId", "logChannelId"];

/// Options coerced to numbers.
pub const NUMERIC_OPTIONS: &[&str] = &[
    "requiredAccountAge",
    "requiredTimeOnServer",
    "smallAttachmentLimit",
    "port",
];

/// Upper bound for `smallAttachmentLimit`, in bytes.
pub const SMALL_ATTACHMENT_LIMIT_MAX: f64 = (8 * 1024 * 1024) as f64;

/// Run the full rule sequence over the merged configuration, in place.
pub fn normalize(config: &mut Map<String, Value>) -> Result<(), ConfigError> {
    clamp_small_attachment_limit(config);
    check_attachment_storage(config)?;
    force_array(config, "mainGuildId", false);
    force_array(config, "inboxServerPermission", true);
    apply_flat_greeting(config);
    expand_new_thread_category(config);
    null_empty_strings(config);
    coerce_numeric_options(config)?;
    coerce_boolean_tokens(config);
    check_required_options(config)?;
    Ok(())
}

/// Truthiness used by the required-option check and the conditional rules:
/// null, false, zero, the empty string and the empty array are falsy.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// Numeric interpretation of a value: numbers pass through, strings must
/// parse as `f64` in full. Anything else has no numeric value.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_small_attachment_limit(config: &mut Map<String, Value>) {
    let Some(value) = config.get("smallAttachmentLimit") else {
        return;
    };
    // Non-numeric values fall through to the numeric coercion, which rejects
    // them with the offending value in the message.
    let Some(limit) = numeric_value(value) else {
        return;
    };
    if limit > SMALL_ATTACHMENT_LIMIT_MAX {
        config.insert(
            "smallAttachmentLimit".to_string(),
            json!(SMALL_ATTACHMENT_LIMIT_MAX),
        );
        warn!("smallAttachmentLimit capped at 8MB");
    }
}

fn check_attachment_storage(config: &Map<String, Value>) -> Result<(), ConfigError> {
    if config.get("attachmentStorage").and_then(Value::as_str) == Some("discord")
        && !is_truthy(config.get("attachmentStorageChannelId"))
    {
        return Err(ConfigError::MissingCompanion {
            key: "attachmentStorageChannelId".to_string(),
            storage: "discord".to_string(),
        });
    }
    Ok(())
}

/// Wrap a scalar value in a one-element array. With `null_to_empty`, null
/// becomes an empty array; otherwise null is left alone so the required
/// check can report it.
fn force_array(config: &mut Map<String, Value>, key: &str, null_to_empty: bool) {
    let Some(value) = config.get_mut(key) else {
        return;
    };
    match value {
        Value::Array(_) => {}
        Value::Null => {
            if null_to_empty {
                *value = Value::Array(Vec::new());
            }
        }
        other => {
            let scalar = other.take();
            *other = Value::Array(vec![scalar]);
        }
    }
}

/// Backward compatibility: a flat `greetingMessage`/`greetingAttachment`
/// applies to every guild in `mainGuildId` that has no explicit
/// `guildGreetings` entry of its own.
fn apply_flat_greeting(config: &mut Map<String, Value>) {
    let message = config.get("greetingMessage").cloned().unwrap_or(Value::Null);
    let attachment = config
        .get("greetingAttachment")
        .cloned()
        .unwrap_or(Value::Null);
    if !is_truthy(Some(&message)) && !is_truthy(Some(&attachment)) {
        return;
    }

    let guild_ids: Vec<String> = match config.get("mainGuildId") {
        Some(Value::Array(ids)) => ids.iter().filter_map(scalar_key).collect(),
        _ => return,
    };

    let Some(Value::Object(greetings)) = config.get_mut("guildGreetings") else {
        return;
    };
    for guild_id in guild_ids {
        if is_truthy(greetings.get(&guild_id)) {
            continue;
        }
        greetings.insert(
            guild_id,
            json!({ "message": message.clone(), "attachment": attachment.clone() }),
        );
    }
}

/// `newThreadCategoryId` is syntactic sugar for `categoryAutomation.newThread`.
fn expand_new_thread_category(config: &mut Map<String, Value>) {
    if !is_truthy(config.get("newThreadCategoryId")) {
        return;
    }
    let Some(category_id) = config.remove("newThreadCategoryId") else {
        return;
    };
    if let Some(Value::Object(automation)) = config.get_mut("categoryAutomation") {
        automation.insert("newThread".to_string(), category_id);
    }
}

/// `option=` without a value in config.ini arrives as an empty string; treat
/// it as unset.
fn null_empty_strings(config: &mut Map<String, Value>) {
    for value in config.values_mut() {
        if let Value::String(s) = value
            && s.is_empty()
        {
            *value = Value::Null;
        }
    }
}

fn coerce_numeric_options(config: &mut Map<String, Value>) -> Result<(), ConfigError> {
    for &key in NUMERIC_OPTIONS {
        let Some(value) = config.get(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let number = numeric_value(value)
            .and_then(Number::from_f64)
            .ok_or_else(|| ConfigError::InvalidNumeric {
                key: key.to_string(),
                value: display_value(value),
            })?;
        config.insert(key.to_string(), Value::Number(number));
    }
    Ok(())
}

fn coerce_boolean_tokens(config: &mut Map<String, Value>) {
    for value in config.values_mut() {
        let token = match value {
            Value::String(s) => match s.as_str() {
                "on" | "true" | "1" => Some(true),
                "off" | "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if let Some(flag) = token {
            *value = Value::Bool(flag);
        }
    }
}

fn check_required_options(config: &Map<String, Value>) -> Result<(), ConfigError> {
    for &key in REQUIRED_OPTIONS {
        if !is_truthy(config.get(key)) {
            return Err(ConfigError::MissingRequired {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn scalar_key(value: &Value) -> Option<String> {
    super::types::scalar_to_string(value)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_of(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn valid_base() -> Map<String, Value> {
        config_of(json!({
            "token": "abc",
            "mailGuildId": "10",
            "mainGuildId": "20",
            "logChannelId": "30",
            "guildGreetings": {},
            "categoryAutomation": {},
        }))
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!("x"))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn test_clamp_over_limit() {
        let mut config = valid_base();
        config.insert("smallAttachmentLimit".to_string(), json!(16 * 1024 * 1024));
        normalize(&mut config).unwrap();
        assert_eq!(
            config["smallAttachmentLimit"],
            json!(SMALL_ATTACHMENT_LIMIT_MAX)
        );
    }

    #[test]
    fn test_clamp_applies_to_numeric_strings() {
        let mut config = valid_base();
        config.insert("smallAttachmentLimit".to_string(), json!("16777216"));
        normalize(&mut config).unwrap();
        assert_eq!(
            config["smallAttachmentLimit"],
            json!(SMALL_ATTACHMENT_LIMIT_MAX)
        );
    }

    #[test]
    fn test_under_limit_untouched() {
        let mut config = valid_base();
        config.insert("smallAttachmentLimit".to_string(), json!(1024));
        normalize(&mut config).unwrap();
        assert_eq!(config["smallAttachmentLimit"], json!(1024.0));
    }

    #[test]
    fn test_discord_storage_requires_channel() {
        let mut config = valid_base();
        config.insert("attachmentStorage".to_string(), json!("discord"));
        let err = normalize(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCompanion { .. }));
    }

    #[test]
    fn test_discord_storage_with_channel_passes() {
        let mut config = valid_base();
        config.insert("attachmentStorage".to_string(), json!("discord"));
        config.insert("attachmentStorageChannelId".to_string(), json!("42"));
        normalize(&mut config).unwrap();
    }

    #[test]
    fn test_main_guild_id_scalar_wrapped() {
        let mut config = valid_base();
        config.insert("mainGuildId".to_string(), json!(123));
        normalize(&mut config).unwrap();
        assert_eq!(config["mainGuildId"], json!([123]));
    }

    #[test]
    fn test_main_guild_id_array_untouched() {
        let mut config = valid_base();
        config.insert("mainGuildId".to_string(), json!(["1", "2"]));
        normalize(&mut config).unwrap();
        assert_eq!(config["mainGuildId"], json!(["1", "2"]));
    }

    #[test]
    fn test_inbox_server_permission_null_becomes_empty() {
        let mut config = valid_base();
        config.insert("inboxServerPermission".to_string(), Value::Null);
        normalize(&mut config).unwrap();
        assert_eq!(config["inboxServerPermission"], json!([]));
    }

    #[test]
    fn test_inbox_server_permission_scalar_wrapped() {
        let mut config = valid_base();
        config.insert("inboxServerPermission".to_string(), json!("kickMembers"));
        normalize(&mut config).unwrap();
        assert_eq!(config["inboxServerPermission"], json!(["kickMembers"]));
    }

    #[test]
    fn test_greeting_applied_per_guild() {
        let mut config = valid_base();
        config.insert("mainGuildId".to_string(), json!([1, 2]));
        config.insert("greetingMessage".to_string(), json!("welcome"));
        normalize(&mut config).unwrap();
        assert_eq!(
            config["guildGreetings"]["1"],
            json!({"message": "welcome", "attachment": null})
        );
        assert_eq!(
            config["guildGreetings"]["2"],
            json!({"message": "welcome", "attachment": null})
        );
    }

    #[test]
    fn test_greeting_keeps_explicit_entry() {
        let mut config = valid_base();
        config.insert("mainGuildId".to_string(), json!(["1", "2"]));
        config.insert("greetingMessage".to_string(), json!("welcome"));
        config.insert(
            "guildGreetings".to_string(),
            json!({"1": {"message": "custom", "attachment": null}}),
        );
        normalize(&mut config).unwrap();
        assert_eq!(config["guildGreetings"]["1"]["message"], json!("custom"));
        assert_eq!(config["guildGreetings"]["2"]["message"], json!("welcome"));
    }

    #[test]
    fn test_new_thread_category_sugar() {
        let mut config = valid_base();
        config.insert("newThreadCategoryId".to_string(), json!("555"));
        normalize(&mut config).unwrap();
        assert!(!config.contains_key("newThreadCategoryId"));
        assert_eq!(config["categoryAutomation"]["newThread"], json!("555"));
    }

    #[test]
    fn test_empty_strings_become_null() {
        let mut config = valid_base();
        config.insert("closeMessage".to_string(), json!(""));
        normalize(&mut config).unwrap();
        assert!(config["closeMessage"].is_null());
    }

    #[test]
    fn test_numeric_coercion_from_string() {
        let mut config = valid_base();
        config.insert("port".to_string(), json!("8080"));
        normalize(&mut config).unwrap();
        assert_eq!(config["port"], json!(8080.0));
    }

    #[test]
    fn test_invalid_numeric_is_fatal() {
        let mut config = valid_base();
        config.insert("port".to_string(), json!("not-a-port"));
        let err = normalize(&mut config).unwrap_err();
        match err {
            ConfigError::InvalidNumeric { key, value } => {
                assert_eq!(key, "port");
                assert_eq!(value, "not-a-port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_boolean_tokens_coerced() {
        let mut config = valid_base();
        config.insert("allowUserClose".to_string(), json!("on"));
        config.insert("typingProxy".to_string(), json!("0"));
        config.insert("alwaysReply".to_string(), json!("false"));
        normalize(&mut config).unwrap();
        assert_eq!(config["allowUserClose"], json!(true));
        assert_eq!(config["typingProxy"], json!(false));
        assert_eq!(config["alwaysReply"], json!(false));
    }

    #[test]
    fn test_missing_required_is_fatal() {
        let mut config = valid_base();
        config.insert("token".to_string(), Value::Null);
        let err = normalize(&mut config).unwrap_err();
        match err {
            ConfigError::MissingRequired { key } => assert_eq!(key, "token"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_main_guild_id_reported_missing() {
        let mut config = valid_base();
        config.insert("mainGuildId".to_string(), Value::Null);
        let err = normalize(&mut config).unwrap_err();
        match err {
            ConfigError::MissingRequired { key } => assert_eq!(key, "mainGuildId"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
