//! The typed configuration schema.
//!
//! The normalized mapping deserializes into [`Config`], which is what the
//! rest of the application consumes. Field names are compile-time checked;
//! guild/channel/category IDs accept either JSON numbers or strings and
//! normalize to strings, since INI supplies IDs as strings while JSON5
//! configs often write them as numbers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The final, immutable server configuration.
///
/// Every field is guaranteed present: resolution merges user input onto the
/// built-in defaults and rejects unknown keys before this type is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Bot token. Required.
    pub token: String,

    /// ID of the inbox (staff) server. Required.
    #[serde(deserialize_with = "string_from_scalar")]
    pub mail_guild_id: String,

    /// IDs of the main servers. Scalar input is wrapped during
    /// normalization, so this is always an array here.
    #[serde(deserialize_with = "vec_string_from_scalars")]
    pub main_guild_id: Vec<String>,

    /// Channel that receives thread logs. Required.
    #[serde(deserialize_with = "string_from_scalar")]
    pub log_channel_id: String,

    pub prefix: String,
    pub snippet_prefix: String,
    pub snippet_prefix_anon: String,

    pub status: String,
    pub response_message: String,
    pub close_message: Option<String>,
    pub allow_user_close: bool,

    /// Always `None` after resolution; the value moves into
    /// `categoryAutomation.newThread`.
    #[serde(default, deserialize_with = "opt_string_from_scalar")]
    pub new_thread_category_id: Option<String>,
    #[serde(deserialize_with = "string_from_scalar")]
    pub mention_role: String,
    pub ping_on_bot_mention: bool,
    pub bot_mention_response: Option<String>,

    pub inbox_server_permission: Vec<PermissionSpec>,
    pub always_reply: bool,
    pub always_reply_anon: bool,
    pub use_nicknames: bool,
    pub ignore_accidental_threads: bool,
    pub thread_timestamps: bool,
    pub allow_move: bool,
    pub sync_permissions_on_move: bool,
    pub typing_proxy: bool,
    pub typing_proxy_reverse: bool,
    pub mention_user_in_thread_header: bool,
    pub roles_in_thread_header: bool,

    pub enable_greeting: bool,
    pub greeting_message: Option<String>,
    pub greeting_attachment: Option<String>,

    /// Per-guild greetings, keyed by guild ID.
    pub guild_greetings: BTreeMap<String, GuildGreeting>,

    /// Minimum account age for opening a thread, in hours.
    pub required_account_age: Option<f64>,
    pub account_age_denied_message: String,

    /// Minimum time on server for opening a thread, in minutes.
    pub required_time_on_server: Option<f64>,
    pub time_on_server_denied_message: String,

    pub relay_small_attachments_as_attachments: bool,
    /// In bytes, clamped to 8 MiB.
    pub small_attachment_limit: f64,
    pub attachment_storage: String,
    #[serde(default, deserialize_with = "opt_string_from_scalar")]
    pub attachment_storage_channel_id: Option<String>,

    #[serde(deserialize_with = "map_string_from_scalars")]
    pub category_automation: BTreeMap<String, String>,

    pub update_notifications: bool,
    pub plugins: Vec<String>,

    pub command_aliases: BTreeMap<String, String>,

    pub port: f64,
    pub url: Option<String>,

    pub db_dir: PathBuf,
    /// Database connection settings, handed to the migration system verbatim.
    pub knex: DatabaseConfig,

    pub log_dir: PathBuf,
}

/// A greeting configured for a single guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GuildGreeting {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}

/// knex-style database connection block.
///
/// `migrations` is always present: resolution injects it from the resolved
/// `dbDir`. Any extra driver options the user supplied are carried along
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub connection: Option<Value>,
    pub migrations: MigrationSettings,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// Migration settings injected into the database block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MigrationSettings {
    pub directory: PathBuf,
}

/// An inbox-server permission requirement: either a permission level or a
/// named permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionSpec {
    Level(f64),
    Name(String),
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

/// IDs written as numbers print without a trailing `.0`, whichever numeric
/// representation the decoder produced (JSON5 numbers may arrive as floats).
fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(f) = n.as_f64()
        && f.is_finite()
        && f.fract() == 0.0
        && f.abs() < i64::MAX as f64
    {
        return (f as i64).to_string();
    }
    n.to_string()
}

fn string_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a string or number, got {value}")))
}

fn opt_string_from_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    scalar_to_string(&value)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("expected a string or number, got {value}")))
}

fn vec_string_from_scalars<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|v| {
            scalar_to_string(v)
                .ok_or_else(|| de::Error::custom(format!("expected a string or number, got {v}")))
        })
        .collect()
}

fn map_string_from_scalars<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = BTreeMap::<String, Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|(k, v)| {
            scalar_to_string(&v)
                .map(|s| (k, s))
                .ok_or_else(|| de::Error::custom(format!("expected a string or number, got {v}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permission_spec_untagged() {
        let level: PermissionSpec = serde_json::from_value(json!(4)).unwrap();
        assert_eq!(level, PermissionSpec::Level(4.0));
        let name: PermissionSpec = serde_json::from_value(json!("kickMembers")).unwrap();
        assert_eq!(name, PermissionSpec::Name("kickMembers".to_string()));
    }

    #[test]
    fn test_integral_float_ids_lose_the_point() {
        let id: String = string_from_scalar(json!(123.0)).unwrap();
        assert_eq!(id, "123");
    }

    #[test]
    fn test_guild_greeting_partial_entry() {
        let greeting: GuildGreeting =
            serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(greeting.message.as_deref(), Some("hi"));
        assert_eq!(greeting.attachment, None);
    }

    #[test]
    fn test_database_config_keeps_extra_options() {
        let db: DatabaseConfig = serde_json::from_value(json!({
            "client": "sqlite3",
            "connection": {"filename": "bot.sqlite"},
            "useNullAsDefault": true,
            "migrations": {"directory": "db/migrations"}
        }))
        .unwrap();
        assert_eq!(db.client.as_deref(), Some("sqlite3"));
        assert_eq!(db.options["useNullAsDefault"], json!(true));
        assert_eq!(db.migrations.directory, PathBuf::from("db/migrations"));
    }

    #[test]
    fn test_id_fields_accept_numbers() {
        let value = json!({"directory": "x"});
        let _: MigrationSettings = serde_json::from_value(value).unwrap();

        let id: String = string_from_scalar(json!(123456789012345678_u64)).unwrap();
        assert_eq!(id, "123456789012345678");
    }
}
