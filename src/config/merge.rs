//! Defaults merging.
//!
//! The default configuration defines the full set of valid option names: a
//! user key that is not in the default set fails resolution. Recognized keys
//! overwrite defaults shallowly; nested mappings such as `commandAliases`
//! are replaced wholesale, not deep-merged.

use super::normalize::is_truthy;
use crate::error::ConfigError;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Build the default configuration mapping. `base_dir` anchors the database
/// and log directories.
pub fn default_config(base_dir: &Path) -> Map<String, Value> {
    let db_dir = base_dir.join("db");
    let log_dir = base_dir.join("logs");

    let defaults = json!({
        "token": null,
        "mailGuildId": null,
        "mainGuildId": null,
        "logChannelId": null,

        "prefix": "!",
        "snippetPrefix": "!!",
        "snippetPrefixAnon": "!!!",

        "status": "Message me for help!",
        "responseMessage": "Thank you for your message! Our mod team will reply to you here as soon as possible.",
        "closeMessage": null,
        "allowUserClose": false,

        "newThreadCategoryId": null,
        "mentionRole": "here",
        "pingOnBotMention": true,
        "botMentionResponse": null,

        "inboxServerPermission": null,
        "alwaysReply": false,
        "alwaysReplyAnon": false,
        "useNicknames": false,
        "ignoreAccidentalThreads": false,
        "threadTimestamps": false,
        "allowMove": false,
        "syncPermissionsOnMove": true,
        "typingProxy": false,
        "typingProxyReverse": false,
        "mentionUserInThreadHeader": false,
        "rolesInThreadHeader": false,

        "enableGreeting": false,
        "greetingMessage": null,
        "greetingAttachment": null,

        "guildGreetings": {},

        // In hours
        "requiredAccountAge": null,
        "accountAgeDeniedMessage": "Your Discord account is not old enough to contact modmail.",

        // In minutes
        "requiredTimeOnServer": null,
        "timeOnServerDeniedMessage": "You haven't been a member of the server for long enough to contact modmail.",

        "relaySmallAttachmentsAsAttachments": false,
        "smallAttachmentLimit": 2 * 1024 * 1024,
        "attachmentStorage": "local",
        "attachmentStorageChannelId": null,

        "categoryAutomation": {},

        "updateNotifications": true,
        "plugins": [],

        "commandAliases": {},

        "port": 8890,
        "url": null,

        "dbDir": db_dir.to_string_lossy(),
        "knex": null,

        "logDir": log_dir.to_string_lossy(),
    });

    match defaults {
        Value::Object(map) => map,
        _ => unreachable!("default config literal is an object"),
    }
}

/// Overlay the assembled user configuration onto a copy of the defaults.
///
/// Fails fatally on any key that is not part of the default set, then fills
/// in the database connection block (see [`ensure_database_config`]).
pub fn merge_with_defaults(
    user: Map<String, Value>,
    base_dir: &Path,
    database_url: Option<&str>,
) -> Result<Map<String, Value>, ConfigError> {
    let mut merged = default_config(base_dir);

    for (key, value) in user {
        if !merged.contains_key(&key) {
            return Err(ConfigError::UnknownOption { key });
        }
        merged.insert(key, value);
    }

    ensure_database_config(&mut merged, database_url);
    Ok(merged)
}

/// Synthesize a `knex` block pointing at `DATABASE_URL` when the user did not
/// supply one, and always inject the migrations directory derived from the
/// resolved `dbDir`.
fn ensure_database_config(config: &mut Map<String, Value>, database_url: Option<&str>) {
    if !is_truthy(config.get("knex")) {
        config.insert(
            "knex".to_string(),
            json!({
                "client": "pg",
                "connection": database_url,
            }),
        );
    }

    let migrations_dir = config
        .get("dbDir")
        .and_then(Value::as_str)
        .map(|dir| Path::new(dir).join("migrations").to_string_lossy().into_owned());

    if let Some(directory) = migrations_dir
        && let Some(Value::Object(knex)) = config.get_mut("knex")
    {
        knex.insert("migrations".to_string(), json!({ "directory": directory }));
    }
}
