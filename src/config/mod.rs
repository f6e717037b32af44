//! Configuration resolution for the modmail server.
//!
//! A single-pass pipeline, run once at process startup:
//! 1. **Discover** - first match from a fixed candidate list (`config.ini`,
//!    `config.json5`, ...) in the base directory
//! 2. **Parse** - INI or JSON5, selected by extension
//! 3. **Environment overlay** - `MM_`-prefixed variables, plus unprefixed
//!    `PORT` and `DATABASE_URL`
//! 4. **Dotted key expansion** - `commandAliases.mv` -> nested mapping
//! 5. **Defaults merge** - unknown keys are fatal
//! 6. **Normalize/validate** - coercion, array wrapping, sugar expansion,
//!    required-option checks
//!
//! The result is the typed [`Config`], installed process-wide via [`init`]
//! and read through [`get`]; it never changes after that.

mod discover;
mod env;
mod expand;
mod merge;
mod normalize;
mod parse;
mod resolver;
mod types;

pub use discover::{CANDIDATE_FILES, ConfigFormat, DiscoveredFile, discover_config_file};
pub use env::ENV_KEY_PREFIX;
pub use normalize::{NUMERIC_OPTIONS, REQUIRED_OPTIONS, SMALL_ATTACHMENT_LIMIT_MAX};
pub use resolver::Resolver;
pub use types::{Config, DatabaseConfig, GuildGreeting, MigrationSettings, PermissionSpec};

use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install the resolved configuration as the process-wide instance and
/// return a handle to it. The first call wins; later calls return the
/// already-installed configuration.
pub fn init(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

/// The process-wide configuration, or `None` before [`init`] has run.
pub fn get() -> Option<&'static Config> {
    CONFIG.get()
}
