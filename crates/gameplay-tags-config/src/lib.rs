//! Config-directory loader for gameplay-tags.
//!
//! Reads tag definitions from TOML files and turns them into the in-memory
//! [`TagSources`](gameplay_tags::TagSources) and
//! [`TagSettings`](gameplay_tags::TagSettings) a [`TagRegistry`] is built from.
//!
//! # Layout
//!
//! ```text
//! config/
//! ├── GameplayTags.toml      [settings], default [[tag]] list, [[redirect]],
//! │                          [[data_table]]
//! ├── Tags/
//! │   ├── Combat.toml        per-file [[tag]] list
//! │   └── Owners.toml        skipped if a restricted list has this file name
//! └── Restricted/
//!     └── Owners.toml        listed in settings.restricted_config_files
//! ```
//!
//! Every file is optional; an empty directory yields default settings and no
//! rows.
//!
//! # Usage
//!
//! ```ignore
//! let registry = gameplay_tags_config::load_registry("config")?;
//! let stunned = registry.request_tag("State.Stunned", true);
//! ```

mod toml_parser;

pub use toml_parser::{ConfigError, MAIN_FILE, TAGS_DIR, TagsConfig};

use std::path::Path;

use gameplay_tags::TagRegistry;

/// Load a config directory and build an initialized registry from it.
///
/// Data problems inside the rows (bad names, conflicting sources, broken
/// redirects) do not fail the load; they are reported by the registry's
/// diagnostics. Only unreadable or malformed files are errors.
pub fn load_registry(dir: impl AsRef<Path>) -> Result<TagRegistry, ConfigError> {
    Ok(TagsConfig::from_dir(dir)?.build_registry())
}
