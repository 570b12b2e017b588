//! TOML parser for the config directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use gameplay_tags::{
    RestrictedTagRow, SourceRows, TagRedirect, TagRegistry, TagRow, TagSettings, TagSources,
};

/// Main file: settings, the default tag list, redirects and data tables.
pub const MAIN_FILE: &str = "GameplayTags.toml";

/// Directory scanned for per-file tag lists.
pub const TAGS_DIR: &str = "Tags";

/// Parsed config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsConfig {
    pub settings: TagSettings,
    pub sources: TagSources,
}

/// Raw main-file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawMainFile {
    settings: TagSettings,
    tag: Vec<TagRow>,
    redirect: Vec<TagRedirect>,
    data_table: Vec<RawDataTable>,
}

#[derive(Debug, Deserialize)]
struct RawDataTable {
    name: String,
    #[serde(default)]
    tag: Vec<TagRow>,
}

/// Raw per-file list: `[[tag]]` rows only.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTagList<R> {
    tag: Vec<R>,
}

impl TagsConfig {
    /// Load every file of a config directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();

        let main = dir.join(MAIN_FILE);
        let mut config = if main.is_file() {
            Self::from_file(&main)?
        } else {
            debug!(path = %main.display(), "no main tag config, using defaults");
            Self::default()
        };

        for relative in config.settings.restricted_config_files.clone() {
            let path = dir.join(&relative);
            if !path.is_file() {
                warn!(path = %path.display(), "restricted tag list not found");
                continue;
            }
            let rows = read_list::<RestrictedTagRow>(&path)?;
            config.sources.restricted.push(SourceRows::new(relative, rows));
        }

        for path in list_toml_files(&dir.join(TAGS_DIR))? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "skipping tag list with a non UTF-8 name");
                continue;
            };
            let source = format!("{TAGS_DIR}/{file_name}");
            let rows = read_list::<TagRow>(&path)?;
            config.sources.tag_lists.push(SourceRows::new(source, rows));
        }

        info!(
            dir = %dir.display(),
            rows = config.sources.row_count(),
            redirects = config.sources.redirects.len(),
            restricted_lists = config.sources.restricted.len(),
            tag_lists = config.sources.tag_lists.len(),
            "loaded tag config"
        );
        Ok(config)
    }

    /// Parse a main file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read(path)?;
        Self::parse_main(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse main-file content.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse_main(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(MAIN_FILE),
            source,
        })
    }

    fn parse_main(content: &str) -> Result<Self, toml::de::Error> {
        let raw: RawMainFile = toml::from_str(content)?;

        let mut sources = TagSources::new();
        sources.default_list = raw.tag;
        sources.redirects = raw.redirect;
        sources.data_tables = raw
            .data_table
            .into_iter()
            .map(|table| SourceRows::new(table.name, table.tag))
            .collect();

        Ok(Self {
            settings: raw.settings,
            sources,
        })
    }

    /// Build and initialize a registry from this config.
    pub fn build_registry(self) -> TagRegistry {
        let mut registry = TagRegistry::new(self.settings);
        registry.initialize(self.sources);
        registry
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_list<R: DeserializeOwned + Default>(path: &Path) -> Result<Vec<R>, ConfigError> {
    let content = read(path)?;
    let raw: RawTagList<R> = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw.tag)
}

/// `*.toml` files directly inside `dir`, sorted. A missing directory is empty.
fn list_toml_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Errors while reading a config directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_main_file() {
        let toml = r#"
[settings]
common_tags = ["State.Stunned"]
net_index_first_bit_segment = 4

[[tag]]
name = "State.Stunned"
comment = "Cannot act"

[[tag]]
tag = "State.Rooted"

[[redirect]]
old = "State.Frozen"
new = "State.Rooted"
"#;
        let config = TagsConfig::from_str(toml).unwrap();

        assert_eq!(config.settings.common_tags, vec!["State.Stunned".to_string()]);
        assert_eq!(config.settings.net_index_first_bit_segment, 4);
        assert_eq!(config.settings.net_index_bits, 16);
        assert_eq!(
            config.sources.default_list,
            vec![
                TagRow::new("State.Stunned", "Cannot act"),
                TagRow::new("State.Rooted", ""),
            ]
        );
        assert_eq!(
            config.sources.redirects,
            vec![TagRedirect::new("State.Frozen", "State.Rooted")]
        );
    }

    #[test]
    fn empty_main_file_is_defaults() {
        let config = TagsConfig::from_str("").unwrap();
        assert_eq!(config, TagsConfig::default());
    }

    #[test]
    fn data_tables_keep_their_names() {
        let toml = r#"
[[data_table]]
name = "Abilities"

[[data_table.tag]]
name = "Ability.Fireball"
dev_comment = "Big"
"#;
        let config = TagsConfig::from_str(toml).unwrap();
        assert_eq!(
            config.sources.data_tables,
            vec![SourceRows::new(
                "Abilities",
                vec![TagRow::new("Ability.Fireball", "Big")]
            )]
        );
    }

    #[test]
    fn retired_redirect_has_empty_target() {
        let config = TagsConfig::from_str("[[redirect]]\nold = \"Old.Tag\"\n").unwrap();
        assert_eq!(config.sources.redirects, vec![TagRedirect::new("Old.Tag", "")]);
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let err = TagsConfig::from_str("[[tags]]\nname = \"A\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse GameplayTags.toml"));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(TagsConfig::from_str("[[tag]\nname = ").is_err());
    }

    #[test]
    fn build_registry_initializes() {
        let config = TagsConfig::from_str("[[tag]]\nname = \"A.B\"\n").unwrap();
        let registry = config.build_registry();
        assert!(registry.is_initialized());
        assert_eq!(registry.len(), 2);
        assert!(registry.is_dictionary_tag("A.B"));
        assert!(!registry.is_dictionary_tag("A"));
    }
}
