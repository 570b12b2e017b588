//! Registry settings.

use serde::Deserialize;

/// Maps one category filter onto several root categories for
/// [`TagRegistry::filtered_root_tags`](crate::TagRegistry::filtered_root_tags).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryRemap {
    pub base_category: String,
    #[serde(default)]
    pub remap_categories: Vec<String>,
}

/// Tunables for tree construction, validation and replication.
///
/// Every field has a default, so an empty `[settings]` table is valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagSettings {
    /// Characters rejected in tag names, in addition to whitespace and control
    /// characters which are always rejected.
    pub invalid_tag_characters: String,
    /// Tags that get the smallest net indices, in priority order.
    pub common_tags: Vec<String>,
    /// Assign net indices after construction.
    pub fast_replication: bool,
    /// Width of the short wire segment for net indices.
    pub net_index_first_bit_segment: u8,
    /// Width of the net-index integer; at most 16.
    pub net_index_bits: u8,
    /// Bits used for the tag count prefix when writing a container.
    pub num_bits_for_container_size: u8,
    /// Report unknown tag names found while loading persisted tags.
    pub warn_on_invalid_tags: bool,
    /// Category filter remapping used by root-tag filtering.
    pub category_remapping: Vec<CategoryRemap>,
    /// Restricted tag list files, relative to the config directory. A per-file
    /// tag list with the same file name is skipped.
    pub restricted_config_files: Vec<String>,
}

impl Default for TagSettings {
    fn default() -> Self {
        Self {
            invalid_tag_characters: "\"',".to_string(),
            common_tags: Vec::new(),
            fast_replication: true,
            net_index_first_bit_segment: 16,
            net_index_bits: 16,
            num_bits_for_container_size: 6,
            warn_on_invalid_tags: true,
            category_remapping: Vec::new(),
            restricted_config_files: Vec::new(),
        }
    }
}

impl TagSettings {
    /// `true` if `c` may not appear in a tag name.
    pub fn is_invalid_char(&self, c: char) -> bool {
        c.is_whitespace() || c.is_control() || self.invalid_tag_characters.contains(c)
    }

    /// Effective net-index width, clamped to `1..=16`.
    pub fn index_bits(&self) -> u8 {
        self.net_index_bits.clamp(1, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_control_always_invalid() {
        let settings = TagSettings {
            invalid_tag_characters: String::new(),
            ..TagSettings::default()
        };
        assert!(settings.is_invalid_char(' '));
        assert!(settings.is_invalid_char('\t'));
        assert!(settings.is_invalid_char('\u{7}'));
        assert!(!settings.is_invalid_char('_'));
        assert!(!settings.is_invalid_char(','));
    }

    #[test]
    fn default_denylist_has_quotes_and_commas() {
        let settings = TagSettings::default();
        assert!(settings.is_invalid_char('"'));
        assert!(settings.is_invalid_char('\''));
        assert!(settings.is_invalid_char(','));
    }

    #[test]
    fn index_bits_clamped() {
        let settings = TagSettings {
            net_index_bits: 40,
            ..TagSettings::default()
        };
        assert_eq!(settings.index_bits(), 16);
    }
}
