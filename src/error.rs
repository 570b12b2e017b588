use thiserror::Error;

/// Why a tag name was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagNameError {
    #[error("tag name is empty")]
    Empty,

    #[error("tag name '{name}' starts or ends with '.'")]
    StraySeparator { name: String, fixed: String },

    #[error("tag name '{name}' has leading or trailing whitespace")]
    Untrimmed { name: String, fixed: String },

    #[error("tag name '{name}' has an empty segment")]
    EmptySegment { name: String, fixed: String },

    #[error("tag name '{name}' contains invalid character {invalid:?}")]
    InvalidCharacter {
        name: String,
        invalid: char,
        fixed: String,
    },
}

impl TagNameError {
    /// Suggested replacement name, if one exists.
    pub fn fixed(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::StraySeparator { fixed, .. }
            | Self::Untrimmed { fixed, .. }
            | Self::EmptySegment { fixed, .. }
            | Self::InvalidCharacter { fixed, .. } => {
                if fixed.is_empty() {
                    None
                } else {
                    Some(fixed)
                }
            }
        }
    }

    /// Whether the registry may apply [`fixed`](Self::fixed) on its own.
    ///
    /// Only structural clean-up is applied; a name with invalid characters is
    /// always rejected so the author picks the replacement.
    pub fn is_normalizable(&self) -> bool {
        !matches!(self, Self::Empty | Self::InvalidCharacter { .. }) && self.fixed().is_some()
    }
}

/// Errors from the net-index wire encoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of bit stream: needed {needed} bits, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("container holds {len} tags but only {max} fit in the size prefix")]
    ContainerTooLarge { len: usize, max: usize },

    #[error("net indices have not been assigned")]
    NoNetIndex,

    #[error("tag '{0}' has no net index")]
    UnknownTag(String),
}
