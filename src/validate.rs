//! Tag name validation and best-effort normalization.

use crate::error::TagNameError;
use crate::settings::TagSettings;
use crate::tag::TAG_SEPARATOR;

/// Check `name` against the structural rules and the invalid-character set.
///
/// On failure the error carries a suggested fix: trimmed whitespace, stripped
/// leading/trailing separators, collapsed empty segments, and invalid
/// characters replaced with `_`. The first problem found decides the error
/// variant, but the suggested fix addresses all of them.
pub fn validate_tag_name(name: &str, settings: &TagSettings) -> Result<(), TagNameError> {
    if name.is_empty() {
        return Err(TagNameError::Empty);
    }

    let fixed = suggest_fix(name, settings);

    if name.trim() != name {
        return Err(TagNameError::Untrimmed {
            name: name.to_string(),
            fixed,
        });
    }
    if name.starts_with(TAG_SEPARATOR) || name.ends_with(TAG_SEPARATOR) {
        return Err(TagNameError::StraySeparator {
            name: name.to_string(),
            fixed,
        });
    }
    if name.split(TAG_SEPARATOR).any(str::is_empty) {
        return Err(TagNameError::EmptySegment {
            name: name.to_string(),
            fixed,
        });
    }
    if let Some(invalid) = name.chars().find(|&c| settings.is_invalid_char(c)) {
        return Err(TagNameError::InvalidCharacter {
            name: name.to_string(),
            invalid,
            fixed,
        });
    }
    Ok(())
}

fn suggest_fix(name: &str, settings: &TagSettings) -> String {
    structural_fix(name)
        .chars()
        .map(|c| if settings.is_invalid_char(c) { '_' } else { c })
        .collect()
}

/// Trim whitespace and separators, and drop empty segments.
fn structural_fix(name: &str) -> String {
    name.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Normalize a row name for insertion.
///
/// Returns the name to insert, plus the error when a structural fix was
/// applied; `Err` when the row must be dropped.
pub(crate) fn normalize_tag_name(
    name: &str,
    settings: &TagSettings,
) -> Result<(String, Option<TagNameError>), TagNameError> {
    match validate_tag_name(name, settings) {
        Ok(()) => Ok((name.to_string(), None)),
        Err(err) if err.is_normalizable() => {
            let fixed = structural_fix(name);
            match validate_tag_name(&fixed, settings) {
                Ok(()) => Ok((fixed, Some(err))),
                Err(_) => Err(err),
            }
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings() -> TagSettings {
        TagSettings::default()
    }

    #[rstest]
    #[case("A")]
    #[case("A.B.C")]
    #[case("Weapon.Ranged.Sniper_01")]
    #[case("Ability-Cooldown.Fire")]
    fn accepts_valid_names(#[case] name: &str) {
        assert_eq!(validate_tag_name(name, &settings()), Ok(()));
    }

    #[rstest]
    #[case(".A.B", "A.B")]
    #[case("A.B.", "A.B")]
    #[case(" A.B ", "A.B")]
    #[case("A..B", "A.B")]
    #[case("A.B C", "A.B_C")]
    #[case("A,B", "A_B")]
    #[case("..A. .B..", "A.B")]
    fn suggests_fixes(#[case] name: &str, #[case] fixed: &str) {
        let err = validate_tag_name(name, &settings()).unwrap_err();
        assert_eq!(err.fixed(), Some(fixed));
    }

    #[test]
    fn empty_has_no_fix() {
        let err = validate_tag_name("", &settings()).unwrap_err();
        assert_eq!(err, TagNameError::Empty);
        assert_eq!(err.fixed(), None);

        let err = validate_tag_name("...", &settings()).unwrap_err();
        assert_eq!(err.fixed(), None);
    }

    #[test]
    fn normalize_applies_structural_fixes_only() {
        let (name, err) = normalize_tag_name(" .A.B ", &settings()).unwrap();
        assert_eq!(name, "A.B");
        assert!(err.is_some());

        let (name, err) = normalize_tag_name("A.B", &settings()).unwrap();
        assert_eq!(name, "A.B");
        assert!(err.is_none());

        let err = normalize_tag_name("A.B C", &settings()).unwrap_err();
        assert!(matches!(err, TagNameError::InvalidCharacter { invalid: ' ', .. }));

        // trimming must not smuggle an invalid character through
        let err = normalize_tag_name(" A.B,C", &settings()).unwrap_err();
        assert_eq!(err.fixed(), Some("A.B_C"));
    }

    #[test]
    fn custom_invalid_characters() {
        let settings = TagSettings {
            invalid_tag_characters: "#".into(),
            ..TagSettings::default()
        };
        assert!(validate_tag_name("A#B", &settings).is_err());
        assert!(validate_tag_name("A,B", &settings).is_ok());
    }
}
