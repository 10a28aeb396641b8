/*!
 * Tests for language code utilities
 */

use beadalign::language_utils::{
    display_name, get_language_name, language_codes_match, normalize_to_part1_or_part2t,
    normalize_to_part2t, validate_language_code, LanguageCodeType,
};

/// Test code type detection
#[test]
fn test_validate_language_code_withKnownCodes_shouldDetectType() {
    assert_eq!(validate_language_code("en").ok(), Some(LanguageCodeType::Part1));
    assert_eq!(validate_language_code("deu").ok(), Some(LanguageCodeType::Part2T));
    assert_eq!(validate_language_code("ger").ok(), Some(LanguageCodeType::Part2B));
    assert_eq!(validate_language_code(" FR ").ok(), Some(LanguageCodeType::Part1));
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("english").is_err());
}

/// Test normalization to three-letter codes
#[test]
fn test_normalize_to_part2t_withEveryCodeType_shouldReturnPart2T() {
    assert_eq!(normalize_to_part2t("de").ok().as_deref(), Some("deu"));
    assert_eq!(normalize_to_part2t("ger").ok().as_deref(), Some("deu"));
    assert_eq!(normalize_to_part2t("fre").ok().as_deref(), Some("fra"));
    assert_eq!(normalize_to_part2t("zho").ok().as_deref(), Some("zho"));
    assert!(normalize_to_part2t("").is_err());
}

/// Test normalization back to two-letter codes where they exist
#[test]
fn test_normalize_to_part1_or_part2t_withThreeLetterCode_shouldPreferPart1() {
    assert_eq!(normalize_to_part1_or_part2t("fra").ok().as_deref(), Some("fr"));
    assert_eq!(normalize_to_part1_or_part2t("chi").ok().as_deref(), Some("zh"));
}

/// Test that different spellings of one language match
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "invalid"));
}

/// Test language names
#[test]
fn test_get_language_name_withValidCode_shouldReturnEnglishName() {
    assert_eq!(get_language_name("en").ok().as_deref(), Some("English"));
    assert_eq!(get_language_name("deu").ok().as_deref(), Some("German"));
    assert!(get_language_name("qq").is_err());
    assert_eq!(display_name("qq"), "qq");
    assert_eq!(display_name("fr"), "French");
}
