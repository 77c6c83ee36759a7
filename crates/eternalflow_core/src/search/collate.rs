//! Locale-aware title comparison.
//!
//! Three comparison levels, in the spirit of the Unicode collation algorithm:
//! - primary: base letters after canonical decomposition, case-folded, with
//!   whitespace < punctuation and symbols < digits < letters;
//! - secondary: diacritics attached to each base letter (`е` < `ё`,
//!   `cote` < `coté` < `côte`);
//! - tertiary: lowercase before uppercase.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Symbol,
    Digit,
    Letter,
}

fn class_of(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Space
    } else if ch.is_numeric() {
        CharClass::Digit
    } else if ch.is_alphabetic() {
        CharClass::Letter
    } else {
        CharClass::Symbol
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SortKey {
    primary: Vec<(CharClass, char)>,
    /// Combining marks per primary element, same length as `primary`.
    accents: Vec<Vec<char>>,
}

fn sort_key(value: &str) -> SortKey {
    let mut primary = Vec::new();
    let mut accents: Vec<Vec<char>> = Vec::new();
    for ch in value.nfd().flat_map(char::to_lowercase) {
        if is_combining_mark(ch) {
            // A mark with no base letter before it carries no weight.
            if let Some(marks) = accents.last_mut() {
                marks.push(ch);
            }
            continue;
        }
        primary.push((class_of(ch), ch));
        accents.push(Vec::new());
    }
    SortKey { primary, accents }
}

fn tertiary_cmp(left: &str, right: &str) -> Ordering {
    for (a, b) in left.chars().zip(right.chars()) {
        if a == b {
            continue;
        }
        match (a.is_lowercase(), b.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => return a.cmp(&b),
        }
    }
    left.chars().count().cmp(&right.chars().count())
}

/// Compares two titles the way a sorted card list should read.
///
/// Returns `Equal` only for identical strings.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    let left_key = sort_key(left);
    let right_key = sort_key(right);
    left_key
        .primary
        .cmp(&right_key.primary)
        .then_with(|| left_key.accents.cmp(&right_key.accents))
        .then_with(|| tertiary_cmp(left, right))
}

#[cfg(test)]
mod tests {
    use super::locale_compare;
    use std::cmp::Ordering;

    #[test]
    fn comparison_ignores_case_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Яблоко", "арбуз"), Ordering::Greater);
    }

    #[test]
    fn yo_sorts_next_to_ye() {
        assert_eq!(locale_compare("ёж", "жук"), Ordering::Less);
        assert_eq!(locale_compare("еж", "ёж"), Ordering::Less);
    }

    #[test]
    fn accented_latin_sorts_with_its_base_letter() {
        assert_eq!(locale_compare("école", "zoo"), Ordering::Less);
        assert_eq!(locale_compare("École", "ecole"), Ordering::Greater);
        assert_eq!(locale_compare("Ångström", "banana"), Ordering::Less);
        assert_eq!(locale_compare("cote", "coté"), Ordering::Less);
        assert_eq!(locale_compare("coté", "côte"), Ordering::Less);
    }

    #[test]
    fn precomposed_and_decomposed_forms_share_a_position() {
        let precomposed = "\u{e9}t\u{e9}";
        let decomposed = "e\u{301}te\u{301}";
        assert_eq!(locale_compare(precomposed, "eta"), Ordering::Greater);
        assert_eq!(locale_compare(decomposed, "eta"), Ordering::Greater);
        assert_eq!(locale_compare(precomposed, "etz"), Ordering::Less);
        assert_eq!(locale_compare(decomposed, "etz"), Ordering::Less);
    }

    #[test]
    fn symbols_and_digits_precede_letters() {
        assert_eq!(locale_compare("~note", "apple"), Ordering::Less);
        assert_eq!(locale_compare("_draft", "Aardvark"), Ordering::Less);
        assert_eq!(locale_compare("2 недели", "апрель"), Ordering::Less);
        assert_eq!(locale_compare("#1", "1"), Ordering::Less);
        assert_eq!(locale_compare("zoo", "арбуз"), Ordering::Less);
    }

    #[test]
    fn lowercase_precedes_uppercase_on_ties() {
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("Same", "Same"), Ordering::Equal);
    }
}
