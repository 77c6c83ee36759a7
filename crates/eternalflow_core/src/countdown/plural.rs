//! Three-way plural selection for the display locale (Russian).
//!
//! Another locale plugs in by providing its own [`PluralRule`] and label table
//! behind the same `[one, few, many]` contract.

/// Grammatical number category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralCategory {
    One,
    Few,
    Many,
}

/// Label forms for one noun, indexed by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluralForms {
    pub one: &'static str,
    pub few: &'static str,
    pub many: &'static str,
}

impl PluralForms {
    pub const fn new(one: &'static str, few: &'static str, many: &'static str) -> Self {
        Self { one, few, many }
    }

    pub fn get(&self, category: PluralCategory) -> &'static str {
        match category {
            PluralCategory::One => self.one,
            PluralCategory::Few => self.few,
            PluralCategory::Many => self.many,
        }
    }
}

/// Maps a count to a plural category.
pub trait PluralRule {
    fn category(&self, value: u64) -> PluralCategory;

    /// Picks the label for `value` from `forms`.
    fn select(&self, value: u64, forms: &PluralForms) -> &'static str {
        forms.get(self.category(value))
    }
}

/// East Slavic one/few/many rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RussianPlural;

impl PluralRule for RussianPlural {
    fn category(&self, value: u64) -> PluralCategory {
        let last = value % 10;
        let last_two = value % 100;
        if last == 1 && last_two != 11 {
            PluralCategory::One
        } else if (2..=4).contains(&last) && !(12..=14).contains(&last_two) {
            PluralCategory::Few
        } else {
            PluralCategory::Many
        }
    }
}

/// Convenience wrapper for the default rule.
pub fn plural_label(value: u64, forms: &PluralForms) -> &'static str {
    RussianPlural.select(value, forms)
}
