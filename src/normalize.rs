use crate::model::{CanonicalState, MedalRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const STRIPPED_PUNCTUATION: &[char] = &[
    '\'', '\u{2018}', '\u{2019}', '"', '\u{201C}', '\u{201D}', '(', ')', '.', ',',
];

pub fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Uppercase, diacritic-free form with quotes, parentheses, periods and
/// commas removed, hyphens turned into spaces and whitespace collapsed.
pub fn clean_name(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for ch in strip_diacritics(input).chars() {
        if STRIPPED_PUNCTUATION.contains(&ch) {
            continue;
        }
        if ch == '-' {
            cleaned.push(' ');
        } else {
            cleaned.extend(ch.to_uppercase());
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to match a display name against medal winners.
///
/// Trailing tokens that are known country codes are dropped (as long as at
/// least one token remains) and the rest is sorted, so `"Steven Dubois, CAN"`
/// and `"Dubois Steven"` share a key. An empty key never matches anything.
pub fn normalize_key(raw_name: &str, land_codes: &LandCodes) -> String {
    let cleaned = clean_name(raw_name);
    let mut tokens: Vec<&str> = cleaned.split(' ').filter(|t| !t.is_empty()).collect();

    while tokens.len() >= 2 {
        match tokens.last() {
            Some(last) if land_codes.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }

    tokens.sort_unstable();
    tokens.join(" ")
}

/// Three-letter country codes visible in the current render: every code in
/// a scope's medal data plus the country column of the results table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandCodes {
    codes: BTreeSet<String>,
}

impl LandCodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: &CanonicalState) -> Self {
        let mut codes = Self::new();
        codes.extend_from_state(state);
        codes
    }

    pub fn extend_from_state(&mut self, state: &CanonicalState) {
        self.extend_from_records(state.records());
    }

    pub fn extend_from_records<'a>(&mut self, records: impl IntoIterator<Item = &'a MedalRecord>) {
        for record in records {
            for (_, slot) in record.medals() {
                self.absorb_text(&slot.land);
            }
        }
    }

    /// Adds every code found in free text such as a results-table cell.
    pub fn absorb_text(&mut self, text: &str) {
        let upper = text.to_uppercase();
        for token in upper.split(|ch: char| !ch.is_ascii_alphanumeric()) {
            if is_land_code(token) {
                self.codes.insert(token.to_string());
            }
        }
    }

    pub fn union(&self, other: &LandCodes) -> LandCodes {
        LandCodes {
            codes: self.codes.union(&other.codes).cloned().collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.codes.contains(token)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for LandCodes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut codes = LandCodes::new();
        for text in iter {
            codes.absorb_text(text.as_ref());
        }
        codes
    }
}

fn is_land_code(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|ch| ch.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NameLand;

    fn codes(items: &[&str]) -> LandCodes {
        items.iter().collect()
    }

    #[test]
    fn clean_name_strips_marks_and_punctuation() {
        assert_eq!(clean_name("  Élise   O'Neill-Côté (jr.) "), "ELISE ONEILL COTE JR");
        assert_eq!(clean_name("Dubois, Steven"), "DUBOIS STEVEN");
        assert_eq!(clean_name("\u{201C}Ahn\u{201D} Hyun-soo"), "AHN HYUN SOO");
    }

    #[test]
    fn comma_separated_land_code_is_dropped() {
        let lands = codes(&["CAN"]);
        assert_eq!(normalize_key("Steven Dubois, CAN", &lands), "DUBOIS STEVEN");
        assert_eq!(
            normalize_key("Steven Dubois, CAN", &lands),
            normalize_key("Dubois Steven", &lands)
        );
    }

    #[test]
    fn trailing_land_code_is_dropped() {
        let lands = codes(&["CAN"]);
        assert_eq!(
            normalize_key("Stoddard Corinne CAN", &lands),
            normalize_key("Corinne Stoddard", &lands)
        );
    }

    #[test]
    fn repeated_land_codes_are_all_dropped() {
        let lands = codes(&["NED", "CAN"]);
        assert_eq!(normalize_key("Suzanne Schulting NED NED", &lands), "SCHULTING SUZANNE");
    }

    #[test]
    fn single_token_is_never_emptied() {
        let lands = codes(&["NED"]);
        assert_eq!(normalize_key("NED", &lands), "NED");
    }

    #[test]
    fn unknown_trailing_token_is_kept() {
        let lands = codes(&["CAN"]);
        assert_eq!(normalize_key("Liu Shaoang HUN", &lands), "HUN LIU SHAOANG");
    }

    #[test]
    fn blank_input_has_empty_key() {
        assert_eq!(normalize_key("   ", &LandCodes::new()), "");
        assert_eq!(normalize_key("", &LandCodes::new()), "");
    }

    #[test]
    fn land_codes_come_from_medal_data() {
        let mut state = CanonicalState::default();
        state.men.m500.push(MedalRecord {
            gold: NameLand::new("William Dandjinou", "CAN"),
            silver: NameLand::new("Jens van 't Wout", "ned"),
            bronze: NameLand::new("Team", "KOREA"),
            ..MedalRecord::blank()
        });
        let lands = LandCodes::from_state(&state);
        assert!(lands.contains("CAN"));
        assert!(lands.contains("NED"));
        assert!(!lands.contains("KOREA"));
        assert_eq!(lands.len(), 2);
    }

    #[test]
    fn union_merges_both_sources() {
        let merged = codes(&["CAN"]).union(&codes(&["KOR", "x"]));
        assert_eq!(merged.iter().collect::<Vec<_>>(), vec!["CAN", "KOR"]);
    }
}
