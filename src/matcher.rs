use crate::canonical::canonicalize;
use crate::model::{CanonicalState, Distance, Gender, MedalRecord, ViewState};
use crate::normalize::{normalize_key, LandCodes};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Placeholder rendered when a name has no medals.
pub const NO_MATCH: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedalEntry {
    pub rank: u8,
    #[serde(rename = "yearSuffix")]
    pub year_suffix: String,
}

impl fmt::Display for MedalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year_suffix.is_empty() {
            write!(f, "{}", self.rank)
        } else {
            write!(f, "{} ({})", self.rank, self.year_suffix)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchQuery {
    pub gender: Gender,
    pub distance: Distance,
}

impl From<ViewState> for MatchQuery {
    fn from(view: ViewState) -> Self {
        Self {
            gender: view.gender,
            distance: view.distance,
        }
    }
}

/// Normalized name key to medal history, newest year first and gold before
/// silver before bronze within a year.
#[derive(Debug, Clone, Default)]
pub struct MedalIndex {
    entries: HashMap<String, Vec<MedalEntry>>,
}

impl MedalIndex {
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a MedalRecord>,
        land_codes: &LandCodes,
    ) -> Self {
        let mut collected: HashMap<String, Vec<(i64, MedalEntry)>> = HashMap::new();

        for record in records {
            let digits = year_digits(&record.year);
            let sort_year = digits.and_then(|d| d.parse().ok()).unwrap_or(-1);
            let suffix = digits.map(two_digit_suffix).unwrap_or_default();

            for (rank, slot) in record.medals() {
                let key = normalize_key(&slot.name, land_codes);
                if key.is_empty() {
                    continue;
                }
                collected.entry(key).or_default().push((
                    sort_year,
                    MedalEntry {
                        rank,
                        year_suffix: suffix.clone(),
                    },
                ));
            }
        }

        let entries: HashMap<String, Vec<MedalEntry>> = collected
            .into_iter()
            .map(|(key, mut list)| {
                list.sort_by(|(year_a, a), (year_b, b)| {
                    year_b.cmp(year_a).then(a.rank.cmp(&b.rank))
                });
                (key, list.into_iter().map(|(_, entry)| entry).collect::<Vec<_>>())
            })
            .collect();

        Self { entries }
    }

    /// Index over the buckets [`select_records`] picks for the query.
    pub fn for_query(state: &CanonicalState, query: MatchQuery, land_codes: &LandCodes) -> Self {
        Self::build(select_records(state, query), land_codes)
    }

    /// `None` when the name normalizes to nothing or has no medals.
    pub fn lookup(&self, display_name: &str, land_codes: &LandCodes) -> Option<&[MedalEntry]> {
        let key = normalize_key(display_name, land_codes);
        if key.is_empty() {
            return None;
        }
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Records to index for a query. Individual distances merge the men's and
/// women's buckets because skaters are often filed under the wrong gender;
/// relay stays per gender and mixed relay has a single bucket.
pub fn select_records(state: &CanonicalState, query: MatchQuery) -> Vec<&MedalRecord> {
    let distance = query.distance;
    if distance.is_individual() {
        Gender::ALL
            .into_iter()
            .flat_map(|gender| state.bucket(gender, distance))
            .collect()
    } else {
        state.bucket(query.gender, distance).iter().collect()
    }
}

/// Cell text for a lookup result: one `"rank (yy)"` line per medal, or
/// [`NO_MATCH`].
pub fn format_entries(entries: Option<&[MedalEntry]>) -> String {
    match entries {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(MedalEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => NO_MATCH.to_string(),
    }
}

/// Last two digits of the first 2-4 digit run in a year label.
pub fn year_suffix(year: &str) -> String {
    year_digits(year).map(two_digit_suffix).unwrap_or_default()
}

fn year_digits(year: &str) -> Option<&str> {
    let bytes = year.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let run = end - start;
        if run >= 2 {
            return Some(&year[start..start + run.min(4)]);
        }
        start = end;
    }
    None
}

fn two_digit_suffix(digits: &str) -> String {
    digits[digits.len() - 2..].to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowAnnotation {
    pub os: String,
    pub wk: String,
}

/// OS and WK lookups for one render of a results table. Rebuild it whenever
/// the selectors or the table change, since the land codes depend on both.
#[derive(Debug, Clone)]
pub struct CrossReference {
    olympic: MedalIndex,
    olympic_lands: LandCodes,
    world: MedalIndex,
    world_lands: LandCodes,
}

impl CrossReference {
    pub fn from_states(
        world: &CanonicalState,
        olympic: &CanonicalState,
        query: MatchQuery,
        table_lands: &LandCodes,
    ) -> Self {
        let world_lands = LandCodes::from_state(world).union(table_lands);
        let olympic_lands = LandCodes::from_state(olympic).union(table_lands);
        Self {
            world: MedalIndex::for_query(world, query, &world_lands),
            olympic: MedalIndex::for_query(olympic, query, &olympic_lands),
            world_lands,
            olympic_lands,
        }
    }

    /// For blobs read straight from storage events, before they were
    /// canonicalized.
    pub fn from_raw(
        world: &Value,
        olympic: &Value,
        query: MatchQuery,
        table_lands: &LandCodes,
    ) -> Self {
        Self::from_states(&canonicalize(world), &canonicalize(olympic), query, table_lands)
    }

    pub fn annotate(&self, display_name: &str) -> RowAnnotation {
        RowAnnotation {
            os: format_entries(self.olympic.lookup(display_name, &self.olympic_lands)),
            wk: format_entries(self.world.lookup(display_name, &self.world_lands)),
        }
    }

    pub fn annotate_all<I, S>(&self, names: I) -> Vec<RowAnnotation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.annotate(name.as_ref()))
            .collect()
    }
}
