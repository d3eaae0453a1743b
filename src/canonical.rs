use crate::extract::extract_record;
use crate::model::{CanonicalState, Distance, Gender, MedalRecord};
use crate::normalize::clean_name;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

const RESERVED_KEYS: &[&str] = &["men", "women", "mixed", "meta", "updatedAt"];

/// Maps historical bucket names ("500m", "1500 Men", "Mixed relay") to a
/// distance by substring. The order matters: "1500" contains "500".
pub fn normalize_distance_key(key: &str) -> Option<Distance> {
    let lower = key.trim().to_lowercase();
    if lower.is_empty() {
        None
    } else if lower.contains("mixed") {
        Some(Distance::Mixed)
    } else if lower.contains("relay") {
        Some(Distance::Relay)
    } else if lower.contains("1500") {
        Some(Distance::M1500)
    } else if lower.contains("1000") {
        Some(Distance::M1000)
    } else if lower.contains("500") {
        Some(Distance::M500)
    } else {
        None
    }
}

/// Fixed-shape state from a blob of any historical shape. Every load runs
/// through here, so canonicalizing a canonical state changes nothing.
pub fn canonicalize(raw: &Value) -> CanonicalState {
    let mut state = CanonicalState::default();
    let Some(root) = raw.as_object() else {
        return state;
    };

    state.meta.updated_at = root
        .get("meta")
        .and_then(|meta| meta.get("updatedAt"))
        .and_then(timestamp_text)
        .or_else(|| root.get("updatedAt").and_then(timestamp_text));

    for gender in Gender::ALL {
        let Some(buckets) = root.get(gender.key()).and_then(Value::as_object) else {
            continue;
        };
        for (key, rows) in buckets {
            if let Some(distance) = normalize_distance_key(key) {
                absorb(&mut state, gender, distance, rows);
            }
        }
    }

    // Everything under `mixed` is mixed relay, whatever the sub-key says.
    match root.get("mixed") {
        Some(Value::Object(buckets)) => {
            for rows in buckets.values() {
                absorb(&mut state, Gender::Men, Distance::Mixed, rows);
            }
        }
        Some(rows @ Value::Array(_)) => absorb(&mut state, Gender::Men, Distance::Mixed, rows),
        _ => {}
    }

    // Oldest saves had distance keys at the top level with no gender.
    for (key, rows) in root {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(distance) = normalize_distance_key(key) {
            absorb(&mut state, Gender::Men, distance, rows);
        }
    }

    for gender in Gender::ALL {
        for distance in Distance::GENDERED {
            dedupe(state.bucket_mut(gender, distance));
        }
    }
    dedupe(&mut state.mixed.mixed);

    debug!(
        "canonicalized champions state with {} records",
        state.record_count()
    );
    state
}

/// Brings an already typed state (such as an edit draft) back to canonical
/// form: trimmed text, uppercase land codes, no duplicate results.
pub fn tidy(state: &mut CanonicalState) {
    for gender in Gender::ALL {
        for distance in Distance::GENDERED {
            tidy_bucket(state.bucket_mut(gender, distance));
        }
    }
    tidy_bucket(&mut state.mixed.mixed);
}

/// Tidies the state and stamps `meta.updatedAt` with the save time.
pub fn mark_saved(state: &mut CanonicalState, now: DateTime<Utc>) {
    tidy(state);
    state.meta.updated_at = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
}

fn tidy_bucket(records: &mut Vec<MedalRecord>) {
    for record in records.iter_mut() {
        record.year = record.year.trim().to_string();
        record.place = record.place.trim().to_string();
        for slot in [&mut record.gold, &mut record.silver, &mut record.bronze] {
            slot.name = slot.name.trim().to_string();
            slot.land = slot.land.trim().to_uppercase();
        }
    }
    dedupe(records);
}

/// Identity of a result for deduplication: year plus the three medalist
/// names, compared in cleaned uppercase form. Place and land are ignored.
pub fn dedup_key(record: &MedalRecord) -> String {
    [
        record.year.as_str(),
        record.gold.name.as_str(),
        record.silver.name.as_str(),
        record.bronze.name.as_str(),
    ]
    .iter()
    .map(|part| clean_name(part))
    .collect::<Vec<_>>()
    .join("|")
}

fn absorb(state: &mut CanonicalState, gender: Gender, distance: Distance, rows: &Value) {
    let bucket = state.bucket_mut(gender, distance);
    bucket.extend(row_list(rows).iter().map(extract_record));
}

/// Rows of a bucket value: the array itself, or the `rows`/`data` array of
/// a wrapper object.
fn row_list(value: &Value) -> &[Value] {
    match value {
        Value::Array(rows) => rows,
        Value::Object(wrapper) => ["rows", "data"]
            .iter()
            .find_map(|key| wrapper.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        _ => None,
    }
}

fn dedupe(records: &mut Vec<MedalRecord>) {
    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(dedup_key(record)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NameLand;
    use serde_json::json;

    fn recanonicalize(state: &CanonicalState) -> CanonicalState {
        canonicalize(&serde_json::to_value(state).unwrap())
    }

    #[test]
    fn distance_keys_match_by_substring() {
        assert_eq!(normalize_distance_key("500m"), Some(Distance::M500));
        assert_eq!(normalize_distance_key("1500 Men"), Some(Distance::M1500));
        assert_eq!(normalize_distance_key("1000"), Some(Distance::M1000));
        assert_eq!(normalize_distance_key("Relay Women"), Some(Distance::Relay));
        assert_eq!(normalize_distance_key("Mixed Relay"), Some(Distance::Mixed));
        assert_eq!(normalize_distance_key("marathon"), None);
        assert_eq!(normalize_distance_key(""), None);
    }

    #[test]
    fn non_object_input_gives_empty_state() {
        for raw in [json!(null), json!([]), json!("x"), json!(1)] {
            assert_eq!(canonicalize(&raw), CanonicalState::default());
        }
    }

    #[test]
    fn buckets_are_complete_for_any_shape() {
        let raw = json!({"women": {"1000m": [{"year": "2023"}]}, "junk": 5});
        let value = serde_json::to_value(canonicalize(&raw)).unwrap();
        for gender in ["men", "women"] {
            let mut keys: Vec<&String> = value[gender].as_object().unwrap().keys().collect();
            keys.sort();
            assert_eq!(keys, vec!["1000", "1500", "500", "relay"]);
        }
        let keys: Vec<&String> = value["mixed"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["mixed"]);
    }

    #[test]
    fn gendered_keys_are_normalized() {
        let raw = json!({
            "men": {
                "1500 Men": [{"year": "2025", "gold": {"name": "A B", "land": "CAN"}}],
                "500m": {"rows": [{"year": "2024"}]},
                "Relay": {"data": [{"year": "2023"}]},
                "notes": [{"year": "1999"}],
            },
            "women": {"1000": [{"year": "2022"}]},
        });
        let state = canonicalize(&raw);
        assert_eq!(state.men.m1500.len(), 1);
        assert_eq!(state.men.m1500[0].gold, NameLand::new("A B", "CAN"));
        assert_eq!(state.men.m500.len(), 1);
        assert_eq!(state.men.relay.len(), 1);
        assert_eq!(state.women.m1000.len(), 1);
        assert_eq!(state.record_count(), 4);
    }

    #[test]
    fn duplicates_keep_the_first_row_in_stored_order() {
        let text = r#"{"men": {
            "500m": [{"_id": "first", "year": "2018", "place": "Montreal", "gold": "Wu Dajing, CHN"}],
            "500": [{"_id": "second", "year": "2018", "place": "Sofia", "gold": "Wu Dajing, CHN"}]
        }}"#;
        let raw: Value = serde_json::from_str(text).unwrap();
        let state = canonicalize(&raw);
        assert_eq!(state.men.m500.len(), 1);
        assert_eq!(state.men.m500[0].id, "first");
        assert_eq!(state.men.m500[0].place, "Montreal");
    }

    #[test]
    fn everything_under_mixed_lands_in_mixed() {
        let raw = json!({
            "mixed": {
                "mixed": [{"year": "2024", "gold": "Netherlands, NED"}],
                "500": [{"year": "2023", "gold": "Canada, CAN"}],
            },
            "men": {"Mixed relay": [{"year": "2022", "gold": "China, CHN"}]},
        });
        let state = canonicalize(&raw);
        assert_eq!(state.mixed.mixed.len(), 3);
        assert!(state.men.m500.is_empty());
    }

    #[test]
    fn top_level_distance_keys_default_to_men() {
        let raw = json!({
            "500": [{"year": "2010", "gold": "Charles Hamelin, CAN"}],
            "relay": [{"year": "2011"}],
            "meta": {"updatedAt": "2024-01-01T00:00:00Z"},
            "updatedAt": "ignored",
        });
        let state = canonicalize(&raw);
        assert_eq!(state.men.m500.len(), 1);
        assert_eq!(state.men.relay.len(), 1);
        assert!(state.women.m500.is_empty());
        assert_eq!(state.meta.updated_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn legacy_top_level_timestamp_is_kept() {
        let state = canonicalize(&json!({"updatedAt": "2020-05-05T10:00:00Z"}));
        assert_eq!(state.meta.updated_at.as_deref(), Some("2020-05-05T10:00:00Z"));
        assert_eq!(canonicalize(&json!({"meta": {}})).meta.updated_at, None);
    }

    #[test]
    fn duplicates_differing_only_in_place_collapse() {
        let raw = json!({"women": {"500": [
            {"_id": "first", "year": "2019", "place": "Sofia",
             "gold": {"name": "Suzanne Schulting"}, "silver": {"name": "Kim Boutin"},
             "bronze": {"name": "Choi Min-jeong"}},
            {"_id": "second", "year": " 2019", "place": "Dordrecht",
             "gold": {"name": "SUZANNE SCHULTING"}, "silver": {"name": "Kim Boutin."},
             "bronze": {"name": "Choi Min jeong"}},
            {"_id": "third", "year": "2019", "gold": {"name": "Élise Christie"}},
            {"_id": "fourth", "year": "2019", "gold": {"name": "Elise Christie"}},
        ]}});
        let state = canonicalize(&raw);
        let ids: Vec<&str> = state.women.m500.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "third"]);
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let raw = json!({
            "men": {
                "500m": [{"year": 2022, "goldName": "Liu Shaoang", "goldLand": "chn"}],
                "Relay Men": {"rows": [{"season": "2018", "1": ["Hungary", "HUN"]}]},
            },
            "women": {"1500": [{"jaar": "2014", "gold": "Zhou Yang, CHN", "place": "Sochi"}]},
            "mixed": {"500": [{"year": "2022", "first": "China", "firstLand": "CHN"}]},
            "1000": [{"year": "2006"}, {"year": "2006"}],
            "updatedAt": "2021-03-03T00:00:00Z",
        });
        let once = canonicalize(&raw);
        let twice = recanonicalize(&once);
        assert_eq!(once, twice);
        assert_eq!(recanonicalize(&twice), once);
        assert_eq!(once.men.m1000.len(), 1);
        assert_eq!(once.men.m500[0].year, "2022");
        assert_eq!(once.men.m500[0].gold.land, "CHN");
    }

    #[test]
    fn tidy_matches_canonical_form() {
        let mut state = CanonicalState::default();
        state.women.relay.push(MedalRecord {
            year: " 2026 ".into(),
            gold: NameLand::new(" Netherlands ", "ned "),
            ..MedalRecord::blank()
        });
        state.women.relay.push(MedalRecord {
            year: "2026".into(),
            place: "Milan".into(),
            gold: NameLand::new("NETHERLANDS", "NED"),
            ..MedalRecord::blank()
        });
        tidy(&mut state);
        assert_eq!(state.women.relay.len(), 1);
        assert_eq!(state.women.relay[0].gold, NameLand::new("Netherlands", "NED"));
        assert_eq!(recanonicalize(&state), state);
    }

    #[test]
    fn mark_saved_stamps_time() {
        let now = DateTime::parse_from_rfc3339("2026-02-10T18:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut state = CanonicalState::default();
        mark_saved(&mut state, now);
        assert_eq!(state.meta.updated_at.as_deref(), Some("2026-02-10T18:30:00.000Z"));
    }

    #[test]
    fn record_without_medals_but_with_year_is_kept() {
        let state = canonicalize(&json!({"men": {"1000": [{"year": "1994", "place": "Lillehammer"}]}}));
        assert_eq!(state.men.m1000.len(), 1);
        assert_eq!(state.men.m1000[0].place, "Lillehammer");
    }
}
