use crate::model::{generate_id, MedalRecord, NameLand};
use serde_json::{Map, Value};

const ID_KEYS: &[&str] = &["_id", "id"];
const YEAR_KEYS: &[&str] = &["year", "jaar", "season", "date"];
const PLACE_KEYS: &[&str] = &["place", "location", "venue", "city", "event"];

const NAME_KEYS: &[&str] = &[
    "name", "naam", "skater", "rider", "value", "label", "text", "fullname", "full_name",
];
const LAND_KEYS: &[&str] = &["land", "country", "nation", "code"];

struct SlotAliases {
    direct: &'static [&'static str],
    flat_name: &'static [&'static str],
    flat_land: &'static [&'static str],
}

const GOLD: SlotAliases = SlotAliases {
    direct: &["gold", "1", "first", "1st", "winner"],
    flat_name: &[
        "goldname", "gold_name", "goldskater", "goldrider", "1_name", "firstname", "first_name",
    ],
    flat_land: &["goldland", "gold_land", "goldcountry", "1_land", "firstland", "first_land"],
};

const SILVER: SlotAliases = SlotAliases {
    direct: &["silver", "2", "second", "2nd"],
    flat_name: &[
        "silvername",
        "silver_name",
        "silverskater",
        "silverrider",
        "2_name",
        "secondname",
        "second_name",
    ],
    flat_land: &[
        "silverland",
        "silver_land",
        "silvercountry",
        "2_land",
        "secondland",
        "second_land",
    ],
};

const BRONZE: SlotAliases = SlotAliases {
    direct: &["bronze", "3", "third", "3rd"],
    flat_name: &[
        "bronzename",
        "bronze_name",
        "bronzeskater",
        "bronzerider",
        "3_name",
        "thirdname",
        "third_name",
    ],
    flat_land: &[
        "bronzeland",
        "bronze_land",
        "bronzecountry",
        "3_land",
        "thirdland",
        "third_land",
    ],
};

/// Never fails: a row that is not an object yields an empty record with a
/// fresh id, and mistyped fields read as empty text.
pub fn extract_record(raw: &Value) -> MedalRecord {
    let Some(row) = raw.as_object() else {
        return MedalRecord::blank();
    };

    let id = pick(row, ID_KEYS)
        .and_then(id_text)
        .unwrap_or_else(generate_id);

    MedalRecord {
        id,
        year: pick(row, YEAR_KEYS).map(scalar_text).unwrap_or_default(),
        place: pick(row, PLACE_KEYS).map(scalar_text).unwrap_or_default(),
        gold: extract_slot(row, &GOLD),
        silver: extract_slot(row, &SILVER),
        bronze: extract_slot(row, &BRONZE),
    }
}

/// Reads a single medal value: `{name, land}` (with aliases), `[name, land]`,
/// `"Name, LAND"` or a bare scalar name.
pub fn extract_medal(value: &Value) -> NameLand {
    match value {
        Value::Array(items) => NameLand::new(
            items.first().map(scalar_text).unwrap_or_default(),
            items.get(1).map(scalar_text).unwrap_or_default().to_uppercase(),
        ),
        Value::String(text) => NameLand::parse(text),
        Value::Object(fields) => NameLand::new(
            pick(fields, NAME_KEYS).map(scalar_text).unwrap_or_default(),
            pick(fields, LAND_KEYS)
                .map(scalar_text)
                .unwrap_or_default()
                .to_uppercase(),
        ),
        Value::Number(number) => NameLand::new(number.to_string(), ""),
        Value::Null | Value::Bool(_) => NameLand::default(),
    }
}

/// The direct slot value wins; flat fields fill whatever it left empty, so
/// `{"first": "Name", "firstLand": "CAN"}` still carries its land.
fn extract_slot(row: &Map<String, Value>, aliases: &SlotAliases) -> NameLand {
    let mut medal = pick(row, aliases.direct)
        .map(extract_medal)
        .unwrap_or_default();

    if medal.name.is_empty() {
        medal.name = pick(row, aliases.flat_name)
            .map(scalar_text)
            .unwrap_or_default();
    }
    if medal.land.is_empty() {
        medal.land = pick(row, aliases.flat_land)
            .map(scalar_text)
            .unwrap_or_default()
            .to_uppercase();
    }
    medal
}

/// First alias present with a non-blank value. Keys compare case-insensitively.
fn pick<'a>(fields: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        fields
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(alias) && !is_blank(value))
            .map(|(_, value)| value)
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
