use crate::model::{Distance, Gender};
use crate::normalize::LandCodes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

pub const RANK_COLUMN: usize = 0;
pub const NAME_COLUMN: usize = 3;
pub const LAND_COLUMN: usize = 4;
/// Points columns of the three rounds (CAN 1, CAN 2, POL).
pub const ROUND_COLUMNS: [usize; 3] = [5, 6, 7];
pub const TIME_COLUMN: usize = 10;
/// Riders shown side by side in one comparison.
pub const MAX_COMPARED: usize = 8;

const POINTS_TO_RANK: [(u32, u8); 24] = [
    (100, 1),
    (80, 2),
    (70, 3),
    (60, 4),
    (50, 5),
    (44, 6),
    (40, 7),
    (36, 8),
    (32, 9),
    (28, 10),
    (24, 11),
    (20, 12),
    (18, 13),
    (16, 14),
    (14, 15),
    (12, 16),
    (10, 17),
    (8, 18),
    (6, 19),
    (5, 20),
    (4, 21),
    (3, 22),
    (2, 23),
    (1, 24),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// First grid row is the header; rows with only blank cells are dropped.
    pub fn from_grid(grid: &[Vec<Value>]) -> Self {
        let Some((header, body)) = grid.split_first() else {
            return Self::default();
        };
        Self {
            headers: header.iter().map(cell_text).collect(),
            rows: body
                .iter()
                .filter(|row| row.iter().any(|cell| !cell_text(cell).is_empty()))
                .cloned()
                .collect(),
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> String {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(cell_text)
            .unwrap_or_default()
    }

    pub fn column(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|cells| cells.get(column).map(cell_text).unwrap_or_default())
            .collect()
    }

    pub fn land_codes(&self, column: usize) -> LandCodes {
        self.column(column).iter().collect()
    }

    /// First row whose name cell matches, ignoring case and outer spaces.
    pub fn find_rider(&self, name: &str) -> Option<&[Value]> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .find(|cells| {
                cells
                    .get(NAME_COLUMN)
                    .map(|cell| cell_text(cell).to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .map(Vec::as_slice)
    }

    /// Distinct riders of a sheet sorted by name; the first land seen wins.
    pub fn riders(&self) -> Vec<Rider> {
        let mut seen = HashSet::new();
        let mut riders: Vec<Rider> = self
            .rows
            .iter()
            .map(|cells| Rider {
                name: cells.get(NAME_COLUMN).map(cell_text).unwrap_or_default(),
                land: cells.get(LAND_COLUMN).map(cell_text).unwrap_or_default(),
            })
            .filter(|rider| !rider.name.is_empty() && seen.insert(rider.name.to_lowercase()))
            .collect();
        riders.sort_by(|a, b| a.name.cmp(&b.name));
        riders
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rider {
    pub name: String,
    pub land: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
}

/// One line of the head-to-head table. Round ranks come from the points of
/// the distance sheet, the overall rank from the overall sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderComparison {
    pub name: String,
    pub land: String,
    pub rounds: [Option<u8>; 3],
    pub overall_rank: String,
    pub time: String,
}

/// Names of the overall and distance sheets for a selection, when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSelection {
    pub overall: Option<String>,
    pub distance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkbookData {
    pub file_name: String,
    pub loaded_at: String,
    pub sheets: BTreeMap<String, Sheet>,
}

impl WorkbookData {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// First candidate present by exact name, else by case-insensitive name.
    pub fn resolve_sheet(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .find(|name| self.sheets.contains_key(**name))
            .map(|name| name.to_string())
            .or_else(|| {
                candidates.iter().find_map(|candidate| {
                    self.sheets
                        .keys()
                        .find(|key| key.to_lowercase() == candidate.to_lowercase())
                        .cloned()
                })
            })
    }

    pub fn sheets_for(&self, gender: Gender, distance: Distance) -> SheetSelection {
        SheetSelection {
            overall: self.resolve_sheet(overall_candidates(gender)),
            distance: self.resolve_sheet(distance_candidates(gender, distance)),
        }
    }

    /// Comparison lines for the picked riders, in pick order. Blank picks are
    /// skipped; riders missing from a sheet get empty cells.
    pub fn compare<S: AsRef<str>>(
        &self,
        gender: Gender,
        distance: Distance,
        names: &[S],
    ) -> Vec<RiderComparison> {
        let selection = self.sheets_for(gender, distance);
        let overall = selection.overall.as_deref().and_then(|name| self.sheet(name));
        let results = selection.distance.as_deref().and_then(|name| self.sheet(name));

        names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .take(MAX_COMPARED)
            .map(|name| {
                let mut line = RiderComparison {
                    name: name.to_string(),
                    ..RiderComparison::default()
                };
                if let Some(row) = results.and_then(|sheet| sheet.find_rider(name)) {
                    line.land = row.get(LAND_COLUMN).map(cell_text).unwrap_or_default();
                    line.rounds = ROUND_COLUMNS.map(|col| row.get(col).and_then(points_to_rank));
                    line.time = row.get(TIME_COLUMN).map(format_race_time).unwrap_or_default();
                }
                line.overall_rank = overall
                    .and_then(|sheet| sheet.find_rider(name))
                    .and_then(|row| row.get(RANK_COLUMN))
                    .map(cell_text)
                    .unwrap_or_default();
                line
            })
            .collect()
    }

    pub fn summary(&self) -> Vec<SheetSummary> {
        self.sheets
            .iter()
            .map(|(name, sheet)| SheetSummary {
                name: name.clone(),
                rows: sheet.rows.len(),
            })
            .collect()
    }
}

pub fn overall_candidates(gender: Gender) -> &'static [&'static str] {
    match gender {
        Gender::Men => &["Overall Men", "Overall MEN", "Overall"],
        Gender::Women => &["Overall Women", "Overall WOMEN", "Overall"],
    }
}

pub fn distance_candidates(gender: Gender, distance: Distance) -> &'static [&'static str] {
    match (distance, gender) {
        (Distance::M500, Gender::Men) => &["500 Men", "500 MEN", "500m Men", "500"],
        (Distance::M500, Gender::Women) => &["500 Women", "500 WOMEN", "500m Women", "500"],
        (Distance::M1000, Gender::Men) => &["1000 Men", "1000 MEN", "1000m Men", "1000"],
        (Distance::M1000, Gender::Women) => &["1000 Women", "1000 WOMEN", "1000m Women", "1000"],
        (Distance::M1500, Gender::Men) => &["1500 Men", "1500 MEN", "1500m Men", "1500"],
        (Distance::M1500, Gender::Women) => &["1500 Women", "1500 WOMEN", "1500m Women", "1500"],
        (Distance::Relay, Gender::Men) => &["Relay Men", "Relay MEN", "Relay"],
        (Distance::Relay, Gender::Women) => &["Relay Women", "Relay WOMEN", "Relay"],
        (Distance::Mixed, _) => &["Mixed Relay", "Mixed relay", "Mixed"],
    }
}

/// Finishing rank for the points a round awarded; `None` for anything off
/// the points table.
pub fn points_to_rank(cell: &Value) -> Option<u8> {
    let points = match cell {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if points.fract() != 0.0 || points <= 0.0 {
        return None;
    }
    POINTS_TO_RANK
        .iter()
        .find(|(table_points, _)| f64::from(*table_points) == points)
        .map(|(_, rank)| *rank)
}

/// Race time cell as text. Spreadsheet times are fractions of a day and
/// render as `m:ss.fff`; text cells are passed through trimmed.
pub fn format_race_time(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => {
            let Some(days) = number.as_f64() else {
                return number.to_string();
            };
            let total_ms = (days * 86_400_000.0).round();
            if !total_ms.is_finite() || total_ms <= 0.0 {
                return number.to_string();
            }
            let total_ms = total_ms as u64;
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) / 1_000;
            let millis = total_ms % 1_000;
            format!("{}:{:02}.{:03}", minutes, seconds, millis)
        }
        _ => String::new(),
    }
}

pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

/// Names and visible land codes of a results sheet, the input of a
/// cross-reference render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsTable {
    pub names: Vec<String>,
    pub lands: LandCodes,
}

impl ResultsTable {
    pub fn from_sheet(sheet: &Sheet) -> Self {
        Self {
            names: sheet.column(NAME_COLUMN),
            lands: sheet.land_codes(LAND_COLUMN),
        }
    }
}
