pub mod canonical;
pub mod editor;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod storage;
pub mod workbook;

use canonical::normalize_distance_key;
use chrono::{SecondsFormat, Utc};
use editor::{EditSession, MedalSlot, RowEdit};
use log::warn;
use matcher::{CrossReference, MatchQuery};
use model::{sorted_for_display, Distance, Gender, Scope};
use normalize::LandCodes;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;
use workbook::{ResultsTable, Sheet, WorkbookData};

fn js_error<E: Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

fn parse_scope(scope: &str) -> Result<Scope, JsValue> {
    Scope::parse(scope).ok_or_else(|| js_error(format!("unknown competition scope '{}'", scope)))
}

fn parse_query(gender: &str, distance: &str) -> Result<MatchQuery, JsValue> {
    let distance = normalize_distance_key(distance)
        .ok_or_else(|| js_error(format!("unknown distance '{}'", distance)))?;
    // Mixed relay has no gender toggle; anything goes.
    let gender = match Gender::parse(gender) {
        Some(gender) => gender,
        None if distance == Distance::Mixed => Gender::Men,
        None => return Err(js_error(format!("unknown gender '{}'", gender))),
    };
    Ok(MatchQuery { gender, distance })
}

fn parse_text_list(json: &str) -> Result<Vec<String>, JsValue> {
    let cells: Vec<Value> = serde_json::from_str(json).map_err(js_error)?;
    Ok(cells.iter().map(workbook::cell_text).collect())
}

/// Canonical JSON for any champions blob, e.g. the `newValue` of a storage event.
#[wasm_bindgen]
pub fn canonicalize_champions(raw_json: &str) -> Result<String, JsValue> {
    to_json(&storage::decode_state(raw_json))
}

#[wasm_bindgen]
pub fn load_champions(scope: &str) -> Result<String, JsValue> {
    let scope = parse_scope(scope)?;
    to_json(&storage::load_state(scope))
}

/// Canonicalizes, stamps and stores a state; returns what was stored.
#[wasm_bindgen]
pub fn save_champions(scope: &str, state_json: &str) -> Result<String, JsValue> {
    let scope = parse_scope(scope)?;
    let raw: Value = serde_json::from_str(state_json).map_err(js_error)?;
    let state = storage::prepare_for_save(&raw, Utc::now());
    storage::save_state(scope, &state).map_err(js_error)?;
    to_json(&state)
}

/// `"world"` or `"olympic"` when `key` is a champions storage key.
#[wasm_bindgen]
pub fn champions_scope_for_key(key: &str) -> Option<String> {
    storage::scope_for_key(key).map(|scope| scope.key().to_string())
}

/// OS/WK cells for the displayed names of a results table, as a JSON array
/// of `{os, wk}`. `lands_json` holds the table's country column.
#[wasm_bindgen]
pub fn annotate_results(
    gender: &str,
    distance: &str,
    names_json: &str,
    lands_json: &str,
) -> Result<String, JsValue> {
    let query = parse_query(gender, distance)?;
    let names = parse_text_list(names_json)?;
    let table_lands: LandCodes = parse_text_list(lands_json)?.iter().collect();

    let world = storage::load_state(Scope::World);
    let olympic = storage::load_state(Scope::Olympic);
    let reference = CrossReference::from_states(&world, &olympic, query, &table_lands);
    to_json(&reference.annotate_all(&names))
}

/// Same as [`annotate_results`] for champions blob text handed over
/// directly, e.g. from a storage event. Unreadable text counts as empty.
#[wasm_bindgen]
pub fn annotate_results_from_blobs(
    world_json: &str,
    olympic_json: &str,
    gender: &str,
    distance: &str,
    names_json: &str,
    lands_json: &str,
) -> Result<String, JsValue> {
    let query = parse_query(gender, distance)?;
    let names = parse_text_list(names_json)?;
    let table_lands: LandCodes = parse_text_list(lands_json)?.iter().collect();

    let world = storage::decode_state(world_json);
    let olympic = storage::decode_state(olympic_json);
    let reference = CrossReference::from_states(&world, &olympic, query, &table_lands);
    to_json(&reference.annotate_all(&names))
}

#[derive(Serialize)]
struct AnnotatedRider {
    name: String,
    os: String,
    wk: String,
}

/// Annotates the distance sheet of the uploaded workbook for a selection.
/// Returns an empty list when no workbook or matching sheet is stored.
#[wasm_bindgen]
pub fn annotate_workbook(gender: &str, distance: &str) -> Result<String, JsValue> {
    let query = parse_query(gender, distance)?;
    let Some(data) = storage::load_workbook() else {
        return to_json::<[AnnotatedRider]>(&[]);
    };
    let selection = data.sheets_for(query.gender, query.distance);
    let Some(sheet) = selection.distance.as_deref().and_then(|name| data.sheet(name)) else {
        warn!(
            "No results sheet for {} {}",
            query.gender.label(),
            query.distance.label()
        );
        return to_json::<[AnnotatedRider]>(&[]);
    };

    let table = ResultsTable::from_sheet(sheet);
    let world = storage::load_state(Scope::World);
    let olympic = storage::load_state(Scope::Olympic);
    let reference = CrossReference::from_states(&world, &olympic, query, &table.lands);

    let rows: Vec<AnnotatedRider> = table
        .names
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(|name| {
            let annotation = reference.annotate(&name);
            AnnotatedRider {
                name,
                os: annotation.os,
                wk: annotation.wk,
            }
        })
        .collect();
    to_json(&rows)
}

/// Stores an uploaded workbook given as `{sheetName: [[cell, ...], ...]}`
/// and returns the per-sheet row counts.
#[wasm_bindgen]
pub fn store_workbook(file_name: &str, grids_json: &str) -> Result<String, JsValue> {
    let grids: BTreeMap<String, Vec<Vec<Value>>> =
        serde_json::from_str(grids_json).map_err(js_error)?;
    let data = WorkbookData {
        file_name: file_name.to_string(),
        loaded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        sheets: grids
            .iter()
            .map(|(name, grid)| (name.clone(), Sheet::from_grid(grid)))
            .collect(),
    };
    storage::save_workbook(&data).map_err(|err| {
        warn!("{}", err);
        js_error(err)
    })?;
    to_json(&data.summary())
}

/// Distinct riders of the stored overall sheet for a gender.
#[wasm_bindgen]
pub fn workbook_riders(gender: &str) -> Result<String, JsValue> {
    let gender = Gender::parse(gender).ok_or_else(|| js_error(format!("unknown gender '{}'", gender)))?;
    let riders = storage::load_workbook()
        .and_then(|data| {
            let name = data.resolve_sheet(workbook::overall_candidates(gender))?;
            data.sheet(&name).map(Sheet::riders)
        })
        .unwrap_or_default();
    to_json(&riders)
}

/// Head-to-head lines for the picked riders from the stored workbook.
#[wasm_bindgen]
pub fn compare_riders(gender: &str, distance: &str, names_json: &str) -> Result<String, JsValue> {
    let query = parse_query(gender, distance)?;
    let names = parse_text_list(names_json)?;
    let lines = storage::load_workbook()
        .map(|data| data.compare(query.gender, query.distance, &names))
        .unwrap_or_default();
    to_json(&lines)
}

/// Champions page state for one scope: the committed table plus the edit
/// draft of the "Bewerk" dialog.
#[wasm_bindgen]
pub struct ChampionsEditor {
    scope: Scope,
    session: EditSession,
}

#[wasm_bindgen]
impl ChampionsEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(scope: &str) -> Result<ChampionsEditor, JsValue> {
        let scope = parse_scope(scope)?;
        Ok(Self {
            scope,
            session: EditSession::new(storage::migrate_state(scope)),
        })
    }

    pub fn title(&self) -> String {
        self.scope.title().to_string()
    }

    #[wasm_bindgen(js_name = updatedAt)]
    pub fn updated_at(&self) -> Option<String> {
        self.session.committed().meta.updated_at.clone()
    }

    /// Committed rows of a tab, newest first.
    pub fn rows(&self, gender: &str, distance: &str) -> Result<String, JsValue> {
        let query = parse_query(gender, distance)?;
        to_json(&sorted_for_display(
            self.session.committed().bucket(query.gender, query.distance),
        ))
    }

    pub fn begin(&mut self) {
        self.session.begin();
    }

    #[wasm_bindgen(js_name = draftRows)]
    pub fn draft_rows(&self, gender: &str, distance: &str) -> Result<String, JsValue> {
        let query = parse_query(gender, distance)?;
        to_json(&sorted_for_display(
            self.session.draft_rows(query.gender, query.distance),
        ))
    }

    #[wasm_bindgen(js_name = addRow)]
    pub fn add_row(&mut self, gender: &str, distance: &str) -> Result<Option<String>, JsValue> {
        let query = parse_query(gender, distance)?;
        Ok(self.session.add_row(query.gender, query.distance))
    }

    #[wasm_bindgen(js_name = setYear)]
    pub fn set_year(&mut self, gender: &str, distance: &str, id: &str, year: String) -> Result<bool, JsValue> {
        self.edit(gender, distance, id, RowEdit::Year(year))
    }

    #[wasm_bindgen(js_name = setPlace)]
    pub fn set_place(&mut self, gender: &str, distance: &str, id: &str, place: String) -> Result<bool, JsValue> {
        self.edit(gender, distance, id, RowEdit::Place(place))
    }

    /// `rank` 1-3 picks gold, silver or bronze; `text` is `"Name, LAND"`.
    #[wasm_bindgen(js_name = setMedal)]
    pub fn set_medal(
        &mut self,
        gender: &str,
        distance: &str,
        id: &str,
        rank: u8,
        text: String,
    ) -> Result<bool, JsValue> {
        let slot = MedalSlot::from_rank(rank)
            .ok_or_else(|| js_error(format!("no medal for rank {}", rank)))?;
        self.edit(gender, distance, id, RowEdit::Medal(slot, text))
    }

    #[wasm_bindgen(js_name = removeRow)]
    pub fn remove_row(&mut self, gender: &str, distance: &str, id: &str) -> Result<bool, JsValue> {
        let query = parse_query(gender, distance)?;
        Ok(self.session.remove_row(query.gender, query.distance, id))
    }

    /// Commits the draft and stores it. A failed write is returned as an
    /// error for the page to show; the committed state is kept either way.
    pub fn commit(&mut self) -> Result<bool, JsValue> {
        let Some(state) = self.session.commit(Utc::now()) else {
            return Ok(false);
        };
        storage::save_state(self.scope, state).map_err(|err| {
            warn!("{}", err);
            js_error(err)
        })?;
        Ok(true)
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    /// Picks up a save from another tab.
    pub fn reload(&mut self) {
        self.session.replace_committed(storage::load_state(self.scope));
    }

    fn edit(&mut self, gender: &str, distance: &str, id: &str, edit: RowEdit) -> Result<bool, JsValue> {
        let query = parse_query(gender, distance)?;
        Ok(self.session.update_row(query.gender, query.distance, id, edit))
    }
}
