use crate::canonical::mark_saved;
use crate::model::{CanonicalState, Distance, Gender, MedalRecord, NameLand};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedalSlot {
    Gold,
    Silver,
    Bronze,
}

impl MedalSlot {
    pub fn rank(self) -> u8 {
        match self {
            MedalSlot::Gold => 1,
            MedalSlot::Silver => 2,
            MedalSlot::Bronze => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(MedalSlot::Gold),
            2 => Some(MedalSlot::Silver),
            3 => Some(MedalSlot::Bronze),
            _ => None,
        }
    }

    fn of(self, record: &mut MedalRecord) -> &mut NameLand {
        match self {
            MedalSlot::Gold => &mut record.gold,
            MedalSlot::Silver => &mut record.silver,
            MedalSlot::Bronze => &mut record.bronze,
        }
    }
}

/// A change typed into one field of an editor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEdit {
    Year(String),
    Place(String),
    /// `"Name, LAND"` text as typed in a medal input.
    Medal(MedalSlot, String),
}

/// The committed champions state of a page plus an optional draft.
///
/// The draft is an independent copy: edits never reach the committed state
/// until [`EditSession::commit`] replaces it wholesale, and dropping the draft
/// is all a cancel needs.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    committed: CanonicalState,
    draft: Option<CanonicalState>,
}

impl EditSession {
    pub fn new(committed: CanonicalState) -> Self {
        Self {
            committed,
            draft: None,
        }
    }

    pub fn committed(&self) -> &CanonicalState {
        &self.committed
    }

    pub fn draft(&self) -> Option<&CanonicalState> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Starts a draft from the committed state. An existing draft is kept.
    pub fn begin(&mut self) -> &CanonicalState {
        self.draft.get_or_insert_with(|| self.committed.clone())
    }

    pub fn draft_rows(&self, gender: Gender, distance: Distance) -> &[MedalRecord] {
        match &self.draft {
            Some(draft) => draft.bucket(gender, distance),
            None => &[],
        }
    }

    /// Appends an empty row and returns its id, or `None` without a draft.
    pub fn add_row(&mut self, gender: Gender, distance: Distance) -> Option<String> {
        let draft = self.draft.as_mut()?;
        let row = MedalRecord::blank();
        let id = row.id.clone();
        draft.bucket_mut(gender, distance).push(row);
        Some(id)
    }

    /// Returns whether a draft row with that id was found.
    pub fn update_row(&mut self, gender: Gender, distance: Distance, id: &str, edit: RowEdit) -> bool {
        let Some(row) = self.draft_row_mut(gender, distance, id) else {
            return false;
        };
        match edit {
            RowEdit::Year(year) => row.year = year,
            RowEdit::Place(place) => row.place = place,
            RowEdit::Medal(slot, text) => *slot.of(row) = NameLand::parse(&text),
        }
        true
    }

    pub fn remove_row(&mut self, gender: Gender, distance: Distance, id: &str) -> bool {
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        let rows = draft.bucket_mut(gender, distance);
        let before = rows.len();
        rows.retain(|row| row.id != id);
        rows.len() != before
    }

    /// Replaces the committed state with the tidied, time-stamped draft.
    /// Returns the new committed state for persisting, or `None` when no
    /// draft was open.
    pub fn commit(&mut self, now: DateTime<Utc>) -> Option<&CanonicalState> {
        let mut draft = self.draft.take()?;
        mark_saved(&mut draft, now);
        self.committed = draft;
        Some(&self.committed)
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Swaps in a state saved elsewhere (another tab). An open draft is left
    /// alone; the next commit wins.
    pub fn replace_committed(&mut self, state: CanonicalState) {
        self.committed = state;
    }

    fn draft_row_mut(&mut self, gender: Gender, distance: Distance, id: &str) -> Option<&mut MedalRecord> {
        self.draft
            .as_mut()?
            .bucket_mut(gender, distance)
            .iter_mut()
            .find(|row| row.id == id)
    }
}
