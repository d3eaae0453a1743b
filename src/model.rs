use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Men, Gender::Women];

    pub fn key(self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Men => "Men",
            Gender::Women => "Women",
        }
    }

    /// Reads a toggle label such as `"Women"` or `"men"`. "women" is checked
    /// first because it contains "men".
    pub fn parse(input: &str) -> Option<Self> {
        let lower = input.trim().to_lowercase();
        if lower.contains("women") {
            Some(Gender::Women)
        } else if lower.contains("men") {
            Some(Gender::Men)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    #[serde(rename = "500")]
    M500,
    #[serde(rename = "1000")]
    M1000,
    #[serde(rename = "1500")]
    M1500,
    #[serde(rename = "relay")]
    Relay,
    #[serde(rename = "mixed")]
    Mixed,
}

impl Distance {
    pub const ALL: [Distance; 5] = [
        Distance::M500,
        Distance::M1000,
        Distance::M1500,
        Distance::Relay,
        Distance::Mixed,
    ];

    /// Distances that own a bucket per gender.
    pub const GENDERED: [Distance; 4] = [
        Distance::M500,
        Distance::M1000,
        Distance::M1500,
        Distance::Relay,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Distance::M500 => "500",
            Distance::M1000 => "1000",
            Distance::M1500 => "1500",
            Distance::Relay => "relay",
            Distance::Mixed => "mixed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Distance::M500 => "500m",
            Distance::M1000 => "1000m",
            Distance::M1500 => "1500m",
            Distance::Relay => "Relay",
            Distance::Mixed => "Mixed Relay",
        }
    }

    /// Individual-skater distances, where men's and women's results are
    /// merged during cross-referencing.
    pub fn is_individual(self) -> bool {
        matches!(self, Distance::M500 | Distance::M1000 | Distance::M1500)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    World,
    Olympic,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::World, Scope::Olympic];

    pub fn key(self) -> &'static str {
        match self {
            Scope::World => "world",
            Scope::Olympic => "olympic",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Scope::World => "World Champions",
            Scope::Olympic => "Olympic Champions",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "world" | "wk" => Some(Scope::World),
            "olympic" | "os" => Some(Scope::Olympic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameLand {
    pub name: String,
    pub land: String,
}

impl NameLand {
    pub fn new(name: impl Into<String>, land: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            land: land.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.land.trim().is_empty()
    }

    /// Reads the `"Name, LAND"` text used by the editor inputs. The last
    /// comma separates the land code; text without a comma is a bare name.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.rsplit_once(',') {
            Some((name, land)) => Self::new(name.trim(), land.trim().to_uppercase()),
            None => Self::new(text, ""),
        }
    }

    /// Inverse of [`NameLand::parse`].
    pub fn packed(&self) -> String {
        let name = self.name.trim();
        let land = self.land.trim();
        match (name.is_empty(), land.is_empty()) {
            (false, false) => format!("{}, {}", name, land),
            (false, true) => name.to_string(),
            (true, false) => land.to_string(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub gold: NameLand,
    #[serde(default)]
    pub silver: NameLand,
    #[serde(default)]
    pub bronze: NameLand,
}

impl MedalRecord {
    pub fn blank() -> Self {
        Self {
            id: generate_id(),
            year: String::new(),
            place: String::new(),
            gold: NameLand::default(),
            silver: NameLand::default(),
            bronze: NameLand::default(),
        }
    }

    /// Medal slots paired with their rank, gold first.
    pub fn medals(&self) -> [(u8, &NameLand); 3] {
        [(1, &self.gold), (2, &self.silver), (3, &self.bronze)]
    }

    pub fn has_medalists(&self) -> bool {
        self.medals().iter().any(|(_, slot)| !slot.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenderBuckets {
    #[serde(rename = "500")]
    pub m500: Vec<MedalRecord>,
    #[serde(rename = "1000")]
    pub m1000: Vec<MedalRecord>,
    #[serde(rename = "1500")]
    pub m1500: Vec<MedalRecord>,
    pub relay: Vec<MedalRecord>,
}

impl GenderBuckets {
    /// `None` for [`Distance::Mixed`], which lives outside the gender buckets.
    pub fn get(&self, distance: Distance) -> Option<&Vec<MedalRecord>> {
        match distance {
            Distance::M500 => Some(&self.m500),
            Distance::M1000 => Some(&self.m1000),
            Distance::M1500 => Some(&self.m1500),
            Distance::Relay => Some(&self.relay),
            Distance::Mixed => None,
        }
    }

    pub fn get_mut(&mut self, distance: Distance) -> Option<&mut Vec<MedalRecord>> {
        match distance {
            Distance::M500 => Some(&mut self.m500),
            Distance::M1000 => Some(&mut self.m1000),
            Distance::M1500 => Some(&mut self.m1500),
            Distance::Relay => Some(&mut self.relay),
            Distance::Mixed => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedBuckets {
    pub mixed: Vec<MedalRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

/// All champions records of one competition scope. Every bucket is a field,
/// so a missing distance cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalState {
    pub men: GenderBuckets,
    pub women: GenderBuckets,
    pub mixed: MixedBuckets,
    pub meta: Meta,
}

impl CanonicalState {
    pub fn gender(&self, gender: Gender) -> &GenderBuckets {
        match gender {
            Gender::Men => &self.men,
            Gender::Women => &self.women,
        }
    }

    pub fn gender_mut(&mut self, gender: Gender) -> &mut GenderBuckets {
        match gender {
            Gender::Men => &mut self.men,
            Gender::Women => &mut self.women,
        }
    }

    /// The list shown for a gender toggle and distance tab. Mixed relay
    /// ignores the gender.
    pub fn bucket(&self, gender: Gender, distance: Distance) -> &[MedalRecord] {
        match self.gender(gender).get(distance) {
            Some(rows) => rows,
            None => &self.mixed.mixed,
        }
    }

    pub fn bucket_mut(&mut self, gender: Gender, distance: Distance) -> &mut Vec<MedalRecord> {
        let buckets = match gender {
            Gender::Men => &mut self.men,
            Gender::Women => &mut self.women,
        };
        match distance {
            Distance::M500 => &mut buckets.m500,
            Distance::M1000 => &mut buckets.m1000,
            Distance::M1500 => &mut buckets.m1500,
            Distance::Relay => &mut buckets.relay,
            Distance::Mixed => &mut self.mixed.mixed,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &MedalRecord> {
        Gender::ALL
            .into_iter()
            .flat_map(move |gender| {
                Distance::GENDERED
                    .into_iter()
                    .filter_map(move |distance| self.gender(gender).get(distance))
            })
            .flatten()
            .chain(self.mixed.mixed.iter())
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }
}

/// Selector state of a page, owned by whoever renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub gender: Gender,
    pub distance: Distance,
    pub scope: Scope,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            gender: Gender::Men,
            distance: Distance::M500,
            scope: Scope::World,
        }
    }
}

pub fn generate_id() -> String {
    let random: u64 = rand::thread_rng().gen();
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("{:x}{:x}", random, millis)
}

/// Leading integer of a year label, e.g. `2025` for `"2025/26"`.
pub fn leading_year(year: &str) -> Option<i64> {
    let digits: String = year
        .trim_start()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Order used by the champions tables: newest year first, then by place.
/// Rows without a leading year go last.
pub fn display_order(a: &MedalRecord, b: &MedalRecord) -> Ordering {
    let by_place = || a.place.trim().cmp(b.place.trim());
    match (leading_year(&a.year), leading_year(&b.year)) {
        (Some(ya), Some(yb)) => yb.cmp(&ya).then_with(by_place),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_place(),
    }
}

pub fn sorted_for_display(records: &[MedalRecord]) -> Vec<MedalRecord> {
    let mut rows = records.to_vec();
    rows.sort_by(display_order);
    rows
}
