use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============ Remote Store Models ============

/// A named area holding an ordered list of societies.
///
/// This is the record served by `GET /api/places/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Lookup key, unique within the store.
    pub name: String,
    /// Societies in the order the store returns them.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub societies: Vec<Society>,
}

/// A residential complex within a place, with its cost and ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Society {
    /// Society name, unique within its place.
    pub name: String,
    /// Free-text "About" section.
    #[serde(default)]
    pub description: Option<String>,
    /// Average monthly expenditure in rupees.
    #[serde(deserialize_with = "lenient_f64")]
    pub cost_of_living: f64,
    /// Safety rating, 1-5.
    #[serde(deserialize_with = "lenient_f64")]
    pub safety_rating: f64,
    /// Green spaces rating, 1-5.
    #[serde(deserialize_with = "lenient_f64")]
    pub green_spaces: f64,
    /// Nightlife rating, 1-5.
    #[serde(deserialize_with = "lenient_f64")]
    pub nightlife: f64,
    /// Public transport rating, 1-5.
    #[serde(deserialize_with = "lenient_f64")]
    pub public_transport: f64,
}

impl Society {
    /// Value of one of the rated aspects.
    pub fn rating(&self, aspect: Aspect) -> f64 {
        match aspect {
            Aspect::CostOfLiving => self.cost_of_living,
            Aspect::Safety => self.safety_rating,
            Aspect::GreenSpaces => self.green_spaces,
            Aspect::Nightlife => self.nightlife,
            Aspect::PublicTransport => self.public_transport,
        }
    }

    /// Picks the aspect this society scores best on.
    ///
    /// The four ratings are scanned in [`Aspect::RATINGS`] order and the leader is
    /// only replaced by a strictly greater value, so ties go to the earlier aspect.
    pub fn highest_rated(&self) -> Aspect {
        let mut highest = Aspect::RATINGS[0];
        for aspect in Aspect::RATINGS {
            if self.rating(aspect) > self.rating(highest) {
                highest = aspect;
            }
        }
        highest
    }
}

/// Body of `POST /api/places`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    pub name: String,
    pub societies: Vec<Society>,
}

/// Rated aspects of a society, as labelled in the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aspect {
    CostOfLiving,
    Safety,
    GreenSpaces,
    Nightlife,
    PublicTransport,
}

impl Aspect {
    /// The four 1-5 ratings, in tie-break order.
    pub const RATINGS: [Aspect; 4] = [
        Aspect::Safety,
        Aspect::GreenSpaces,
        Aspect::Nightlife,
        Aspect::PublicTransport,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Aspect::CostOfLiving => "Cost of Living",
            Aspect::Safety => "Safety",
            Aspect::GreenSpaces => "Green Spaces",
            Aspect::Nightlife => "Nightlife",
            Aspect::PublicTransport => "Public Transport",
        }
    }

    /// JSON field name on the wire and in drafts.
    pub fn field_name(self) -> &'static str {
        match self {
            Aspect::CostOfLiving => "costOfLiving",
            Aspect::Safety => "safetyRating",
            Aspect::GreenSpaces => "greenSpaces",
            Aspect::Nightlife => "nightlife",
            Aspect::PublicTransport => "publicTransport",
        }
    }
}

// ============ Draft Form Models ============

/// One society as typed into the form: every field is still raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocietyDraft {
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "text_or_number")]
    pub safety_rating: String,
    #[serde(deserialize_with = "text_or_number")]
    pub cost_of_living: String,
    #[serde(deserialize_with = "text_or_number")]
    pub green_spaces: String,
    #[serde(deserialize_with = "text_or_number")]
    pub nightlife: String,
    #[serde(deserialize_with = "text_or_number")]
    pub public_transport: String,
}

impl SocietyDraft {
    /// Raw text of a numeric field.
    pub fn raw(&self, aspect: Aspect) -> &str {
        match aspect {
            Aspect::CostOfLiving => &self.cost_of_living,
            Aspect::Safety => &self.safety_rating,
            Aspect::GreenSpaces => &self.green_spaces,
            Aspect::Nightlife => &self.nightlife,
            Aspect::PublicTransport => &self.public_transport,
        }
    }
}

/// Editable field of a [`SocietyDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Description,
    Numeric(Aspect),
}

/// The "Add New Place" form.
///
/// Always holds at least one society draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDraft {
    #[serde(default)]
    pub place_name: String,
    #[serde(default = "one_empty_society", deserialize_with = "at_least_one_society")]
    pub societies: Vec<SocietyDraft>,
}

impl Default for PlaceDraft {
    fn default() -> Self {
        Self {
            place_name: String::new(),
            societies: one_empty_society(),
        }
    }
}

impl PlaceDraft {
    pub fn new(place_name: impl Into<String>, societies: Vec<SocietyDraft>) -> Self {
        let mut draft = Self {
            place_name: place_name.into(),
            societies,
        };
        if draft.societies.is_empty() {
            draft.add_society();
        }
        draft
    }

    /// Appends an empty society draft.
    pub fn add_society(&mut self) {
        self.societies.push(SocietyDraft::default());
    }

    /// Removes the draft at `index` unless it is the last one left.
    ///
    /// Returns whether anything was removed.
    pub fn remove_society(&mut self, index: usize) -> bool {
        if self.societies.len() <= 1 || index >= self.societies.len() {
            return false;
        }
        self.societies.remove(index);
        true
    }

    /// Overwrites one field of the draft at `index`. Out-of-range indexes are ignored.
    pub fn set_field(&mut self, index: usize, field: DraftField, value: impl Into<String>) {
        let Some(society) = self.societies.get_mut(index) else {
            return;
        };
        let value = value.into();
        match field {
            DraftField::Name => society.name = value,
            DraftField::Description => society.description = value,
            DraftField::Numeric(Aspect::CostOfLiving) => society.cost_of_living = value,
            DraftField::Numeric(Aspect::Safety) => society.safety_rating = value,
            DraftField::Numeric(Aspect::GreenSpaces) => society.green_spaces = value,
            DraftField::Numeric(Aspect::Nightlife) => society.nightlife = value,
            DraftField::Numeric(Aspect::PublicTransport) => society.public_transport = value,
        }
    }

    /// Back to an empty place name and a single empty society.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Transient "Place added successfully!" banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessNotice {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl SuccessNotice {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// ============ Helpers ============

fn one_empty_society() -> Vec<SocietyDraft> {
    vec![SocietyDraft::default()]
}

fn at_least_one_society<'de, D>(deserializer: D) -> Result<Vec<SocietyDraft>, D::Error>
where
    D: Deserializer<'de>,
{
    let societies = Option::<Vec<SocietyDraft>>::deserialize(deserializer)?.unwrap_or_default();
    if societies.is_empty() {
        Ok(one_empty_society())
    } else {
        Ok(societies)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Society>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Society>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `4`, `4.5` or `"4.5"`; the store does not guarantee numeric JSON.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

/// Draft fields hold raw text, but JSON clients often send numbers.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Number(number)) => number.to_string(),
        None => String::new(),
    })
}
