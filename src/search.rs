//! Place lookup flow.
//!
//! The caller owns a [`SearchState`] and lends it mutably to [`run_search`] for
//! the whole round trip, so a single state can never host two lookups at once.

use serde::Serialize;

use crate::errors::AppError;
use crate::format::format_rupee_amount;
use crate::models::{Place, Society};
use crate::places_client::PlacesClient;

pub const NOT_FOUND_MESSAGE: &str = "No societies found for this place.";
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching data.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error.";
pub const EMPTY_PLACE_MESSAGE: &str = "Please enter a place name.";

/// How a lookup ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The place exists; it may still have no societies.
    Found(Place),
    /// The store answered 404.
    NotFound,
    /// Anything else.
    Failed(SearchFailure),
}

/// Why a lookup produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    /// Nothing to look up; no request was made.
    EmptyPlace,
    /// Unexpected status or unreadable body.
    Fetch,
    /// The request did not complete.
    Network,
}

impl SearchFailure {
    pub fn message(self) -> &'static str {
        match self {
            SearchFailure::EmptyPlace => EMPTY_PLACE_MESSAGE,
            SearchFailure::Fetch => FETCH_ERROR_MESSAGE,
            SearchFailure::Network => NETWORK_ERROR_MESSAGE,
        }
    }
}

/// Search tab state: the typed place, the last result, and the status flags.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    place: String,
    result: Option<Place>,
    loading: bool,
    message: Option<String>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    /// Updates the place while it is being typed.
    pub fn set_place(&mut self, place: impl Into<String>) {
        self.place = place.into();
    }

    /// Trims the stored place once editing is done.
    pub fn commit_place(&mut self) {
        let trimmed = self.place.trim();
        if trimmed.len() != self.place.len() {
            self.place = trimmed.to_string();
        }
    }

    pub fn result(&self) -> Option<&Place> {
        self.result.as_ref()
    }

    /// Set only while `run_search` holds this state, so a caller that owns it
    /// always reads `false` between searches. Concurrent runs on one state are
    /// ruled out by the `&mut` borrow instead of by this flag.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Not-found or error text to show above the results, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Clears the place and the last result, e.g. when leaving the tab.
    pub fn reset(&mut self) {
        self.place.clear();
        self.result = None;
        self.message = None;
    }

    /// Rows for the results table, or `None` when there is nothing to list.
    pub fn rows(&self) -> Option<Vec<SocietyRow>> {
        self.result
            .as_ref()
            .filter(|place| !place.societies.is_empty())
            .map(|place| place.societies.iter().map(SocietyRow::from).collect())
    }

    /// Text shown instead of rows: the flow message, or the empty-place notice.
    pub fn empty_text(&self) -> Option<&str> {
        if let Some(message) = self.message() {
            return Some(message);
        }
        match &self.result {
            Some(place) if place.societies.is_empty() => Some(NOT_FOUND_MESSAGE),
            _ => None,
        }
    }
}

/// One line of the results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocietyRow {
    pub name: String,
    /// `Rs. 1,50,000`
    pub cost_of_living: String,
    /// `avg. Rs. 1,50,000`, as shown on narrow screens.
    pub cost_of_living_label: String,
    pub highest_rated: &'static str,
}

impl From<&Society> for SocietyRow {
    fn from(society: &Society) -> Self {
        let cost = format_rupee_amount(society.cost_of_living);
        Self {
            name: society.name.clone(),
            cost_of_living_label: format!("avg. {}", cost),
            cost_of_living: cost,
            highest_rated: society.highest_rated().label(),
        }
    }
}

/// Looks up the place held in `state` and records the outcome there.
///
/// The previous result and message are cleared before the request goes out,
/// and `loading` stays set until it returns. An empty place name is rejected
/// without touching the network.
///
/// # Arguments
///
/// * `client` - Places API client.
/// * `state` - Search state owned by the caller.
///
/// # Returns
///
/// * `SearchOutcome` - Also reflected in `state`.
pub async fn run_search(client: &PlacesClient, state: &mut SearchState) -> SearchOutcome {
    state.message = None;
    state.result = None;

    let place = state.place.trim().to_string();
    if place.is_empty() {
        state.message = Some(EMPTY_PLACE_MESSAGE.to_string());
        return SearchOutcome::Failed(SearchFailure::EmptyPlace);
    }

    state.loading = true;
    let outcome = outcome_of(client.get_place(&place).await);
    state.loading = false;

    match &outcome {
        SearchOutcome::Found(found) => state.result = Some(found.clone()),
        SearchOutcome::NotFound => state.message = Some(NOT_FOUND_MESSAGE.to_string()),
        SearchOutcome::Failed(failure) => state.message = Some(failure.message().to_string()),
    }
    outcome
}

/// Maps a lookup result onto the outcome shown to the user.
pub fn outcome_of(result: Result<Place, AppError>) -> SearchOutcome {
    match result {
        Ok(place) => SearchOutcome::Found(place),
        Err(err) => match err.root() {
            AppError::NotFound(_) => SearchOutcome::NotFound,
            AppError::Network(_) => SearchOutcome::Failed(SearchFailure::Network),
            _ => {
                tracing::warn!("Search failed: {}", err);
                SearchOutcome::Failed(SearchFailure::Fetch)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(societies: Vec<Society>) -> Place {
        Place {
            name: "Greater Noida".to_string(),
            societies,
        }
    }

    fn society(name: &str, cost: f64) -> Society {
        Society {
            name: name.to_string(),
            description: None,
            cost_of_living: cost,
            safety_rating: 3.0,
            green_spaces: 4.0,
            nightlife: 2.0,
            public_transport: 4.0,
        }
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(
            outcome_of(Err(AppError::NotFound("x".into()))),
            SearchOutcome::NotFound
        );
        assert_eq!(
            outcome_of(Err(AppError::Network("refused".into()))),
            SearchOutcome::Failed(SearchFailure::Network)
        );
        assert_eq!(
            outcome_of(Err(AppError::Remote {
                status: 500,
                body: "boom".into()
            })),
            SearchOutcome::Failed(SearchFailure::Fetch)
        );
    }

    #[test]
    fn test_rows_for_found_place() {
        let mut state = SearchState::new();
        state.result = Some(place(vec![society("Alpha 1", 150000.0)]));
        let rows = state.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cost_of_living, "Rs. 1,50,000");
        assert_eq!(rows[0].cost_of_living_label, "avg. Rs. 1,50,000");
        assert_eq!(rows[0].highest_rated, "Green Spaces");
        assert_eq!(state.empty_text(), None);
    }

    #[test]
    fn test_empty_place_shows_not_found_text() {
        let mut state = SearchState::new();
        state.result = Some(place(vec![]));
        assert!(state.rows().is_none());
        assert_eq!(state.empty_text(), Some(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_commit_and_reset() {
        let mut state = SearchState::new();
        state.set_place("  Sector 62 ");
        state.commit_place();
        assert_eq!(state.place(), "Sector 62");
        state.result = Some(place(vec![]));
        state.reset();
        assert_eq!(state.place(), "");
        assert!(state.result().is_none());
    }

    #[tokio::test]
    async fn test_blank_place_never_hits_network() {
        // Port 9 is discard; any request here would fail as a network error instead.
        let client = PlacesClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
        let mut state = SearchState::new();
        state.set_place("   ");
        let outcome = run_search(&client, &mut state).await;
        assert_eq!(outcome, SearchOutcome::Failed(SearchFailure::EmptyPlace));
        assert_eq!(state.message(), Some(EMPTY_PLACE_MESSAGE));
        assert!(!state.is_loading());
    }
}
