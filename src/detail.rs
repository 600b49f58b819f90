//! Society detail view.
//!
//! Only reachable through a [`SocietyHandoff`] produced by the results list.
//! Nothing here talks to the network: without a hand-off the view is the
//! terminal "no data" state.

use serde::Serialize;

use crate::format::{format_rating, format_rupee_amount};
use crate::models::{Aspect, Place, Society};

pub const NO_DATA_MESSAGE: &str = "No society data found.";

/// Everything the results list passes along when a row is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct SocietyHandoff {
    pub place_name: String,
    pub society: Society,
    /// Position of `society` in the place's list.
    pub index: usize,
    /// Length of the place's list at the time of the search.
    pub total: usize,
}

impl SocietyHandoff {
    /// Hand-off for the society at `index`, if there is one.
    pub fn from_place(place: &Place, index: usize) -> Option<Self> {
        place.societies.get(index).map(|society| Self {
            place_name: place.name.clone(),
            society: society.clone(),
            index,
            total: place.societies.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocietyDetail {
    pub name: String,
    pub place_name: String,
    pub cost_of_living: String,
    pub ratings: Vec<RatingLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 1-based.
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Society(SocietyDetail),
    NoData,
}

impl DetailView {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DetailView::Society(_) => None,
            DetailView::NoData => Some(NO_DATA_MESSAGE),
        }
    }
}

/// Projects a hand-off into the detail view.
pub fn render_detail(handoff: Option<&SocietyHandoff>) -> DetailView {
    let Some(handoff) = handoff else {
        return DetailView::NoData;
    };
    let society = &handoff.society;

    DetailView::Society(SocietyDetail {
        name: society.name.clone(),
        place_name: handoff.place_name.clone(),
        cost_of_living: format_rupee_amount(society.cost_of_living),
        ratings: Aspect::RATINGS
            .into_iter()
            .map(|aspect| RatingLine {
                label: aspect.label(),
                value: format_rating(society.rating(aspect)),
            })
            .collect(),
        description: society
            .description
            .as_ref()
            .filter(|text| !text.is_empty())
            .cloned(),
        position: handoff.index + 1,
        total: handoff.total,
    })
}
