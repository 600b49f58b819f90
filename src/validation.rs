use serde::Serialize;
use std::fmt;

use crate::errors::AppError;
use crate::models::{Aspect, NewPlace, PlaceDraft, Society, SocietyDraft};

/// Blocking notice shown when a draft is rejected.
pub const VALIDATION_NOTICE: &str = "Please fill all fields correctly (ratings should be 1-5)";

pub const MIN_COST_OF_LIVING: f64 = 1.0;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// One reason a draft cannot be submitted.
///
/// `society` is the zero-based position of the offending draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationIssue {
    MissingPlaceName,
    MissingSocietyName { society: usize },
    InvalidCostOfLiving { society: usize, value: String },
    RatingOutOfRange { society: usize, field: Aspect, value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingPlaceName => write!(f, "place name is required"),
            ValidationIssue::MissingSocietyName { society } => {
                write!(f, "society {} needs a name", society + 1)
            }
            ValidationIssue::InvalidCostOfLiving { society, value } => write!(
                f,
                "society {}: cost of living must be a number of at least 1 (got {:?})",
                society + 1,
                value
            ),
            ValidationIssue::RatingOutOfRange {
                society,
                field,
                value,
            } => write!(
                f,
                "society {}: {} must be between 1 and 5 (got {:?})",
                society + 1,
                field.label(),
                value
            ),
        }
    }
}

/// Checks a draft and converts it into the request body for the store.
///
/// Every numeric field is parsed exactly once from its trimmed text; the same
/// value is range-checked and transmitted. All issues are collected, not just
/// the first.
///
/// # Returns
///
/// * `Result<NewPlace, AppError>` - The finalized place, or `AppError::Validation`.
pub fn validate_draft(draft: &PlaceDraft) -> Result<NewPlace, AppError> {
    let mut issues = Vec::new();

    let place_name = draft.place_name.trim();
    if place_name.is_empty() {
        issues.push(ValidationIssue::MissingPlaceName);
    }

    let mut societies = Vec::with_capacity(draft.societies.len());
    for (index, society) in draft.societies.iter().enumerate() {
        match finalize_society(index, society) {
            Ok(finalized) => societies.push(finalized),
            Err(mut found) => issues.append(&mut found),
        }
    }

    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    // Lookups and creation use the name as typed, matching what the user searched for.
    Ok(NewPlace {
        name: draft.place_name.clone(),
        societies,
    })
}

fn finalize_society(index: usize, draft: &SocietyDraft) -> Result<Society, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if draft.name.trim().is_empty() {
        issues.push(ValidationIssue::MissingSocietyName { society: index });
    }

    let cost_of_living = parse_number(&draft.cost_of_living).filter(|v| *v >= MIN_COST_OF_LIVING);
    if cost_of_living.is_none() {
        issues.push(ValidationIssue::InvalidCostOfLiving {
            society: index,
            value: draft.cost_of_living.clone(),
        });
    }

    let mut ratings = [0.0; 4];
    for (slot, aspect) in ratings.iter_mut().zip(Aspect::RATINGS) {
        match parse_number(draft.raw(aspect)).filter(|v| (MIN_RATING..=MAX_RATING).contains(v)) {
            Some(value) => *slot = value,
            None => issues.push(ValidationIssue::RatingOutOfRange {
                society: index,
                field: aspect,
                value: draft.raw(aspect).to_string(),
            }),
        }
    }

    match cost_of_living {
        Some(cost_of_living) if issues.is_empty() => Ok(Society {
            name: draft.name.clone(),
            description: Some(draft.description.clone()),
            cost_of_living,
            safety_rating: ratings[0],
            green_spaces: ratings[1],
            nightlife: ratings[2],
            public_transport: ratings[3],
        }),
        _ => Err(issues),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(cost: &str, ratings: [&str; 4]) -> PlaceDraft {
        PlaceDraft::new(
            "Greater Noida",
            vec![SocietyDraft {
                name: "Alpha 1".to_string(),
                description: "Quiet".to_string(),
                cost_of_living: cost.to_string(),
                safety_rating: ratings[0].to_string(),
                green_spaces: ratings[1].to_string(),
                nightlife: ratings[2].to_string(),
                public_transport: ratings[3].to_string(),
            }],
        )
    }

    fn issues(result: Result<NewPlace, AppError>) -> Vec<ValidationIssue> {
        match result {
            Err(AppError::Validation(issues)) => issues,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_boundary_values_accepted() {
        let low = validate_draft(&draft("1", ["1", "1", "1", "1"])).unwrap();
        assert_eq!(low.societies[0].cost_of_living, 1.0);
        assert_eq!(low.societies[0].safety_rating, 1.0);

        let high = validate_draft(&draft("15000", ["5", "5", "5", "5"])).unwrap();
        assert_eq!(high.name, "Greater Noida");
        assert_eq!(high.societies[0].public_transport, 5.0);
        assert_eq!(high.societies[0].description.as_deref(), Some("Quiet"));
    }

    #[test]
    fn test_zero_cost_rejected() {
        let found = issues(validate_draft(&draft("0", ["3", "3", "3", "3"])));
        assert_eq!(
            found,
            vec![ValidationIssue::InvalidCostOfLiving {
                society: 0,
                value: "0".to_string()
            }]
        );
    }

    #[test]
    fn test_out_of_range_ratings_rejected() {
        for bad in ["0", "6", "", "x", "5.01"] {
            let found = issues(validate_draft(&draft("100", ["3", bad, "3", "3"])));
            assert_eq!(found.len(), 1, "value {:?}", bad);
            assert!(matches!(
                found[0],
                ValidationIssue::RatingOutOfRange {
                    field: Aspect::GreenSpaces,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_missing_names_reported() {
        let mut d = draft("100", ["3", "3", "3", "3"]);
        d.place_name = "   ".to_string();
        d.societies[0].name = " ".to_string();
        let found = issues(validate_draft(&d));
        assert_eq!(
            found,
            vec![
                ValidationIssue::MissingPlaceName,
                ValidationIssue::MissingSocietyName { society: 0 }
            ]
        );
    }

    #[test]
    fn test_coercion_trims_and_accepts_fractions() {
        let place = validate_draft(&draft(" 2500.5 ", ["4.5", " 2", "3", "1.0"])).unwrap();
        let society = &place.societies[0];
        assert_eq!(society.cost_of_living, 2500.5);
        assert_eq!(society.safety_rating, 4.5);
        assert_eq!(society.green_spaces, 2.0);
    }

    #[test]
    fn test_issue_messages_name_the_field() {
        let issue = ValidationIssue::RatingOutOfRange {
            society: 1,
            field: Aspect::PublicTransport,
            value: "6".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "society 2: Public Transport must be between 1 and 5 (got \"6\")"
        );
    }
}
