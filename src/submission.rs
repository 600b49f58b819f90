//! Place submission flow.
//!
//! Validate locally, ask the store whether the place exists, then either append
//! each society in order or create the place with all of them in one request.
//! Appends are not rolled back: when one fails, the ones before it stay in the
//! store and the failure says how many went through.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{PlaceDraft, SuccessNotice};
use crate::places_client::PlacesClient;
use crate::validation::{validate_draft, VALIDATION_NOTICE};

pub const SUCCESS_MESSAGE: &str = "Place added successfully!";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Error occurred. Please check your connection and try again.";
pub const DEFAULT_NOTICE_SECS: i64 = 3;

/// What a successful submission did in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "camelCase")]
pub enum SubmissionOutcome {
    /// New place, created with every society in one request.
    Created { place: String, societies: usize },
    /// Existing place, one append per society.
    Appended { place: String, societies: usize },
}

/// Step at which a submission stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum SubmissionStage {
    Validation,
    ExistenceCheck,
    Append { society: String },
    Create,
}

/// A submission that stopped early.
#[derive(Debug, Clone)]
pub struct SubmissionFailure {
    pub stage: SubmissionStage,
    pub error: AppError,
    /// Societies already appended before the failing step, in order.
    pub appended: Vec<String>,
}

impl SubmissionFailure {
    fn at(stage: SubmissionStage, error: AppError) -> Self {
        Self {
            stage,
            error,
            appended: Vec::new(),
        }
    }

    /// Blocking notice for the user.
    ///
    /// Store rejections include the response text; transport failures get the
    /// generic connection message.
    pub fn notice(&self) -> String {
        if matches!(self.error.root(), AppError::Validation(_)) {
            return VALIDATION_NOTICE.to_string();
        }
        if self.error.is_network() {
            return CONNECTION_ERROR_MESSAGE.to_string();
        }
        let body = match self.error.root() {
            AppError::Remote { body, .. } => body.clone(),
            other => other.to_string(),
        };
        match &self.stage {
            SubmissionStage::Append { .. } => format!("Failed to add society: {}", body),
            SubmissionStage::Create => format!("Failed to add place: {}", body),
            _ => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Persists a draft.
///
/// # Arguments
///
/// * `client` - Places API client.
/// * `draft` - The form contents; left untouched.
///
/// # Returns
///
/// * `Result<SubmissionOutcome, SubmissionFailure>` - Which path was taken, or
///   where it stopped. Validation failures never reach the network.
pub async fn submit(
    client: &PlacesClient,
    draft: &PlaceDraft,
) -> Result<SubmissionOutcome, SubmissionFailure> {
    let place = validate_draft(draft)
        .map_err(|e| SubmissionFailure::at(SubmissionStage::Validation, e))?;

    let exists = client
        .place_exists(&place.name)
        .await
        .map_err(|e| SubmissionFailure::at(SubmissionStage::ExistenceCheck, e))?;

    if !exists {
        client
            .create_place(&place)
            .await
            .map_err(|e| SubmissionFailure::at(SubmissionStage::Create, e))?;
        return Ok(SubmissionOutcome::Created {
            societies: place.societies.len(),
            place: place.name,
        });
    }

    let mut appended = Vec::with_capacity(place.societies.len());
    for society in &place.societies {
        if let Err(error) = client.append_society(&place.name, society).await {
            tracing::warn!(
                "Stopped after {} of {} societies for '{}'",
                appended.len(),
                place.societies.len(),
                place.name
            );
            return Err(SubmissionFailure {
                stage: SubmissionStage::Append {
                    society: society.name.clone(),
                },
                error,
                appended,
            });
        }
        appended.push(society.name.clone());
    }

    Ok(SubmissionOutcome::Appended {
        place: place.name,
        societies: appended.len(),
    })
}

/// "Add New Place" form state.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    draft: PlaceDraft,
    loading: bool,
    notice: Option<SuccessNotice>,
    alert: Option<String>,
    notice_ttl: Duration,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_NOTICE_SECS))
    }
}

impl SubmissionForm {
    pub fn new(notice_ttl: Duration) -> Self {
        Self::with_draft(PlaceDraft::default(), notice_ttl)
    }

    pub fn with_draft(draft: PlaceDraft, notice_ttl: Duration) -> Self {
        Self {
            draft,
            loading: false,
            notice: None,
            alert: None,
            notice_ttl,
        }
    }

    pub fn draft(&self) -> &PlaceDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PlaceDraft {
        &mut self.draft
    }

    /// Whether the submit control should be disabled.
    ///
    /// Only true while `run_submission` holds the form. Other clients see a
    /// running submission through the service's in-flight view.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The success banner, while it has not expired.
    pub fn notice(&self) -> Option<&SuccessNotice> {
        self.notice
            .as_ref()
            .filter(|notice| notice.is_visible_at(Utc::now()))
    }

    /// Drops the success banner once its time is up.
    pub fn clear_expired_notice(&mut self) {
        if self.notice().is_none() {
            self.notice = None;
        }
    }

    /// Last blocking notice, if the previous attempt failed.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}

/// Submits the form's draft and updates the form with the result.
///
/// Success resets the draft and shows the notice for the configured time;
/// failure keeps the draft as typed and records the blocking notice.
pub async fn run_submission(
    client: &PlacesClient,
    form: &mut SubmissionForm,
) -> Result<SubmissionOutcome, SubmissionFailure> {
    form.alert = None;
    form.loading = true;
    let result = submit(client, &form.draft).await;
    form.loading = false;

    match &result {
        Ok(outcome) => {
            tracing::info!("✓ Submission finished: {:?}", outcome);
            form.draft.reset();
            form.notice = Some(SuccessNotice {
                message: SUCCESS_MESSAGE.to_string(),
                expires_at: Utc::now() + form.notice_ttl,
            });
        }
        Err(failure) => {
            tracing::warn!("Submission failed at {:?}: {}", failure.stage, failure.error);
            form.alert = Some(failure.notice());
        }
    }
    result
}
