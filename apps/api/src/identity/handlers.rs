use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::review::{FieldDisplay, ReviewStep};
use crate::identity::validation::{validate, ValidationReport};
use crate::identity::{CandidateIdentity, IdentityField};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Edit,
    Save,
    Cancel,
}

/// One review interaction. The client holds the state between calls:
/// `confirmed` is the last-confirmed identity, `draft` the form contents
/// (absent when not editing).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub confirmed: CandidateIdentity,
    pub draft: Option<CandidateIdentity>,
    pub action: ReviewAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub confirmed: CandidateIdentity,
    pub draft: CandidateIdentity,
    pub editing: bool,
    pub can_start: bool,
    pub fields: Vec<FieldDisplay>,
}

/// POST /api/identity/validate
///
/// Stateless check used to gate the "Start Quiz" action while the candidate edits.
pub async fn handle_validate_identity(
    Json(identity): Json<CandidateIdentity>,
) -> Json<ValidationReport> {
    Json(validate(&identity))
}

/// POST /api/identity/review
///
/// Applies one edit/save/cancel step and returns the resulting rendering.
pub async fn handle_review_identity(Json(req): Json<ReviewRequest>) -> Json<ReviewResponse> {
    let mut review = ReviewStep::new(Some(req.confirmed));

    if let Some(draft) = req.draft {
        review.begin_edit();
        for field in IdentityField::ALL {
            review.set_field(field, draft.field(field));
        }
    }

    match req.action {
        ReviewAction::Edit => review.begin_edit(),
        ReviewAction::Cancel => review.cancel(),
        ReviewAction::Save => {
            if review.save().is_err() {
                debug!("Review save rejected; staying in edit mode");
            }
        }
    }

    Json(ReviewResponse {
        confirmed: review.confirmed().clone(),
        draft: review.draft().clone(),
        editing: review.is_editing(),
        can_start: review.can_start(),
        fields: review.display(),
    })
}
