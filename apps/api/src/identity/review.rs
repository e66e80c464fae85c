//! Review step: the candidate confirms or edits what the extractor found.
//!
//! The step holds the last-confirmed identity and an editable draft. Nothing
//! here touches the network; confirming produces a [`ConfirmedIdentity`] that
//! the quiz runner takes as frozen input.

use serde::Serialize;

use crate::identity::validation::{validate, FieldErrors, ValidationReport};
use crate::identity::{CandidateIdentity, ConfirmedIdentity, IdentityField};

const NOT_PROVIDED: &str = "Not provided";

#[derive(Debug, Clone)]
pub struct ReviewStep {
    confirmed: CandidateIdentity,
    draft: CandidateIdentity,
    editing: bool,
    errors: FieldErrors,
}

/// Read-only rendering of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDisplay {
    pub field: IdentityField,
    pub label: &'static str,
    pub value: String,
    /// Empty fields show a placeholder and are highlighted as invalid in
    /// read-only mode; while editing the raw draft value is shown.
    pub highlighted: bool,
    pub error: Option<String>,
}

impl ReviewStep {
    /// Starts a review from whatever the extractor returned. A failed
    /// extraction (`None`) opens the review with all fields blank.
    pub fn new(extracted: Option<CandidateIdentity>) -> Self {
        let identity = extracted.unwrap_or_default();
        Self {
            confirmed: identity.clone(),
            draft: identity,
            editing: false,
            errors: FieldErrors::new(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn confirmed(&self) -> &CandidateIdentity {
        &self.confirmed
    }

    pub fn draft(&self) -> &CandidateIdentity {
        &self.draft
    }

    #[cfg(test)]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Continuous gate for the "Start Quiz" action.
    pub fn can_start(&self) -> bool {
        validate(&self.draft).valid
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
        self.errors.clear();
    }

    /// Updates one draft field and clears any error shown for it.
    pub fn set_field(&mut self, field: IdentityField, value: impl Into<String>) {
        self.draft.set_field(field, value);
        self.errors.remove(&field);
    }

    /// Discards the draft and restores the last-confirmed identity.
    pub fn cancel(&mut self) {
        self.draft = self.confirmed.clone();
        self.errors.clear();
        self.editing = false;
    }

    /// Commits the draft. On failure the step stays in edit mode with
    /// per-field errors populated.
    pub fn save(&mut self) -> Result<(), ValidationReport> {
        let report = validate(&self.draft);
        if !report.valid {
            self.errors = report.field_errors.clone();
            self.editing = true;
            return Err(report);
        }

        self.confirmed = self.draft.clone();
        self.errors.clear();
        self.editing = false;
        Ok(())
    }

    /// Freezes the current draft for the quiz. Invalid data re-enters edit
    /// mode and surfaces the errors instead of transitioning.
    pub fn start_quiz(&mut self) -> Result<ConfirmedIdentity, ValidationReport> {
        match ConfirmedIdentity::try_from(self.draft.clone()) {
            Ok(confirmed) => {
                self.confirmed = self.draft.clone();
                self.errors.clear();
                self.editing = false;
                Ok(confirmed)
            }
            Err(report) => {
                self.errors = report.field_errors.clone();
                self.editing = true;
                Err(report)
            }
        }
    }

    pub fn display(&self) -> Vec<FieldDisplay> {
        IdentityField::ALL
            .iter()
            .map(|&field| {
                let raw = self.draft.field(field);
                let empty = raw.trim().is_empty();
                FieldDisplay {
                    field,
                    label: field.label(),
                    value: if !self.editing && empty {
                        NOT_PROVIDED.to_string()
                    } else {
                        raw.to_string()
                    },
                    highlighted: !self.editing && empty,
                    error: self.errors.get(&field).cloned(),
                }
            })
            .collect()
    }
}
