//! Candidate identity: the three contact fields a candidate must confirm
//! before a quiz can start.

pub mod handlers;
pub mod review;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::identity::validation::{validate, ValidationReport};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
}

impl CandidateIdentity {
    #[cfg(test)]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            mobile: mobile.into(),
        }
    }

    pub fn field(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Name => &self.name,
            IdentityField::Email => &self.email,
            IdentityField::Mobile => &self.mobile,
        }
    }

    pub fn set_field(&mut self, field: IdentityField, value: impl Into<String>) {
        let slot = match field {
            IdentityField::Name => &mut self.name,
            IdentityField::Email => &mut self.email,
            IdentityField::Mobile => &mut self.mobile,
        };
        *slot = value.into();
    }

    /// True when every field is empty after trimming.
    pub fn is_blank(&self) -> bool {
        IdentityField::ALL
            .iter()
            .all(|f| self.field(*f).trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityField {
    Name,
    Email,
    Mobile,
}

impl IdentityField {
    pub const ALL: [IdentityField; 3] = [
        IdentityField::Name,
        IdentityField::Email,
        IdentityField::Mobile,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IdentityField::Name => "Full Name",
            IdentityField::Email => "Email Address",
            IdentityField::Mobile => "Mobile Number",
        }
    }
}

/// An identity that passed validation. Only constructible through
/// [`TryFrom<CandidateIdentity>`], so holding one proves the fields are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfirmedIdentity(CandidateIdentity);

impl ConfirmedIdentity {
    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn as_identity(&self) -> &CandidateIdentity {
        &self.0
    }
}

impl TryFrom<CandidateIdentity> for ConfirmedIdentity {
    type Error = ValidationReport;

    fn try_from(identity: CandidateIdentity) -> Result<Self, Self::Error> {
        let report = validate(&identity);
        if report.valid {
            Ok(ConfirmedIdentity(identity))
        } else {
            Err(report)
        }
    }
}
