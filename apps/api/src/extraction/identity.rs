use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::extraction::prompts::IDENTITY_EXTRACT_PROMPT;
use crate::identity::CandidateIdentity;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{decode_model_json, LlmClient};

/// Pulls contact details out of resume text.
///
/// Implementations are unreliable by contract: any failure (transport,
/// unparseable output) comes back as `None`, never as an error, and a single
/// attempt is made per resume. Carried in `AppState` as `Arc<dyn IdentityExtractor>`.
#[async_trait]
pub trait IdentityExtractor: Send + Sync {
    async fn extract(&self, resume_text: &str) -> Option<CandidateIdentity>;
}

/// Result handed to the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityExtraction {
    /// Always present; blank fields when extraction failed.
    pub identity: CandidateIdentity,
    pub extracted: bool,
}

/// Runs the extractor and folds a failure into a blank identity.
pub async fn extract_for_review(
    extractor: &dyn IdentityExtractor,
    resume_text: &str,
) -> IdentityExtraction {
    match extractor.extract(resume_text).await {
        Some(identity) => IdentityExtraction {
            identity,
            extracted: true,
        },
        None => IdentityExtraction {
            identity: CandidateIdentity::default(),
            extracted: false,
        },
    }
}

pub struct LlmIdentityExtractor {
    llm: LlmClient,
}

impl LlmIdentityExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IdentityExtractor for LlmIdentityExtractor {
    async fn extract(&self, resume_text: &str) -> Option<CandidateIdentity> {
        if resume_text.trim().is_empty() {
            warn!("Skipping identity extraction: resume text is empty");
            return None;
        }

        let prompt = IDENTITY_EXTRACT_PROMPT.replace("{resume_text}", resume_text);
        let raw = match self.llm.call_text(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Identity extraction call failed: {e}");
                return None;
            }
        };

        let identity = decode_identity(&raw)?;
        if identity.is_blank() {
            warn!("Model found no contact details in resume");
        } else {
            info!(
                "Extracted identity (name: {}, email: {}, mobile: {})",
                !identity.name.is_empty(),
                !identity.email.is_empty(),
                !identity.mobile.is_empty()
            );
        }
        Some(identity)
    }
}

// Models sometimes answer with nulls or a numeric phone number.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIdentity {
    name: Value,
    email: Value,
    mobile: Value,
}

/// Decodes model output into an identity, logging the untouched text on failure.
pub fn decode_identity(raw: &str) -> Option<CandidateIdentity> {
    match decode_model_json::<RawIdentity>(raw) {
        Ok(parsed) => Some(CandidateIdentity {
            name: field_text(&parsed.name),
            email: field_text(&parsed.email),
            mobile: field_text(&parsed.mobile),
        }),
        Err(e) => {
            warn!(raw_text = %raw, "Failed to decode identity from model output: {e}");
            None
        }
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Extractor returning a canned answer, for handler tests.
#[cfg(test)]
pub struct FixedIdentityExtractor(pub Option<CandidateIdentity>);

#[cfg(test)]
#[async_trait]
impl IdentityExtractor for FixedIdentityExtractor {
    async fn extract(&self, _resume_text: &str) -> Option<CandidateIdentity> {
        self.0.clone()
    }
}
