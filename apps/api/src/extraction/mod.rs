// Resume intake: uploaded file -> plain text -> best-effort contact details.
// All model calls go through llm_client.

pub mod handlers;
pub mod identity;
pub mod prompts;
pub mod resume;
pub mod word;
