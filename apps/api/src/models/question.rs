use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Candidate answers keyed by question id.
pub type Answers = BTreeMap<u32, String>;

/// One quiz question. Ids are unique within a quiz and the list order is the
/// presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: String,
    pub max_marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allotted_time_seconds: Option<u32>,
}

impl Question {
    pub fn new(id: u32, prompt: impl Into<String>, max_marks: f64) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            max_marks,
            allotted_time_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_wire_format() {
        let q = Question::new(2, "Describe a challenging project.", 15.0);
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            serde_json::json!({ "id": 2, "question": "Describe a challenging project.", "maxMarks": 15.0 })
        );
    }

    #[test]
    fn test_answers_keys_roundtrip_as_strings() {
        let mut answers = Answers::new();
        answers.insert(1, "First".into());
        answers.insert(3, String::new());
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"1":"First","3":""}"#);
        let back: Answers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answers);
    }
}
