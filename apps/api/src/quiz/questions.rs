use std::collections::HashSet;

use crate::models::question::Question;

/// Built-in question list used whenever no questions are supplied.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new(
            1,
            "Tell me about yourself and your background in software development.",
            10.0,
        ),
        Question::new(
            2,
            "Describe a challenging project you worked on and how you overcame the difficulties.",
            15.0,
        ),
        Question::new(
            3,
            "What are your strengths and how do they apply to this role?",
            10.0,
        ),
    ]
}

/// Returns the supplied questions, or the defaults when none were given.
/// Rejects lists with duplicate ids.
pub fn resolve_questions(supplied: Vec<Question>) -> Result<Vec<Question>, String> {
    if supplied.is_empty() {
        return Ok(default_questions());
    }

    let mut seen = HashSet::new();
    for q in &supplied {
        if !seen.insert(q.id) {
            return Err(format!("Duplicate question id {}", q.id));
        }
        if q.prompt.trim().is_empty() {
            return Err(format!("Question {} has an empty prompt", q.id));
        }
    }
    Ok(supplied)
}
