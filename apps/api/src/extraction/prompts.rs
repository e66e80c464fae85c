// Field extraction prompt templates.

pub const IDENTITY_EXTRACT_PROMPT: &str = r#"Extract the candidate's name, email, and mobile number from the following resume text.
Return the result strictly in the JSON format below. If a field is not found, leave it as an empty string.
Do not add any extra text, comments, or greetings.

Format:
{
  "name": "",
  "email": "",
  "mobile": ""
}

Text:
{resume_text}"#;
