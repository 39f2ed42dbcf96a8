use crate::error::{Error, Result};
use crate::models::question::{Question, OPTIONS_PER_QUESTION, QUESTIONS_PER_ASSIGNMENT};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Requests a fixed-size set of multiple-choice questions from the external
/// generative-text endpoint and rejects malformed output before it is ever
/// persisted or shown to a candidate. Persistence is the caller's job.
#[derive(Clone)]
pub struct QuestionSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl QuestionSource {
    pub fn new(base_url: String, api_key: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn generate(
        &self,
        job_title: &str,
        job_description: &str,
        requirements: &[String],
    ) -> Result<Vec<Question>> {
        if job_title.trim().is_empty() {
            return Err(Error::BadRequest("job title must not be empty".to_string()));
        }

        let prompt = build_prompt(job_title, job_description, requirements);
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7 }
        });

        let url = format!(
            "{}/models/gemini-pro:generateContent?key={}",
            self.base_url, self.api_key
        );
        let res = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "generation endpoint error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;
        let text = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::Generation("response carries no model text".to_string()))?;

        parse_generated_questions(text)
    }
}

fn build_prompt(job_title: &str, job_description: &str, requirements: &[String]) -> String {
    format!(
        r#"Generate {count} multiple choice questions for a {title} position based on the following job description and requirements:

Job Description: {description}

Requirements: {requirements}

Please generate exactly {count} MCQ questions that test:
- Technical knowledge relevant to the role
- Problem-solving abilities
- Best practices in the field
- Practical application of skills

For each question, provide:
1. A clear, specific question
2. {options} multiple choice options (A, B, C, D)
3. The correct answer (0-{max_idx} index)
4. A brief explanation of why the answer is correct

Format the response as a JSON array with this structure:
[
  {{
    "question": "Question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 0,
    "explanation": "Explanation of why this answer is correct"
  }}
]

Make sure questions are practical, relevant, and at an appropriate difficulty level for the position."#,
        count = QUESTIONS_PER_ASSIGNMENT,
        title = job_title,
        description = job_description,
        requirements = requirements.join(", "),
        options = OPTIONS_PER_QUESTION,
        max_idx = OPTIONS_PER_QUESTION - 1,
    )
}

/// Lenient extraction, strict validation. The model text is searched for its
/// first well-formed JSON array substring; the array must then hold exactly
/// ten schema-valid questions or the whole set is rejected. Partial results
/// are never patched up.
pub fn parse_generated_questions(text: &str) -> Result<Vec<Question>> {
    let start = text
        .find('[')
        .ok_or_else(|| Error::Generation("no JSON array in model output".to_string()))?;
    let end = text
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| Error::Generation("no JSON array in model output".to_string()))?;

    let questions: Vec<Question> = serde_json::from_str(&text[start..=end])
        .map_err(|e| Error::Generation(format!("model output is not a question array: {}", e)))?;

    if questions.len() != QUESTIONS_PER_ASSIGNMENT {
        return Err(Error::Generation(format!(
            "expected exactly {} questions, got {}",
            QUESTIONS_PER_ASSIGNMENT,
            questions.len()
        )));
    }
    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|e| Error::Generation(format!("invalid question at index {}: {}", index, e)))?;
    }

    Ok(questions)
}
