use serde::{Deserialize, Serialize};

/// Every assessment carries exactly this many questions.
pub const QUESTIONS_PER_ASSIGNMENT: usize = 10;
/// Every question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question. Immutable once generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`, 0..=3.
    pub correct_answer: i32,
    pub explanation: String,
}

impl Question {
    /// Schema check applied to every generated question before anything is
    /// persisted or shown to a candidate.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "expected {} options, got {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("option text is empty".to_string());
        }
        if self.correct_answer < 0 || self.correct_answer as usize >= OPTIONS_PER_QUESTION {
            return Err(format!(
                "correctAnswer {} out of range 0..={}",
                self.correct_answer,
                OPTIONS_PER_QUESTION - 1
            ));
        }
        if self.explanation.trim().is_empty() {
            return Err("explanation is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_question() -> Question {
        Question {
            question: "What does ownership mean in Rust?".to_string(),
            options: vec![
                "Garbage collection".to_string(),
                "A single responsible binding per value".to_string(),
                "Reference counting".to_string(),
                "Manual free".to_string(),
            ],
            correct_answer: 1,
            explanation: "Each value has exactly one owner.".to_string(),
        }
    }

    #[test]
    fn accepts_a_valid_question() {
        assert!(valid_question().validate().is_ok());
    }

    #[test]
    fn rejects_wrong_option_count() {
        let mut q = valid_question();
        q.options.pop();
        assert!(q.validate().is_err());
        q.options.extend(["x".to_string(), "y".to_string()]);
        assert!(q.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_correct_answer() {
        let mut q = valid_question();
        q.correct_answer = 4;
        assert!(q.validate().is_err());
        q.correct_answer = -1;
        assert!(q.validate().is_err());
    }

    #[test]
    fn rejects_blank_texts() {
        let mut q = valid_question();
        q.question = "  ".to_string();
        assert!(q.validate().is_err());

        let mut q = valid_question();
        q.options[2] = String::new();
        assert!(q.validate().is_err());

        let mut q = valid_question();
        q.explanation = String::new();
        assert!(q.validate().is_err());
    }
}
