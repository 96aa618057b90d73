//! Quiz submission grading
//!
//! Submissions arrive as raw form fields `q_0..q_n`, one per question, each
//! carrying the selected option index. A missing field counts as a wrong
//! answer; a present but unparsable value fails the whole submission.

use std::collections::HashMap;
use thiserror::Error;

use crate::content::catalog::ContentSection;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("unparsable answer {value:?} for question {index}")]
    InvalidAnswer { index: usize, value: String },
}

/// Grade a submission against a section's questions. Returns the number of
/// questions answered with exactly the correct option index.
pub fn grade(
    section: &ContentSection,
    answers: &HashMap<String, String>,
) -> Result<u32, QuizError> {
    let mut score = 0;
    for (index, question) in section.questions.iter().enumerate() {
        let Some(raw) = answers.get(&format!("q_{index}")) else {
            continue;
        };
        let picked: i64 = raw
            .trim()
            .parse()
            .map_err(|_| QuizError::InvalidAnswer {
                index,
                value: raw.clone(),
            })?;
        if picked == question.correct_index as i64 {
            score += 1;
        }
    }
    Ok(score)
}
