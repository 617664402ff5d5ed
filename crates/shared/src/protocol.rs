use serde::{Deserialize, Serialize};

use crate::domain::{
    EvaluationId, EvaluationResult, EvaluationSummary, HistoryItem, IncorrectQuestion, QuestionId,
};

/// `POST /api/evaluate` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub question_image: String,
    pub answer_image: String,
}

/// Evaluation payload as the service sends it, both from `POST
/// /api/evaluate` and `GET /api/evaluations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationPayload {
    pub evaluation_id: EvaluationId,
    pub total_questions: u32,
    pub incorrect_count: u32,
    #[serde(default)]
    pub tabs: Vec<EvaluationTab>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTab {
    pub tab_id: String,
    pub question: String,
    pub error_summary: String,
    pub error_explanation: String,
    pub correct_solution: String,
    pub final_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<EvaluationTab> for IncorrectQuestion {
    fn from(tab: EvaluationTab) -> Self {
        Self {
            question_id: QuestionId(tab.tab_id),
            question: tab.question,
            error_summary: tab.error_summary,
            error_explanation: tab.error_explanation,
            correct_solution: tab.correct_solution,
            final_answer: tab.final_answer,
            question_number: tab.title.filter(|title| !title.trim().is_empty()),
        }
    }
}

impl EvaluationPayload {
    /// True when the advertised `incorrect_count` disagrees with the tabs.
    pub fn has_count_mismatch(&self) -> bool {
        self.incorrect_count as usize != self.tabs.len()
    }

    /// Maps the payload into the client model. The incorrect count is taken
    /// from the tabs so that it always matches the question list.
    pub fn into_result(self) -> EvaluationResult {
        let incorrect_questions: Vec<IncorrectQuestion> =
            self.tabs.into_iter().map(IncorrectQuestion::from).collect();
        let incorrect = incorrect_questions.len() as u32;
        EvaluationResult {
            evaluation_id: self.evaluation_id,
            summary: EvaluationSummary {
                total_questions: self.total_questions.max(incorrect),
                incorrect_questions: incorrect,
            },
            incorrect_questions,
        }
    }
}

/// `GET /api/evaluations?limit=<n>` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub evaluations: Vec<HistoryItem>,
}
