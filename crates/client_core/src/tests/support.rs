//! Scripted stand-in for the evaluation service shared by the unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::domain::{
    EvaluationId, EvaluationResult, EvaluationSummary, HistoryItem, IncorrectQuestion, QuestionId,
};

use crate::{api::EvaluationApi, error::EvaluationError};

pub(crate) struct ScriptedApi {
    submit_result: Result<EvaluationResult, EvaluationError>,
    /// Consumed front to back; the last entry repeats.
    history_results: Mutex<Vec<Result<Vec<HistoryItem>, EvaluationError>>>,
    fetch_result: Result<EvaluationResult, EvaluationError>,
    fetch_delay: Option<Duration>,
    pub submit_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub history_limits: Mutex<Vec<usize>>,
    pub submitted_images: Mutex<Vec<(String, String)>>,
}

impl ScriptedApi {
    pub fn ok() -> Self {
        Self {
            submit_result: Ok(sample_result("ev-new", 0)),
            history_results: Mutex::new(vec![Ok(sample_history(&["ev-2", "ev-1"]))]),
            fetch_result: Ok(sample_result("ev-old", 0)),
            fetch_delay: None,
            submit_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            history_limits: Mutex::new(Vec::new()),
            submitted_images: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit(mut self, result: Result<EvaluationResult, EvaluationError>) -> Self {
        self.submit_result = result;
        self
    }

    pub fn with_history(self, result: Result<Vec<HistoryItem>, EvaluationError>) -> Self {
        self.with_history_sequence(vec![result])
    }

    pub fn with_history_sequence(
        mut self,
        results: Vec<Result<Vec<HistoryItem>, EvaluationError>>,
    ) -> Self {
        assert!(!results.is_empty(), "history script needs at least one entry");
        self.history_results = Mutex::new(results);
        self
    }

    pub fn with_fetch(mut self, result: Result<EvaluationResult, EvaluationError>) -> Self {
        self.fetch_result = result;
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn history_count(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn into_shared(self) -> (Arc<Self>, Arc<dyn EvaluationApi>) {
        let api = Arc::new(self);
        let dyn_api: Arc<dyn EvaluationApi> = api.clone();
        (api, dyn_api)
    }
}

#[async_trait]
impl EvaluationApi for ScriptedApi {
    async fn submit(
        &self,
        question_image_b64: &str,
        answer_image_b64: &str,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_images
            .lock()
            .expect("images lock")
            .push((question_image_b64.to_string(), answer_image_b64.to_string()));
        self.submit_result.clone()
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryItem>, EvaluationError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history_limits.lock().expect("limits lock").push(limit);
        let mut results = self.history_results.lock().expect("history lock");
        if results.len() > 1 {
            results.remove(0)
        } else {
            results[0].clone()
        }
    }

    async fn fetch_by_id(
        &self,
        _evaluation_id: &EvaluationId,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.fetch_result.clone()
    }
}

pub(crate) fn sample_question(n: usize) -> IncorrectQuestion {
    IncorrectQuestion {
        question_id: QuestionId(format!("tab_{n}")),
        question: format!("Evaluate $\\int_0^{n} x\\,dx$"),
        error_summary: "Wrong antiderivative".to_string(),
        error_explanation: "The power rule was applied to the limits".to_string(),
        correct_solution: format!("$\\frac{{x^2}}{{2}}\\Big|_0^{n}$"),
        final_answer: format!("{}", n * n / 2),
        question_number: None,
    }
}

pub(crate) fn sample_result(id: &str, incorrect: usize) -> EvaluationResult {
    let incorrect_questions: Vec<IncorrectQuestion> = (1..=incorrect).map(sample_question).collect();
    EvaluationResult {
        evaluation_id: EvaluationId::from(id),
        summary: EvaluationSummary {
            total_questions: 5,
            incorrect_questions: incorrect as u32,
        },
        incorrect_questions,
    }
}

pub(crate) fn sample_history(ids: &[&str]) -> Vec<HistoryItem> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| HistoryItem {
            evaluation_id: EvaluationId::from(*id),
            created_at: Utc
                .with_ymd_and_hms(2025, 3, 10 - index as u32, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            total_questions: 4,
            incorrect_count: index as u32,
        })
        .collect()
}
