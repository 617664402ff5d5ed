//! Lifecycle of one evaluation attempt: image selection, submission,
//! result display and reset, plus back-navigation handling while results
//! are on screen.
//!
//! Responses are applied in arrival order. A slow `load_from_history` can
//! overwrite a newer `submit` result, and a response that lands after
//! `reset()` still shows up.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{EvaluationId, EvaluationResult, ImageSlot, PickedImage};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    api::EvaluationApi,
    config::RECENT_HISTORY_LIMIT,
    error::EvaluationError,
    history::HistoryController,
    store::{HistoryStore, NoopHistoryStore},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing submitted yet. "Ready" is `Idle` with both slots filled.
    #[default]
    Idle,
    Loading,
    /// Result without incorrect questions.
    Success(EvaluationResult),
    /// Result with at least one incorrect question.
    HasErrors(EvaluationResult),
    Error(String),
}

impl SessionState {
    fn from_result(result: EvaluationResult) -> Self {
        if result.is_all_correct() {
            SessionState::Success(result)
        } else {
            SessionState::HasErrors(result)
        }
    }

    pub fn is_showing_results(&self) -> bool {
        matches!(self, SessionState::Success(_) | SessionState::HasErrors(_))
    }

    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            SessionState::Success(result) | SessionState::HasErrors(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }

    fn accepts_images(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Error(_))
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Success(_) => "success",
            SessionState::HasErrors(_) => "has_errors",
            SessionState::Error(_) => "error",
        }
    }
}

/// Where a back request came from. Both sources are handled identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTrigger {
    /// Swipe gesture or the navigation stack's own back action.
    Gesture,
    HardwareKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackDisposition {
    /// The session reset itself; the host must not leave the screen.
    Consumed,
    /// The host should perform its normal back navigation.
    Propagate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub question_image: Option<PickedImage>,
    pub answer_image: Option<PickedImage>,
}

impl SessionSnapshot {
    pub fn image(&self, slot: ImageSlot) -> Option<&PickedImage> {
        match slot {
            ImageSlot::Question => self.question_image.as_ref(),
            ImageSlot::Answer => self.answer_image.as_ref(),
        }
    }

    /// Both slots hold image data and nothing is in flight.
    pub fn can_submit(&self) -> bool {
        self.state != SessionState::Loading
            && encoded(&self.question_image).is_some()
            && encoded(&self.answer_image).is_some()
    }
}

pub struct EvaluationSession {
    api: Arc<dyn EvaluationApi>,
    history: HistoryController,
    store: Arc<dyn HistoryStore>,
    recent_history_limit: usize,
    inner: Mutex<SessionSnapshot>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl EvaluationSession {
    pub fn new(api: Arc<dyn EvaluationApi>, history: HistoryController) -> Self {
        Self::new_with_dependencies(api, history, Arc::new(NoopHistoryStore), RECENT_HISTORY_LIMIT)
    }

    pub fn new_with_dependencies(
        api: Arc<dyn EvaluationApi>,
        history: HistoryController,
        store: Arc<dyn HistoryStore>,
        recent_history_limit: usize,
    ) -> Self {
        Self {
            api,
            history,
            store,
            recent_history_limit,
            inner: Mutex::new(SessionSnapshot::default()),
            background: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn history(&self) -> &HistoryController {
        &self.history
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn can_submit(&self) -> bool {
        self.lock().can_submit()
    }

    /// Stores an image for `slot`. Selection is only possible before a
    /// submission or after a failure; returns whether the image was taken.
    pub fn select_image(&self, slot: ImageSlot, image: PickedImage) -> bool {
        let mut inner = self.lock();
        if !inner.state.accepts_images() {
            debug!(?slot, state = inner.state.name(), "ignoring image selection");
            return false;
        }
        debug!(?slot, uri = %image.uri, "image selected");
        match slot {
            ImageSlot::Question => inner.question_image = Some(image),
            ImageSlot::Answer => inner.answer_image = Some(image),
        }
        true
    }

    pub async fn submit(&self) {
        let images = {
            let mut inner = self.lock();
            let question = encoded(&inner.question_image);
            let answer = encoded(&inner.answer_image);
            let images = question.zip(answer);
            if images.is_some() {
                inner.state = SessionState::Loading;
            }
            images
        };
        let Some((question, answer)) = images else {
            self.fail(EvaluationError::missing_images());
            return;
        };

        match self.api.submit(&question, &answer).await {
            Ok(result) => {
                self.show(result.clone());
                self.spawn_history_refresh();
                if let Err(err) = self.store.save(&result).await {
                    warn!(
                        evaluation_id = %result.evaluation_id,
                        error = %err,
                        "failed to save evaluation locally"
                    );
                }
            }
            Err(err) => self.fail(err),
        }
    }

    /// Re-opens a past evaluation. No history refresh follows, nothing new
    /// was created.
    pub async fn load_from_history(&self, evaluation_id: &EvaluationId) {
        self.lock().state = SessionState::Loading;

        match self.api.fetch_by_id(evaluation_id).await {
            Ok(result) => self.show(result),
            Err(err) => self.fail(err),
        }
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        debug!(from = inner.state.name(), "session reset");
        *inner = SessionSnapshot::default();
    }

    /// While results are showing, back means "start over": the session
    /// resets and the event is consumed. Otherwise it propagates untouched.
    pub fn handle_back(&self, trigger: BackTrigger) -> BackDisposition {
        let mut inner = self.lock();
        if !inner.state.is_showing_results() {
            return BackDisposition::Propagate;
        }
        info!(?trigger, "back navigation intercepted; resetting session");
        *inner = SessionSnapshot::default();
        BackDisposition::Consumed
    }

    /// Waits for fire-and-forget history refreshes started by `submit`.
    pub async fn settle(&self) {
        let pending: Vec<JoinHandle<()>> = {
            let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
            background.drain(..).collect()
        };
        for handle in pending {
            if let Err(err) = handle.await {
                warn!(error = %err, "history refresh task did not complete");
            }
        }
    }

    fn show(&self, result: EvaluationResult) {
        info!(
            evaluation_id = %result.evaluation_id,
            total = result.summary.total_questions,
            incorrect = result.summary.incorrect_questions,
            "evaluation ready"
        );
        self.lock().state = SessionState::from_result(result);
    }

    fn fail(&self, err: EvaluationError) {
        error!(error = %err, "evaluation failed");
        self.lock().state = SessionState::Error(err.user_message());
    }

    fn spawn_history_refresh(&self) {
        let history = self.history.clone();
        let limit = self.recent_history_limit;
        let handle = tokio::spawn(async move {
            history.refresh(limit).await;
        });
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        background.retain(|handle| !handle.is_finished());
        background.push(handle);
    }
}

fn encoded(image: &Option<PickedImage>) -> Option<String> {
    image
        .as_ref()
        .and_then(PickedImage::encoded)
        .map(str::to_string)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
