//! View models for the evaluation and history screens.
//!
//! Nothing here talks to the network. Math markup is rendered by an
//! external surface which reports its measured height back through
//! [`QuestionCard::report_height`].

use chrono::{DateTime, Utc};
use shared::domain::{
    EvaluationId, EvaluationResult, EvaluationSummary, HistoryItem, IncorrectQuestion, QuestionId,
};

use crate::{
    history::HistorySnapshot,
    session::{SessionSnapshot, SessionState},
};

pub const MARKUP_MAX_HEIGHT: u32 = 300;
const MARKUP_MEASURE_PADDING: u32 = 20;

/// Text routed either to plain rendering or to the math-markup renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContent {
    Plain(String),
    Markup(String),
}

impl FieldContent {
    pub fn classify(text: &str) -> Self {
        if text.contains(['$', '\\']) {
            FieldContent::Markup(text.to_string())
        } else {
            FieldContent::Plain(text.to_string())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            FieldContent::Plain(text) | FieldContent::Markup(text) => text,
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, FieldContent::Markup(_))
    }
}

/// Host-side box for one markup field. Grows to the measured height,
/// capped at [`MARKUP_MAX_HEIGHT`], past which the content scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupFrame {
    pub min_height: u32,
    pub height: u32,
}

impl MarkupFrame {
    pub fn new(min_height: u32) -> Self {
        Self {
            min_height,
            height: min_height,
        }
    }

    /// Returns whether the frame changed size.
    pub fn report_height(&mut self, measured: u32) -> bool {
        if measured <= self.min_height {
            return false;
        }
        let height = measured
            .saturating_add(MARKUP_MEASURE_PADDING)
            .min(MARKUP_MAX_HEIGHT);
        let changed = height != self.height;
        self.height = height;
        changed
    }

    pub fn is_scrollable(&self) -> bool {
        self.height >= MARKUP_MAX_HEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Question,
    WhatWentWrong,
    CorrectSolution,
    FinalAnswer,
}

impl SectionKind {
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Question => "QUESTION",
            SectionKind::WhatWentWrong => "WHAT WENT WRONG",
            SectionKind::CorrectSolution => "CORRECT SOLUTION",
            SectionKind::FinalAnswer => "Final Answer",
        }
    }

    fn min_height(self) -> u32 {
        match self {
            SectionKind::Question | SectionKind::WhatWentWrong => 50,
            SectionKind::CorrectSolution => 60,
            SectionKind::FinalAnswer => 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSection {
    pub kind: SectionKind,
    /// Plain line shown above the content (the error summary).
    pub lead: Option<String>,
    pub content: FieldContent,
    /// Present only for markup content.
    pub frame: Option<MarkupFrame>,
}

impl CardSection {
    fn new(kind: SectionKind, lead: Option<&str>, text: &str) -> Self {
        let content = FieldContent::classify(text);
        let frame = content
            .is_markup()
            .then(|| MarkupFrame::new(kind.min_height()));
        Self {
            kind,
            lead: lead.map(str::to_string),
            content,
            frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCard {
    pub question_id: QuestionId,
    pub title: String,
    pub error_summary: String,
    pub expanded: bool,
    pub sections: Vec<CardSection>,
}

impl QuestionCard {
    pub fn new(question: &IncorrectQuestion, expanded: bool) -> Self {
        let sections = vec![
            CardSection::new(SectionKind::Question, None, &question.question),
            CardSection::new(
                SectionKind::WhatWentWrong,
                Some(&question.error_summary),
                &question.error_explanation,
            ),
            CardSection::new(SectionKind::CorrectSolution, None, &question.correct_solution),
            CardSection::new(SectionKind::FinalAnswer, None, &question.final_answer),
        ];
        Self {
            question_id: question.question_id.clone(),
            title: card_title(question),
            error_summary: question.error_summary.clone(),
            expanded,
            sections,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    /// One-line summary shown on the collapsed header.
    pub fn preview(&self) -> Option<&str> {
        (!self.expanded).then_some(self.error_summary.as_str())
    }

    pub fn section(&self, kind: SectionKind) -> Option<&CardSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    /// Feeds a height measured by the markup renderer into the section's
    /// frame. Plain sections ignore it.
    pub fn report_height(&mut self, kind: SectionKind, measured: u32) -> bool {
        self.sections
            .iter_mut()
            .find(|section| section.kind == kind)
            .and_then(|section| section.frame.as_mut())
            .is_some_and(|frame| frame.report_height(measured))
    }
}

fn card_title(question: &IncorrectQuestion) -> String {
    if let Some(number) = question
        .question_number
        .as_deref()
        .filter(|label| !label.trim().is_empty())
    {
        return number.to_string();
    }
    let digits: String = question
        .question_id
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        "Question ?".to_string()
    } else {
        format!("Question {digits}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    AllCorrect,
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub evaluation_id: EvaluationId,
    pub summary: EvaluationSummary,
    pub verdict: Verdict,
    pub cards: Vec<QuestionCard>,
}

impl ResultView {
    /// Cards keep server order. A lone card starts expanded, otherwise all
    /// start collapsed.
    pub fn new(result: &EvaluationResult) -> Self {
        let auto_expand = result.incorrect_questions.len() == 1;
        let cards = result
            .incorrect_questions
            .iter()
            .map(|question| QuestionCard::new(question, auto_expand))
            .collect();
        let verdict = if result.is_all_correct() {
            Verdict::AllCorrect
        } else {
            Verdict::NeedsReview
        };
        Self {
            evaluation_id: result.evaluation_id.clone(),
            summary: result.summary,
            verdict,
            cards,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.verdict {
            Verdict::AllCorrect => "Perfect Solution!",
            Verdict::NeedsReview => "Questions to Review",
        }
    }

    pub fn detail(&self) -> String {
        match self.verdict {
            Verdict::AllCorrect => format!(
                "All {} questions answered correctly",
                self.summary.total_questions
            ),
            Verdict::NeedsReview => "Tap to expand details".to_string(),
        }
    }

    /// Returns false when no card carries `question_id`.
    pub fn toggle(&mut self, question_id: &QuestionId) -> bool {
        match self
            .cards
            .iter_mut()
            .find(|card| &card.question_id == question_id)
        {
            Some(card) => {
                card.toggle();
                true
            }
            None => false,
        }
    }

    pub fn expanded_count(&self) -> usize {
        self.cards.iter().filter(|card| card.expanded).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub question_selected: bool,
    pub answer_selected: bool,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureView {
    pub title: &'static str,
    pub message: String,
    /// Performs `reset()`.
    pub action_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    Upload(UploadView),
    Loading {
        title: &'static str,
        subtitle: &'static str,
    },
    Results(ResultView),
    Failure(FailureView),
}

impl ScreenView {
    pub fn from_session(snapshot: &SessionSnapshot) -> Self {
        match &snapshot.state {
            SessionState::Idle => ScreenView::Upload(UploadView {
                question_selected: snapshot.question_image.is_some(),
                answer_selected: snapshot.answer_image.is_some(),
                can_submit: snapshot.can_submit(),
            }),
            SessionState::Loading => ScreenView::Loading {
                title: "Evaluating your solution...",
                subtitle: "This may take a few seconds",
            },
            SessionState::Success(result) | SessionState::HasErrors(result) => {
                ScreenView::Results(ResultView::new(result))
            }
            SessionState::Error(message) => ScreenView::Failure(FailureView {
                title: "Evaluation Failed",
                message: message.clone(),
                action_label: "Try Again",
            }),
        }
    }
}

/// Where a history list is shown. The two screens label dates differently
/// and only the full screen surfaces load failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScreen {
    /// Short list under the upload form.
    Recent,
    /// Dedicated history screen.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub evaluation_id: EvaluationId,
    pub date_label: String,
    pub questions_label: String,
    pub all_correct: bool,
    pub status_label: String,
}

impl HistoryRow {
    pub fn new(item: &HistoryItem, now: DateTime<Utc>, screen: HistoryScreen) -> Self {
        let status_label = match item.incorrect_count {
            0 => "All Correct".to_string(),
            1 => "1 Error".to_string(),
            n => format!("{n} Errors"),
        };
        let date_label = match screen {
            HistoryScreen::Recent => relative_date_label(item.created_at, now),
            HistoryScreen::Full => long_date_label(item.created_at, now),
        };
        Self {
            evaluation_id: item.evaluation_id.clone(),
            date_label,
            questions_label: format!("{} Questions", item.total_questions),
            all_correct: item.is_all_correct(),
            status_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryListView {
    /// No load has finished yet, or the first one is still running.
    Loading,
    Empty {
        title: &'static str,
        text: &'static str,
    },
    /// Full screen only: nothing to show and the last load failed.
    Failed {
        message: String,
        action_label: &'static str,
    },
    Rows {
        rows: Vec<HistoryRow>,
        refreshing: bool,
    },
}

impl HistoryListView {
    pub fn new(snapshot: &HistorySnapshot, now: DateTime<Utc>, screen: HistoryScreen) -> Self {
        if !snapshot.items.is_empty() {
            return HistoryListView::Rows {
                rows: snapshot
                    .items
                    .iter()
                    .map(|item| HistoryRow::new(item, now, screen))
                    .collect(),
                refreshing: snapshot.refreshing,
            };
        }
        if snapshot.loading || !snapshot.loaded_once {
            return HistoryListView::Loading;
        }
        match (&snapshot.last_error, screen) {
            (Some(message), HistoryScreen::Full) if !snapshot.refreshing => {
                HistoryListView::Failed {
                    message: message.clone(),
                    action_label: "Retry",
                }
            }
            _ => HistoryListView::Empty {
                title: "No History Yet",
                text: "Your evaluation history will appear here",
            },
        }
    }

    pub fn recent(snapshot: &HistorySnapshot, now: DateTime<Utc>) -> Self {
        Self::new(snapshot, now, HistoryScreen::Recent)
    }

    pub fn full(snapshot: &HistorySnapshot, now: DateTime<Utc>) -> Self {
        Self::new(snapshot, now, HistoryScreen::Full)
    }
}

/// Compact label used under the upload form: `5m ago`, `3h ago`, `2d ago`.
pub fn relative_date_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match elapsed_bucket(created_at, now) {
        Elapsed::JustNow => "Just now".to_string(),
        Elapsed::Minutes(n) => format!("{n}m ago"),
        Elapsed::Hours(n) => format!("{n}h ago"),
        Elapsed::Days(n) => format!("{n}d ago"),
        Elapsed::Older => created_at.format("%b %-d, %Y").to_string(),
    }
}

/// Label used on the history screen: `5 min ago`, `1 hour ago`, and a
/// date with time once older than a week.
pub fn long_date_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let plural = |n: i64| if n > 1 { "s" } else { "" };
    match elapsed_bucket(created_at, now) {
        Elapsed::JustNow => "Just now".to_string(),
        Elapsed::Minutes(n) => format!("{n} min ago"),
        Elapsed::Hours(n) => format!("{n} hour{} ago", plural(n)),
        Elapsed::Days(n) => format!("{n} day{} ago", plural(n)),
        Elapsed::Older => created_at.format("%b %-d, %I:%M %p").to_string(),
    }
}

enum Elapsed {
    JustNow,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Older,
}

fn elapsed_bucket(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Elapsed {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return Elapsed::JustNow;
    }
    if minutes < 60 {
        return Elapsed::Minutes(minutes);
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return Elapsed::Hours(hours);
    }
    let days = elapsed.num_days();
    if days < 7 {
        return Elapsed::Days(days);
    }
    Elapsed::Older
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
