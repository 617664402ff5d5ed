//! Terminal rendering of the client-core view models.

use client_core::presentation::{
    CardSection, FieldContent, HistoryListView, QuestionCard, ResultView, ScreenView, Verdict,
};
use shared::domain::ImageSlot;

/// Pixel height the markup frames assume for one terminal row.
const ROW_HEIGHT: u32 = 24;

pub fn print_screen(view: &ScreenView) {
    match view {
        ScreenView::Upload(upload) => {
            println!("Evaluate Solution");
            for (slot, selected) in [
                (ImageSlot::Question, upload.question_selected),
                (ImageSlot::Answer, upload.answer_selected),
            ] {
                let status = if selected { "selected" } else { "missing" };
                println!("  {:<16} {status}", slot.label());
            }
        }
        ScreenView::Loading { title, subtitle } => println!("{title} {subtitle}"),
        ScreenView::Results(result) => print_result(result),
        ScreenView::Failure(failure) => {
            eprintln!("{}: {}", failure.title, failure.message);
        }
    }
}

fn print_result(view: &ResultView) {
    println!("Evaluation Result ({})", view.evaluation_id);
    println!(
        "  Total Questions: {}   Incorrect: {}",
        view.summary.total_questions, view.summary.incorrect_questions
    );
    println!("{}", view.headline());
    println!("  {}", view.detail());
    if view.verdict == Verdict::AllCorrect {
        return;
    }
    // Terminal output has no taps; show every card opened.
    for card in &view.cards {
        let mut card = card.clone();
        if !card.expanded {
            card.toggle();
        }
        println!();
        for line in card_lines(&mut card) {
            println!("{line}");
        }
    }
}

fn card_lines(card: &mut QuestionCard) -> Vec<String> {
    let mut lines = vec![format!("x {}", card.title)];
    let kinds: Vec<_> = card.sections.iter().map(|section| section.kind).collect();
    for kind in kinds {
        if let Some(section) = card.section(kind) {
            let rows = measure_rows(section);
            card.report_height(kind, rows * ROW_HEIGHT);
        }
        if let Some(section) = card.section(kind) {
            lines.extend(section_lines(section));
        }
    }
    lines
}

fn measure_rows(section: &CardSection) -> u32 {
    let lines = section.content.text().lines().count().max(1);
    u32::try_from(lines).unwrap_or(u32::MAX)
}

/// A terminal scrolls itself, so a capped frame still prints every line;
/// it only gets a border marking where the app would scroll.
fn section_lines(section: &CardSection) -> Vec<String> {
    let mut lines = vec![format!("  {}", section.kind.label())];
    if let Some(lead) = &section.lead {
        lines.push(format!("    {lead}"));
    }
    match (&section.content, section.frame) {
        (FieldContent::Markup(text), Some(frame)) if frame.is_scrollable() => {
            lines.push("    +--".to_string());
            lines.extend(text.lines().map(|line| format!("    | {line}")));
            lines.push("    +--".to_string());
        }
        (FieldContent::Markup(text), _) => {
            lines.extend(text.lines().map(|line| format!("    | {line}")));
        }
        (content, _) => {
            lines.extend(content.text().lines().map(|line| format!("    {line}")));
        }
    }
    lines
}

pub fn print_history(view: &HistoryListView) {
    for line in history_lines(view) {
        println!("{line}");
    }
}

fn history_lines(view: &HistoryListView) -> Vec<String> {
    match view {
        HistoryListView::Loading => vec!["  loading...".to_string()],
        HistoryListView::Empty { title, text } => vec![format!("  {title}"), format!("  {text}")],
        HistoryListView::Failed {
            message,
            action_label,
        } => vec![
            format!("  {message}"),
            format!("  {action_label}: run `evaluator history` again"),
        ],
        HistoryListView::Rows { rows, .. } => rows
            .iter()
            .map(|row| {
                format!(
                    "  {:<28} {:<18} {:<14} {}",
                    row.evaluation_id.as_str(),
                    row.date_label,
                    row.questions_label,
                    row.status_label
                )
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
