use anyhow::Result;
use console::style;

use crate::api::{ArtifactKind, ProcessingResult, ProgressStatus};
use crate::form::{FormErrors, ModelSize};
use crate::languages::SUPPORTED_TARGET_LANGUAGES;
use crate::results::{DownloadReport, ResultsView, TranslationIndicator};

/// Landing screen
pub fn print_cover() {
    println!();
    println!("{}", style("Video Notes").bold().cyan());
    println!("Turn any YouTube video into a transcript, AI notes and a PDF.");
    println!();
}

/// Header of the options form
pub fn print_form_header() {
    println!();
    println!("{}", style("Transform Your Video").bold().cyan());
    println!("Configure your video processing preferences.");
}

pub fn print_model_sizes() {
    for (index, model) in ModelSize::ALL.iter().enumerate() {
        println!(
            "  {}. {:<7} {}",
            index + 1,
            model.label(),
            style(model.description()).dim()
        );
    }
}

pub fn print_languages() {
    for (index, lang) in SUPPORTED_TARGET_LANGUAGES.iter().enumerate() {
        println!("  {}. {} {} ({})", index + 1, lang.flag, lang.label, lang.code);
    }
}

/// Field messages from a rejected form
pub fn print_form_errors(errors: &FormErrors) {
    for message in errors.values() {
        println!("  {} {}", style("✗").red(), style(message).red());
    }
}

/// Failure view of the loading page
pub fn print_failure(message: &str, retry_count: u32) {
    println!();
    println!("{}", style("Processing Failed").bold().red());
    println!("{}", message);
    if retry_count > 0 {
        println!("{}", style(format!("Retried {} time(s)", retry_count)).dim());
    }
}

/// Language flow line, e.g. `English (EN)  → Translated →  French (FR)`
pub fn format_language_flow(view: &ResultsView) -> String {
    let middle = match view.indicator {
        TranslationIndicator::Translated => format!("→ {} →", view.indicator.label()),
        TranslationIndicator::NoTranslationNeeded => format!("✓ {}", view.indicator.label()),
    };

    format!(
        "{} ({})  {}  {} ({})",
        view.detected.name, view.detected.code, middle, view.target.name, view.target.code
    )
}

/// Results page for a finished job
pub fn print_results(view: &ResultsView) {
    println!();
    println!("{}", style("Processing Complete!").bold().green());
    println!("Your video has been successfully processed.");
    println!();
    println!("{}", style("Language Processing").bold());

    let flow = format_language_flow(view);
    match view.indicator {
        TranslationIndicator::Translated => println!("  {}", style(flow).cyan()),
        TranslationIndicator::NoTranslationNeeded => println!("  {}", style(flow).green()),
    }
    println!("  {}", view.summary());
    println!();

    println!("{}", style("Downloads").bold());
    for (index, kind) in ArtifactKind::ALL.iter().enumerate() {
        println!(
            "  {}. {:<13} {}",
            index + 1,
            kind.title(),
            style(kind.file_name(&view.job_id)).dim()
        );
    }
}

pub fn print_download_reports(reports: &[DownloadReport]) {
    for report in reports {
        match &report.outcome {
            Ok(path) => println!(
                "  {} {} saved to {}",
                style("✓").green(),
                report.kind.title(),
                path.display()
            ),
            Err(e) => println!("  {} {}: {}", style("✗").red(), report.kind.title(), e),
        }
    }
}

pub fn print_progress(status: &ProgressStatus) {
    println!("Job: {}", status.video_id);
    println!("Step: {} ({})", status.current_step, status.step_description);
    println!("Progress: {:.0}%", status.progress_percentage);
    println!("Completed: {}", if status.completed { "yes" } else { "no" });
    if let Some(error) = &status.error {
        println!("Error: {}", style(error).red());
    }
}

/// Machine-readable form of a finished job
pub fn format_result_json(result: &ProcessingResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
