use anyhow::Result;
use console::{style, Term};

use super::{App, AppUpdate, UserAction};
use crate::api::ArtifactKind;
use crate::form::{FormState, ModelSize};
use crate::languages::SUPPORTED_TARGET_LANGUAGES;
use crate::output;
use crate::session::Page;

/// Source of user input lines
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<String>;
}

impl Prompt for Term {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.write_str(&format!("{} ", style(question).bold()))?;
        Ok(self.read_line()?.trim().to_string())
    }
}

/// Defaults preselected in the form
#[derive(Debug, Clone)]
pub struct FormDefaults {
    pub model_size: ModelSize,
    pub target_language: String,
}

fn is_quit(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "q" | "quit" | "exit")
}

fn parse_model_size(answer: &str, default: ModelSize) -> Option<ModelSize> {
    if answer.is_empty() {
        return Some(default);
    }
    if let Ok(index) = answer.parse::<usize>() {
        return ModelSize::ALL.get(index.checked_sub(1)?).copied();
    }
    answer.parse().ok()
}

fn parse_language(answer: &str, default: &str) -> String {
    if answer.is_empty() {
        return default.to_string();
    }
    answer
        .parse::<usize>()
        .ok()
        .and_then(|index| SUPPORTED_TARGET_LANGUAGES.get(index.checked_sub(1)?))
        .map(|lang| lang.code.to_string())
        .unwrap_or_else(|| answer.to_lowercase())
}

fn parse_download(answer: &str) -> Option<UserAction> {
    match answer.to_lowercase().as_str() {
        "a" | "all" => Some(UserAction::DownloadAll),
        "1" | "transcript" => Some(UserAction::Download(ArtifactKind::Transcript)),
        "2" | "notes" => Some(UserAction::Download(ArtifactKind::Notes)),
        "3" | "pdf" => Some(UserAction::Download(ArtifactKind::Pdf)),
        _ => None,
    }
}

enum Step {
    Act(UserAction),
    Stay,
    Quit,
}

/// Ask for the form fields, or pick up a back/quit answer to the URL question
fn fill_form(prompt: &mut dyn Prompt, defaults: &FormDefaults) -> Result<Step> {
    output::print_form_header();

    let url = prompt.ask("YouTube video URL (b = back, q = quit):")?;
    if is_quit(&url) {
        return Ok(Step::Quit);
    }
    if url.eq_ignore_ascii_case("b") {
        return Ok(Step::Act(UserAction::Back));
    }

    output::print_model_sizes();
    let model_size = loop {
        let answer = prompt.ask(&format!("Model size [{}]:", defaults.model_size))?;
        match parse_model_size(&answer, defaults.model_size) {
            Some(model_size) => break model_size,
            None => println!("  {}", style("Choose 1-4 or small/base/medium/large").red()),
        }
    };

    output::print_languages();
    let answer = prompt.ask(&format!("Target language [{}]:", defaults.target_language))?;
    let target_language = parse_language(&answer, &defaults.target_language);

    let mut form = FormState::with_defaults(model_size, target_language);
    form.set_source_url(url);
    Ok(Step::Act(UserAction::Submit(form)))
}

fn next_step(app: &App, prompt: &mut dyn Prompt, defaults: &FormDefaults) -> Result<Step> {
    match app.active_page() {
        Page::Cover => {
            output::print_cover();
            let answer = prompt.ask("Press Enter to get started (q = quit):")?;
            if is_quit(&answer) {
                Ok(Step::Quit)
            } else {
                Ok(Step::Act(UserAction::Start))
            }
        }
        Page::Form => fill_form(prompt, defaults),
        Page::Loading => {
            let Some(message) = app.orchestrator().last_error() else {
                return Ok(Step::Act(UserAction::Back));
            };
            output::print_failure(message, app.orchestrator().retry_count());

            let answer = prompt.ask("[r]etry, [b]ack to the form, [q]uit:")?;
            match answer.to_lowercase().as_str() {
                "r" | "retry" => Ok(Step::Act(UserAction::Retry)),
                "b" | "back" => Ok(Step::Act(UserAction::Back)),
                a if is_quit(a) => Ok(Step::Quit),
                _ => Ok(Step::Stay),
            }
        }
        Page::Results => {
            let answer = prompt.ask(
                "Download [1-3] or [a]ll, [b]ack to the form, [n]ew video, [q]uit:",
            )?;
            if is_quit(&answer) {
                return Ok(Step::Quit);
            }
            match answer.to_lowercase().as_str() {
                "b" | "back" => Ok(Step::Act(UserAction::Back)),
                "n" | "new" => Ok(Step::Act(UserAction::NewSession)),
                other => Ok(parse_download(other).map(Step::Act).unwrap_or(Step::Stay)),
            }
        }
    }
}

fn show(update: &AppUpdate) {
    match update {
        AppUpdate::FormRejected(errors) => output::print_form_errors(errors),
        AppUpdate::Completed(view) => output::print_results(view),
        AppUpdate::Downloads(reports) => output::print_download_reports(reports),
        AppUpdate::Ignored(message) => println!("{}", style(message).dim()),
        // The failure view is drawn from session state on the next prompt
        AppUpdate::Failed { .. } | AppUpdate::Page(_) => {}
    }
}

/// Walk the user through cover, form, loading and results until they quit
pub async fn run(app: &mut App, prompt: &mut dyn Prompt, defaults: &FormDefaults) -> Result<()> {
    loop {
        let action = match next_step(app, prompt, defaults)? {
            Step::Act(action) => action,
            Step::Stay => continue,
            Step::Quit => break,
        };

        let update = app.dispatch(action).await;
        show(&update);
    }

    println!("Goodbye!");
    Ok(())
}
