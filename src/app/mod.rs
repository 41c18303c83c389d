use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ArtifactDownloader, ArtifactKind, TranscriptApi};
use crate::form::{FormErrors, FormState};
use crate::loading::{LoadOutcome, LoadingController};
use crate::results::{DownloadReport, ResultsView};
use crate::session::{Page, PageOrchestrator};

pub mod terminal;

/// Something the user did on the current page
#[derive(Debug, Clone)]
pub enum UserAction {
    Start,
    Submit(FormState),
    Retry,
    Back,
    NewSession,
    Download(ArtifactKind),
    DownloadAll,
}

/// What the screen should show after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppUpdate {
    /// Plain page change
    Page(Page),
    /// The form stays open with messages next to the offending fields
    FormRejected(FormErrors),
    /// Loading page switched to its failure view
    Failed { message: String, retry_count: u32 },
    /// Results page with the finished job
    Completed(ResultsView),
    /// Download attempts made from the results page
    Downloads(Vec<DownloadReport>),
    /// The action does not apply to the current page
    Ignored(String),
}

/// The whole flow: pages, the request lifecycle and downloads
pub struct App {
    orchestrator: PageOrchestrator,
    loading: LoadingController,
    downloader: Arc<dyn ArtifactDownloader>,
    download_dir: PathBuf,
}

impl App {
    pub fn new(
        loading: LoadingController,
        downloader: Arc<dyn ArtifactDownloader>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            orchestrator: PageOrchestrator::new(),
            loading,
            downloader,
            download_dir,
        }
    }

    /// Build the flow around one client that both processes and downloads
    pub fn with_client<C>(
        client: Arc<C>,
        display_delay: std::time::Duration,
        download_dir: PathBuf,
    ) -> Self
    where
        C: TranscriptApi + ArtifactDownloader + 'static,
    {
        let loading = LoadingController::new(client.clone(), display_delay);
        Self::new(loading, client, download_dir)
    }

    pub fn orchestrator(&self) -> &PageOrchestrator {
        &self.orchestrator
    }

    pub fn loading(&self) -> &LoadingController {
        &self.loading
    }

    pub fn active_page(&self) -> Page {
        self.orchestrator.active_page()
    }

    pub fn download_dir(&self) -> &std::path::Path {
        &self.download_dir
    }

    /// Show a spinner while the request runs
    pub fn with_indicator(mut self, show_indicator: bool) -> Self {
        self.loading = self.loading.with_indicator(show_indicator);
        self
    }

    /// Apply one user action; errors become updates, nothing escapes
    pub async fn dispatch(&mut self, action: UserAction) -> AppUpdate {
        tracing::debug!("Action {:?} on {} page", action, self.active_page());

        match action {
            UserAction::Start => match self.orchestrator.start() {
                Ok(()) => AppUpdate::Page(self.active_page()),
                Err(e) => AppUpdate::Ignored(e.to_string()),
            },
            UserAction::Submit(form) => self.submit(form).await,
            UserAction::Retry => self.retry().await,
            UserAction::Back => {
                let leaving_loading = self.active_page() == Page::Loading;
                match self.orchestrator.back() {
                    Ok(()) => {
                        if leaving_loading {
                            self.loading.reset();
                        }
                        AppUpdate::Page(self.active_page())
                    }
                    Err(e) => AppUpdate::Ignored(e.to_string()),
                }
            }
            UserAction::NewSession => match self.orchestrator.new_session() {
                Ok(()) => {
                    self.loading.reset();
                    AppUpdate::Page(self.active_page())
                }
                Err(e) => AppUpdate::Ignored(e.to_string()),
            },
            UserAction::Download(kind) => match self.results_view() {
                Some(view) => {
                    let report = view
                        .download(self.downloader.as_ref(), kind, &self.download_dir)
                        .await;
                    AppUpdate::Downloads(vec![report])
                }
                None => AppUpdate::Ignored("There is nothing to download yet".to_string()),
            },
            UserAction::DownloadAll => match self.results_view() {
                Some(view) => AppUpdate::Downloads(
                    view.download_all(self.downloader.as_ref(), &self.download_dir)
                        .await,
                ),
                None => AppUpdate::Ignored("There is nothing to download yet".to_string()),
            },
        }
    }

    /// Results of the finished job, only while the results page is shown
    pub fn results_view(&self) -> Option<ResultsView> {
        if self.active_page() != Page::Results {
            return None;
        }
        self.orchestrator.last_result().map(ResultsView::new)
    }

    async fn submit(&mut self, form: FormState) -> AppUpdate {
        if self.active_page() != Page::Form {
            return AppUpdate::Ignored(format!("Cannot submit from the {} page", self.active_page()));
        }

        let request = match form.submit() {
            Ok(request) => request,
            Err(errors) => return AppUpdate::FormRejected(errors),
        };

        let pending = match self.orchestrator.submit(request) {
            Ok(pending) => pending.clone(),
            Err(e) => return AppUpdate::Ignored(e.to_string()),
        };

        if let Err(e) = self.loading.start(&pending) {
            return AppUpdate::Ignored(e.to_string());
        }

        self.run_loading().await
    }

    async fn retry(&mut self) -> AppUpdate {
        if self.active_page() != Page::Loading {
            return AppUpdate::Ignored(format!("Cannot retry from the {} page", self.active_page()));
        }

        if let Err(e) = self.loading.retry() {
            return AppUpdate::Ignored(e.to_string());
        }
        if let Err(e) = self.orchestrator.record_retry() {
            return AppUpdate::Ignored(e.to_string());
        }

        self.run_loading().await
    }

    async fn run_loading(&mut self) -> AppUpdate {
        match self.loading.drive().await {
            Some(LoadOutcome::Completed(result)) => {
                let view = ResultsView::new(&result);
                match self.orchestrator.complete(result) {
                    Ok(()) => AppUpdate::Completed(view),
                    Err(e) => AppUpdate::Ignored(e.to_string()),
                }
            }
            Some(LoadOutcome::Failed(message)) => {
                if let Err(e) = self.orchestrator.record_failure(message.clone()) {
                    return AppUpdate::Ignored(e.to_string());
                }
                AppUpdate::Failed {
                    message,
                    retry_count: self.orchestrator.retry_count(),
                }
            }
            None => AppUpdate::Page(self.active_page()),
        }
    }
}
