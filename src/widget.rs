use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, error, info};

use crate::autocomplete::{UserAutocomplete, DEFAULT_DEBOUNCE};
use crate::client::ReportBackend;
use crate::clipboard::Clipboard;
use crate::error::ReportError;
use crate::export;
use crate::filters::{self, DepartmentOption, FilterState};
use crate::table::{self, Column, PermissionRecord, ResultsTable, SortState};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

impl StatusLine {
    fn set(&mut self, message: impl Into<String>, is_error: bool) {
        self.message = message.into();
        self.is_error = is_error;
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error {
            write!(f, "{}", self.message.red())
        } else {
            write!(f, "{}", self.message)
        }
    }
}

#[derive(Clone, Debug)]
pub struct WidgetOptions {
    pub filters: FilterState,
    pub debounce: Duration,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            filters: FilterState::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// The permissions report: filter controls, username autocomplete, the
/// results table and the export trigger over one backend.
pub struct ReportWidget<B> {
    backend: Arc<B>,
    pub filters: FilterState,
    departments: Vec<DepartmentOption>,
    autocomplete: UserAutocomplete<B>,
    table: ResultsTable,
    status: StatusLine,
    export_visible: bool,
}

impl<B: ReportBackend> ReportWidget<B> {
    pub fn new(backend: Arc<B>, opts: WidgetOptions) -> Self {
        let autocomplete = UserAutocomplete::new(Arc::clone(&backend), opts.debounce);
        Self {
            backend,
            filters: opts.filters,
            departments: Vec::new(),
            autocomplete,
            table: ResultsTable::default(),
            status: StatusLine::default(),
            export_visible: false,
        }
    }

    /// Fills the department options. A failure only sets the status line.
    pub async fn load_departments(&mut self) -> Result<&[DepartmentOption], ReportError> {
        match self.backend.list_sites().await {
            Ok(sites) => {
                debug!(count = sites.len(), "sites loaded");
                self.departments = filters::department_options(sites);
                Ok(&self.departments)
            }
            Err(e) => {
                error!(error = %e, "failed to fetch sites");
                let message = match &e {
                    ReportError::Network {
                        status: Some(code), ..
                    } => format!("Failed to load sites ({code})"),
                    _ => "Failed to load sites.".to_string(),
                };
                self.status.set(message, true);
                Err(e)
            }
        }
    }

    pub fn departments(&self) -> &[DepartmentOption] {
        &self.departments
    }

    pub fn type_username(&mut self, text: &str) {
        self.filters.username = text.to_string();
        self.autocomplete.on_input(text);
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.autocomplete.suggestions()
    }

    pub async fn settle_suggestions(&mut self) {
        self.autocomplete.settle().await;
    }

    pub fn suggestions_pending(&self) -> bool {
        self.autocomplete.is_pending()
    }

    pub fn select_suggestion(&mut self, index: usize) -> Option<String> {
        let chosen = self.autocomplete.select(index)?;
        self.filters.username = chosen.clone();
        Some(chosen)
    }

    /// Fetches the report for the current filters and replaces the table.
    /// Returns the number of rows loaded.
    pub async fn submit(&mut self) -> Result<usize, ReportError> {
        self.status.set("Loading...", false);
        self.export_visible = false;

        let query = self.filters.query_pairs();
        let parsed = match self.backend.fetch_permissions(&query).await {
            Ok(body) => table::parse_response(&body),
            Err(e) => Err(e),
        };
        let response = match parsed {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "permissions request failed");
                let message = match &e {
                    ReportError::UnexpectedShape => e.to_string(),
                    _ => format!("Request failed: {e}"),
                };
                self.status.set(message, true);
                return Err(e);
            }
        };

        self.table.replace(response);
        let rows = self.table.records().len();
        self.export_visible = rows > 0;
        info!(rows, "permissions loaded");
        self.status
            .set(format!("Loaded {rows} permission rows."), false);
        Ok(rows)
    }

    pub fn sort_by(&mut self, column: Column) -> SortState {
        self.table.sort_by(column)
    }

    pub fn render(&self) -> String {
        self.table.render()
    }

    pub fn table(&self) -> &ResultsTable {
        &self.table
    }

    /// Copies the row's node reference. Best effort: clipboard errors are
    /// dropped and rows without a reference do nothing.
    pub fn activate_row(&self, row: usize, clipboard: &mut impl Clipboard) -> Option<String> {
        let node_ref = self.table.node_ref(row)?;
        if let Err(e) = clipboard.write_text(node_ref) {
            debug!(error = %e, "clipboard write ignored");
        }
        Some(node_ref.to_string())
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn export_visible(&self) -> bool {
        self.export_visible
    }

    /// The rows a local export writes: the same set the table shows.
    pub fn export_records(&self) -> Option<&[PermissionRecord]> {
        self.export_visible.then(|| self.table.records())
    }

    pub fn download_url(&self) -> Result<reqwest::Url, ReportError> {
        export::export_url(self.backend.endpoints(), &self.filters)
    }

    pub async fn download(&mut self, path: &Path) -> Result<usize, ReportError> {
        match export::download_to(self.backend.as_ref(), &self.filters, path).await {
            Ok(n) => Ok(n),
            Err(e) => {
                error!(error = %e, "download failed");
                self.status.set("Failed to start download.", true);
                Err(e)
            }
        }
    }
}
