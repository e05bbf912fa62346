pub mod host_form;

use std::path::Path;

use tracing::{debug, info};

use crate::client::{Endpoints, ReportBackend};
use crate::error::ReportError;
use crate::filters::FilterState;

pub use host_form::{locate_username, HostField, LocatedUsername};

/// Download URL for the spreadsheet export. Built from the filters alone,
/// so it does not depend on a previous submit.
pub fn export_url(endpoints: &Endpoints, filters: &FilterState) -> Result<reqwest::Url, ReportError> {
    let url = endpoints.export(&filters.query_pairs())?;
    debug!(url = %url, "export url");
    Ok(url)
}

/// Fetches the export and writes it to `path`. Returns the byte count.
pub async fn download_to<B: ReportBackend>(
    backend: &B,
    filters: &FilterState,
    path: &Path,
) -> Result<usize, ReportError> {
    let url = export_url(backend.endpoints(), filters)?;
    let bytes = backend.fetch_export(&url).await?;
    tokio::fs::write(path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "export saved");
    Ok(bytes.len())
}
