use crate::error::ReportError;
use crate::utils;

pub const SITES_PATH: &str = "alfresco/service/api/sites";
pub const PEOPLE_PATH: &str = "alfresco/service/api/people";
pub const PERMISSIONS_PATH: &str = "alfresco/service/alfresco/tutorials/direct-permissions";
pub const EXPORT_PATH: &str = "alfresco/service/alfresco/tutorials/direct-permissions-xlsx";

/// Endpoint URLs derived from the page the report is served from.
///
/// The sites and permissions endpoints hang off the base URL (page URL cut
/// at the last `share/`), while people search and the export download use
/// the plain page origin. The two roots differ when Share is mounted below
/// a path prefix.
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: String,
    origin: String,
}

impl Endpoints {
    pub fn from_page_url(page_url: &reqwest::Url) -> Self {
        Self {
            base: utils::derive_base_url(page_url),
            origin: utils::origin_of(page_url),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn sites(&self) -> Result<reqwest::Url, ReportError> {
        parse(&format!("{}{SITES_PATH}", self.base))
    }

    pub fn people(&self, filter: &str) -> Result<reqwest::Url, ReportError> {
        let mut url = parse(&format!("{}/{PEOPLE_PATH}", self.origin))?;
        url.query_pairs_mut().append_pair("filter", filter);
        Ok(url)
    }

    pub fn permissions(&self, query: &[(&str, String)]) -> Result<reqwest::Url, ReportError> {
        with_query(&format!("{}{PERMISSIONS_PATH}", self.base), query)
    }

    pub fn export(&self, query: &[(&str, String)]) -> Result<reqwest::Url, ReportError> {
        with_query(&format!("{}/{EXPORT_PATH}", self.origin), query)
    }
}

fn parse(raw: &str) -> Result<reqwest::Url, ReportError> {
    reqwest::Url::parse(raw).map_err(|e| ReportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn with_query(raw: &str, query: &[(&str, String)]) -> Result<reqwest::Url, ReportError> {
    let mut url = parse(raw)?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}
