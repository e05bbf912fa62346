pub mod endpoints;

use std::future::Future;
use std::time::Duration;

use reqwest::{redirect, Proxy};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::filters::SiteEntry;
use crate::utils;

pub use endpoints::Endpoints;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
struct PeopleResponse {
    #[serde(default)]
    people: Vec<Person>,
}

/// The backend calls the report needs. Implemented over HTTP by
/// [`HttpBackend`]; tests substitute in-memory fakes.
pub trait ReportBackend: Send + Sync + 'static {
    fn list_sites(&self) -> impl Future<Output = Result<Vec<SiteEntry>, ReportError>> + Send;

    fn search_people(
        &self,
        filter: &str,
    ) -> impl Future<Output = Result<Vec<Person>, ReportError>> + Send;

    /// Returns the raw permissions body; shape handling lives with the table.
    fn fetch_permissions(
        &self,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<String, ReportError>> + Send;

    fn fetch_export(
        &self,
        url: &reqwest::Url,
    ) -> impl Future<Output = Result<Vec<u8>, ReportError>> + Send;

    fn endpoints(&self) -> &Endpoints;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub page_url: reqwest::Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub header: Option<String>,
    pub proxy: Option<String>,
    pub timeout_seconds: u64,
}

pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: Endpoints,
    username: Option<String>,
    password: Option<String>,
}

impl HttpBackend {
    pub fn new(opts: &ClientOptions) -> Result<Self, ReportError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = opts.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (name, value) = utils::parse_header(raw).map_err(ReportError::Config)?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .redirect(redirect::Policy::limited(10))
            .timeout(Duration::from_secs(opts.timeout_seconds));
        if let Some(proxy) = opts.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = Proxy::all(proxy)
                .map_err(|e| ReportError::Config(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| ReportError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoints: Endpoints::from_page_url(&opts.page_url),
            username: opts.username.clone(),
            password: opts.password.clone(),
        })
    }

    async fn get(&self, url: reqwest::Url) -> Result<reqwest::Response, ReportError> {
        debug!(url = %url, "GET");
        let mut req = self.client.get(url.clone());
        if let Some(user) = self.username.as_deref() {
            req = req.basic_auth(user, self.password.as_deref());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ReportError::transport(url.as_str(), e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if let Some(message) = backend_error_message(&body) {
                warn!(url = %url, status = status.as_u16(), %message, "backend rejected request");
            }
            return Err(ReportError::status(url.as_str(), status.as_u16()));
        }
        Ok(resp)
    }

    async fn get_text(&self, url: reqwest::Url) -> Result<String, ReportError> {
        let resp = self.get(url.clone()).await?;
        resp.text()
            .await
            .map_err(|e| ReportError::transport(url.as_str(), e))
    }
}

impl ReportBackend for HttpBackend {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, ReportError> {
        let body = self.get_text(self.endpoints.sites()?).await?;
        serde_json::from_str(&body).map_err(|e| ReportError::Parse(e.to_string()))
    }

    async fn search_people(&self, filter: &str) -> Result<Vec<Person>, ReportError> {
        let body = self.get_text(self.endpoints.people(filter)?).await?;
        let parsed: PeopleResponse =
            serde_json::from_str(&body).map_err(|e| ReportError::Parse(e.to_string()))?;
        Ok(parsed.people)
    }

    async fn fetch_permissions(
        &self,
        query: &[(&'static str, String)],
    ) -> Result<String, ReportError> {
        self.get_text(self.endpoints.permissions(query)?).await
    }

    async fn fetch_export(&self, url: &reqwest::Url) -> Result<Vec<u8>, ReportError> {
        let resp = self.get(url.clone()).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ReportError::transport(url.as_str(), e))?;
        Ok(bytes.to_vec())
    }

    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Pulls `error` out of the `{ "success": false, "error": "..." }` bodies
/// the web scripts send with 4xx/5xx statuses.
fn backend_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(|s| s.to_string())
}

/// Keeps usernames whose lowercase form starts with the lowercase query.
pub fn filter_usernames(people: Vec<Person>, query: &str) -> Vec<String> {
    let prefix = query.to_lowercase();
    people
        .into_iter()
        .map(|p| p.user_name)
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_filtered_by_case_insensitive_prefix() {
        let people = ["Alice", "alicia", "malice", "bob"]
            .into_iter()
            .map(|n| Person {
                user_name: n.to_string(),
            })
            .collect();
        assert_eq!(filter_usernames(people, "ALI"), vec!["Alice", "alicia"]);
    }

    #[test]
    fn backend_error_message_reads_error_field() {
        assert_eq!(
            backend_error_message(r#"{"success":false,"error":"Site hr not found"}"#),
            Some("Site hr not found".to_string())
        );
        assert_eq!(backend_error_message("<html>"), None);
    }
}
