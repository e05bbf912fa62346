use chrono::{Local, NaiveDate};
use reqwest::header::{HeaderName, HeaderValue};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Splits the page URL at the last `share/` segment, so that
/// `https://host/share/page/report` becomes `https://host/`.
///
/// Pages outside Share fall back to `origin + "/"`.
pub fn derive_base_url(page_url: &reqwest::Url) -> String {
    let href = page_url.as_str();
    match href.rfind("share/") {
        Some(idx) => href[..idx].to_string(),
        None => format!("{}/", origin_of(page_url)),
    }
}

pub fn origin_of(page_url: &reqwest::Url) -> String {
    page_url.origin().ascii_serialization()
}

pub fn parse_page_url(value: &str) -> Result<reqwest::Url, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("url is empty".to_string());
    }
    let url = reqwest::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

pub fn parse_header(value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name is empty".to_string());
    }
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|_| format!("invalid header name '{key}'"))?;
    let value = HeaderValue::from_str(val.trim())
        .map_err(|_| format!("invalid header value for '{key}'"))?;
    Ok((name, value))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value.trim()))
}

pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// True when the value is empty or one of the "no filter" sentinels.
pub fn is_unset_filter(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("all") || v.eq_ignore_ascii_case("all users")
}
