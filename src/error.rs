use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{reason}")]
    Network {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Failed to parse response JSON")]
    Parse(String),

    #[error("Response did not contain permissions array.")]
    UnexpectedShape,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }

    pub(crate) fn status(url: &str, status: u16) -> Self {
        Self::Network {
            url: url.to_string(),
            status: Some(status),
            reason: format!("Network response was not ok ({status})"),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnexpectedShape)
    }
}
