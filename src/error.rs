//! Error type shared by the store, bridge and provider layers.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned error status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("malformed provider response from {slug}: {detail}")]
    MalformedResponse { slug: String, detail: String },

    #[error("invalid storage reference {reference}: {reason}")]
    InvalidReference { reference: String, reason: String },
}

impl AppError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Http {
            url: url.into(),
            source,
        }
    }

    pub fn malformed(slug: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            slug: slug.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_body_text() {
        let err = AppError::Status {
            url: "https://fal.run/fal-ai/imagen4/preview".to_string(),
            status: 403,
            body: "Invalid key".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("Invalid key"));
    }

    #[test]
    fn malformed_names_the_slug() {
        let err = AppError::malformed("fal-ai/bytedance/omnihuman", "missing field `video`");
        assert_eq!(
            err.to_string(),
            "malformed provider response from fal-ai/bytedance/omnihuman: missing field `video`"
        );
    }
}
