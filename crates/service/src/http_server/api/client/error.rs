use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpStatus(status, _) => Some(*status),
            ApiError::Reqwest(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The remote rejected the request, as opposed to never answering it
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::HttpStatus(..))
    }

    /// Best effort human readable message.
    ///
    /// Error bodies are usually `{"message": "..."}`; anything else is
    ///  passed through as text.
    pub fn message(&self) -> String {
        match self {
            ApiError::HttpStatus(status, body) => {
                #[derive(serde::Deserialize)]
                struct ErrorBody {
                    message: Option<String>,
                    error: Option<String>,
                }

                match serde_json::from_str::<ErrorBody>(body) {
                    Ok(ErrorBody {
                        message: Some(message),
                        ..
                    })
                    | Ok(ErrorBody {
                        error: Some(message),
                        ..
                    }) => message,
                    _ if !body.trim().is_empty() => body.trim().to_string(),
                    _ => status.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_json_message() {
        let err = ApiError::HttpStatus(
            StatusCode::BAD_REQUEST,
            r#"{"message":"connector limit reached"}"#.to_string(),
        );
        assert_eq!(err.message(), "connector limit reached");
        assert!(err.is_rejection());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_message_falls_back_to_text_then_status() {
        let err = ApiError::HttpStatus(StatusCode::BAD_GATEWAY, "upstream down\n".to_string());
        assert_eq!(err.message(), "upstream down");

        let err = ApiError::HttpStatus(StatusCode::NOT_FOUND, String::new());
        assert!(err.is_not_found());
        assert_eq!(err.message(), "404 Not Found");
    }
}
