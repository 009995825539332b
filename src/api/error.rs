use std::fmt;

use reqwest::StatusCode;

/// Error reported by the Data API in a non-2xx response.
pub struct ApiError {
    status: StatusCode,
    code: Option<String>,
    message: Option<String>,
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status: {}, Code: {:?}, Message: {:?}",
            self.status, self.code, self.message
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(msg)) => write!(f, "{} ({}): {}", self.status, code, msg),
            (None, Some(msg)) => write!(f, "{}: {}", self.status, msg),
            (Some(code), None) => write!(f, "{} ({})", self.status, code),
            (None, None) => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn new(status: StatusCode, code: Option<String>, message: Option<String>) -> Self {
        ApiError {
            status,
            code,
            message,
        }
    }
}
