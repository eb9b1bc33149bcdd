pub mod jobdtos;
pub mod paymentdtos;
pub mod skilldtos;
pub mod userdtos;

use serde::{Deserialize, Serialize};

/// JSON envelope for every handler. `status` is `success`, `warning`,
/// `error` or `redirect`; `redirect` carries the path the client should go
/// to next when a soft gate turns the request away.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
            redirect: None,
        }
    }

    /// The request was understood but nothing changed (duplicate or already decided).
    pub fn warning(message: &str, data: T) -> Self {
        Self {
            status: "warning".to_string(),
            message: message.to_string(),
            data: Some(data),
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, path: &str) -> Self {
        self.redirect = Some(path.to_string());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> ApiResponse<()> {
        ApiResponse {
            status: "error".to_string(),
            message: message.to_string(),
            data: None,
            redirect: None,
        }
    }

    pub fn redirect(message: &str, path: &str) -> ApiResponse<()> {
        ApiResponse {
            status: "redirect".to_string(),
            message: message.to_string(),
            data: None,
            redirect: Some(path.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
