use crate::api::{ApiError, ErrorBody};
use reqwest::{Error, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Error as SerdeError;
use spdlog::prelude::*;
use thiserror::Error;
use url::Url;

/// Minimal client for a MongoDB Data API compatible endpoint.
#[derive(Debug)]
pub struct ApiClient {
    base_url: Url,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("bad base url: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("api error: {0}")]
    ApiError(#[from] ApiError),

    #[error("reqwest error: {0}")]
    ReqwestError(#[from] Error),

    #[error("json error: {0}")]
    JsonError(#[from] SerdeError),
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;

        // Url::join drops the last path segment unless it ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(ApiClient {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    pub fn action_url(&self, action: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!("action/{action}"))?)
    }

    // performs POST /action/<action>
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        action: &str,
        body: &T,
    ) -> Result<R, ClientError> {
        let url = self.action_url(action)?;
        debug!("ApiClient.post(): {}", url);
        let request = self.client.post(url).json(body);

        self.send(request).await
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ClientError> {
        let res = request
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        self.handle_response(res).await
    }

    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<R, ClientError> {
        let status = response.status();
        let message = response.text().await?;

        parse_response(status, &message)
    }
}

fn parse_response<R: DeserializeOwned>(status: StatusCode, message: &str) -> Result<R, ClientError> {
    if status.is_client_error() || status.is_server_error() {
        // error bodies from proxies are not always JSON
        let body: ErrorBody = serde_json::from_str(message).unwrap_or_default();
        let detail = body.error.or_else(|| {
            let trimmed = message.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });
        return Err(ClientError::ApiError(ApiError::new(
            status,
            body.error_code,
            detail,
        )));
    }

    Ok(serde_json::from_str(message)?)
}
