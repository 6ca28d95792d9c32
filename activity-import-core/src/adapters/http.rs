//! Import API HTTP client
//!
//! Talks to a REST import endpoint:
//! - `POST {base}/api/v1/import?dryRun=true` validates drafts and returns `{ activities: [...] }`
//! - `POST {base}/api/v1/import` imports the selected activities
//!
//! Rejections come back as 4xx with `{ "message": ["activities.0.date ...", ...] }`
//! (a single string is accepted too).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::{
    ActivityImporter, DryRunRequest, DryRunResponse, ImportRequest, ValidationOracle,
};

const IMPORT_PATH: &str = "api/v1/import";

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<MessageField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    Many(Vec<String>),
    One(String),
}

/// Client for the import API
#[derive(Debug, Clone)]
pub struct HttpImportApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpImportApi {
    /// Create a client for `base_url` (http or https)
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        // Url::join replaces the last segment unless the path ends with '/'
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Endpoint URL for an import call
    pub fn endpoint(&self, dry_run: bool) -> Result<Url> {
        let mut url = self
            .base_url
            .join(IMPORT_PATH)
            .map_err(|e| Error::Config(format!("Invalid API URL: {}", e)))?;
        if dry_run {
            url.query_pairs_mut().append_pair("dryRun", "true");
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: serde::Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<Response> {
        let response = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        check_response_status(response).await
    }
}

#[async_trait]
impl ValidationOracle for HttpImportApi {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<DryRunResponse> {
        let url = self.endpoint(true)?;
        log::debug!(
            "Dry-run validation of {} activities against {}",
            request.activities.len(),
            url
        );

        let response = self.send(url, request).await?;
        let text = response.text().await.map_err(map_request_error)?;

        // A success body we cannot read is the oracle's format problem, not the network's
        serde_json::from_str(&text).map_err(|e| {
            log::warn!("Unreadable dry-run response: {}", e);
            Error::Validation(Vec::new())
        })
    }
}

#[async_trait]
impl ActivityImporter for HttpImportApi {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        let url = self.endpoint(false)?;
        log::info!("Importing {} activities", request.activities.len());
        self.send(url, request).await?;
        Ok(())
    }
}

fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::transport("Request to the import API timed out")
    } else if error.is_connect() {
        Error::transport("Unable to connect to the import API")
    } else {
        Error::transport(format!("Import API request failed: {}", error))
    }
}

async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::transport(
            "Import API authentication failed. Check your API token.",
        )),
        StatusCode::NOT_FOUND => Err(Error::transport("Import API endpoint not found")),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::transport(
            "Import API rate limit exceeded. Please wait a moment and try again.",
        )),
        s if s.is_client_error() => {
            let body = response.text().await.map_err(map_request_error)?;
            Err(Error::Validation(rejection_messages(&body)))
        }
        s => Err(Error::transport(format!("Import API error: HTTP {}", s.as_u16()))),
    }
}

/// Messages from a rejection body, empty if the body has none
fn rejection_messages(body: &str) -> Vec<String> {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload {
            message: Some(MessageField::Many(messages)),
        }) => messages,
        Ok(ErrorPayload {
            message: Some(MessageField::One(message)),
        }) => vec![message],
        _ => Vec::new(),
    }
}
