//! HTTP transport against a drive-style content endpoint.

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{Result, XlrelayError};

use super::{FileLocator, Transport};

/// `GET`/`PUT {base_url}/{locator}/content` with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| XlrelayError::Transport(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn content_url(&self, locator: &FileLocator) -> String {
        format!(
            "{}/{}/content",
            self.base_url,
            locator.as_str().trim_start_matches('/')
        )
    }
}

/// Map a non-success status to a transport error; `None` for success.
pub(crate) fn status_error(status: StatusCode, body: &str) -> Option<XlrelayError> {
    if status.is_success() {
        return None;
    }
    let detail = body.trim();
    let message = match status {
        StatusCode::LOCKED => format!("resource locked: {detail}"),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authorization failed ({status}): {detail}")
        }
        _ => format!("unexpected status {status}: {detail}"),
    };
    Some(XlrelayError::Transport(message))
}

fn request_err(e: &reqwest::Error) -> XlrelayError {
    XlrelayError::Transport(format!("request failed: {e}"))
}

impl Transport for HttpTransport {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.content_url(locator))
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| request_err(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body)
                .unwrap_or_else(|| XlrelayError::Transport(format!("status {status}"))));
        }
        let bytes = response.bytes().map_err(|e| request_err(&e))?;
        Ok(bytes.to_vec())
    }

    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()> {
        let response = self
            .client
            .put(self.content_url(locator))
            .bearer_auth(&self.token)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .body(bytes.to_vec())
            .send()
            .map_err(|e| request_err(&e))?;

        let status = response.status();
        let body = if status.is_success() {
            String::new()
        } else {
            response.text().unwrap_or_default()
        };
        match status_error(status, &body) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
