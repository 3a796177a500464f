// SPDX-License-Identifier: MIT

//! HTTP fetcher - GET a JSON document per resource id

use crate::settle::config::{HttpFetcherConfig, ID_PLACEHOLDER};
use crate::settle::error::SettleError;
use crate::wait::{FetchError, Fetcher};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::time::Duration;
use url::Url;

/// Longest response body quoted in a status error
const MAX_ERROR_BODY: usize = 512;

/// Fetches a resource with `GET <url>` and decodes the body as JSON
pub struct HttpFetcher {
    client: Client,
    url_template: String,
    headers: HeaderMap,
    bearer_token: Option<String>,
}

impl HttpFetcher {
    /// Create a new HttpFetcher
    ///
    /// When `bearer_token_env` is set, that environment variable must be present.
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, SettleError> {
        let bearer_token = match &config.bearer_token_env {
            Some(var) => Some(
                env::var(var).map_err(|_| SettleError::config(format!("{} must be set", var)))?,
            ),
            None => None,
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SettleError::config(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SettleError::config(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            url_template: config.url.clone(),
            headers,
            bearer_token,
        })
    }

    /// Build the request URL for a resource id. The id is percent-encoded.
    pub fn url_for(&self, resource_id: &str) -> Result<Url, SettleError> {
        let encoded: String =
            url::form_urlencoded::byte_serialize(resource_id.as_bytes()).collect();
        // byte_serialize writes spaces as '+', which only means space in query strings
        let encoded = encoded.replace('+', "%20");
        Ok(Url::parse(
            &self.url_template.replace(ID_PLACEHOLDER, &encoded),
        )?)
    }

    async fn get(&self, resource_id: &str) -> Result<Value, SettleError> {
        let url = self.url_for(resource_id)?;
        log::debug!("GET {}", url);

        let mut request = self.client.get(url.clone()).headers(self.headers.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SettleError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    type Resource = Value;

    async fn fetch(&self, resource_id: &str) -> Result<Value, FetchError> {
        Ok(self.get(resource_id).await?)
    }
}
