//! HTTP transport against a search endpoint.
//!
//! `GET {server}/search/{type}?q=...&start=...&rows=...[&sort=...]`, or `POST`
//! to the same URL with the projection as the JSON body for partial search.
//! Requests carry an identity header but are not signed.

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use super::{error_message, parse_page, PageRequest, SearchPage, SearchTransport};
use crate::query::encode_query;
use crate::{Config, Error, Result};

/// Search over HTTP.
pub struct HttpTransport {
    agent: Agent,
    server_url: String,
    client_name: String,
}

impl HttpTransport {
    pub fn new(server_url: impl Into<String>, client_name: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: Agent::new_with_config(config),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            client_name: client_name.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.server_url.clone(),
            config.client_name.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full request URL for a page.
    pub fn page_url(&self, request: &PageRequest<'_>) -> String {
        let mut url = format!(
            "{}/search/{}?q={}&start={}&rows={}",
            self.server_url,
            encode_query(request.object_type),
            request.encoded_query,
            request.start,
            request.rows
        );
        if let Some(sort) = request.sort {
            url.push_str("&sort=");
            url.push_str(&encode_query(sort));
        }
        url
    }
}

impl SearchTransport for HttpTransport {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage> {
        let url = self.page_url(request);
        debug!(%url, partial = request.filter_result.is_some(), "search request");

        let sent = match request.filter_result {
            Some(spec) => {
                let body = serde_json::to_string(spec)?;
                self.agent
                    .post(&url)
                    .header("Accept", "application/json")
                    .header("Content-Type", "application/json")
                    .header("X-Ops-UserId", &self.client_name)
                    .send(body.as_str())
            }
            None => self
                .agent
                .get(&url)
                .header("Accept", "application/json")
                .header("X-Ops-UserId", &self.client_name)
                .call(),
        };

        let response = sent.map_err(|e| Error::transport(format!("request to {} failed: {}", url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| Error::transport(format!("failed reading response body: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(Error::Transport {
                status: Some(status),
                message: error_message(&body),
            });
        }

        parse_page(&body)
    }
}
