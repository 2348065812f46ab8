//! Switch statistics fetcher.
//!
//! [`StatsFetcher`] is the seam between collectors and the switches. The
//! production implementation, [`HttpStatsFetcher`], logs in to the switch web
//! interface and scrapes the port statistics page.

use crate::config::SwitchConfig;
use crate::error::{FetchError, GatewayError};
use crate::model::PortMap;
use crate::scrape::parse_port_stats;
use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::header::COOKIE;
use std::time::Duration;
use tracing::debug;

/// Path of the login form handler
pub const LOGIN_PATH: &str = "/login.cgi";

/// Path and query of the port statistics page
pub const STATS_PATH: &str = "/port.cgi?page=stats";

/// Produces the current port records of one switch
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    async fn fetch(&self, switch: &SwitchConfig) -> Result<PortMap, FetchError>;
}

/// Session token expected by the switch: hex MD5 of username + password.
pub fn auth_token(username: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn login_url(address: &str) -> String {
    format!("http://{}{}", address, LOGIN_PATH)
}

pub fn stats_url(address: &str) -> String {
    format!("http://{}{}", address, STATS_PATH)
}

/// The switch answers an unauthenticated stats request with its login form.
fn is_login_page(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("login.cgi") || lower.contains("type=\"password\"")
}

/// HTTP scraper for the switch web interface
#[derive(Debug, Clone)]
pub struct HttpStatsFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpStatsFetcher {
    /// Create a fetcher whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn http_error(&self, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http {
                url: url.to_string(),
                source,
            }
        }
    }

    async fn login(&self, switch: &SwitchConfig, token: &str) -> Result<(), FetchError> {
        let url = login_url(&switch.address);
        let form = [
            ("username", switch.username.as_str()),
            ("password", switch.password.as_str()),
            ("language", "EN"),
            ("Response", token),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.http_error(&url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                address: switch.address.clone(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        debug!(switch = %switch.name, "Logged in to switch web interface");
        Ok(())
    }
}

#[async_trait]
impl StatsFetcher for HttpStatsFetcher {
    async fn fetch(&self, switch: &SwitchConfig) -> Result<PortMap, FetchError> {
        let token = auth_token(&switch.username, &switch.password);
        self.login(switch, &token).await?;

        let url = stats_url(&switch.address);
        let response = self
            .client
            .get(&url)
            .header(COOKIE, format!("admin={}", token))
            .send()
            .await
            .map_err(|e| self.http_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.http_error(&url, e))?;

        if is_login_page(&body) {
            return Err(FetchError::Auth {
                address: switch.address.clone(),
            });
        }

        parse_port_stats(&body)
    }
}
