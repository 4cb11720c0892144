//! Service registration.
//!
//! On startup the server announces itself to an external registrar with a
//! single request and gets back the address other services should use to
//! reach it. The registrar is optional; when it is unreachable the server
//! keeps running and only logs a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::RegistrarConfig;

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    service: &'a str,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    address: String,
}

/// Registers `local_addr` under the configured service name and returns the
/// address the registrar recorded.
pub async fn register(config: &RegistrarConfig, local_addr: SocketAddr) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let url = format!("{}/register", config.url.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .json(&RegisterRequest {
            service: &config.service,
            port: local_addr.port(),
        })
        .send()
        .await
        .with_context(|| format!("registrar request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("registrar at {} rejected registration", url))?;

    let body: RegisterResponse = resp
        .json()
        .await
        .context("registrar returned an unreadable response")?;

    Ok(body.address)
}
