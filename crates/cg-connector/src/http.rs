//! Shared HTTP plumbing

use crate::error::{transport, ConnectorError};
use cg_resolver::ResolveError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{redirect, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("content-graph/", env!("CARGO_PKG_VERSION"));

/// Client with timeout, no redirects and optional bearer auth
pub(crate) fn build_client(
    timeout: Duration,
    bearer: Option<&str>,
) -> Result<Client, ConnectorError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ConnectorError::InvalidHeader { name: "authorization" })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?)
}

/// Outcome of a GET that distinguishes absence from failure
pub(crate) enum Fetched {
    Found(Value),
    Missing,
}

/// Send a request and decode a JSON body
///
/// 404 is [`Fetched::Missing`]; any other non-success status, transport
/// failure or undecodable body is a transport error.
pub(crate) async fn get_json(backend: &str, request: RequestBuilder) -> Result<Fetched, ResolveError> {
    let response = request.send().await.map_err(|e| transport(backend, &e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Fetched::Missing);
    }
    if !status.is_success() {
        return Err(ResolveError::transport(backend, format!("unexpected status {status}")));
    }

    response
        .json::<Value>()
        .await
        .map(Fetched::Found)
        .map_err(|e| transport(backend, &e))
}
