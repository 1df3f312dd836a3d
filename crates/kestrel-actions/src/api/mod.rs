//! Clients for the third-party HTTP APIs used by actions.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{ActionError, ActionResult};

pub mod bttv;
pub mod ffz;
pub mod riot;

/// The HTTP client type the API clients share.
pub type HttpClient = Client;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the HTTP client shared by the API clients.
pub fn http_client() -> ActionResult<Client> {
    ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(ActionError::from)
}

/// Fetches `url` and decodes the JSON body, treating non-success statuses as
/// [`ActionError::Api`].
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> ActionResult<T> {
    trace!(url = %url, "GET");

    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ActionError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(resp.json().await?)
}
