mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

/// One API operation seen from the client side: how the HTTP request is
/// built, and what deserializes back. Implemented next to each handler
/// so the two sides of the wire cannot drift apart.
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}
