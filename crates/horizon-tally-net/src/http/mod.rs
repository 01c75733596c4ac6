//! HTTP client for Horizon Tally.
//!
//! A thin layer over `reqwest` that the GraphQL client sends its
//! operations through: a cheaply cloneable [`HttpClient`], a request
//! builder and a response wrapper that maps failures onto
//! [`NetworkError`](crate::NetworkError).
//!
//! # Example
//!
//! ```ignore
//! use horizon_tally_net::http::HttpClient;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let response = client
//!     .post("https://api.example.com/graphql")
//!     .json(&serde_json::json!({ "query": "{ __typename }" }))
//!     .send()
//!     .await?;
//! println!("Status: {}", response.status());
//! ```

mod client;
mod request;
mod response;

pub use client::{
    HttpClient, HttpClientBuilder, HttpClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
pub use request::{HttpMethod, HttpRequestBuilder, RequestBody};
pub use response::HttpResponse;
