//! Networking module for Horizon Tally.
//!
//! This crate connects paged collections to the labelling backend:
//!
//! - **HTTP Client**: a small async client over `reqwest`
//! - **GraphQL Client**: query and mutation execution with typed response
//!   parsing
//! - **Page sources**: [`GraphQLPageSource`], a
//!   [`PageSource`](horizon_tally_core::PageSource) over the backend's
//!   `list*Proxy` queries, described by a [`ListQuery`]
//! - **Mutations**: [`Mutation`] descriptors whose decoded result is merged
//!   back into a loaded collection
//!
//! # Example
//!
//! ```ignore
//! use horizon_tally_net::{GraphQLClient, GraphQLPageSource, ListQuery};
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .api_key("da2-...")
//!     .build()?;
//!
//! let labels: GraphQLPageSource<Label> =
//!     GraphQLPageSource::new(client, ListQuery::labels("p1").with_limit(100));
//! let page = labels.get_page(None, "").await?;
//! ```
//!
//! # Errors
//!
//! Transport failures are [`NetworkError`]s. Page sources classify them
//! into [`FetchError`](horizon_tally_core::FetchError) kinds with
//! [`NetworkError::into_fetch_error`].

mod error;
pub mod graphql;
pub mod http;
mod mutation;
mod source;

pub use error::{NetworkError, Result};
pub use graphql::{GraphQLClient, GraphQLClientBuilder, GraphQLRequest, GraphQLResponse};
pub use http::{HttpClient, HttpClientBuilder};
pub use mutation::Mutation;
pub use source::{GraphQLPageSource, ListQuery};
