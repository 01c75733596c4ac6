//! GraphQL client for queries and mutations.
//!
//! This module provides:
//! - Query and mutation execution over HTTP POST
//! - Variables via JSON
//! - Response parsing with typed access to top-level fields and to the
//!   server's `errorType`
//!
//! # Example
//!
//! ```ignore
//! use horizon_tally_net::graphql::{GraphQLClient, GraphQLRequest};
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .api_key("da2-...")
//!     .build()?;
//!
//! let request = GraphQLRequest::query(r#"
//!     query ListLabels($projectId: ID!) {
//!         listLabelsProxy(projectId: $projectId) {
//!             items { id name description }
//!             nextToken
//!         }
//!     }
//! "#)
//! .variable("projectId", "p1");
//!
//! let response = client.execute(request).await?;
//! let labels: serde_json::Value = response.field("listLabelsProxy")?;
//! ```

mod client;
mod request;
mod response;

pub use client::{GraphQLClient, GraphQLClientBuilder};
pub use request::{GraphQLRequest, OperationType};
pub use response::{GraphQLError, GraphQLLocation, GraphQLResponse, PathSegment};
