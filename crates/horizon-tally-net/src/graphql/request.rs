//! GraphQL request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
}

/// A GraphQL request.
///
/// Represents a GraphQL operation with optional variables and operation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL document.
    pub query: String,

    /// Variables for the operation.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,

    /// Optional operation name (for documents with multiple operations).
    #[serde(skip_serializing_if = "Option::is_none", rename = "operationName")]
    pub operation_name: Option<String>,

    #[serde(skip)]
    pub(crate) operation_type: OperationType,
}

impl GraphQLRequest {
    /// Create a new query request.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_tally_net::graphql::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::query(
    ///     "query ListLabels($projectId: ID!) { listLabelsProxy(projectId: $projectId) { items { id } } }",
    /// )
    /// .variable("projectId", "p1");
    /// assert_eq!(request.variables["projectId"], "p1");
    /// ```
    pub fn query(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Query)
    }

    /// Create a new mutation request.
    pub fn mutation(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Mutation)
    }

    fn with_type(query: String, operation_type: OperationType) -> Self {
        Self {
            query,
            variables: Map::new(),
            operation_name: None,
            operation_type,
        }
    }

    /// Set a variable value. `null` values are sent as-is.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Merge variables from a JSON object.
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Get the operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }
}
