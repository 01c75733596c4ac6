//! GraphQL response types.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::error::NetworkError;

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Error category set by the server (e.g. `Unauthorized`,
    /// `Lambda:Unhandled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    /// Locations in the document where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// The error category, from `errorType` or `extensions.errorType` /
    /// `extensions.code`.
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref().or_else(|| {
            let extensions = self.extensions.as_ref()?;
            extensions
                .get("errorType")
                .or_else(|| extensions.get("code"))
                .and_then(Value::as_str)
        })
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (at ")?;
            for (i, segment) in path.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                match segment {
                    PathSegment::Field(name) => write!(f, "{}", name)?,
                    PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

/// A GraphQL response from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// The data returned by the operation.
    #[serde(default)]
    pub data: Option<Value>,

    /// Errors that occurred during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLResponse {
    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&GraphQLError> {
        self.errors.first()
    }

    /// Get all errors as a combined message.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(
                self.errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// The response's errors as a [`NetworkError::GraphQL`], if any.
    pub fn error(&self) -> Option<NetworkError> {
        let message = self.error_message()?;
        Some(NetworkError::GraphQL {
            message,
            error_type: self
                .first_error()
                .and_then(GraphQLError::error_type)
                .map(str::to_owned),
        })
    }

    /// Parse a specific top-level field from the data.
    ///
    /// A missing or `null` field is [`NetworkError::NoData`].
    pub fn field<T: DeserializeOwned>(&self, field: &str) -> Result<T, NetworkError> {
        if let Some(err) = self.error() {
            return Err(err);
        }
        let value = match &self.data {
            Some(Value::Object(data)) => data.get(field).filter(|v| !v.is_null()),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(NetworkError::InvalidBody(
                    "Response data is not an object".into(),
                ));
            }
        };
        let value = value.ok_or_else(|| NetworkError::NoData {
            field: field.to_owned(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            NetworkError::Json(format!("Failed to deserialize field '{}': {}", field, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_successful_response() {
        let response: GraphQLResponse =
            serde_json::from_value(json!({ "data": { "label": { "id": "1" } } })).unwrap();
        assert!(!response.has_errors());
        assert!(response.error().is_none());
    }

    #[test]
    fn test_appsync_error_shape() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": { "listViewsProxy": null },
            "errors": [{
                "path": ["listViewsProxy"],
                "data": null,
                "errorType": "Unauthorized",
                "errorInfo": null,
                "locations": [{ "line": 1, "column": 40 }],
                "message": "Not Authorized to access listViewsProxy on type Query"
            }]
        }))
        .unwrap();

        assert!(response.has_errors());
        let error = response.first_error().unwrap();
        assert_eq!(error.error_type(), Some("Unauthorized"));
        assert_eq!(
            error.to_string(),
            "Not Authorized to access listViewsProxy on type Query (at listViewsProxy)"
        );

        let err = response.field::<Value>("listViewsProxy").unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_error_type_from_extensions() {
        let error: GraphQLError = serde_json::from_value(json!({
            "message": "boom",
            "extensions": { "code": "INTERNAL_SERVER_ERROR" }
        }))
        .unwrap();
        assert_eq!(error.error_type(), Some("INTERNAL_SERVER_ERROR"));
    }

    #[test]
    fn test_parse_field() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": { "label": { "id": "1", "name": "cat" } }
        }))
        .unwrap();

        #[derive(Deserialize)]
        struct Label {
            id: String,
            name: String,
        }

        let label: Label = response.field("label").unwrap();
        assert_eq!(label.id, "1");
        assert_eq!(label.name, "cat");
    }

    #[test]
    fn test_null_field_is_no_data() {
        let response: GraphQLResponse =
            serde_json::from_value(json!({ "data": { "listLabelsProxy": null } })).unwrap();
        let err = response.field::<Value>("listLabelsProxy").unwrap_err();
        assert_eq!(
            err,
            NetworkError::NoData {
                field: "listLabelsProxy".into()
            }
        );

        let response: GraphQLResponse = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(matches!(
            response.field::<Value>("listLabelsProxy"),
            Err(NetworkError::NoData { .. })
        ));
    }

    #[test]
    fn test_combined_error_message() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "errors": [{ "message": "first" }, { "message": "second" }]
        }))
        .unwrap();
        assert_eq!(response.error_message().as_deref(), Some("first; second"));
        assert!(matches!(
            response.field::<Value>("label"),
            Err(NetworkError::GraphQL { .. })
        ));
    }
}
