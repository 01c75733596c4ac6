//! Single-field mutations whose result is patched into a loaded collection.
//!
//! A [`Mutation`] names one mutation field, its arguments and the selection
//! read back. [`GraphQLClient::mutate`](crate::GraphQLClient::mutate) sends
//! it and decodes the field's value, which callers merge into a collection
//! with `upsert_item` or drop with `remove_item`.

use serde_json::{Map, Value};

use crate::graphql::GraphQLRequest;
use crate::source::{OperationArg, operation_name, signature, view_file_selection};

/// Describes one mutation field and the selection read from its result.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    field: String,
    selection: String,
    args: Vec<OperationArg>,
}

impl Mutation {
    /// A mutation on `field` whose result is read with `selection`.
    pub fn new(field: impl Into<String>, selection: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selection: selection.into(),
            args: Vec::new(),
        }
    }

    /// Adds an argument, declared with the given GraphQL type.
    pub fn arg(
        mut self,
        name: impl Into<String>,
        graphql_type: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.args.push(OperationArg {
            name: name.into(),
            graphql_type: graphql_type.into(),
            value: value.into(),
        });
        self
    }

    /// The mutation's response field, e.g. `setViewFileLabelProxy`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operation_name(&self) -> String {
        operation_name(&self.field)
    }

    /// Renders the GraphQL document.
    pub fn document(&self) -> String {
        let params = self
            .args
            .iter()
            .map(|arg| (arg.name.as_str(), arg.graphql_type.as_str()));
        let (declarations, arguments) = signature(params);
        format!(
            "mutation {}({declarations}) {{ {}({arguments}) {{ {} }} }}",
            self.operation_name(),
            self.field,
            self.selection,
        )
    }

    /// Argument values keyed by name. Absent optional values are `null`.
    pub fn variables(&self) -> Map<String, Value> {
        self.args
            .iter()
            .map(|arg| (arg.name.clone(), arg.value.clone()))
            .collect()
    }

    /// The request sent for this mutation.
    pub fn to_request(&self) -> GraphQLRequest {
        GraphQLRequest::mutation(self.document())
            .variables(self.variables())
            .operation_name(self.operation_name())
    }

    // =========================================================================
    // View files
    // =========================================================================

    /// Sets or clears the label of one file in a view.
    ///
    /// The backend toggles: sending the label the file already has clears
    /// it. The result is the updated view file row.
    pub fn set_view_file_label(
        project_id: impl Into<String>,
        view_id: impl Into<String>,
        file_id: impl Into<String>,
        label_id: Option<&str>,
    ) -> Self {
        Self::view_file("setViewFileLabelProxy", project_id, view_id, file_id).arg(
            "labelId",
            "ID",
            label_id.map_or(Value::Null, |id| Value::String(id.to_owned())),
        )
    }

    /// Removes one file from a view. The result is the removed row.
    pub fn delete_view_file(
        project_id: impl Into<String>,
        view_id: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self::view_file("deleteViewFileProxy", project_id, view_id, file_id)
    }

    fn view_file(
        field: &str,
        project_id: impl Into<String>,
        view_id: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self::new(field, view_file_selection())
            .arg("projectId", "ID!", Value::String(project_id.into()))
            .arg("viewId", "ID!", Value::String(view_id.into()))
            .arg("fileId", "ID!", Value::String(file_id.into()))
    }
}
