//! Page sources backed by the backend's `list*Proxy` GraphQL queries.
//!
//! Every list query takes `nextToken` and `limit` and returns
//! `{ items: [..], nextToken }`. A [`ListQuery`] describes one such query
//! (field, selection set, fixed arguments) and renders the document and
//! variables for a page; [`GraphQLPageSource`] sends it and turns the
//! response into a [`Page`].
//!
//! # Example
//!
//! ```ignore
//! use horizon_tally_net::{GraphQLClient, GraphQLPageSource, ListQuery};
//! use horizon_tally_core::ImageOptions;
//!
//! let client = GraphQLClient::builder(endpoint).api_key(key).build()?;
//! let source: GraphQLPageSource<ViewFile> = GraphQLPageSource::new(
//!     client,
//!     ListQuery::view_files("p1", "v1", ImageOptions::default()).with_limit(50),
//! );
//! let first = source.get_page(None, "").await?;
//! ```

use std::future::Future;
use std::marker::PhantomData;

use horizon_tally_core::logging::targets;
use horizon_tally_core::{FetchResult, ImageOptions, Page, PageSource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{NetworkError, Result};
use crate::graphql::{GraphQLClient, GraphQLRequest};

const FILE_FIELDS: &str = "id name path owner resource createdAt updatedAt";
const PROJECT_FIELDS: &str = "id name description createdAt updatedAt";
const USER_FIELDS: &str = "accountId email owner createdAt updatedAt";
const LABEL_FIELDS: &str = "id name description createdAt updatedAt";

/// The `ImageOptionsProxy*Input` object for a file listing.
fn image_options(images: ImageOptions) -> Value {
    serde_json::json!({
        "width": images.width,
        "height": images.height,
        "format": images.format.as_str(),
    })
}

/// Selection set of a view file row, shared by listings and mutations.
pub(crate) fn view_file_selection() -> String {
    format!(
        "viewId fileId labelId createdAt updatedAt file {{ {FILE_FIELDS} }} label {{ {LABEL_FIELDS} }}"
    )
}

/// One fixed argument of an operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OperationArg {
    pub(crate) name: String,
    pub(crate) graphql_type: String,
    pub(crate) value: Value,
}

/// `listLabelsProxy` becomes `ListLabelsProxy`.
pub(crate) fn operation_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders `$name: Type` declarations and `name: $name` arguments.
pub(crate) fn signature<'a>(
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> (String, String) {
    let (declarations, arguments): (Vec<String>, Vec<String>) = params
        .into_iter()
        .map(|(name, graphql_type)| {
            (format!("${name}: {graphql_type}"), format!("{name}: ${name}"))
        })
        .unzip();
    (declarations.join(", "), arguments.join(", "))
}

/// Describes one cursor-paged list query.
///
/// The rendered document always declares `$nextToken: String` and
/// `$limit: Int`, plus `$query: String` when the backend filters
/// server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    field: String,
    selection: String,
    args: Vec<OperationArg>,
    limit: Option<u32>,
    supports_query: bool,
    item_field: Option<String>,
}

impl ListQuery {
    /// A list query on `field` whose items are read with `selection`.
    pub fn new(field: impl Into<String>, selection: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selection: selection.into(),
            args: Vec::new(),
            limit: None,
            supports_query: false,
            item_field: None,
        }
    }

    /// Adds a fixed argument, declared with the given GraphQL type.
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

    /// Adds a fixed argument from any serializable value.
    ///
    /// Fails with [`NetworkError::Json`] if the value does not serialize.
    pub fn try_arg(
        self,
        name: impl Into<String>,
        graphql_type: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.arg(name, graphql_type, value))
    }

    /// Requests at most `limit` items per page.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sends the collection's filter query as the `query` argument.
    pub fn with_query_arg(mut self) -> Self {
        self.supports_query = true;
        self
    }

    /// Reads each item from a nested field of the returned row.
    pub fn with_item_field(mut self, field: impl Into<String>) -> Self {
        self.item_field = Some(field.into());
        self
    }

    /// The query's response field, e.g. `listViewFilesProxy`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Returns true if the filter query is sent to the backend.
    pub fn supports_query(&self) -> bool {
        self.supports_query
    }

    pub fn item_field(&self) -> Option<&str> {
        self.item_field.as_deref()
    }

    /// The value of a fixed argument.
    pub fn arg_value(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    /// The operation name used in the document.
    pub fn operation_name(&self) -> String {
        operation_name(&self.field)
    }

    /// Renders the GraphQL document.
    pub fn document(&self) -> String {
        let paging = [("nextToken", "String"), ("limit", "Int")];
        let query = self.supports_query.then_some(("query", "String"));
        let fixed = self
            .args
            .iter()
            .map(|arg| (arg.name.as_str(), arg.graphql_type.as_str()));
        let (declarations, arguments) = signature(fixed.chain(paging).chain(query));

        format!(
            "query {}({declarations}) {{ {}({arguments}) {{ items {{ {} }} nextToken }} }}",
            self.operation_name(),
            self.field,
            self.selection,
        )
    }

    /// Variables for the page starting at `cursor`.
    ///
    /// `nextToken` is always present (`null` for the first page). The
    /// filter query is sent as given; an empty one is sent as `null`.
    pub fn variables(&self, cursor: Option<&str>, query: &str) -> Map<String, Value> {
        let mut variables = Map::new();
        for arg in &self.args {
            variables.insert(arg.name.clone(), arg.value.clone());
        }
        variables.insert(
            "nextToken".into(),
            cursor.map_or(Value::Null, |c| Value::String(c.to_owned())),
        );
        if let Some(limit) = self.limit {
            variables.insert("limit".into(), Value::from(limit));
        }
        if self.supports_query {
            variables.insert(
                "query".into(),
                if query.is_empty() {
                    Value::Null
                } else {
                    Value::String(query.to_owned())
                },
            );
        }
        variables
    }

    /// Builds the request for the page starting at `cursor`.
    pub fn request(&self, cursor: Option<&str>, query: &str) -> GraphQLRequest {
        GraphQLRequest::query(self.document())
            .operation_name(self.operation_name())
            .variables(self.variables(cursor, query))
    }

    /// Projects visible to the caller.
    ///
    /// Rows are memberships with the project nested under `project`; the
    /// source yields the projects.
    pub fn projects() -> Self {
        Self::new(
            "listProjectsProxy",
            format!("projectId accountId access createdAt updatedAt project {{ {PROJECT_FIELDS} }}"),
        )
        .with_item_field("project")
    }

    /// All users, filtered server-side by the collection's query.
    pub fn users() -> Self {
        Self::new("listUsersProxy", USER_FIELDS).with_query_arg()
    }

    pub fn views(project_id: impl Into<String>) -> Self {
        Self::new(
            "listViewsProxy",
            "id projectId name description createdAt updatedAt",
        )
        .arg("projectId", "ID!", Value::String(project_id.into()))
        .with_query_arg()
    }

    pub fn project_files(project_id: impl Into<String>, images: ImageOptions) -> Self {
        Self::new(
            "listProjectFilesProxy",
            format!("projectId fileId createdAt updatedAt file {{ {FILE_FIELDS} }}"),
        )
        .arg("projectId", "ID!", Value::String(project_id.into()))
        .arg("imageOptions", "ImageOptionsProxyInput!", image_options(images))
    }

    pub fn view_files(
        project_id: impl Into<String>,
        view_id: impl Into<String>,
        images: ImageOptions,
    ) -> Self {
        Self::new("listViewFilesProxy", view_file_selection())
            .arg("projectId", "ID!", Value::String(project_id.into()))
            .arg("viewId", "ID!", Value::String(view_id.into()))
            .arg("imageOptions", "ImageOptionsProxy1Input!", image_options(images))
    }

    pub fn project_memberships(project_id: impl Into<String>) -> Self {
        Self::new(
            "listProjectMembershipsProxy",
            format!("accountId projectId access createdAt updatedAt user {{ {USER_FIELDS} }}"),
        )
        .arg("projectId", "ID!", Value::String(project_id.into()))
    }

    pub fn labels(project_id: impl Into<String>) -> Self {
        Self::new("listLabelsProxy", LABEL_FIELDS)
            .arg("projectId", "ID!", Value::String(project_id.into()))
    }

    pub fn prompts(project_id: impl Into<String>) -> Self {
        Self::new(
            "listPromptsProxy",
            "id projectId summary description activeVersion createdAt updatedAt",
        )
        .arg("projectId", "ID!", Value::String(project_id.into()))
    }

    /// Labels attached to one prompt.
    pub fn prompt_labels(project_id: impl Into<String>, prompt_id: impl Into<String>) -> Self {
        Self::new("listPromptLabelsProxy", LABEL_FIELDS)
            .arg("projectId", "ID!", Value::String(project_id.into()))
            .arg("promptId", "ID!", Value::String(prompt_id.into()))
    }

    pub fn classifications(project_id: impl Into<String>) -> Self {
        Self::new(
            "listClassificationsProxy",
            "id projectId viewId promptId version name description createdAt updatedAt",
        )
        .arg("projectId", "ID!", Value::String(project_id.into()))
    }

    pub fn classification_candidates(
        classification_id: impl Into<String>,
        images: ImageOptions,
    ) -> Self {
        Self::new(
            "listClassificationCandidatesProxy",
            format!(
                "classificationId fileId status resultId file {{ {FILE_FIELDS} }} \
                 result {{ id classificationId fileId labelId confidence label {{ {LABEL_FIELDS} }} }}"
            ),
        )
        .arg("classificationId", "ID!", Value::String(classification_id.into()))
        .arg("imageOptions", "ImageOptionsProxy2Input!", image_options(images))
    }
}

/// A [`PageSource`] that reads one [`ListQuery`] through a
/// [`GraphQLClient`].
///
/// Transport and GraphQL failures are classified with
/// [`NetworkError::into_fetch_error`]; a `null` list field is a validation
/// error.
pub struct GraphQLPageSource<T> {
    client: GraphQLClient,
    query: ListQuery,
    _marker: PhantomData<fn() -> T>,
}

impl<T> GraphQLPageSource<T> {
    pub fn new(client: GraphQLClient, query: ListQuery) -> Self {
        Self {
            client,
            query,
            _marker: PhantomData,
        }
    }

    pub fn client(&self) -> &GraphQLClient {
        &self.client
    }

    pub fn list_query(&self) -> &ListQuery {
        &self.query
    }
}

impl<T: DeserializeOwned> GraphQLPageSource<T> {
    /// Fetches one page, keeping the transport error.
    pub async fn fetch_page(&self, cursor: Option<&str>, query: &str) -> Result<Page<T>> {
        let request = self.query.request(cursor, query);
        let response = self.client.execute(request).await?;
        let page: Page<Value> = response.field(self.query.field())?;

        let items = page
            .items
            .into_iter()
            .map(|item| self.decode_item(item))
            .collect::<Result<Vec<T>>>()?;

        tracing::debug!(
            target: targets::GRAPHQL,
            field = self.query.field(),
            items = items.len(),
            has_next = page.next_cursor.is_some(),
            "page received"
        );
        Ok(Page {
            items,
            next_cursor: page.next_cursor,
        })
    }

    fn decode_item(&self, item: Value) -> Result<T> {
        let item = match self.query.item_field() {
            Some(nested) => match item {
                Value::Object(mut row) => row
                    .remove(nested)
                    .filter(|value| !value.is_null())
                    .ok_or_else(|| {
                        NetworkError::InvalidBody(format!(
                            "'{}' item is missing '{}'",
                            self.query.field(),
                            nested
                        ))
                    })?,
                _ => {
                    return Err(NetworkError::InvalidBody(format!(
                        "'{}' item is not an object",
                        self.query.field()
                    )));
                }
            },
            None => item,
        };
        serde_json::from_value(item).map_err(|e| {
            NetworkError::Json(format!(
                "Failed to deserialize '{}' item: {}",
                self.query.field(),
                e
            ))
        })
    }
}

impl<T: DeserializeOwned + Send> PageSource<T> for GraphQLPageSource<T> {
    fn get_page(
        &self,
        cursor: Option<&str>,
        query: &str,
    ) -> impl Future<Output = FetchResult<Page<T>>> + Send {
        async move {
            self.fetch_page(cursor, query)
                .await
                .map_err(NetworkError::into_fetch_error)
        }
    }
}

impl<T> std::fmt::Debug for GraphQLPageSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLPageSource")
            .field("client", &self.client)
            .field("query", &self.query)
            .finish()
    }
}
