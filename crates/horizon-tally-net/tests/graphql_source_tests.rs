//! Tests for GraphQL page sources against a mocked endpoint.

use std::time::Duration;

use horizon_tally_core::{FetchErrorKind, Identified, ImageOptions, PageSource};
use horizon_tally_net::{GraphQLClient, GraphQLPageSource, ListQuery, NetworkError};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Label {
    id: String,
    name: String,
}

impl Identified for Label {
    fn id(&self) -> &str {
        &self.id
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(server: &MockServer) -> GraphQLClient {
    GraphQLClient::builder(format!("{}/graphql", server.uri()))
        .api_key("test-key")
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn labels_source(server: &MockServer) -> GraphQLPageSource<Label> {
    GraphQLPageSource::new(client(server), ListQuery::labels("p1").with_limit(2))
}

#[tokio::test]
async fn test_pages_through_next_token() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(json!({
            "operationName": "ListLabelsProxy",
            "variables": { "projectId": "p1", "nextToken": null, "limit": 2 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": {
                "items": [
                    { "id": "l1", "name": "cat", "description": "" },
                    { "id": "l2", "name": "dog", "description": "" }
                ],
                "nextToken": "t1"
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "nextToken": "t1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": {
                "items": [{ "id": "l3", "name": "bird", "description": "" }],
                "nextToken": null
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = labels_source(&server);

    let first = source.get_page(None, "").await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].name, "cat");
    assert_eq!(first.next_cursor.as_deref(), Some("t1"));

    let second = source.get_page(Some("t1"), "").await.unwrap();
    assert_eq!(second.items[0].id(), "l3");
    assert!(second.is_last());
}

#[tokio::test]
async fn test_null_list_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "listLabelsProxy": null } })),
        )
        .mount(&server)
        .await;

    let err = labels_source(&server).get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Validation);
    assert!(err.message.contains("No data returned"));
}

#[tokio::test]
async fn test_http_status_classification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "projectId": "p1" } })))
        .respond_with(ResponseTemplate::new(401).set_body_string("UnauthorizedException"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "projectId": "p2" } })))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = labels_source(&server).get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Auth);

    let source: GraphQLPageSource<Label> =
        GraphQLPageSource::new(client(&server), ListQuery::labels("p2"));
    let err = source.get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Server);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_graphql_error_classification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "projectId": "p1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": null },
            "errors": [{
                "message": "Unauthorized",
                "errorType": "Lambda:Unhandled",
                "path": ["listLabelsProxy"]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "projectId": "p2" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{
                "message": "Failed to list labels",
                "errorType": "Lambda:Unhandled"
            }]
        })))
        .mount(&server)
        .await;

    let err = labels_source(&server).get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Auth);

    let source: GraphQLPageSource<Label> =
        GraphQLPageSource::new(client(&server), ListQuery::labels("p2"));
    let err = source.fetch_page(None, "").await.unwrap_err();
    assert_eq!(
        err,
        NetworkError::GraphQL {
            message: "Failed to list labels".into(),
            error_type: Some("Lambda:Unhandled".into()),
        }
    );
    assert_eq!(err.into_fetch_error().kind, FetchErrorKind::Server);
}

#[tokio::test]
async fn test_malformed_items_are_validation_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": { "items": [{ "id": 7 }], "nextToken": null } }
        })))
        .mount(&server)
        .await;

    let err = labels_source(&server).get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Validation);
}

#[tokio::test]
async fn test_non_json_body_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = labels_source(&server).get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Validation);
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = GraphQLClient::builder(format!("{}/graphql", server.uri()))
        .request_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let source: GraphQLPageSource<Label> = GraphQLPageSource::new(client, ListQuery::labels("p1"));

    let err = source.get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Network);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = GraphQLClient::builder(format!("http://127.0.0.1:{port}/graphql"))
        .build()
        .unwrap();
    let source: GraphQLPageSource<Label> = GraphQLPageSource::new(client, ListQuery::labels("p1"));

    let err = source.get_page(None, "").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Network);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRow {
    id: String,
    name: String,
}

#[tokio::test]
async fn test_projects_are_unwrapped_from_membership_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "ListProjectsProxy" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listProjectsProxy": {
                "items": [{
                    "projectId": "p1",
                    "accountId": "u1",
                    "access": "VIEW",
                    "project": { "id": "p1", "name": "Cats" }
                }],
                "nextToken": null
            } }
        })))
        .mount(&server)
        .await;

    let source: GraphQLPageSource<ProjectRow> =
        GraphQLPageSource::new(client(&server), ListQuery::projects());
    let page = source.get_page(None, "").await.unwrap();
    assert_eq!(page.items[0].id, "p1");
    assert_eq!(page.items[0].name, "Cats");
}

#[tokio::test]
async fn test_image_options_and_query_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": {
                "classificationId": "c1",
                "imageOptions": { "width": 256, "height": 256, "format": "webp" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listClassificationCandidatesProxy": { "items": [], "nextToken": null } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "query": "alice" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listUsersProxy": { "items": [], "nextToken": null } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates: GraphQLPageSource<serde_json::Value> = GraphQLPageSource::new(
        client(&server),
        ListQuery::classification_candidates("c1", ImageOptions::square(256)),
    );
    assert!(candidates.get_page(None, "").await.unwrap().items.is_empty());

    let users: GraphQLPageSource<serde_json::Value> =
        GraphQLPageSource::new(client(&server), ListQuery::users());
    assert!(users.get_page(None, "alice").await.unwrap().is_last());
}
