//! Tests for view file mutations against a mocked endpoint.

use horizon_tally_net::{GraphQLClient, Mutation, NetworkError};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewFileRow {
    file_id: String,
    label_id: Option<String>,
}

fn client(server: &MockServer) -> GraphQLClient {
    GraphQLClient::builder(format!("{}/graphql", server.uri()))
        .api_key("test-key")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_set_label_sends_mutation_and_decodes_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(json!({
            "operationName": "SetViewFileLabelProxy",
            "variables": { "projectId": "p1", "viewId": "v1", "fileId": "f1", "labelId": "l1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "setViewFileLabelProxy": { "fileId": "f1", "labelId": "l1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let row: ViewFileRow = client(&server)
        .mutate(&Mutation::set_view_file_label("p1", "v1", "f1", Some("l1")))
        .await
        .unwrap();
    assert_eq!(row.file_id, "f1");
    assert_eq!(row.label_id.as_deref(), Some("l1"));
}

#[tokio::test]
async fn test_clearing_label_sends_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "labelId": null } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "setViewFileLabelProxy": { "fileId": "f1", "labelId": null } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let row: ViewFileRow = client(&server)
        .mutate(&Mutation::set_view_file_label("p1", "v1", "f1", None))
        .await
        .unwrap();
    assert!(row.label_id.is_none());
}

#[tokio::test]
async fn test_mutation_errors_are_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{
                "message": "Unauthorized (project membership access level is not MANAGE)",
                "errorType": "Lambda:Unhandled"
            }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .mutate::<ViewFileRow>(&Mutation::delete_view_file("p1", "v1", "f1"))
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::GraphQL { .. }));
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_null_mutation_result_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "deleteViewFileProxy": null }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .mutate::<ViewFileRow>(&Mutation::delete_view_file("p1", "v1", "f1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NetworkError::NoData {
            field: "deleteViewFileProxy".into()
        }
    );
}
