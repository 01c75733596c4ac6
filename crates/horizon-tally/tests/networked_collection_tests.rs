//! Collections fed by the GraphQL page source against a mocked backend.

use std::sync::Arc;

use horizon_tally::collection::{
    CollectionKey, CollectionRegistry, FetchStatus, PagedCollection, SortKey, SortSpec,
};
use horizon_tally::config::{ConfigError, TallyConfig};
use horizon_tally::net::{GraphQLPageSource, ListQuery, Mutation};
use horizon_tally::FetchErrorKind;
use horizon_tally::records::{Label, ViewFile};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn view_file(file_id: &str, name: &str) -> serde_json::Value {
    json!({
        "viewId": "v1",
        "fileId": file_id,
        "labelId": null,
        "createdAt": "2024-11-02T10:00:00Z",
        "updatedAt": "2024-11-02T10:00:00Z",
        "file": {
            "id": file_id,
            "name": name,
            "path": format!("projects/p1/{name}"),
            "createdAt": "2024-11-02T10:00:00Z",
            "updatedAt": "2024-11-02T10:00:00Z"
        }
    })
}

fn config_for(server: &MockServer) -> TallyConfig {
    TallyConfig::from_toml_str(&format!(
        r#"
        [api]
        endpoint = "{}/graphql"
        api_key = "test-key"

        [paging]
        page_size = 2

        [images]
        width = 128
        height = 128
        "#,
        server.uri()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_view_files_load_all() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(json!({
            "variables": {
                "projectId": "p1",
                "viewId": "v1",
                "nextToken": null,
                "limit": 2,
                "imageOptions": { "width": 128, "height": 128, "format": "webp" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listViewFilesProxy": {
                "items": [view_file("f1", "b.png"), view_file("f2", "a.png")],
                "nextToken": "t1"
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "nextToken": "t1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listViewFilesProxy": {
                "items": [view_file("f2", "a-renamed.png"), view_file("f3", "c.png")],
                "nextToken": null
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = config.graphql_client().unwrap();
    let source: GraphQLPageSource<ViewFile> = config.page_source(
        client,
        ListQuery::view_files("p1", "v1", config.images),
    );
    let collection = PagedCollection::new(source)
        .with_label("view-files")
        .with_max_pages(config.paging.max_pages_per_load_all);

    let loaded = collection.fetch_all().await.unwrap();
    assert_eq!(loaded.pages, 2);
    assert!(loaded.exhausted);
    assert_eq!(collection.status(), FetchStatus::Idle);

    let snapshot = collection.snapshot();
    assert_eq!(snapshot.ids(), vec!["f1", "f2", "f3"]);

    let by_name: SortSpec<ViewFile> =
        SortKey::by_ord("name", |f: &ViewFile| f.file.name.clone()).into();
    let view = snapshot.derive_view(Some(&by_name), None).unwrap();
    let names: Vec<&str> = view.iter().map(|f| f.file.name.as_str()).collect();
    assert_eq!(names, vec!["a-renamed.png", "b.png", "c.png"]);
}

#[tokio::test]
async fn test_unauthorized_keeps_collection_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": null },
            "errors": [{ "message": "Unauthorized", "errorType": "Lambda:Unhandled" }]
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let source: GraphQLPageSource<Label> =
        config.page_source(config.graphql_client().unwrap(), ListQuery::labels("p1"));
    let collection = PagedCollection::new(source);

    let err = collection.fetch_next().await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Auth);
    assert_eq!(collection.status(), FetchStatus::Error);
    assert_eq!(collection.last_error(), Some(err));
    assert!(collection.is_empty());
    assert!(collection.has_more());
}

#[tokio::test]
async fn test_registry_shares_network_collections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listLabelsProxy": {
                "items": [{ "id": "l1", "name": "cat", "description": "" }],
                "nextToken": null
            } }
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = config.graphql_client().unwrap();
    let registry = CollectionRegistry::new();
    let key = CollectionKey::new("labels").with_param("projectId", "p1");

    let make = |key: &CollectionKey| {
        let project_id = key.param("projectId").unwrap_or_default();
        PagedCollection::new(config.page_source::<Label>(client.clone(), ListQuery::labels(project_id)))
    };
    let first = registry.get_or_insert_with(key.clone(), make);
    first.fetch_next().await.unwrap();

    let again = registry.get_or_insert_with(key.clone(), make);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(again.len(), 1);

    assert_eq!(registry.invalidate_prefix(&CollectionKey::new("labels")), 1);
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_mutations_patch_loaded_view_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "ListViewFilesProxy" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listViewFilesProxy": {
                "items": [view_file("f1", "a.png"), view_file("f2", "b.png")],
                "nextToken": null
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut labelled = view_file("f1", "a.png");
    labelled["labelId"] = json!("l1");
    labelled["label"] = json!({ "id": "l1", "name": "cat", "description": "" });
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "operationName": "SetViewFileLabelProxy",
            "variables": { "projectId": "p1", "viewId": "v1", "fileId": "f1", "labelId": "l1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "setViewFileLabelProxy": labelled }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "operationName": "DeleteViewFileProxy",
            "variables": { "projectId": "p1", "viewId": "v1", "fileId": "f2" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "deleteViewFileProxy": view_file("f2", "b.png") }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = config.graphql_client().unwrap();
    let source: GraphQLPageSource<ViewFile> = config.page_source(
        client.clone(),
        ListQuery::view_files("p1", "v1", config.images),
    );
    let collection = PagedCollection::new(source).with_label("view-files");
    collection.fetch_all().await.unwrap();

    let updated: ViewFile = client
        .mutate(&Mutation::set_view_file_label("p1", "v1", "f1", Some("l1")))
        .await
        .unwrap();
    assert!(!collection.upsert_item(updated));

    let removed: ViewFile = client
        .mutate(&Mutation::delete_view_file("p1", "v1", "f2"))
        .await
        .unwrap();
    assert!(collection.remove_item(&removed.file_id).is_some());

    let snapshot = collection.snapshot();
    assert_eq!(snapshot.ids(), vec!["f1"]);
    let file = &snapshot.items[0];
    assert_eq!(file.label_id.as_deref(), Some("l1"));
    assert_eq!(file.label.as_ref().map(|l| l.name.as_str()), Some("cat"));
}

#[test]
fn test_client_requires_endpoint() {
    let err = TallyConfig::default().graphql_client().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "api.endpoint",
            ..
        }
    ));
}
