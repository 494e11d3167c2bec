//! Client tests against a wiremock server

use capmig_config::{EurekaConfig, OkapiConfig};
use capmig_core::CapabilityLookup;
use capmig_http::{EurekaClient, HttpClient, OkapiClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn okapi_config(url: &str) -> OkapiConfig {
    OkapiConfig {
        url: url.to_string(),
        tenant: "diku".to_string(),
        username: "migrator".to_string(),
        password: "secret".to_string(),
        token_ttl_secs: 300,
        page_size: 2,
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/authn/login"))
        .and(header("x-okapi-tenant", "diku"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("x-okapi-token", "token-123"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn okapi_login_caches_token_within_ttl() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = OkapiClient::new(
        HttpClient::with_defaults().unwrap(),
        okapi_config(&server.uri()),
    );
    assert_eq!(client.login().await.unwrap(), "token-123");
    assert_eq!(client.login().await.unwrap(), "token-123");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn okapi_permissions_follow_pagination() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/perms/permissions"))
        .and(query_param("start", "1"))
        .and(header("x-okapi-token", "token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": [
                { "permissionName": "perms.a", "mutable": true },
                { "permissionName": "perms.b" }
            ],
            "totalRecords": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/perms/permissions"))
        .and(query_param("start", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": [ { "permissionName": "perms.c" } ],
            "totalRecords": 3
        })))
        .mount(&server)
        .await;

    let client = OkapiClient::new(
        HttpClient::with_defaults().unwrap(),
        okapi_config(&server.uri()),
    );
    let permissions = client.permissions().await.unwrap();
    let names: Vec<&str> = permissions.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["perms.a", "perms.b", "perms.c"]);
    assert!(permissions[0].mutable);
}

#[tokio::test]
async fn okapi_module_permissions_map_descriptors() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/_/proxy/tenants/diku/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "mod-orders-1.0",
                "permissionSets": [ { "permissionName": "orders.item.get" } ]
            }
        ])))
        .mount(&server)
        .await;

    let client = OkapiClient::new(
        HttpClient::with_defaults().unwrap(),
        okapi_config(&server.uri()),
    );
    let modules = client.module_permissions().await.unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].module_id, "mod-orders-1.0");
    assert_eq!(modules[0].permission_sets[0].name, "orders.item.get");
}

fn eureka_config(url: &str) -> EurekaConfig {
    EurekaConfig {
        url: url.to_string(),
        page_size: 50,
    }
}

#[tokio::test]
async fn eureka_directory_prioritizes_capability_sets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/capabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "capabilities": [
                { "id": "cap-1", "name": "orders_view", "permission": "orders.view" }
            ],
            "totalRecords": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/capability-sets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "capabilitySets": [
                { "id": "set-1", "name": "orders_manage", "permission": "orders.view" }
            ],
            "totalRecords": 1
        })))
        .mount(&server)
        .await;

    let client = EurekaClient::new(
        HttpClient::with_defaults().unwrap(),
        eureka_config(&server.uri()),
    );
    let directory = client.capability_directory().await.unwrap();
    let (kind, resolved) = directory.resolve("orders.view");
    assert_eq!(kind, capmig_core::ResolvedKind::CapabilitySet);
    assert_eq!(resolved.unwrap().id, "set-1");
}

#[tokio::test]
async fn eureka_create_role_posts_and_decodes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/roles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "role-1",
            "name": "Acquisitions staff"
        })))
        .mount(&server)
        .await;

    let client = EurekaClient::new(
        HttpClient::with_defaults().unwrap(),
        eureka_config(&server.uri()),
    );
    let role = client
        .create_role("Acquisitions staff", Some("migrated"))
        .await
        .unwrap();
    assert_eq!(role.id, "role-1");
}

#[tokio::test]
async fn http_errors_surface_status_and_body() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/perms/permissions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = OkapiClient::new(
        HttpClient::with_defaults().unwrap(),
        okapi_config(&server.uri()),
    );
    let err = client.permissions().await.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("boom"));
}
