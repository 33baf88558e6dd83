//! API surface tests against a mock server.

use cumulus_client::{ActivityState, AddDomainRequest, ApiClient, ApiError, SslBundle};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn environment_json(id: &str, status: &str, parent: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "status": status,
        "parent": parent,
        "created_at": "2024-03-01T12:00:00Z",
        "operations": ["backup", "synchronize"]
    })
}

fn activity_json(id: &str, activity_type: &str, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": activity_type,
        "payload": {},
        "created_at": "2024-03-01T12:00:00Z",
        "state": state,
        "operations": []
    })
}

#[tokio::test]
async fn lists_environments() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                environment_json("main", "active", None),
                environment_json("feature-x", "inactive", Some("main")),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let environments = client.environments("p1").await.unwrap();

    assert_eq!(environments.len(), 2);
    assert!(environments[0].is_active());
    assert_eq!(environments[1].parent.as_deref(), Some("main"));
}

#[tokio::test]
async fn deactivate_returns_activity_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p1/environments/feature-x/deactivate"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(activity_json("act_1", "environment.deactivate", "pending")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let activity = client
        .deactivate_environment("p1", "feature-x")
        .await
        .unwrap();

    assert_eq!(activity.id, "act_1");
    assert_eq!(activity.state, ActivityState::Pending);
}

#[tokio::test]
async fn delete_succeeds_on_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/projects/p1/environments/feature-x"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    client.delete_environment("p1", "feature-x").await.unwrap();
}

#[tokio::test]
async fn remote_rejection_preserves_code_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/projects/p1/environments/main"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "environment_active",
            "message": "Cannot delete an active environment"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let err = client.delete_environment("p1", "main").await.unwrap_err();

    match err {
        ApiError::Remote {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(code, "environment_active");
            assert_eq!(message, "Cannot delete an active environment");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_dedicated_variant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/environments"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "unauthorized",
            "message": "Token expired"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let err = client.environments("p1").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn missing_environment_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/environments/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found",
            "message": "No such environment"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let err = client.environment("p1", "ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn activity_listing_passes_limit_and_type_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/environments/main/activities"))
        .and(query_param("limit", "1"))
        .and(query_param("type", "environment.backup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [activity_json("act_9", "environment.backup", "complete")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let activities = client
        .environment_activities("p1", "main", 1, Some("environment.backup"))
        .await
        .unwrap();

    assert_eq!(activities.len(), 1);
    assert!(activities[0].is_complete());
}

#[tokio::test]
async fn add_domain_submits_ssl_bundle_inline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p1/domains"))
        .and(body_partial_json(json!({
            "name": "example.com",
            "wildcard": false,
            "ssl": {
                "certificate": "CERT",
                "key": "KEY",
                "chain": ["CHAIN-1"]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "name": "example.com",
            "wildcard": false,
            "created_at": "2024-03-01T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok")).unwrap();
    let domain = client
        .add_domain(
            "p1",
            &AddDomainRequest {
                name: "example.com".to_string(),
                wildcard: false,
                ssl: Some(SslBundle {
                    certificate: "CERT".to_string(),
                    key: "KEY".to_string(),
                    chain: vec!["CHAIN-1".to_string()],
                }),
            },
        )
        .await
        .unwrap();

    assert_eq!(domain.name, "example.com");
}
