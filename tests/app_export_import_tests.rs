mod common;

use apictl::archive::{extract_archive, read_meta_file};
use apictl::client::{ApimClient, Auth};
use apictl::compare::{application_differences, subscription_differences, CompareOptions};
use apictl::config::{EnvironmentConfig, Settings};
use apictl::constants::META_FILE_APPLICATION;
use apictl::credentials::KeyStore;
use common::{assert_success, contains_bytes, mount_oauth, platform_zip, stderr, stdout, Apictl};
use std::fs;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP_NAME: &str = "Sample App";
const OWNER: &str = "admin";

fn application_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "applicationId": id,
        "name": APP_NAME,
        "throttlingPolicy": "Unlimited",
        "description": "Sample application",
        "tokenType": "JWT",
        "status": "APPROVED",
        "groups": [],
        "subscriptionCount": 1,
        "keys": [],
        "attributes": {"team": "integration"},
        "subscriptionScopes": [],
        "owner": OWNER,
        "hashEnabled": false
    })
}

fn subscriptions_json(app_id: &str, sub_id: &str, api_id: &str) -> serde_json::Value {
    serde_json::json!({
        "count": 1,
        "list": [{
            "subscriptionId": sub_id,
            "applicationId": app_id,
            "apiId": api_id,
            "throttlingPolicy": "Gold",
            "status": "UNBLOCKED"
        }]
    })
}

/// Serve one application and its subscriptions under the given id
async fn mount_application(server: &MockServer, app_id: &str, sub_id: &str, api_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/am/store/v1/applications/{app_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_json(app_id)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/am/store/v1/subscriptions"))
        .and(query_param("applicationId", app_id))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(subscriptions_json(app_id, sub_id, api_id)),
        )
        .mount(server)
        .await;
}

async fn mount_export(server: &MockServer) {
    let exported = platform_zip(
        "admin-Sample App",
        &[
            ("Application.yaml", "type: application\ndata:\n  name: Sample App\n"),
            ("keys/keys.yaml", "[]\n"),
        ],
    );
    Mock::given(method("GET"))
        .and(path("/api/am/store/v1/applications/export"))
        .and(query_param("appName", APP_NAME))
        .and(query_param("appOwner", OWNER))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(exported))
        .mount(server)
        .await;
}

fn rest_client(env: &str, server: &MockServer) -> ApimClient {
    let endpoints = EnvironmentConfig {
        apim_endpoint: server.uri(),
        ..Default::default()
    };
    ApimClient::new(
        env,
        &endpoints,
        &Settings::default(),
        false,
        Auth::Bearer("test-token".to_string()),
    )
    .unwrap()
}

async fn import_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/api/am/store/v1/applications/import")
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_import_app_between_environments() {
    let dev = MockServer::start().await;
    let prod = MockServer::start().await;
    mount_oauth(&dev).await;
    mount_oauth(&prod).await;
    mount_export(&dev).await;
    mount_application(&dev, "dev-app-1", "dev-sub-1", "dev-api-1").await;
    mount_application(&prod, "prod-app-7", "prod-sub-3", "prod-api-9").await;

    // no flags given: the meta file written at export decides
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/import"))
        .and(query_param("preserveOwner", "true"))
        .and(query_param("update", "true"))
        .and(query_param("skipApplicationKeys", "true"))
        .and(query_param("skipSubscriptions", "false"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&prod)
        .await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.setup_env("prod", &prod.uri()).await;
    cli.login("dev", "admin", "admin").await;

    let out = cli
        .run_async(&["export-app", "-n", APP_NAME, "-o", OWNER, "-e", "dev"])
        .await;
    assert_success(&out);
    assert!(stdout(&out).contains("Successfully exported Application!"));

    let archive_path = cli.app_archive_path("dev", APP_NAME, OWNER);
    assert!(archive_path.exists(), "missing {}", archive_path.display());
    let archive = fs::read(&archive_path).unwrap();
    let meta = read_meta_file(&archive, META_FILE_APPLICATION)
        .unwrap()
        .expect("archive carries application_meta.yaml");
    assert_eq!(meta.name, APP_NAME);
    assert_eq!(meta.owner.as_deref(), Some(OWNER));

    cli.login("prod", "admin", "admin").await;
    let archive_arg = archive_path.to_string_lossy().into_owned();
    let out = cli
        .run_async(&["import-app", "-f", &archive_arg, "-e", "prod"])
        .await;
    assert_success(&out);
    assert!(stdout(&out).contains("Successfully imported Application!"));

    let uploads = import_requests(&prod).await;
    assert_eq!(uploads.len(), 1);
    assert!(contains_bytes(&uploads[0].body, b"application_meta.yaml"));

    let dev_client = rest_client("dev", &dev);
    let prod_client = rest_client("prod", &prod);
    let source = dev_client.get_application("dev-app-1").await.unwrap();
    let imported = prod_client.get_application("prod-app-7").await.unwrap();
    assert!(
        application_differences(&source, &imported, CompareOptions::default()).is_empty(),
        "Application objects are not equal"
    );

    let source_subs = dev_client.list_subscriptions("dev-app-1").await.unwrap();
    let imported_subs = prod_client.list_subscriptions("prod-app-7").await.unwrap();
    assert!(
        subscription_differences(&source_subs, &imported_subs).is_empty(),
        "Subscriptions objects are not equal"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_failure_leaves_no_archive() {
    let dev = MockServer::start().await;
    mount_oauth(&dev).await;
    Mock::given(method("GET"))
        .and(path("/api/am/store/v1/applications/export"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&dev)
        .await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.login("dev", "tenant-admin", "admin").await;

    let out = cli
        .run_async(&["export-app", "-n", APP_NAME, "-o", OWNER, "-e", "dev"])
        .await;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Error exporting Application: 403 Forbidden"));
    assert!(!cli.app_archive_path("dev", APP_NAME, OWNER).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_flags_override_meta_file() {
    let dev = MockServer::start().await;
    let prod = MockServer::start().await;
    mount_oauth(&dev).await;
    mount_oauth(&prod).await;
    mount_export(&dev).await;
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/import"))
        .and(query_param("preserveOwner", "false"))
        .and(query_param("update", "true"))
        .and(query_param("skipApplicationKeys", "false"))
        .and(query_param("skipSubscriptions", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&prod)
        .await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.setup_env("prod", &prod.uri()).await;

    let out = cli
        .run_async(&[
            "export-app", "-n", APP_NAME, "-o", OWNER, "-e", "dev", "-u", "admin", "-p", "admin",
        ])
        .await;
    assert_success(&out);

    let archive_arg = cli
        .app_archive_path("dev", APP_NAME, OWNER)
        .to_string_lossy()
        .into_owned();
    let out = cli
        .run_async(&[
            "import-app",
            "-f",
            &archive_arg,
            "-e",
            "prod",
            "--preserve-owner=false",
            "--skip-keys=false",
            "--skip-subscriptions",
            "-u",
            "admin",
            "-p",
            "admin",
        ])
        .await;
    assert_success(&out);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_from_extracted_directory() {
    let dev = MockServer::start().await;
    let prod = MockServer::start().await;
    mount_oauth(&dev).await;
    mount_oauth(&prod).await;
    mount_export(&dev).await;
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/import"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&prod)
        .await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.setup_env("prod", &prod.uri()).await;
    cli.login("dev", "admin", "admin").await;
    cli.login("prod", "admin", "admin").await;

    let out = cli
        .run_async(&["export-app", "-n", APP_NAME, "-o", OWNER, "-e", "dev"])
        .await;
    assert_success(&out);

    let archive = fs::read(cli.app_archive_path("dev", APP_NAME, OWNER)).unwrap();
    let extracted = cli.config_dir.path().join("extracted");
    extract_archive(&archive, &extracted).unwrap();
    let app_dir = extracted.join("admin-Sample App");
    assert!(app_dir.join(META_FILE_APPLICATION).exists());

    let dir_arg = app_dir.to_string_lossy().into_owned();
    let out = cli
        .run_async(&["import-app", "-f", &dir_arg, "-e", "prod"])
        .await;
    assert_success(&out);

    let uploads = import_requests(&prod).await;
    assert_eq!(uploads.len(), 1);
    assert!(contains_bytes(&uploads[0].body, b"admin-Sample App/Application.yaml"));
    assert!(contains_bytes(&uploads[0].body, b"admin-Sample App/application_meta.yaml"));
}

/// Two admin apps and one of user1, as the devportal lists them
async fn mount_app_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/am/store/v1/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 3,
            "list": [
                {"applicationId": "a-1", "name": APP_NAME, "owner": OWNER, "status": "APPROVED"},
                {"applicationId": "a-2", "name": "DefaultApplication", "owner": OWNER},
                {"applicationId": "u-1", "name": APP_NAME, "owner": "user1"}
            ]
        })))
        .mount(server)
        .await;
}

fn has_query_param(request: &wiremock::Request, key: &str) -> bool {
    request.url.query_pairs().any(|(k, _)| k == key)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_apps_with_owner_as_json_array() {
    let dev = MockServer::start().await;
    mount_oauth(&dev).await;
    mount_app_listing(&dev).await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.login("dev", "admin", "admin").await;

    let out = cli
        .run_async(&["list-apps", "-e", "dev", "-o", OWNER, "--format", "jsonArray"])
        .await;
    assert_success(&out);
    let listed: Vec<serde_json::Value> = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|app| app["owner"] == OWNER));

    let out = cli
        .run_async(&["list-apps", "-e", "dev", "-o", "nobody", "--format", "jsonArray"])
        .await;
    assert_success(&out);
    let listed: Vec<serde_json::Value> = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(listed.is_empty());

    // the devportal `query` parameter matches names, never owners
    let requests = dev.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .filter(|r| r.url.path() == "/api/am/store/v1/applications")
        .all(|r| !has_query_param(r, "query")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_app_of_owner() {
    let dev = MockServer::start().await;
    mount_oauth(&dev).await;
    mount_app_listing(&dev).await;
    Mock::given(method("GET"))
        .and(path("/api/am/store/v1/applications/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "applicationId": "u-1",
            "name": APP_NAME,
            "owner": "user1"
        })))
        .mount(&dev)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/am/store/v1/applications/u-1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&dev)
        .await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;
    cli.login("dev", "admin", "admin").await;

    let out = cli
        .run_async(&["delete-app", "-n", APP_NAME, "-o", "user1", "-e", "dev"])
        .await;
    assert_success(&out);
    assert!(stdout(&out).contains("Sample App Application deleted successfully!"));

    let out = cli
        .run_async(&["delete-app", "-n", APP_NAME, "-o", "user2", "-e", "dev"])
        .await;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Application 'Sample App' not found in dev"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oauth_client_is_registered_once() {
    let dev = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/client-registration/v0.17/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "clientId": "test-client",
            "clientSecret": "test-secret"
        })))
        .expect(1)
        .mount(&dev)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "test-token"})),
        )
        .expect(2)
        .mount(&dev)
        .await;
    mount_app_listing(&dev).await;

    let cli = Apictl::new();
    cli.setup_env("dev", &dev.uri()).await;

    // no login: the first command registers and stores the client
    let out = cli
        .run_async(&["list-apps", "-e", "dev", "-u", "admin", "-p", "admin"])
        .await;
    assert_success(&out);
    let store = KeyStore::load(&cli.config_dir.path().join("keys.yaml")).unwrap();
    assert_eq!(store.get("dev").unwrap().client_id, "test-client");

    let out = cli.run_async(&["list-apps", "-e", "dev"]).await;
    assert_success(&out);
    assert!(stdout(&out).contains(APP_NAME));
}
