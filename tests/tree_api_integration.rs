use std::sync::Arc;

use genea_tree::auth::TokenVerifier;
use genea_tree::config::AppConfig;
use genea_tree::{serve_store, CurrentUser, MemoryStore};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const SECRET: &str = "integration-test-secret";

// Test client wrapper for making authenticated API calls
struct TestClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TestClient {
    fn new(base_url: String, user_id: &str) -> Self {
        let user = CurrentUser {
            id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
        };
        let token = TokenVerifier::new(SECRET)
            .issue(&user, chrono::Duration::hours(1))
            .expect("Failed to sign test token");

        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&json)
            .send()
            .await
    }

    async fn put(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .delete(&format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
    }
}

async fn expect_json(response: reqwest::Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(status, expected, "unexpected status, body: {}", body);
    body
}

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("No local address");

    let mut config = AppConfig::default();
    config.environment = "test".to_string();

    tokio::spawn(async move {
        let store = Arc::new(MemoryStore::new());
        serve_store(listener, store, TokenVerifier::new(SECRET), &config)
            .await
            .expect("Server stopped with an error");
    });

    format!("http://{}", address)
}

async fn add_person(client: &TestClient, tree_id: &str, first: &str, gender: &str) -> String {
    let body = expect_json(
        client
            .post(
                &format!("/api/persons/tree/{}", tree_id),
                json!({ "firstName": first, "lastName": "Martin", "gender": gender }),
            )
            .await
            .expect("Failed to create person"),
        StatusCode::CREATED,
    )
    .await;
    body["person"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_family_tree_complete_workflow() {
    let base_url = start_server().await;
    let client = TestClient::new(base_url.clone(), "owner-1");

    // 0. Health is public
    let health = Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("Health check failed");
    let health = expect_json(health, StatusCode::OK).await;
    assert_eq!(health["status"], "OK");

    // 1. Create a tree with a named root
    let created = expect_json(
        client
            .post(
                "/api/family-trees",
                json!({
                    "name": "Martin family",
                    "description": "Paternal side",
                    "rootPerson": { "firstName": "Louis", "lastName": "Martin", "gender": "male" }
                }),
            )
            .await
            .expect("Failed to create tree"),
        StatusCode::CREATED,
    )
    .await;
    let tree_id = created["tree"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["rootPerson"]["firstName"], "Louis");

    // 2. Add a couple and their child
    let father = add_person(&client, &tree_id, "Pierre", "male").await;
    let mother = add_person(&client, &tree_id, "Marie", "female").await;
    let child = add_person(&client, &tree_id, "Paul", "male").await;

    expect_json(
        client
            .put(
                &format!("/api/node-positions/tree/{}/bulk", tree_id),
                json!({ "positions": [
                    { "nodeId": father, "x": 100.0, "y": 100.0 },
                    { "nodeId": mother, "x": 320.0, "y": 140.0 },
                    { "nodeId": child, "x": 700.0, "y": 90.0 },
                ]}),
            )
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await;

    let spouse = expect_json(
        client
            .post(
                "/api/relationships",
                json!({ "type": "spouse", "sourceId": father, "targetId": mother }),
            )
            .await
            .unwrap(),
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(spouse["relationship"]["type"], "spouse");

    let edges = expect_json(
        client.get(&format!("/api/edges/tree/{}", tree_id)).await.unwrap(),
        StatusCode::OK,
    )
    .await;
    let marriage_id = edges["edges"][0]["id"].as_str().unwrap().to_string();

    expect_json(
        client
            .post(
                "/api/union-children",
                json!({ "marriageEdgeId": marriage_id, "childId": child }),
            )
            .await
            .unwrap(),
        StatusCode::CREATED,
    )
    .await;

    // 3. Smart layout puts the couple on one row and the child below it
    let layout = expect_json(
        client
            .post(
                &format!("/api/family-trees/{}/layout", tree_id),
                json!({ "strategy": "smart", "alignSpouses": true }),
            )
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await;
    let y_of = |id: &str| {
        layout["nodePositions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|position| position["nodeId"] == id)
            .and_then(|position| position["y"].as_f64())
            .unwrap()
    };
    assert_eq!(y_of(father.as_str()), y_of(mother.as_str()));
    assert!(y_of(child.as_str()) > y_of(father.as_str()));

    // 4. Snapshot carries every collection
    let snapshot = expect_json(
        client.get(&format!("/api/family-trees/{}", tree_id)).await.unwrap(),
        StatusCode::OK,
    )
    .await;
    let tree = &snapshot["tree"];
    assert_eq!(tree["Person"].as_array().unwrap().len(), 4);
    assert_eq!(tree["UnionChild"].as_array().unwrap().len(), 1);
    assert_eq!(tree["Edge"].as_array().unwrap().len(), 2);
    assert_eq!(tree["Relationship"].as_array().unwrap().len(), 2);

    // 5. Another user cannot see the private tree
    let stranger = TestClient::new(base_url.clone(), "stranger");
    let response = stranger
        .get(&format!("/api/family-trees/{}", tree_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 6. Deleting a person removes what hangs off it
    expect_json(
        client.delete(&format!("/api/persons/{}", mother)).await.unwrap(),
        StatusCode::OK,
    )
    .await;
    let relationships = expect_json(
        client
            .get(&format!("/api/relationships/person/{}", father))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await;
    assert!(relationships["relationships"].as_array().unwrap().is_empty());

    // 7. Deleting the tree removes it for good
    expect_json(
        client.delete(&format!("/api/family-trees/{}", tree_id)).await.unwrap(),
        StatusCode::OK,
    )
    .await;
    let response = client
        .get(&format!("/api/family-trees/{}", tree_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let trees = expect_json(client.get("/api/family-trees").await.unwrap(), StatusCode::OK).await;
    assert!(trees["trees"].as_array().unwrap().is_empty());
}
