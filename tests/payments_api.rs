use payments_api::handlers::{ApiState, PAYMENTS_PATH};
use payments_api::run::app;
use payments_api::service::PaymentService;
use payments_api::store::InMemoryPaymentStore;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// Serves the API on an ephemeral local port and returns the collection URL.
async fn spawn_server() -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let public_url = Url::parse(&format!("http://{addr}")).unwrap();
    let service = PaymentService::new(
        Arc::new(InMemoryPaymentStore::new()),
        Duration::from_secs(5),
    );
    let state = Arc::new(ApiState::new(service, &public_url));
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}{PAYMENTS_PATH}")
}

fn attributes(amount: f64, debtor_name: Option<&str>) -> Value {
    let mut debtor = json!({"bank_id": "id2", "bank_id_code": "code2"});
    if let Some(name) = debtor_name {
        debtor["name"] = json!(name);
    }
    json!({
        "amount": amount,
        "beneficiary_party": {"bank_id": "id", "bank_id_code": "code", "name": "name"},
        "debtor_party": debtor,
        "end_to_end_reference": "test1"
    })
}

#[tokio::test]
async fn create_update_delete_over_http() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&base)
        .json(&json!({
            "type": "Payment",
            "organisation_id": "org",
            "attributes": attributes(3.0, Some("name2"))
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["version"], json!(0));

    let item = format!("{base}/{id}");
    let response = client
        .put(&item)
        .json(&json!({"attributes": attributes(5.0, Some("name2"))}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["version"], json!(1));
    assert_eq!(updated["attributes"]["amount"], json!(5.0));

    let response = client
        .put(&item)
        .json(&json!({"attributes": attributes(5.0, None)}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.delete(&item).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted: Value = response.json().await.unwrap();
    assert_eq!(deleted, json!({"deleted": true}));

    let response = client.get(&item).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get(&base).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["data"], json!([]));
    assert_eq!(list["links"]["self"], json!(base));
}
