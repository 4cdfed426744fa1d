//! Integration tests for the patient record service.
//!
//! Each test starts the real router on an ephemeral local port, backed by a
//! temporary patient file, and talks to it over HTTP.
//!
//! Run with: cargo test --test integration

use std::net::SocketAddr;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use patient_records::api::{create_router, AppState};
use patient_records::patient::VerdictRule;
use patient_records::store::{FileStore, PatientStore};

/// Start a server over `path` and return its address.
async fn spawn_server(path: &Path, rule: VerdictRule) -> SocketAddr {
    let file = FileStore::new(path);
    file.ensure_exists().expect("init patient file");

    let router = create_router(AppState::new(PatientStore::new(file), rule));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server");
    });

    addr
}

fn patient(id: &str, name: &str, height: f64, weight: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "city": "Hyderabad",
        "age": 33,
        "gender": "female",
        "height": height,
        "weight": weight,
    })
}

/// Full lifecycle: create, read, sort, edit, delete.
#[tokio::test]
async fn test_patient_lifecycle() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(&dir.path().join("patients.json"), VerdictRule::Contiguous).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    for (id, name, height, weight) in [
        ("P001", "Meera", 1.60, 48.0),
        ("P002", "Kavya", 1.70, 95.0),
        ("P003", "Isha", 1.65, 62.0),
    ] {
        let response = client
            .post(format!("{base}/create"))
            .json(&patient(id, name, height, weight))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "create {id}");
    }

    let record: Value = client
        .get(format!("{base}/patient/P002"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["bmi"], 32.87);
    assert_eq!(record["verdict"], "Obese");

    let sorted: Vec<Value> = client
        .get(format!("{base}/sort"))
        .query(&[("sort_by", "weight"), ("order", "asc")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = sorted.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["P001", "P003", "P002"]);

    let response = client
        .put(format!("{base}/edit/P002"))
        .json(&json!({"weight": 70.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{base}/delete/P001"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let view: Value = client
        .get(format!("{base}/view"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let remaining: Vec<&String> = view.as_object().unwrap().keys().collect();
    assert_eq!(remaining, ["P002", "P003"]);
    assert_eq!(view["P002"]["verdict"], "Overweight");
}

/// Files written by older tools carry derived fields; they load and are
/// recomputed rather than trusted.
#[tokio::test]
async fn test_stale_derived_fields_are_recomputed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    std::fs::write(
        &path,
        json!({
            "P001": {
                "name": "Ravi", "city": "Delhi", "age": 40, "gender": "male",
                "height": 1.8, "weight": 81.0, "bmi": 10.0, "verdict": "Underweight"
            }
        })
        .to_string(),
    )
    .unwrap();

    let addr = spawn_server(&path, VerdictRule::Contiguous).await;
    let record: Value = reqwest::get(format!("http://{addr}/patient/P001"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(record["bmi"], 25.0);
    assert_eq!(record["verdict"], "Overweight");
}

/// Concurrent creates through the server are serialized; none is lost.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    let addr = spawn_server(&path, VerdictRule::Contiguous).await;
    let client = reqwest::Client::new();

    let requests = (0..20).map(|i| {
        let client = client.clone();
        async move {
            client
                .post(format!("http://{addr}/create"))
                .json(&patient(&format!("C{i:02}"), "Batch", 1.7, 60.0 + i as f64))
                .send()
                .await
                .unwrap()
                .status()
        }
    });
    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let persisted = FileStore::new(&path).load_all().unwrap();
    assert_eq!(persisted.len(), 20);
}
