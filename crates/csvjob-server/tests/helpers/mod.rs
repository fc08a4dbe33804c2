//! Test helpers for csvjob server integration tests
//!
//! - [`TestApp`]: the full router over a `#[sqlx::test]` pool and a temp upload dir
//! - request helpers that return `(status, headers, body)`
//! - a hand-built multipart body for upload requests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use csvjob_server::{
    api,
    config::Config,
    features::{shared::IdCodec, FeatureState},
    storage::{Storage, StorageConfig},
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "csvjob-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub upload_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

impl TestApp {
    pub async fn new(pool: SqlitePool) -> Self {
        Self::with_max_file_size_mb(pool, 200).await
    }

    pub async fn with_max_file_size_mb(pool: SqlitePool, mb: u64) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.storage = StorageConfig::new(upload_dir.path()).with_max_file_size_mb(mb);

        let storage = Storage::new(config.storage.clone())
            .await
            .expect("Failed to initialize storage");
        let ids = IdCodec::new(&config.security.secret_key).expect("Failed to build id codec");

        let state = FeatureState::new(pool.clone(), storage, ids);
        let router = api::create_router(state, &config);

        Self {
            router,
            pool,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, filename: &str, content_type: &str, content: &[u8]) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/files/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body("file", filename, content_type, content)))
                .unwrap(),
        )
        .await
    }

    /// Upload a CSV and return its job id
    pub async fn upload_csv(&self, filename: &str, content: &[u8]) -> String {
        let response = self.upload(filename, "text/csv", content).await;
        assert_eq!(response.status, StatusCode::ACCEPTED);
        response.json()["jobId"]
            .as_str()
            .expect("jobId missing")
            .to_string()
    }

    /// Poll the status route until the job leaves `pending`/`loading`
    pub async fn wait_for_job(&self, job_id: &str) -> TestResponse {
        let uri = format!("/api/jobs/jobStatus/{job_id}");
        for _ in 0..100 {
            let response = self.get(&uri).await;
            if response.status != StatusCode::ACCEPTED {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("job {job_id} did not finish");
    }

    pub fn upload_dir_entries(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

/// A single-field `multipart/form-data` body
pub fn multipart_body(field: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
