#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use document_portal::config::{
    AdminSettings, BackendSettings, ExportSettings, ServerSettings, Settings, TelemetrySettings,
    ViewSettings,
};
use document_portal::startup::build_router;
use document_portal::AppState;
use secrecy::Secret;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const BOUNDARY: &str = "portal-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub backend: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with the test settings adjusted by `customize`.
    pub async fn spawn_with(customize: impl FnOnce(&mut Settings)) -> Self {
        let backend = MockServer::start().await;
        let mut settings = test_settings(&backend.uri());
        customize(&mut settings);
        let state = AppState::new(settings).expect("Failed to build app state");

        TestApp {
            router: build_router(state),
            backend,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(&self, uri: &str, body: Vec<u8>, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Sign in as admin on a fresh session; returns the session cookie.
    pub async fn admin_cookie(&self) -> String {
        let body = format!("access_key={}", ADMIN_KEY);
        let response = self.post_form("/admin/signin", &body, None).await;
        session_cookie(&response).expect("Sign-in did not set a session cookie")
    }
}

pub fn test_settings(backend_url: &str) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 1024 * 1024,
        },
        backend: BackendSettings {
            url: backend_url.to_string(),
            request_timeout_secs: 5,
        },
        admin: AdminSettings {
            access_key: Secret::new(ADMIN_KEY.to_string()),
        },
        export: ExportSettings::default(),
        views: ViewSettings::default(),
        telemetry: TelemetrySettings::default(),
    }
}

/// `name=value` of the session cookie set on `response`, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn sample_documents() -> Value {
    json!([
        {
            "_id": "doc-alice",
            "documentType": "ICS",
            "documentNumber": 1001,
            "uploaderName": "Alice",
            "description": "chair",
            "dateAcquired": "2024-03-05T00:00:00.000Z",
            "quantity": 4
        },
        {
            "_id": "doc-bob",
            "documentType": "PAR",
            "documentNumber": 2002,
            "uploaderName": "Bob",
            "description": "desk",
            "dateAcquired": "2023-11-20T00:00:00.000Z",
            "quantity": 1
        }
    ])
}

/// Multipart body with the given text fields and an optional
/// `documentCopy` file.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"documentCopy\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn complete_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("documentType", "ICS"),
        ("documentNumber", "1042"),
        ("uploaderName", "Carla"),
        ("description", "Filing cabinet"),
        ("dateAcquired", "2024-05-01"),
        ("quantity", "2"),
    ]
}
