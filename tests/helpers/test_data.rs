//! Test data helpers for building users and requests

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use chrono::Utc;
use serde_json::json;

use ascesa::models::user::{User, UserRole, UserStatus};

pub const MULTIPART_BOUNDARY: &str = "ascesa-test-boundary";

pub fn test_user(id: i64, role: UserRole) -> User {
    User {
        id,
        name: "Maria Silva".to_string(),
        email: format!("user{}@ascesa.org.br", id),
        cpf: "52998224725".to_string(),
        phone: Some("61987654321".to_string()),
        password_hash: String::new(),
        role,
        status: UserStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn registration_body() -> serde_json::Value {
    json!({
        "name": "Maria da Silva",
        "email": "maria@ascesa.org.br",
        "cpf": "529.982.247-25",
        "phone": "(61) 98765-4321",
        "password": "s3nha-forte",
    })
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Raw body with a JSON content type, for malformed payloads
pub fn raw_json_request(method: Method, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// One `file` part, optionally preceded by a `title` part
pub fn multipart_upload(
    uri: &str,
    token: &str,
    title: Option<&str>,
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{t}\r\n",
                b = MULTIPART_BOUNDARY,
                t = title
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: {m}\r\n\r\n",
                b = MULTIPART_BOUNDARY,
                f = file_name,
                m = mime
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

/// Attach a peer address the way `into_make_service_with_connect_info` does
pub fn from_peer(mut request: Request<Body>, addr: &str) -> Request<Body> {
    let addr: SocketAddr = addr.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}
