//! Helpers for handler tests that need a real database.
//!
//! Tests using these helpers only run when `TEST_DATABASE_URL` points at a
//! PostgreSQL database; otherwise [`TestApp::start`] prints a skip notice,
//! returns `None`, and the test returns early.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, OnceLock};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::auth::{create_session, SessionKind};
use crate::config::Config;
use crate::db::{create_pool, DbPool};
use crate::models::{NewProfile, NewUser};
use crate::schema::{profiles, users};
use crate::{build_app, AppState};

static POOL: OnceLock<Option<Arc<DbPool>>> = OnceLock::new();

fn shared_pool() -> Option<Arc<DbPool>> {
    POOL.get_or_init(|| {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        Some(Arc::new(create_pool(&url)))
    })
    .clone()
}

pub struct TestApp {
    pub state: AppState,
    // Held so the media root outlives the test
    pub media: TempDir,
}

impl TestApp {
    #[track_caller]
    pub fn start() -> Option<Self> {
        let Some(pool) = shared_pool() else {
            eprintln!(
                "SKIPPED database test at {}: TEST_DATABASE_URL is not set",
                std::panic::Location::caller()
            );
            return None;
        };
        let media = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: String::new(),
            bind_addr: "127.0.0.1:0".to_string(),
            media_root: media.path().to_path_buf(),
            max_upload_bytes: 10 * 1024 * 1024,
            access_token_ttl: Duration::minutes(5),
            refresh_token_ttl: Duration::days(1),
        };
        Some(Self {
            state: AppState {
                pool,
                config: Arc::new(config),
            },
            media,
        })
    }

    pub fn router(&self) -> Router {
        build_app(self.state.clone())
    }

    pub fn conn(&self) -> PooledConnection<ConnectionManager<PgConnection>> {
        self.state.pool.get().unwrap()
    }

    /// Insert a user with the given roles and return (user id, access token).
    pub fn user(&self, is_creator: bool, is_viewer: bool) -> (Uuid, String) {
        let mut conn = self.conn();
        let username = format!("user-{}", Uuid::new_v4());
        let user_id: Uuid = diesel::insert_into(users::table)
            .values(&NewUser {
                username: &username,
                password_hash: "unused",
            })
            .returning(users::id)
            .get_result(&mut conn)
            .unwrap();
        diesel::insert_into(profiles::table)
            .values(&NewProfile {
                user_id,
                is_creator,
                is_viewer,
            })
            .execute(&mut conn)
            .unwrap();
        let token =
            create_session(&mut conn, user_id, SessionKind::Access, Duration::minutes(5)).unwrap();
        (user_id, token)
    }

    pub fn creator(&self) -> (Uuid, String) {
        self.user(true, false)
    }

    pub fn viewer(&self) -> (Uuid, String) {
        self.user(false, true)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "recipeshare-test-boundary";

/// A multipart request; `files` entries are sent with a filename.
pub fn multipart_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, Vec<u8>)],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .unwrap();
    }
    for (name, filename, data) in files {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .unwrap();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A minimal single-sheet xlsx workbook. Every cell is an inline string.
pub fn xlsx_of(rows: &[&[&str]]) -> Vec<u8> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        write!(sheet, r#"<row r="{}">"#, r + 1).unwrap();
        for (c, value) in row.iter().enumerate() {
            let column = (b'A' + c as u8) as char;
            let value = value
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            write!(
                sheet,
                r#"<c r="{column}{}" t="inlineStr"><is><t>{value}</t></is></c>"#,
                r + 1
            )
            .unwrap();
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts: [(&str, &str); 5] = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];
    let entries: Vec<(&str, &[u8])> = parts.iter().map(|(name, xml)| (*name, xml.as_bytes())).collect();
    zip_of(&entries)
}

/// Create a recipe through the API and return its JSON representation.
pub async fn create_recipe(app: &TestApp, token: &str, body: serde_json::Value) -> serde_json::Value {
    let (status, recipe) = app
        .send(json_request(Method::POST, "/recipes/", Some(token), body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", recipe);
    recipe
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
