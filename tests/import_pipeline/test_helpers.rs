//! Shared test helpers for the import pipeline tests.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, dev::ServiceResponse, test, web};
use async_trait::async_trait;
use school_insights_lib::config::ImportSettings;
use school_insights_lib::error::PersistenceError;
use school_insights_lib::middleware::RequestLogger;
use school_insights_lib::models::{KnownSchool, PerformanceRecord, SchoolRecord};
use school_insights_lib::services::schema::{PERFORMANCE_COLUMNS, SCHOOL_COLUMNS};
use school_insights_lib::services::{EventBroadcaster, RecordStore, UploadSession};
use serde_json::Value;
use uuid::Uuid;

const BOUNDARY: &str = "----school-insights-test-boundary";

/// Import settings without the artificial `.xlsx` delay.
pub fn test_settings() -> ImportSettings {
    ImportSettings {
        xlsx_rejection_delay: Duration::ZERO,
        ..ImportSettings::default()
    }
}

/// Build a shared session over `store`.
pub fn create_session(store: Arc<dyn RecordStore>, settings: ImportSettings) -> web::Data<UploadSession> {
    web::Data::new(UploadSession::new(store, settings, EventBroadcaster::new()))
}

/// Create a test app exposing the import API.
pub async fn create_test_app(
    session: web::Data<UploadSession>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .wrap(RequestLogger)
            .app_data(session)
            .service(
                web::scope("/api/v1")
                    .configure(school_insights_lib::api::configure_health_routes)
                    .configure(school_insights_lib::api::configure_import_routes),
            ),
    )
    .await
}

/// School CSV with every required column and one row per name.
pub fn school_csv(names: &[&str]) -> Vec<u8> {
    let mut csv = SCHOOL_COLUMNS.join(",");
    for name in names {
        csv.push_str(&format!(
            "\n{},4,3,2,2019,2,sim,s,1,nao,TRUE,false,Sim,sim,Alta,nao,sim,0",
            name
        ));
    }
    csv.push('\n');
    csv.into_bytes()
}

/// Performance CSV with one row per school code.
pub fn performance_csv(codes: &[&str]) -> Vec<u8> {
    let mut csv = PERFORMANCE_COLUMNS.join(",");
    for code in codes {
        csv.push_str(&format!(
            "\n{},EF05MA03,Matemática,Comparar frações,58.3",
            code
        ));
    }
    csv.push('\n');
    csv.into_bytes()
}

/// Encode `(file_name, content)` pairs as a multipart/form-data body.
pub fn multipart_body(files: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (file_name, content) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// POST files to `/api/v1/imports/{kind}`.
pub async fn upload_files<S>(app: &S, kind: &str, files: &[(&str, &[u8])]) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (content_type, body) = multipart_body(files);
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/imports/{}", kind))
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// POST `/api/v1/imports/process`.
pub async fn process_imports<S>(app: &S) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/imports/process")
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// GET `/api/v1/imports`.
pub async fn get_snapshot<S>(app: &S) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get().uri("/api/v1/imports").to_request();
    test::call_and_read_body_json(app, req).await
}

/// Store whose inserts never complete, to hold a batch open.
pub struct StallingStore;

#[async_trait]
impl RecordStore for StallingStore {
    async fn list_schools(&self) -> Result<Vec<KnownSchool>, PersistenceError> {
        Ok(vec![KnownSchool::new("E1")])
    }

    async fn insert_school_records(
        &self,
        _import_id: Uuid,
        _records: &[SchoolRecord],
    ) -> Result<u64, PersistenceError> {
        std::future::pending().await
    }

    async fn insert_performance_records(
        &self,
        _import_id: Uuid,
        _records: &[PerformanceRecord],
    ) -> Result<u64, PersistenceError> {
        std::future::pending().await
    }
}
