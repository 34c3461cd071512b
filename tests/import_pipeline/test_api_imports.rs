//! HTTP tests for the import endpoints.

use std::sync::Arc;
use std::time::Duration;

use actix_web::test;
use school_insights_lib::config::ImportSettings;
use school_insights_lib::services::MemoryStore;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_health() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_rt::test]
async fn test_upload_valid_school_file() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;
    let csv = school_csv(&["Escola Municipal Sol", "Escola Estadual Lua"]);

    let (status, body) = upload_files(&app, "school", &[("escolas.csv", csv.as_slice())]).await;

    assert_eq!(status, 201, "{body}");
    assert_eq!(body[0]["status"], "success");
    assert_eq!(body[0]["record_count"], 2);
    assert_eq!(body[0]["kind"], "school");

    let snapshot = get_snapshot(&app).await;
    assert_eq!(snapshot["files"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["is_uploading"], false);
}

#[actix_rt::test]
async fn test_upload_multiple_parts_keeps_invalid_entries() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;
    let csv = school_csv(&["A"]);

    let (status, body) = upload_files(
        &app,
        "schools",
        &[("escolas.csv", csv.as_slice()), ("escolas.pdf", &b"%PDF"[..]), ("escolas.xlsx", &b"PK"[..])],
    )
    .await;

    assert_eq!(status, 201);
    let statuses: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["success", "error", "error"]);
    assert!(body[1]["message"].as_str().unwrap().contains("Invalid file format"));
}

#[actix_rt::test]
async fn test_upload_unknown_kind_is_bad_request() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;

    let (status, body) = upload_files(&app, "students", &[("alunos.csv", &b"nome\nAna\n"[..])]).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_upload_without_file_part_is_bad_request() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;

    let (status, _) = upload_files(&app, "school", &[]).await;

    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_oversized_file_is_rejected() {
    let settings = ImportSettings {
        max_upload_size: 64,
        ..test_settings()
    };
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), settings)).await;
    let csv = school_csv(&["Escola com nome comprido o bastante para estourar o limite"]);

    let (status, body) = upload_files(&app, "school", &[("escolas.csv", csv.as_slice())]).await;

    assert_eq!(status, 413);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    assert!(get_snapshot(&app).await["files"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_size_limit_applies_per_file() {
    let settings = ImportSettings {
        max_upload_size: 1024,
        ..test_settings()
    };
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), settings)).await;
    let csv = school_csv(&["A"]);
    assert!(csv.len() < 1024 && csv.len() * 4 > 1024);

    let files: Vec<(&str, &[u8])> = ["a.csv", "b.csv", "c.csv", "d.csv"]
        .into_iter()
        .map(|name| (name, csv.as_slice()))
        .collect();
    let (status, body) = upload_files(&app, "school", &files).await;

    assert_eq!(status, 201, "{body}");
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[actix_rt::test]
async fn test_process_persists_and_reports_progress() {
    let store = Arc::new(MemoryStore::new());
    let app = create_test_app(create_session(store.clone(), test_settings())).await;
    let csv = school_csv(&["A", "B"]);
    upload_files(&app, "school", &[("escolas.csv", csv.as_slice())]).await;

    let (status, outcome) = process_imports(&app).await;

    assert_eq!(status, 200, "{outcome}");
    assert_eq!(outcome["total_files"], 1);
    assert_eq!(outcome["records_saved"], 2);
    assert_eq!(outcome["progress_percent"], 100);
    assert!(outcome.get("failed_file").is_none());

    let snapshot = get_snapshot(&app).await;
    assert_eq!(snapshot["progress_percent"], 100);
    assert_eq!(snapshot["files"][0]["persisted"], true);
    assert_eq!(
        snapshot["files"][0]["message"],
        "Data imported successfully! 2 records saved."
    );
    assert_eq!(store.school_records().len(), 2);
}

#[actix_rt::test]
async fn test_performance_before_schools_is_reference_gap() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;
    let csv = performance_csv(&["E1", "E2", "E3"]);

    let (status, body) = upload_files(&app, "performance", &[("desempenho.csv", csv.as_slice())]).await;

    assert_eq!(status, 201);
    assert_eq!(body[0]["status"], "error");
    assert!(
        body[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("No schools found in the database")
    );

    let (status, outcome) = process_imports(&app).await;
    assert_eq!(status, 200);
    assert_eq!(outcome["total_files"], 0);
}

#[actix_rt::test]
async fn test_delete_file() {
    let app = create_test_app(create_session(Arc::new(MemoryStore::new()), test_settings())).await;
    let csv = school_csv(&["A"]);
    upload_files(&app, "school", &[("escolas.csv", csv.as_slice())]).await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/imports/school/escolas.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 204);

    let req = test::TestRequest::delete()
        .uri("/api/v1/imports/school/escolas.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_rt::test]
async fn test_conflicts_while_batch_is_running() {
    let app = create_test_app(create_session(Arc::new(StallingStore), test_settings())).await;
    let csv = school_csv(&["A"]);
    upload_files(&app, "school", &[("escolas.csv", csv.as_slice())]).await;

    let stalled = tokio::time::timeout(Duration::from_millis(200), process_imports(&app));
    let competing = async {
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (process_status, _) = process_imports(&app).await;

        let req = test::TestRequest::delete()
            .uri("/api/v1/imports/school/escolas.csv")
            .to_request();
        let delete_status = test::call_service(&app, req).await.status().as_u16();

        (process_status, delete_status)
    };

    let (stalled, (process_status, delete_status)) = tokio::join!(stalled, competing);

    assert!(stalled.is_err(), "first batch should still be running");
    assert_eq!(process_status, 409);
    assert_eq!(delete_status, 409);

    // The abandoned batch released the session.
    assert_eq!(get_snapshot(&app).await["is_uploading"], false);
}
