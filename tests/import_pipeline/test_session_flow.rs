//! End-to-end flows through the upload session.

use std::sync::Arc;

use school_insights_lib::config::ImportSettings;
use school_insights_lib::models::{FileKind, ImportedRecords, UploadStatus};
use school_insights_lib::services::coercion::NumericPolicy;
use school_insights_lib::services::{MemoryStore, UploadSession};

use super::test_helpers::*;

/// Schools imported in one batch become the reference set for performance files.
#[actix_rt::test]
async fn test_schools_then_performance() {
    let store = Arc::new(MemoryStore::new());
    let session = create_session(store.clone(), test_settings());

    session
        .add_file(FileKind::School, "escolas.csv", &school_csv(&["EM Sol", "EE Lua"]))
        .await;
    let outcome = session.process_files().await.unwrap();
    assert_eq!(outcome.records_saved, 2);

    let file = session
        .add_file(
            FileKind::Performance,
            "desempenho.csv",
            &performance_csv(&["EM Sol", "EE Lua", "EM Estrela", "em sol"]),
        )
        .await;

    assert_eq!(file.status, UploadStatus::Success, "{:?}", file.message);
    assert_eq!(file.record_count(), 2);
    assert_eq!(file.skipped_references, vec!["EM Estrela", "em sol"]);

    let outcome = session.process_files().await.unwrap();
    assert_eq!(outcome.total_files, 1);
    assert_eq!(outcome.records_saved, 2);

    let stored: Vec<String> = store
        .performance_records()
        .into_iter()
        .map(|r| r.school_code)
        .collect();
    assert_eq!(stored, vec!["EM Sol", "EE Lua"]);
}

/// Two files, second insert fails: first keeps its result, progress stops at 50.
#[actix_rt::test]
async fn test_second_insert_fails() {
    let store = Arc::new(MemoryStore::new().fail_insert_number(2, "relation \"escolas\" is locked"));
    let session = create_session(store.clone(), test_settings());
    session.add_file(FileKind::School, "a.csv", &school_csv(&["A"])).await;
    session.add_file(FileKind::School, "b.csv", &school_csv(&["B"])).await;

    let outcome = session.process_files().await.unwrap();

    assert!(outcome.aborted());
    assert_eq!(outcome.completed_files, 1);

    let snapshot = session.snapshot();
    assert!(!snapshot.is_uploading);
    assert_eq!(snapshot.progress_percent, 50);
    assert_eq!(snapshot.files[0].status, UploadStatus::Success);
    assert!(snapshot.files[0].message.as_deref().unwrap().contains("1 records saved"));
    assert_eq!(snapshot.files[1].status, UploadStatus::Error);
    assert_eq!(
        snapshot.files[1].message.as_deref(),
        Some("Failed to save to database: relation \"escolas\" is locked")
    );

    // Retrying sends nothing: the failed file is terminal and the first is stored.
    let retry = session.process_files().await.unwrap();
    assert!(retry.is_idle());
    assert_eq!(store.school_records().len(), 1);
}

/// Strict numbers turn a silent zero into a file error.
#[actix_rt::test]
async fn test_strict_numbers() {
    let settings = ImportSettings {
        numeric_policy: NumericPolicy::Strict,
        ..test_settings()
    };
    let store = Arc::new(MemoryStore::new().with_schools(["E1"]));
    let session = UploadSession::new(
        store,
        settings,
        school_insights_lib::services::EventBroadcaster::new(),
    );

    let csv = "codigo_escola,codigo_habilidade,componente_curricular,descricao_habilidade,percentual_acertos\n\
E1,H01,Língua Portuguesa,Localizar informação,\n";
    let file = session
        .add_file(FileKind::Performance, "p.csv", csv.as_bytes())
        .await;

    assert_eq!(file.status, UploadStatus::Error);
    let message = file.message.unwrap();
    assert!(message.contains("line 2"), "{message}");
    assert!(message.contains("percentual_acertos"), "{message}");
}

/// Semicolon exports with a BOM, padded headers and decimal commas are accepted.
#[actix_rt::test]
async fn test_spreadsheet_export_quirks() {
    let store = Arc::new(MemoryStore::new().with_schools(["E1"]));
    let session = create_session(store, test_settings());

    let csv = "\u{feff} CODIGO_ESCOLA ;codigo_habilidade;componente_curricular;descricao_habilidade;percentual_acertos\r\n\
E1;H02;Matemática;Somar, subtrair;71.25\r\n\r\n\
E1;H03;Matemática;Multiplicar;64,5\r\n";
    let file = session
        .add_file(FileKind::Performance, "desempenho.CSV", csv.as_bytes())
        .await;

    assert_eq!(file.status, UploadStatus::Success, "{:?}", file.message);
    match file.records {
        Some(ImportedRecords::Performance(records)) => {
            assert_eq!(records[0].school_code, "E1");
            assert_eq!(records[0].skill_description, "Somar, subtrair");
            assert_eq!(records[0].percent_correct, 71.25);
            assert_eq!(records[1].percent_correct, 64.5);
        }
        other => panic!("expected performance records, got {other:?}"),
    }
}
