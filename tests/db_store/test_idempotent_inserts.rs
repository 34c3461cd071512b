//! Retried inserts for the same file are not stored twice.

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use school_insights_lib::entity::{performance, school};
use school_insights_lib::services::RecordStore;
use uuid::Uuid;

use super::test_helpers::*;

async fn stored_schools(pool: &school_insights_lib::db::DbPool, import_id: Uuid) -> u64 {
    school::Entity::find()
        .filter(school::Column::ImportId.eq(import_id))
        .count(pool.connection())
        .await
        .unwrap()
}

async fn stored_performance(pool: &school_insights_lib::db::DbPool, import_id: Uuid) -> u64 {
    performance::Entity::find()
        .filter(performance::Column::ImportId.eq(import_id))
        .count(pool.connection())
        .await
        .unwrap()
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_school_insert_is_idempotent_per_import() {
    let pool = create_test_pool().await;
    let import_id = Uuid::now_v7();
    let name = unique_name("Escola Municipal");
    let records = vec![school(&name), school(&unique_name("Escola Estadual"))];

    let first = pool.insert_school_records(import_id, &records).await.unwrap();
    let retry = pool.insert_school_records(import_id, &records).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(retry, 2);
    assert_eq!(stored_schools(&pool, import_id).await, 2);

    let known = pool.list_schools().await.unwrap();
    assert!(known.iter().any(|s| s.name == name));
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_retry_with_new_import_id_inserts_again() {
    let pool = create_test_pool().await;
    let records = vec![school(&unique_name("Escola Nova"))];

    let first_id = Uuid::now_v7();
    let second_id = Uuid::now_v7();
    pool.insert_school_records(first_id, &records).await.unwrap();
    pool.insert_school_records(second_id, &records).await.unwrap();

    assert_eq!(stored_schools(&pool, first_id).await, 1);
    assert_eq!(stored_schools(&pool, second_id).await, 1);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_large_performance_file_is_batched_once() {
    let pool = create_test_pool().await;
    let import_id = Uuid::now_v7();
    let code = unique_name("EM");
    // More than two INSERT batches.
    let records: Vec<_> = (0..2_500).map(|i| performance(&code, i)).collect();

    let first = pool
        .insert_performance_records(import_id, &records)
        .await
        .unwrap();
    let retry = pool
        .insert_performance_records(import_id, &records[..10])
        .await
        .unwrap();

    assert_eq!(first, 2_500);
    assert_eq!(retry, 2_500);
    assert_eq!(stored_performance(&pool, import_id).await, 2_500);
}
