//! Shared helpers for the database tests.

use school_insights_lib::config::Config;
use school_insights_lib::db::DbPool;
use school_insights_lib::models::{PerformanceRecord, SchoolRecord};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATIONS_RUN: OnceCell<()> = OnceCell::const_new();

/// Create a small DB pool. Migrations run only once.
pub async fn create_test_pool() -> DbPool {
    let mut config = Config::from_env().expect(
        "Failed to load config. Set RUST_ENV and DATABASE_URL, \
         and make sure PostgreSQL is running.",
    );
    config.database.max_connections = 2;
    config.database.min_connections = 1;

    let pool = DbPool::new(&config.database)
        .await
        .expect("Failed to connect to database");

    MIGRATIONS_RUN
        .get_or_init(|| async {
            pool.run_migrations()
                .await
                .expect("Failed to run migrations");
        })
        .await;

    pool
}

/// Name unique to one test run.
pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::now_v7().simple())
}

pub fn school(name: &str) -> SchoolRecord {
    SchoolRecord {
        name: name.to_string(),
        portuguese_teachers: 4,
        math_teachers: 3,
        science_teachers: 2,
        last_renovation_year: 2019,
        sports_courts: 1,
        has_library: true,
        has_computer_lab: false,
        has_internet_access: true,
        mobile_device_projects: false,
        teacher_shortage: true,
        has_air_conditioning: false,
        adequate_lighting: true,
        has_water_fountains: true,
        accessibility: "Alta".to_string(),
        external_projects: false,
        recreation_areas: true,
        shift_performance_gap: false,
    }
}

pub fn performance(school_code: &str, skill: usize) -> PerformanceRecord {
    PerformanceRecord {
        school_code: school_code.to_string(),
        skill_code: format!("EF05MA{:02}", skill % 100),
        curricular_component: "Matemática".to_string(),
        skill_description: "Resolver problemas".to_string(),
        percent_correct: (skill % 101) as f64,
    }
}
