//! CLI tool to import CSV files without the dashboard.
//!
//! Usage:
//!   cargo run --bin import-csv -- escolas=data/escolas.csv desempenho=data/desempenho.csv
//!   cargo run --bin import-csv -- --dry-run school=data/escolas.csv
//!
//! School files are imported before performance files so that performance
//! rows can be resolved against the schools just stored.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use school_insights_lib::config::{Config, ImportSettings};
use school_insights_lib::db::DbPool;
use school_insights_lib::models::{FileKind, UploadStatus, UploadedFile};
use school_insights_lib::services::{EventBroadcaster, MemoryStore, RecordStore, UploadSession};

struct ImportArg {
    kind: FileKind,
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args: Vec<String> = env::args().skip(1).collect();

    let mut dry_run = false;
    let mut imports: Vec<ImportArg> = Vec::new();

    for arg in &args {
        match arg.as_str() {
            "--dry-run" | "-n" => dry_run = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => match parse_import_arg(arg) {
                Some(import) => imports.push(import),
                None => {
                    eprintln!("Invalid argument: {}", arg);
                    print_usage();
                    std::process::exit(1);
                }
            },
        }
    }

    if imports.is_empty() {
        eprintln!("Error: at least one <kind>=<path> is required");
        print_usage();
        std::process::exit(1);
    }

    let (store, settings): (Arc<dyn RecordStore>, ImportSettings) = if dry_run {
        let settings = Config::from_env()
            .map(|c| c.import)
            .unwrap_or_default();
        (Arc::new(MemoryStore::new()), settings)
    } else {
        let config = match Config::from_env() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        };
        let pool = match DbPool::new(&config.database).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error connecting to database: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = pool.run_migrations().await {
            eprintln!("Error running migrations: {}", e);
            std::process::exit(1);
        }
        (Arc::new(pool), config.import)
    };

    let session = UploadSession::new(store, settings, EventBroadcaster::new());
    let mut failed = false;

    // Schools first, then everything else.
    let (schools, others): (Vec<ImportArg>, Vec<ImportArg>) = imports
        .into_iter()
        .partition(|i| i.kind == FileKind::School);

    for phase in [schools, others] {
        if phase.is_empty() {
            continue;
        }

        for import in &phase {
            let file_name = import
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| import.path.display().to_string());

            match tokio::fs::read(&import.path).await {
                Ok(bytes) => {
                    session.add_file(import.kind, file_name, &bytes).await;
                }
                Err(e) => {
                    eprintln!("Cannot read {}: {}", import.path.display(), e);
                    failed = true;
                }
            }
        }

        if let Err(e) = session.process_files().await {
            eprintln!("Import failed: {}", e);
            failed = true;
        }
    }

    println!();
    println!("{:<12} {:<10} {:<30} MESSAGE", "KIND", "STATUS", "FILE");
    println!("{}", "-".repeat(80));
    for file in session.files() {
        print_file(&file);
        failed |= file.status == UploadStatus::Error;
    }

    if dry_run {
        println!();
        println!("Dry run: records were kept in memory, nothing was written to the database.");
    }

    if failed {
        std::process::exit(1);
    }
}

fn parse_import_arg(arg: &str) -> Option<ImportArg> {
    let (kind, path) = arg.split_once('=')?;
    let kind = match kind.trim().to_lowercase().as_str() {
        "escolas" => FileKind::School,
        "desempenho" => FileKind::Performance,
        "professores" => FileKind::Teacher,
        other => FileKind::parse(other)?,
    };
    if path.is_empty() {
        return None;
    }
    Some(ImportArg {
        kind,
        path: PathBuf::from(path),
    })
}

fn print_file(file: &UploadedFile) {
    println!(
        "{:<12} {:<10} {:<30} {}",
        file.kind.as_str(),
        file.status.as_str(),
        file.file_name,
        file.message.as_deref().unwrap_or("")
    );
}

fn print_usage() {
    eprintln!(
        r#"
Usage: import-csv [OPTIONS] <KIND>=<PATH>...

Import school and performance CSV files into the database.

Arguments:
  <KIND>=<PATH>      File to import. KIND is school (escolas), performance
                     (desempenho) or teacher (professores)

Options:
  -n, --dry-run      Run the full import against an in-memory store
  -h, --help         Show this help message

Environment:
  RUST_ENV, DATABASE_URL and the EDU_* import settings are read as for the server.

Examples:
  import-csv escolas=escolas.csv desempenho=desempenho.csv
  import-csv --dry-run performance=desempenho.csv
"#
    );
}
