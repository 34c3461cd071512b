//! Import endpoints for the dashboard upload panel.
//!
//! - `GET    /api/v1/imports` - session snapshot
//! - `POST   /api/v1/imports/process` - send validated files to the database
//! - `POST   /api/v1/imports/{kind}` - add files (multipart/form-data)
//! - `DELETE /api/v1/imports/{kind}/{file_name}` - remove a file

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, web};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{FileKind, FileSummary};
use crate::services::UploadSession;

// ============================================================================
// Types
// ============================================================================

/// One file part read from a multipart body.
struct ReceivedFile {
    file_name: String,
    bytes: Vec<u8>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Current session state.
#[get("/imports")]
async fn list_imports(session: web::Data<UploadSession>) -> HttpResponse {
    HttpResponse::Ok().json(session.snapshot())
}

/// Persist every validated file.
///
/// Returns 409 while another batch is running.
#[post("/imports/process")]
async fn process_imports(session: web::Data<UploadSession>) -> AppResult<HttpResponse> {
    let outcome = session.process_files().await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Add one or more files of `kind`.
///
/// Every file part is validated in order; invalid files still get an entry
/// in the error state. Responds 201 with the resulting entries.
#[post("/imports/{kind}")]
async fn upload_import(
    path: web::Path<String>,
    mut payload: Multipart,
    session: web::Data<UploadSession>,
) -> AppResult<HttpResponse> {
    let kind = parse_kind(&path.into_inner())?;
    let max_upload_size = session.settings().max_upload_size;

    let received = read_files(&mut payload, max_upload_size).await?;
    if received.is_empty() {
        return Err(AppError::InvalidInput(
            "No file found in the request. Send a multipart 'file' part.".to_string(),
        ));
    }

    info!("Received {} {} file(s)", received.len(), kind);

    let mut summaries: Vec<FileSummary> = Vec::with_capacity(received.len());
    for file in received {
        let entry = session.add_file(kind, file.file_name, &file.bytes).await;
        summaries.push(entry.summary());
    }

    Ok(HttpResponse::Created().json(summaries))
}

/// Remove the first file matching kind and name.
#[delete("/imports/{kind}/{file_name}")]
async fn delete_import(
    path: web::Path<(String, String)>,
    session: web::Data<UploadSession>,
) -> AppResult<HttpResponse> {
    let (kind, file_name) = path.into_inner();
    let kind = parse_kind(&kind)?;

    if session.remove_file(kind, &file_name)? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!("File '{}'", file_name)))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_kind(raw: &str) -> AppResult<FileKind> {
    FileKind::parse(raw).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Unknown file kind '{}'. Expected school, performance or teacher",
            raw
        ))
    })
}

/// Keep only the last path segment of a client-supplied file name.
fn sanitize_file_name(raw: &str) -> String {
    raw.replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Buffer every file part, enforcing the per-file size limit.
async fn read_files(payload: &mut Multipart, max_upload_size: usize) -> AppResult<Vec<ReceivedFile>> {
    let mut files = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let file_name = match field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(sanitize_file_name)
        {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            if bytes.len() + chunk.len() > max_upload_size {
                warn!("Rejected {}: larger than {} bytes", file_name, max_upload_size);
                return Err(AppError::PayloadTooLarge(format!(
                    "File '{}' exceeds the {} byte limit",
                    file_name, max_upload_size
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        files.push(ReceivedFile { file_name, bytes });
    }

    Ok(files)
}

/// Configure import routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_imports)
        .service(process_imports)
        .service(upload_import)
        .service(delete_import);
}
