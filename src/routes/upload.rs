//! Upload route
//!
//! `POST /upload` accepts `multipart/form-data` with the PDF in a `file` (or
//! `pdf`) field and optional `generate_preview` / `include_layout` fields.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use tracing::Instrument;

use crate::document::{Document, DocumentError};
use crate::error::{AppError, Result};
use crate::extract::{ExtractOptions, ExtractionResult};
use crate::state::AppState;

use super::{admit, request_span, run_extraction};

/// Longest accepted value for a flag field
const MAX_FLAG_BYTES: usize = 64;

/// Upload a PDF and extract it
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>> {
    async move {
        let permit = admit(&state).await?;
        let (document, options) = read_upload(&state, multipart).await?;
        let result = run_extraction(&state, &permit, document, &options).await?;
        Ok::<_, AppError>(Json(result))
    }
    .instrument(request_span())
    .await
}

async fn read_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(Document, ExtractOptions)> {
    let max_bytes = state.loader().config().max_bytes;
    let mut options = ExtractOptions::default();
    let mut upload = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read upload", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" | "pdf" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?
                {
                    let size = data.len() as u64 + chunk.len() as u64;
                    if size > max_bytes {
                        return Err(DocumentError::TooLarge {
                            size,
                            max: max_bytes,
                        }
                        .into());
                    }
                    data.extend_from_slice(&chunk);
                }

                tracing::debug!(
                    "Received file field '{}': filename={:?}, {} bytes",
                    name,
                    filename,
                    data.len()
                );
                upload = Some((filename, content_type, data));
            }
            "generate_preview" | "include_layout" => {
                let value = read_flag_field(&mut field, &name).await?;
                let flag = parse_flag(&name, &value)?;
                if name == "generate_preview" {
                    options.generate_preview = flag;
                } else {
                    options.include_layout = flag;
                }
            }
            _ => {
                tracing::debug!("Ignoring multipart field '{}'", name);
            }
        }
    }

    let (filename, content_type, data) = upload.ok_or_else(|| {
        AppError::BadRequest("No file provided, send the PDF in a 'file' field".to_string())
    })?;

    let document = state
        .loader()
        .receive(filename.as_deref(), content_type.as_deref(), data)?;

    Ok((document, options))
}

/// Read a short text field, refusing values longer than a flag can be
async fn read_flag_field(field: &mut Field<'_>, name: &str) -> Result<String> {
    let mut value = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error("Failed to read field", e))?
    {
        if value.len() + chunk.len() > MAX_FLAG_BYTES {
            return Err(AppError::BadRequest(format!(
                "Field '{}' is longer than {} bytes",
                name, MAX_FLAG_BYTES
            )));
        }
        value.extend_from_slice(&chunk);
    }

    String::from_utf8(value)
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::RequestTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, err.body_text()))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Field '{}' must be true or false, got '{}'",
            name, other
        ))),
    }
}
