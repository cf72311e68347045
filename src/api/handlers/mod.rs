pub mod ai;
pub mod login;
pub mod report;
pub mod status;
pub mod trades;
pub mod users;

use axum::body::Bytes;
use axum::extract::Multipart;
use serde::Serialize;

use crate::errors::AppError;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// A file received as the `file` field of a multipart form.
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".into()));
        }

        return Ok(Upload { file_name, bytes });
    }

    Err(AppError::BadRequest("missing multipart field 'file'".into()))
}
