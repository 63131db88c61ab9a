use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use chrono::Utc;
use futures::StreamExt;
use std::io::Write;
use uuid::Uuid;

use crate::models::dataset::{DatasetFormat, ErrorResponse, StoredDataset, UploadResponse};
use crate::services::loader::DatasetLoader;
use crate::services::DatasetStore;

/// Handle a dataset upload: read the multipart file field, validate and
/// parse it, and store the raw bytes for later question cycles.
pub async fn upload_dataset<S>(
    mut payload: Multipart,
    store: web::Data<S>,
) -> Result<HttpResponse, Error>
where
    S: DatasetStore,
{
    let mut file_content = Vec::new();
    let mut filename = String::new();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let content_disposition = field.content_disposition().clone();

        if content_disposition.get_name() == Some("file") {
            if let Some(fname) = content_disposition.get_filename() {
                filename = fname.to_string();
            }

            while let Some(chunk) = field.next().await {
                let data = chunk?;
                file_content.write_all(&data)?;
            }
        }
    }

    if file_content.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No file uploaded".to_string(),
            status_code: 400,
        }));
    }

    let format = match DatasetFormat::from_filename(&filename) {
        Some(format) => format,
        None => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "File must be a CSV or XLSX".to_string(),
                status_code: 400,
            }));
        }
    };

    // Parse up front so a malformed file is rejected at upload time instead
    // of on the first question.
    let df = match DatasetLoader::parse(&file_content, format) {
        Ok(df) => df,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
                status_code: 400,
            }));
        }
    };
    let schema = match DatasetLoader::summarize(&df) {
        Ok(schema) => schema,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
                status_code: 400,
            }));
        }
    };

    let dataset_id = Uuid::new_v4();
    let dataset = StoredDataset {
        id: dataset_id,
        filename: filename.clone(),
        format,
        bytes: file_content,
        uploaded_at: Utc::now(),
    };

    match store.put_dataset(dataset).await {
        Ok(()) => {
            log::info!("✅ Stored dataset {} ({})", dataset_id, filename);
            Ok(HttpResponse::Ok().json(UploadResponse {
                dataset_id,
                filename,
                schema,
                message: Some("File uploaded; ready for questions".to_string()),
            }))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: format!("Failed to store dataset: {}", e),
            status_code: 500,
        })),
    }
}
