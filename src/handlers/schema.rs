use actix_web::{web, Error, HttpResponse};
use uuid::Uuid;

use crate::models::dataset::ErrorResponse;
use crate::services::loader::DatasetLoader;
use crate::services::DatasetStore;

/// Return the schema summary for an uploaded dataset, recomputed from the
/// stored bytes.
pub async fn get_schema<S>(
    dataset_id: web::Path<Uuid>,
    store: web::Data<S>,
) -> Result<HttpResponse, Error>
where
    S: DatasetStore,
{
    let dataset_id = dataset_id.into_inner();

    let dataset = match store.get_dataset(dataset_id).await {
        Ok(Some(dataset)) => dataset,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ErrorResponse {
                error: format!("Dataset with ID {} not found", dataset_id),
                status_code: 404,
            }));
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Store error: {}", e),
                status_code: 500,
            }));
        }
    };

    let schema = DatasetLoader::parse(&dataset.bytes, dataset.format)
        .and_then(|df| DatasetLoader::summarize(&df));
    match schema {
        Ok(schema) => Ok(HttpResponse::Ok().json(schema)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: e.to_string(),
            status_code: 500,
        })),
    }
}
