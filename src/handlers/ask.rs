use actix_web::{web, Error, HttpResponse};
use log::{error, info};

use crate::error::AnalysisError;
use crate::models::dataset::{AskRequest, ErrorResponse};
use crate::services::{AnalysisService, DatasetStore, OracleService};

/// Handle a natural-language question about an uploaded dataset.
pub async fn ask_question<S, O>(
    request: web::Json<AskRequest>,
    service: web::Data<AnalysisService<S, O>>,
) -> Result<HttpResponse, Error>
where
    S: DatasetStore + Clone + std::fmt::Debug,
    O: OracleService + Clone + std::fmt::Debug,
{
    info!("Received question: {}", request.question);

    match service.ask(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(AnalysisError::DatasetNotFound(id)) => {
            Ok(HttpResponse::NotFound().json(ErrorResponse {
                error: format!("Dataset with ID {} not found", id),
                status_code: 404,
            }))
        }
        Err(e) => {
            error!("Error processing question: {}", e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
                status_code: 500,
            }))
        }
    }
}
