use crate::{
    model_service::{ModelState, TumorPrediction},
    server::SharedState,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictTumorError {
    #[error("Model not loaded. Please check backend logs.")]
    ModelNotLoaded,
    #[error("No image file provided in the request.")]
    NoImageFile,
    #[error("No selected file.")]
    NoSelectedFile,
    #[error("Error processing image or making prediction: {0}")]
    Processing(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for PredictTumorError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictTumorError::NoImageFile | PredictTumorError::NoSelectedFile => {
                StatusCode::BAD_REQUEST
            }
            PredictTumorError::ModelNotLoaded | PredictTumorError::Processing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict_tumor(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TumorPrediction>, PredictTumorError> {
    // The extractor result is deferred so the model check stays the first
    // precondition even for requests that are not multipart at all.
    let model = match state.model.as_ref() {
        ModelState::Ready(model) => model.clone(),
        ModelState::Unavailable(reason) => {
            tracing::warn!(reason = %reason, "prediction requested while model is unavailable");
            return Err(PredictTumorError::ModelNotLoaded);
        }
    };

    // A request without a multipart body carries no image file.
    let mut multipart = multipart.map_err(|_| PredictTumorError::NoImageFile)?;

    let mut image_field = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| PredictTumorError::NoImageFile)?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().map(str::to_owned);
            let data = field
                .bytes()
                .await
                .map_err(|e| PredictTumorError::Processing(e.to_string()))?;
            image_field = Some((filename, data));
            break;
        }
    }

    // A part without a filename attribute is a plain form field, not an
    // uploaded file.
    let (filename, image_data) = image_field.ok_or(PredictTumorError::NoImageFile)?;
    match filename.as_deref() {
        None => return Err(PredictTumorError::NoImageFile),
        Some("") => return Err(PredictTumorError::NoSelectedFile),
        Some(_) => {}
    }

    let probability = model
        .predict(&image_data)
        .map_err(|e| PredictTumorError::Processing(e.to_string()))?;

    tracing::debug!(probability, "inference completed");

    Ok(Json(TumorPrediction::from_probability(probability)))
}
