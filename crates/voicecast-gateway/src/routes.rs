//! HTTP surface: uploads in, JSON and CSV out. All timeline logic lives in `voicecast_core`.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use voicecast_core::{
    assign_voice, clear_voice, export_csv, format_timecode, import_csv, sorted_by_start, speakers,
    total_duration, ElevenLabsCatalog, ImportOptions, Segment, TimelineResult, VoiceCatalog,
};

use crate::settings::GatewayConfig;
use crate::uploads::{is_csv, video_extension, UploadStore};

const EXPORT_FILE_NAME: &str = "script_timeline.csv";

pub struct AppState {
    pub import: ImportOptions,
    pub uploads: UploadStore,
    /// `None` when no voice API key is configured.
    pub catalog: Option<Arc<dyn VoiceCatalog>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> TimelineResult<Self> {
        let catalog = config.voice_api_key.as_ref().map(|key| {
            Arc::new(ElevenLabsCatalog::new(config.voice_api_base_url.as_str(), key.as_str()))
                as Arc<dyn VoiceCatalog>
        });
        Ok(Self {
            import: config.import_options()?,
            uploads: UploadStore::new(&config.upload_dir),
            catalog,
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.uploads.root());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route("/", get(serve_index))
        .route("/get-voices", get(voices_handler))
        .route("/upload-csv", post(upload_csv_handler))
        .route("/upload-video", post(upload_video_handler))
        .route("/assign-voice", post(assign_voice_handler))
        .route("/export-csv", post(export_csv_handler))
        .nest_service("/uploads", uploads)
        .layer(body_limit)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn serve_index() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

/// Segment plus display fields. Clients send it back as a plain `Segment`; extras are ignored.
#[derive(Serialize)]
struct SegmentView<'a> {
    #[serde(flatten)]
    segment: &'a Segment,
    start_time_formatted: String,
    end_time_formatted: String,
    duration: f64,
}

impl<'a> From<&'a Segment> for SegmentView<'a> {
    fn from(segment: &'a Segment) -> Self {
        Self {
            segment,
            start_time_formatted: format_timecode(segment.start_seconds),
            end_time_formatted: format_timecode(segment.end_seconds),
            duration: segment.duration(),
        }
    }
}

fn segment_views(segments: &[Segment]) -> Vec<SegmentView<'_>> {
    segments.iter().map(SegmentView::from).collect()
}

/// GET /get-voices: provider catalog, or an empty list when no key is configured.
async fn voices_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let Some(catalog) = state.catalog.as_ref() else {
        return Ok(Json(json!({ "voices": [], "api_key_configured": false })));
    };

    match catalog.list_voices().await {
        Ok(voices) => Ok(Json(json!({ "voices": voices, "api_key_configured": true }))),
        Err(e) => {
            tracing::error!("Error fetching voices: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": format!("Error fetching voices: {}", e),
                    "voices": [],
                    "api_key_configured": true,
                })),
            ))
        }
    }
}

/// Client file name of an upload field; an empty name means nothing was selected.
fn upload_file_name(field: &Field<'_>) -> Result<String, ApiError> {
    let file_name = field.file_name().unwrap_or_default().trim().to_string();
    if file_name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No file selected"));
    }
    Ok(file_name)
}

fn missing_field(field_name: &str) -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("No {} provided", field_name),
    )
}

fn invalid_upload(e: MultipartError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
}

/// POST /upload-csv: infer columns, build the timeline, keep the file under a generated name.
async fn upload_csv_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some("csv_file") {
            continue;
        }
        let file_name = upload_file_name(&field)?;
        if !is_csv(&file_name) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Please upload a CSV file. Only .csv files are allowed.",
            ));
        }
        // Parsed in memory anyway, so the body is buffered whole.
        let bytes = field.bytes().await.map_err(invalid_upload)?;
        return import_upload(&state, &file_name, &bytes).await;
    }
    Err(missing_field("csv_file"))
}

async fn import_upload(
    state: &AppState,
    file_name: &str,
    bytes: &[u8],
) -> Result<Json<Value>, ApiError> {
    let import = import_csv(bytes, &state.import).map_err(|e| {
        tracing::warn!(file = %file_name, error = %e, "CSV import failed");
        api_error(StatusCode::BAD_REQUEST, format!("Error processing CSV: {}", e))
    })?;

    let upload_id = state.uploads.store(bytes, "csv").await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save CSV file: {}", e),
        )
    })?;

    tracing::info!(
        file = %file_name,
        upload_id = %upload_id,
        segments = import.segments.len(),
        rejected = import.rejected.len(),
        "CSV timeline imported"
    );

    let display = sorted_by_start(&import.segments);
    Ok(Json(json!({
        "upload_id": upload_id,
        "columns": import.columns,
        "mapping": import.mapping,
        "segments": segment_views(&display),
        "speakers": speakers(&import.segments),
        "total_duration": total_duration(&import.segments),
        "rejected": import.rejected,
    })))
}

/// POST /upload-video: stream the file to disk untouched for client-side preview.
async fn upload_video_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some("video_file") {
            continue;
        }
        let file_name = upload_file_name(&field)?;
        let Some(extension) = video_extension(&file_name) else {
            return Err(api_error(StatusCode::BAD_REQUEST, "Invalid video file format"));
        };

        let mut pending = state.uploads.create(&extension).await.map_err(video_save_error)?;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    pending.discard().await;
                    return Err(invalid_upload(e));
                }
            };
            if let Err(e) = pending.write(&chunk).await {
                pending.discard().await;
                return Err(video_save_error(e));
            }
        }
        let filename = pending.finish().await.map_err(video_save_error)?;

        return Ok(Json(json!({
            "url": format!("/uploads/{}", filename),
            "filename": filename,
        })));
    }
    Err(missing_field("video_file"))
}

fn video_save_error(e: std::io::Error) -> ApiError {
    tracing::error!("Video upload error: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error uploading video: {}", e),
    )
}

#[derive(Deserialize)]
struct AssignVoiceRequest {
    segments: Vec<Segment>,
    speaker: String,
    voice_id: String,
}

/// POST /assign-voice: set one voice on every segment of a speaker. A blank voice clears it.
async fn assign_voice_handler(Json(body): Json<AssignVoiceRequest>) -> Result<Json<Value>, ApiError> {
    if body.speaker.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No speaker given"));
    }
    let segments = match body.voice_id.trim() {
        "" => clear_voice(&body.segments, &body.speaker),
        voice_id => assign_voice(&body.segments, &body.speaker, voice_id),
    };
    Ok(Json(json!({ "segments": segment_views(&segments) })))
}

#[derive(Deserialize)]
struct ExportRequest {
    columns: Vec<String>,
    segments: Vec<Segment>,
}

/// POST /export-csv: original columns plus `voice_id`, as a download.
async fn export_csv_handler(Json(body): Json<ExportRequest>) -> Result<Response, ApiError> {
    if body.segments.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No segments to export"));
    }
    if body.columns.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No columns to export"));
    }

    let bytes = export_csv(&body.segments, &body.columns).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error exporting CSV: {}", e),
        )
    })?;
    tracing::info!(segments = body.segments.len(), "CSV exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
