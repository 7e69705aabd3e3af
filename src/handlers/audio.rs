//! Transcribe and polish endpoints.
//!
//! - `POST /api/transcribe` - multipart upload, field `file`
//! - `POST /api/polish` - JSON body `{"text": "..."}`
//!
//! Input problems (wrong field, content type or an upload over `server.max_upload_bytes`)
//! are rejected with 400 before any service runs. Everything after that
//! answers 200 with a `success` flag; upstream failures are handled by the orchestrator.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;

/// Upload content types accepted by the transcribe endpoint.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "audio/mpeg",
    "audio/wav",
    "audio/x-m4a",
    "audio/mp4",
    "video/mp4",
];

/// Filename used when the upload does not carry one.
const DEFAULT_FILENAME: &str = "audio";

#[derive(Debug, Deserialize)]
pub struct PolishRequest {
    pub text: String,
}

pub async fn transcribe(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    while let Some(item) = payload.next().await {
        let mut field = item?;
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported file type: {}. Allowed: {}",
                if content_type.is_empty() { "none" } else { content_type.as_str() },
                ALLOWED_CONTENT_TYPES.join(", ")
            )));
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();

        let limit = state.config.server.max_upload_bytes;
        let mut content = web::BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if content.len() + chunk.len() > limit {
                return Err(AppError::BadRequest(format!(
                    "File too large. Maximum size is {} bytes",
                    limit
                )));
            }
            content.extend_from_slice(&chunk);
        }

        tracing::info!(
            filename = %filename,
            content_type = %content_type,
            bytes = content.len(),
            "Received audio upload"
        );

        let outcome = state.audio.transcribe(content.freeze(), &filename).await;
        return Ok(HttpResponse::Ok().json(outcome));
    }

    Err(AppError::BadRequest("Missing 'file' field in upload".to_string()))
}

pub async fn polish(
    state: web::Data<AppState>,
    request: web::Json<PolishRequest>,
) -> AppResult<HttpResponse> {
    if request.text.trim().is_empty() {
        return Err(AppError::ValidationError("Text cannot be empty".to_string()));
    }

    let outcome = state.audio.polish(&request.text).await;
    Ok(HttpResponse::Ok().json(outcome))
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::services::{
        AudioService, ConnectivityProbes, MockGenerator, Transcriber, TranscriptionError,
    };
    use crate::state::AppState;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const BOUNDARY: &str = "sonote-test-boundary";

    #[derive(Default)]
    struct CountingTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(
            &self,
            audio: bytes::Bytes,
            filename: &str,
        ) -> Result<String, TranscriptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} bytes from {}", audio.len(), filename))
        }
    }

    fn state_with(mock_mode: bool, transcriber: Option<Arc<CountingTranscriber>>) -> AppState {
        state_with_config(AppConfig::default(), mock_mode, transcriber)
    }

    fn state_with_config(
        mut config: AppConfig,
        mock_mode: bool,
        transcriber: Option<Arc<CountingTranscriber>>,
    ) -> AppState {
        config.mock.enabled = mock_mode;
        let audio = AudioService::new(
            mock_mode,
            true,
            MockGenerator::new(Duration::ZERO, Duration::ZERO),
            transcriber.map(|t| t as Arc<dyn Transcriber>),
            None,
        );
        let probes = ConnectivityProbes::from_config(&config);
        AppState::with_services(config, audio, probes)
    }

    fn upload(content_type: &str, filename: &str, data: &[u8]) -> test::TestRequest {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        test::TestRequest::post()
            .uri("/api/transcribe")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(crate::configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_transcribe_in_mock_mode() {
        let app = app!(state_with(true, None));

        let req = upload("audio/mp4", "sample.m4a", b"<bytes>").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert!(body["transcript"].as_str().unwrap().contains("sample.m4a"));
        assert!(body["error"].is_null());
    }

    #[actix_web::test]
    async fn test_transcribe_passes_bytes_and_filename() {
        let transcriber = Arc::new(CountingTranscriber::default());
        let app = app!(state_with(false, Some(transcriber.clone())));

        let req = upload("audio/wav", "memo.wav", b"12345").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["transcript"], "5 bytes from memo.wav");
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_transcribe_rejects_text_plain_before_any_service() {
        let transcriber = Arc::new(CountingTranscriber::default());
        let app = app!(state_with(false, Some(transcriber.clone())));

        let req = upload("text/plain", "notes.txt", b"hello").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_transcribe_rejects_oversized_upload() {
        let transcriber = Arc::new(CountingTranscriber::default());
        let mut config = AppConfig::default();
        config.server.max_upload_bytes = 4;
        let app = app!(state_with_config(config, false, Some(transcriber.clone())));

        let req = upload("audio/wav", "memo.wav", b"12345").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        let req = upload("audio/wav", "memo.wav", b"1234").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["transcript"], "4 bytes from memo.wav");
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_transcribe_requires_file_field() {
        let app = app!(state_with(true, None));

        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"other\"\r\n\r\n\
             value\r\n--{BOUNDARY}--\r\n"
        );
        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_polish_rejects_blank_text() {
        let app = app!(state_with(true, None));

        let req = test::TestRequest::post()
            .uri("/api/polish")
            .set_json(serde_json::json!({ "text": "   \n" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_polish_without_credentials_returns_mock_success() {
        let app = app!(state_with(false, None));

        let req = test::TestRequest::post()
            .uri("/api/polish")
            .set_json(serde_json::json!({ "text": "那个，今天我们讨论预算" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert!(body["polishedText"]
            .as_str()
            .unwrap()
            .ends_with("原文预览: 那个，今天我们讨论预算"));
        assert_eq!(body["keywords"].as_array().unwrap().len(), 5);
    }
}
