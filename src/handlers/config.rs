use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

const CONFIG_TIP: &str =
    "Set USE_MOCK=false and configure API keys in .env to enable real transcription";

/// `GET /api/config`: configuration summary plus live upstream reachability.
pub async fn check_config(state: web::Data<AppState>) -> HttpResponse {
    let (llm, asr) = state.probes.check_all().await;

    tracing::debug!(
        llm_reachable = llm.reachable,
        asr_reachable = asr.reachable,
        "Connectivity probes finished"
    );

    HttpResponse::Ok().json(json!({
        "mock_mode": state.mock_mode(),
        "llm_provider": state.config.llm.provider,
        "llm_status": llm.status(),
        "llm_message": llm.message,
        "asr_status": asr.status(),
        "asr_message": asr.message,
        "tip": CONFIG_TIP
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::state::AppState;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn test_config_without_credentials() {
        let state = AppState::new(AppConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["mock_mode"], true);
        assert_eq!(body["llm_provider"], "dashscope");
        assert_eq!(body["llm_status"], "not configured");
        assert_eq!(body["llm_message"], "LLM not configured. Set DASHSCOPE_API_KEY in .env");
        assert_eq!(body["asr_status"], "not configured");
        assert!(body["tip"].as_str().unwrap().contains("USE_MOCK=false"));
    }
}
