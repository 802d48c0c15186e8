//! Привязки для фронтенда: JSON на входе, JSON на выходе

use wasm_bindgen::prelude::*;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::facade::{AnalyticsFacade, AnalyticsRequest, AnalyticsResponse, ErrorReport};

fn facade(config_json: Option<String>) -> Result<AnalyticsFacade, AnalyticsError> {
    let config = match config_json {
        Some(json) => AnalyticsConfig::from_json_str(&json)?,
        None => AnalyticsConfig::default(),
    };
    Ok(AnalyticsFacade::new(config))
}

fn error_json(error: &AnalyticsError) -> String {
    serde_json::to_string(&ErrorReport::from(error))
        .unwrap_or_else(|_| r#"{"error":"serialization failed","kind":"degenerate_computation"}"#.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error_json(&AnalyticsError::DegenerateComputation(format!("serialization failed: {}", e)))
    })
}

/// Одна операция: `{"operation": "leave_patterns", "records": [...]}`
#[wasm_bindgen(js_name = runAnalytics)]
pub fn run_analytics(request_json: &str, config_json: Option<String>) -> String {
    let facade = match facade(config_json) {
        Ok(facade) => facade,
        Err(e) => return error_json(&e),
    };
    let request: AnalyticsRequest = match serde_json::from_str(request_json) {
        Ok(request) => request,
        Err(e) => return error_json(&AnalyticsError::InvalidInput(format!("request: {}", e))),
    };
    to_json(&facade.run(&request))
}

/// Пакет операций последовательно, плюс общий ранжированный список инсайтов
#[wasm_bindgen(js_name = runAnalyticsBatch)]
pub fn run_analytics_batch(requests_json: &str, config_json: Option<String>) -> String {
    let facade = match facade(config_json) {
        Ok(facade) => facade,
        Err(e) => return error_json(&e),
    };
    let requests: Vec<AnalyticsRequest> = match serde_json::from_str(requests_json) {
        Ok(requests) => requests,
        Err(e) => return error_json(&AnalyticsError::InvalidInput(format!("requests: {}", e))),
    };

    let responses: Vec<AnalyticsResponse> = requests.iter().map(|r| facade.run(r)).collect();
    let insights = AnalyticsFacade::compose_insights(&responses);
    to_json(&serde_json::json!({
        "responses": responses,
        "insights": insights,
    }))
}
