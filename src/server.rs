use crate::adapters::{DisabledOrderHistory, StoreApiClient};
use crate::core::engine::DiscountEngine;
use crate::domain::model::ApplyDiscountRequest;
use crate::domain::ports::OrderHistory;
use crate::utils::validation::validate_store_id;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub const APPLY_DISCOUNT_PATH: &str = "/ecom/modules/apply-discount";
pub const STORE_ID_HEADER: &str = "x-store-id";

/// Shared application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub store_api: Option<StoreApiClient>,
}

impl AppState {
    pub fn new(store_api: Option<StoreApiClient>) -> Self {
        Self { store_api }
    }

    /// 依呼叫標頭中的商店 ID 建立查詢來源
    fn order_history(&self, store_id: Option<&str>) -> Box<dyn OrderHistory> {
        match (&self.store_api, store_id) {
            (Some(client), Some(store_id)) => Box::new(client.for_store(store_id)),
            (Some(client), None) => Box::new(client.clone()),
            (None, _) => Box::new(DisabledOrderHistory),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn bad_request(error: &'static str, message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error, message })).into_response()
}

async fn health() -> &'static str {
    "ok"
}

async fn apply_discount(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ApplyDiscountRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected module request body: {}", rejection.body_text());
            return bad_request("invalid_body", rejection.body_text());
        }
    };

    let store_id = match headers.get(STORE_ID_HEADER) {
        None => None,
        Some(value) => {
            let value = value.to_str().unwrap_or_default().trim();
            if let Err(e) = validate_store_id(STORE_ID_HEADER, value) {
                return bad_request("invalid_store_id", e.to_string());
            }
            Some(value.to_string())
        }
    };

    let engine = DiscountEngine::new(state.order_history(store_id.as_deref()));
    let response = engine.apply(&request).await;
    tracing::info!(
        "📦 apply_discount store={} discount={} freebies={}",
        store_id.as_deref().unwrap_or("-"),
        response.discount_value(),
        response.freebie_product_ids.as_ref().map_or(0, Vec::len)
    );
    Json(response).into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route(APPLY_DISCOUNT_PATH, post(apply_discount))
        .with_state(Arc::new(state))
}
