//! HTTP adapter for flow definitions.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::adapters::http::error::ApiError;
use crate::application::handlers::GetFlowHandler;
use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::foundation::FlowId;

/// GET /flow/:flowId - Serve a flow definition to the client
pub async fn get_flow(
    State(handler): State<Arc<GetFlowHandler>>,
    Path(flow_id): Path<String>,
) -> Result<Json<FlowDefinition>, ApiError> {
    let flow_id = FlowId::new(flow_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let flow = handler.handle(&flow_id).map_err(|e: FlowError| {
        tracing::debug!(flow_id = %flow_id, "Flow lookup failed");
        ApiError::from(e)
    })?;
    Ok(Json(flow.as_ref().clone()))
}

pub fn flow_routes(handler: Arc<GetFlowHandler>) -> Router {
    Router::new()
        .route("/flow/:flow_id", get(get_flow))
        .with_state(handler)
}
