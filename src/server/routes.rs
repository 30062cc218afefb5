//! HTTP routes: the device poll endpoint and the JSON control plane.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use super::error::ApiError;
use crate::delivery::{
    ClientId, DeliveryError, DeliveryService, DevicePoll, DeviceReply, JobReceipt, ServiceStatus,
};

/// Path prefix devices poll.
pub const DEVICE_PATH: &str = "/ibb-device/";
/// Query key carrying the device identity.
pub const CLIENT_ID_PARAM: &str = "ID_IWBB";
/// Largest mock drawing size accepted from the control plane.
pub const MAX_MOCK_SIZE: u32 = 20;

type SharedService = Arc<DeliveryService>;

/// Query string of a device poll.
#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    /// Device identity.
    #[serde(rename = "ID_IWBB")]
    pub client_id: Option<String>,
    /// Highest block the device has applied.
    #[serde(rename = "NUM")]
    pub ack: Option<String>,
}

/// Query string of a control-plane action.
#[derive(Debug, Default, Deserialize)]
pub struct ControlQuery {
    /// Target device identity.
    #[serde(rename = "ID_IWBB")]
    pub client_id: Option<String>,
    /// Mock drawing size.
    pub size: Option<String>,
}

impl ControlQuery {
    fn client_id(&self) -> Result<ClientId, DeliveryError> {
        let raw = self
            .client_id
            .as_deref()
            .ok_or_else(|| DeliveryError::malformed(format!("missing {CLIENT_ID_PARAM}")))?;
        ClientId::parse(raw)
    }

    fn size(&self) -> Result<u32, DeliveryError> {
        let raw = self
            .size
            .as_deref()
            .ok_or_else(|| DeliveryError::malformed("missing size"))?;
        let size: u32 = raw
            .trim()
            .parse()
            .map_err(|_| DeliveryError::malformed(format!("invalid size {raw:?}")))?;
        if size > MAX_MOCK_SIZE {
            return Err(DeliveryError::malformed(format!(
                "size {size} exceeds {MAX_MOCK_SIZE}"
            )));
        }
        Ok(size)
    }
}

/// Reply to a queue clear.
#[derive(Debug, Serialize)]
pub struct Cleared {
    /// Device identity.
    pub client: String,
    /// Blocks discarded.
    pub cleared: usize,
}

/// Build the application router around a shared service.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", get(status))
        .route(DEVICE_PATH, get(device_poll))
        .route("/ibb-device/*rest", get(device_poll))
        .route("/clearQueue", get(clear_queue))
        .route("/erase", get(erase))
        .route("/addMockData", get(add_mock_data))
        .route("/jobs", post(submit_job))
        .route("/preview", get(preview))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn device_poll(
    State(service): State<SharedService>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, ApiError> {
    let request = DevicePoll::parse(query.client_id.as_deref(), query.ack.as_deref())?;

    // The poll parks on the queue's condition variable; keep it off the async workers.
    let reply = match tokio::task::spawn_blocking(move || service.poll(&request)).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %err, "poll worker failed; sending empty reply");
            DeviceReply::Empty
        }
    };

    Ok(([(header::CONTENT_TYPE, "text/html")], reply.body()).into_response())
}

async fn status(State(service): State<SharedService>) -> Json<ServiceStatus> {
    Json(service.status())
}

async fn clear_queue(
    State(service): State<SharedService>,
    Query(query): Query<ControlQuery>,
) -> Result<Json<Cleared>, ApiError> {
    let id = query.client_id()?;
    let cleared = service.clear_queue(&id)?;
    Ok(Json(Cleared {
        client: id.to_string(),
        cleared,
    }))
}

async fn erase(
    State(service): State<SharedService>,
    Query(query): Query<ControlQuery>,
) -> Result<Json<JobReceipt>, ApiError> {
    let id = query.client_id()?;
    Ok(Json(service.erase(&id)?))
}

async fn add_mock_data(
    State(service): State<SharedService>,
    Query(query): Query<ControlQuery>,
) -> Result<Json<JobReceipt>, ApiError> {
    let id = query.client_id()?;
    let size = query.size()?;
    Ok(Json(service.add_mock_data(&id, size)?))
}

async fn submit_job(
    State(service): State<SharedService>,
    Query(query): Query<ControlQuery>,
    body: Bytes,
) -> Result<Json<JobReceipt>, ApiError> {
    let id = query.client_id()?;
    let client = service.registry().get(&id)?;
    Ok(Json(service.enqueue_to(&client, &body)?))
}

async fn preview(
    State(service): State<SharedService>,
    Query(query): Query<ControlQuery>,
) -> Result<Response, ApiError> {
    let id = query.client_id()?;
    let svg = service.preview(&id)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
