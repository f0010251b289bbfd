//! HTTP surface of the star board.
//!
//! - `GET /ping` - liveness
//! - `GET /api/message` - a random batch of stars from the cache
//! - `POST /api/message` - submit a star for asynchronous persistence
//! - `POST /api/donate` - record a donation

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::service::StarService;
use crate::traits::DonationLedger;
use crate::traits::StorageGateway;
use crate::types::CreateOutcome;
use crate::types::DonateOutcome;
use crate::types::Donation;
use crate::types::Slot;
use crate::types::Star;

pub const CACHE_COLD_MESSAGE: &str = "failed to get stars: cache is not warm yet, please resend a request";
pub const ACCEPTED_MESSAGE: &str = "your star will be created soon";
pub const OVERLOADED_MESSAGE: &str = "the server is under heavy load, please resend soon";
pub const DONATION_CREATED_MESSAGE: &str = "donation created";

/// Response body. The variant name becomes the `status` field.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Success { data: Arc<Vec<Star>> },
    #[serde(rename = "success")]
    Created { message: String },
    Failed { message: String },
    Accept { message: String },
    Unavailable { message: String },
}

impl Reply {
    fn failed<S: Into<String>>(message: S) -> Self {
        Reply::Failed {
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Reply::Success { .. } => StatusCode::OK,
            Reply::Created { .. } => StatusCode::CREATED,
            Reply::Failed { .. } => StatusCode::BAD_REQUEST,
            Reply::Accept { .. } => StatusCode::ACCEPTED,
            Reply::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Same body, explicit status code.
    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.with_status(status)
    }
}

pub fn router<G>(service: Arc<StarService<G>>) -> Router
where
    G: DonationLedger,
{
    Router::new()
        .route("/ping", get(ping))
        .route("/api/message", get(get_stars::<G>).post(create_star::<G>))
        .route("/api/donate", post(create_donation::<G>))
        .with_state(service)
}

async fn ping() -> &'static str {
    "pong"
}

async fn get_stars<G>(State(service): State<Arc<StarService<G>>>) -> Response
where
    G: StorageGateway,
{
    match service.handle_read() {
        Slot::Ready(data) => Reply::Success { data }.into_response(),
        // Not the client's fault: a cold slot is a transient server-side condition.
        Slot::Empty => Reply::failed(CACHE_COLD_MESSAGE).with_status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn create_star<G>(
    State(service): State<Arc<StarService<G>>>,
    body: Result<Json<Star>, JsonRejection>,
) -> Reply
where
    G: StorageGateway,
{
    let Json(star) = match body {
        Ok(star) => star,
        Err(rejection) => return Reply::failed(format!("body binding error: {}", rejection.body_text())),
    };

    match service.handle_create(star).await {
        CreateOutcome::Accepted => Reply::Accept {
            message: ACCEPTED_MESSAGE.to_string(),
        },
        CreateOutcome::Rejected => Reply::Unavailable {
            message: OVERLOADED_MESSAGE.to_string(),
        },
        CreateOutcome::Invalid(message) => Reply::failed(message),
    }
}

async fn create_donation<G>(
    State(service): State<Arc<StarService<G>>>,
    body: Result<Json<Donation>, JsonRejection>,
) -> Reply
where
    G: DonationLedger,
{
    let Json(donation) = match body {
        Ok(donation) => donation,
        Err(rejection) => return Reply::failed(format!("body binding error: {}", rejection.body_text())),
    };

    match service.handle_donate(donation).await {
        DonateOutcome::Created => Reply::Created {
            message: DONATION_CREATED_MESSAGE.to_string(),
        },
        DonateOutcome::Invalid(message) => Reply::failed(message),
        DonateOutcome::Failed(err) => Reply::failed(format!("creation error: {err}")),
    }
}
