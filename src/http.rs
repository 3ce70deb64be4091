// HTTP delivery layer for the booking engine

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::{
    error::BookingError,
    lifecycle::BookingEngine,
    model::{BookingStatus, CancelRequest, CreateBookingRequest, ListQuery, StatusUpdate},
};

pub const SERVICE_NAME: &str = "Wanderly Travel API";

type Engine = State<Arc<BookingEngine>>;

pub fn router(engine: Arc<BookingEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/customer/:email", get(bookings_by_email))
        .route("/bookings/:code", get(get_booking))
        .route("/bookings/:code/status", put(update_status))
        .route("/bookings/:code/cancel", post(cancel_booking))
        .with_state(engine)
}

pub struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(BookingError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(BookingError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(kind = err.kind(), error = %err, "request failed");
        } else {
            warn!(kind = err.kind(), error = %err, "request rejected");
        }

        let body = json!({
            "success": false,
            "kind": err.kind(),
            "message": err.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    customer_email: Option<String>,
    status: Option<BookingStatus>,
    page: Option<u32>,
    limit: Option<u32>,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /bookings
async fn create_booking(
    State(engine): Engine,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let created = engine.create(request).await?;

    let body = json!({
        "success": true,
        "message": "Booking created",
        "data": created.booking,
        "confirmation": created.confirmation,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// GET /bookings?customerEmail= or GET /bookings?status=&page=&limit=
async fn list_bookings(
    State(engine): Engine,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;

    if let Some(email) = query.customer_email {
        return customer_bookings(&engine, &email).await;
    }

    let page = engine
        .list(&ListQuery {
            status: query.status,
            page: query.page,
            limit: query.limit,
        })
        .await?;

    let body = json!({
        "success": true,
        "count": page.total,
        "totalPages": page.total_pages,
        "currentPage": page.current_page,
        "data": page.items,
    });
    Ok(Json(body).into_response())
}

/// GET /bookings/customer/:email
async fn bookings_by_email(State(engine): Engine, Path(email): Path<String>) -> ApiResult {
    customer_bookings(&engine, &email).await
}

async fn customer_bookings(engine: &BookingEngine, email: &str) -> ApiResult {
    let bookings = engine.list_by_email(email).await?;
    let body = json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    });
    Ok(Json(body).into_response())
}

/// GET /bookings/:code
async fn get_booking(State(engine): Engine, Path(code): Path<String>) -> ApiResult {
    let booking = engine.get_by_code(&code).await?;
    Ok(Json(json!({ "success": true, "data": booking })).into_response())
}

/// PUT /bookings/:code/status
async fn update_status(
    State(engine): Engine,
    Path(code): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    let booking = engine.update_status(&code, update).await?;

    let body = json!({
        "success": true,
        "message": "Booking status updated",
        "data": booking,
    });
    Ok(Json(body).into_response())
}

/// POST /bookings/:code/cancel
async fn cancel_booking(
    State(engine): Engine,
    Path(code): Path<String>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> ApiResult {
    // A bare POST without a JSON body cancels with defaults
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CancelRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let outcome = engine.cancel(&code, request).await?;

    let body = json!({
        "success": true,
        "message": "Booking cancelled",
        "data": outcome.booking,
        "refund": outcome.refund,
    });
    Ok(Json(body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        config::EngineConfig,
        store::{InMemoryBookingStore, InMemoryDestinationStore},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
    };
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    fn app() -> Router {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap(),
        ));
        let engine = BookingEngine::new(
            Arc::new(InMemoryBookingStore::new(clock.clone())),
            Arc::new(InMemoryDestinationStore::with_seed_data()),
            clock,
            EngineConfig::default(),
        );
        router(Arc::new(engine))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn booking_body(check_in: &str, check_out: &str) -> Value {
        json!({
            "destinationId": "gunung-bromo",
            "customer": {
                "name": "Rina Kusuma",
                "email": "rina@example.com",
                "phone": "081298765432"
            },
            "tripDetails": {
                "checkInDate": check_in,
                "checkOutDate": check_out,
                "numberOfGuests": {"adults": 2, "children": 1}
            },
            "specialRequests": {"dietary": "vegetarian"}
        })
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/bookings",
            Some(booking_body("2026-10-28", "2026-10-30")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["bookingCode"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_returns_booking_and_confirmation() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/bookings",
            Some(booking_body("2026-10-28", "2026-10-30")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let data = &body["data"];
        assert_eq!(data["status"], "pending");
        assert_eq!(data["payment"]["status"], "pending");
        assert_eq!(data["payment"]["method"], "bank_transfer");
        assert_eq!(data["tripDetails"]["duration"], 2);
        assert_eq!(data["pricing"]["basePrice"], 1_500_000.0);
        assert_eq!(data["specialRequests"]["dietary"], "vegetarian");
        assert_eq!(body["confirmation"]["guests"], "2 dewasa, 1 anak");
        assert_eq!(body["confirmation"]["totalPrice"], "Rp 3.330.000,00");
    }

    #[tokio::test]
    async fn test_create_error_mapping() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/bookings",
            Some(booking_body("2026-10-01", "2026-10-30")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_check_in");
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/bookings",
            Some(booking_body("2026-10-28", "2026-10-28")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_check_out");

        let mut unknown = booking_body("2026-10-28", "2026-10-30");
        unknown["destinationId"] = json!("atlantis");
        let (status, body) = send(&app, Method::POST, "/bookings", Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "destination_not_found");

        let (status, body) = send(
            &app,
            Method::POST,
            "/bookings",
            Some(json!({"destinationId": "gunung-bromo"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn test_get_and_lookup_by_email() {
        let app = app();
        let code = create(&app).await;

        let (status, body) = send(&app, Method::GET, &format!("/bookings/{code}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bookingCode"], code.as_str());

        let (status, body) = send(&app, Method::GET, "/bookings/WDL-20261018-00000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "booking_not_found");

        let (status, body) = send(
            &app,
            Method::GET,
            "/bookings?customerEmail=RINA@example.com",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) =
            send(&app, Method::GET, "/bookings/customer/rina@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["bookingCode"], code.as_str());
    }

    #[tokio::test]
    async fn test_admin_listing() {
        let app = app();
        for _ in 0..3 {
            create(&app).await;
        }

        let (status, body) = send(&app, Method::GET, "/bookings?page=2&limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["currentPage"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, Method::GET, "/bookings?status=confirmed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);

        let (status, _) = send(&app, Method::GET, "/bookings?status=archived", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_update_and_cancel() {
        let app = app();
        let code = create(&app).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/bookings/{code}/status"),
            Some(json!({"paymentStatus": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "confirmed");
        assert!(body["data"]["payment"]["paidAt"].is_string());

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/bookings/{code}/status"),
            Some(json!({"status": "teleported"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/bookings/{code}/cancel"),
            Some(json!({"reason": "sick", "cancelledBy": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refund"]["percentage"], 100);
        let refunded = body["refund"]["amount"].as_f64().unwrap();
        assert!((refunded - 3_330_000.0).abs() < 1e-6, "{refunded}");
        assert_eq!(body["data"]["cancellation"]["cancelledBy"], "admin");

        let (status, body) =
            send(&app, Method::POST, &format!("/bookings/{code}/cancel"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "already_cancelled");
    }

    #[tokio::test]
    async fn test_cancel_rejects_malformed_body() {
        let app = app();
        let code = create(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/bookings/{code}/cancel"),
            Some(json!({"reason": "fraud", "cancelledBy": "robot"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let (status, body) = send(&app, Method::GET, &format!("/bookings/{code}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "pending");
        assert!(body["data"]["cancellation"].is_null());

        let (status, body) =
            send(&app, Method::POST, &format!("/bookings/{code}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cancellation"]["cancelledBy"], "customer");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
    }
}
