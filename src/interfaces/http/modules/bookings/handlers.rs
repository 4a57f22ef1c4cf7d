//! Booking Ledger API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    parse_rental_date, BookingDto, BookingListItem, CreateBookingRequest, CreatedBookingDto,
    TransitionedBookingDto, UpdateBookingRequest,
};
use crate::application::BookingService;
use crate::domain::{Actor, BookingStatus, NewBooking};
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};
use crate::interfaces::http::error::{bad_request, domain_error, ApiError, ApiResult};

#[derive(Clone)]
pub struct BookingHandlerState {
    pub booking_service: Arc<BookingService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<CreatedBookingDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Booking for another customer"),
        (status = 404, description = "Customer or vehicle not found"),
        (status = 409, description = "Vehicle is not available")
    )
)]
pub async fn create_booking(
    State(state): State<BookingHandlerState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedBookingDto>>), ApiError> {
    let customer_id = match (request.customer_id, actor.is_admin()) {
        (Some(id), _) => id,
        (None, false) => actor.id,
        (None, true) => return Err(bad_request("customer_id is required")),
    };
    let new_booking = NewBooking {
        customer_id,
        vehicle_id: request.vehicle_id,
        rent_start_date: parse_rental_date("rent_start_date", &request.rent_start_date)
            .map_err(domain_error)?,
        rent_end_date: parse_rental_date("rent_end_date", &request.rent_end_date)
            .map_err(domain_error)?,
    };

    let created = state
        .booking_service
        .create_booking(&actor, new_booking)
        .await
        .map_err(domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            created.into(),
            "Booking created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible bookings", body = ApiResponse<Vec<BookingListItem>>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_bookings(
    State(state): State<BookingHandlerState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Vec<BookingListItem>> {
    let bookings = state
        .booking_service
        .list_bookings(&actor)
        .await
        .map_err(domain_error)?;

    let shape = if actor.is_admin() {
        BookingListItem::for_admin
    } else {
        BookingListItem::for_customer
    };
    let message = if actor.is_admin() {
        "Bookings retrieved successfully"
    } else {
        "Your bookings retrieved successfully"
    };
    Ok(Json(ApiResponse::success_with_message(
        bookings.into_iter().map(shape).collect(),
        message,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> ApiResult<BookingDto> {
    let booking = state
        .booking_service
        .get_booking(&actor, id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking cancelled or returned", body = ApiResponse<TransitionedBookingDto>),
        (status = 400, description = "Invalid status update"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Booking is not active, or already started")
    )
)]
pub async fn update_booking(
    State(state): State<BookingHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateBookingRequest>,
) -> ApiResult<TransitionedBookingDto> {
    let booking = state
        .booking_service
        .transition_booking(id, &request.status, &actor)
        .await
        .map_err(domain_error)?;

    let message = match booking.status {
        BookingStatus::Returned => "Booking marked as returned. Vehicle is now available",
        _ => "Booking cancelled successfully",
    };
    Ok(Json(ApiResponse::success_with_message(
        booking.into(),
        message,
    )))
}
