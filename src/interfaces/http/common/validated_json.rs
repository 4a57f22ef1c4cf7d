//! JSON body extractor that also runs `validator` rules
//!
//! Malformed bodies and rule violations are both answered with 400 and the
//! standard error envelope, so handlers only ever see requests that passed
//! their DTO's `#[validate(...)]` attributes.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::interfaces::http::error::{bad_request, ApiError};

/// `Json<T>` plus `T::validate()`.
///
/// ```ignore
/// pub async fn create_vehicle(
///     State(state): State<VehicleHandlerState>,
///     Extension(actor): Extension<Actor>,
///     ValidatedJson(request): ValidatedJson<CreateVehicleRequest>,
/// ) -> ApiResult<VehicleDto> { ... }
/// ```
pub struct ValidatedJson<T>(pub T);

/// `field: message` pairs joined with `"; "`, sorted so the text does not
/// depend on hash-map order.
pub fn field_messages(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid ({})", field, e.code),
            })
        })
        .collect();
    messages.sort();

    if messages.is_empty() {
        "Validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| bad_request(format!("Invalid JSON: {}", rejection.body_text())))?;

        value
            .validate()
            .map_err(|errors| bad_request(field_messages(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use crate::interfaces::http::common::ApiResponse;
    use crate::interfaces::http::modules::auth::SignupRequest;

    async fn accept_signup(ValidatedJson(request): ValidatedJson<SignupRequest>) -> String {
        request.email
    }

    async fn post_signup(body: Body) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route("/signup", post(accept_signup));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/signup")
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json(value: serde_json::Value) -> Body {
        Body::from(serde_json::to_vec(&value).unwrap())
    }

    #[tokio::test]
    async fn valid_signup_reaches_the_handler() {
        let (status, body) = post_signup(json(serde_json::json!({
            "name": "Dana",
            "email": "dana@example.com",
            "password": "hunter22",
            "phone": "555-0100"
        })))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"dana@example.com");
    }

    #[tokio::test]
    async fn missing_field_is_reported_as_invalid_json() {
        let (status, body) = post_signup(json(serde_json::json!({
            "name": "Dana",
            "email": "dana@example.com"
        })))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let envelope: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
        assert!(!envelope.success);
        let error = envelope.error.unwrap();
        assert!(error.starts_with("Invalid JSON:"), "{}", error);
        assert!(error.contains("password"), "{}", error);
    }

    #[tokio::test]
    async fn rule_violations_are_listed_per_field() {
        let (status, body) = post_signup(json(serde_json::json!({
            "name": "Dana",
            "email": "not-an-email",
            "password": "123",
            "phone": ""
        })))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let envelope: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            envelope.error.as_deref(),
            Some(
                "email: Invalid email format; \
                 password: Password must be at least 6 characters long; \
                 phone: phone is required"
            )
        );
    }

    #[test]
    fn no_field_errors_falls_back_to_generic_message() {
        assert_eq!(field_messages(&ValidationErrors::new()), "Validation failed");
    }
}
