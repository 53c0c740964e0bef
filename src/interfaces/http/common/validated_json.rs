//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>` and then runs
//! `validator::Validate::validate()` on the value. Rejections use the same
//! envelope as domain errors: malformed JSON is a 400 `MALFORMED_JSON`, a
//! failed validation a 422 `VALIDATION_FAILED` whose params map each
//! offending field to its validator codes.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ErrorResponse;

/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct RecordTasks {
///     #[validate(range(min = 1))]
///     tasks: i64,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<RecordTasks>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Malformed(JsonRejection),
    Invalid(ValidationErrors),
}

impl ValidatedJsonRejection {
    fn status(&self) -> StatusCode {
        match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Field name -> validator codes, sorted for stable output.
fn field_codes(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let mut codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
            codes.sort();
            (field.to_string(), codes)
        })
        .collect()
}

fn describe(errors: &ValidationErrors) -> String {
    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        "Validation failed".to_string()
    } else {
        lines.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Malformed(rejection) => ErrorResponse {
                success: false,
                data: None,
                error: format!("Invalid JSON: {}", rejection.body_text()),
                code: "MALFORMED_JSON".to_string(),
                params: None,
            },
            Self::Invalid(errors) => ErrorResponse {
                success: false,
                data: None,
                error: describe(&errors),
                code: "VALIDATION_FAILED".to_string(),
                params: Some(serde_json::json!({ "fields": field_codes(&errors) })),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::Invalid)?;

        Ok(ValidatedJson(value))
    }
}
