use axum::extract::{FromRequest, Request};
use axum::Json;
use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use eventdesk_auth::{NewUser, Role};
use eventdesk_core::{DomainError, DomainResult, EventId};
use eventdesk_events::{EventDetails, EventPatch, parse_event_date};

use crate::app::errors::ApiError;

// -------------------------
// Validation
// -------------------------

const INVALID_EMAIL: &str = "Please provide a valid email address.";
const INVALID_ROLE: &str = "Role must be either 'attendee' or 'organizer'.";
const INVALID_DATE: &str = "date must be a valid date";

/// A request body checked with `garde` and then turned into its domain input.
pub trait RequestBody: DeserializeOwned + Validate<Context = ()> {
    type Output;

    /// Client-facing message for the first field that failed its rules.
    fn rejection(&self, field: &str) -> String;

    fn into_domain(self) -> DomainResult<Self::Output>;
}

/// Run the `garde` rules and report only the first failing field.
pub fn validated<T: RequestBody>(body: T) -> Result<T::Output, ApiError> {
    if let Err(report) = body.validate(&()) {
        let field = report
            .iter()
            .next()
            .map(|(path, _)| path.to_string())
            .unwrap_or_default();
        tracing::debug!(%report, "request body rejected");
        return Err(ApiError::bad_request(body.rejection(&field)));
    }
    Ok(body.into_domain()?)
}

/// JSON body extractor that rejects with 400 before the handler runs.
///
/// Yields the validated domain input rather than the raw body.
pub struct ValidJson<T: RequestBody>(pub T::Output);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: RequestBody,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        validated(body).map(Self)
    }
}

/// Parse an `:id` path segment.
pub fn parse_event_id(raw: &str) -> Result<EventId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid event id"))
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

fn optional_not_blank(value: &Option<String>, ctx: &()) -> garde::Result {
    value.as_deref().map_or(Ok(()), |v| not_blank(v, ctx))
}

/// `garde`'s email rule accepts leading, trailing and doubled dots in the
/// local part; a dot-atom does not.
fn dot_atom_local_part(value: &str, _ctx: &()) -> garde::Result {
    let local = value.rsplit_once('@').map_or(value, |(local, _)| local);
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(garde::Error::new("not a valid email address"));
    }
    Ok(())
}

fn known_role(value: &Option<String>, _ctx: &()) -> garde::Result {
    match value.as_deref() {
        Some(raw) if Role::parse(raw).is_none() => Err(garde::Error::new("unknown role")),
        _ => Ok(()),
    }
}

fn valid_date(value: &str, _ctx: &()) -> garde::Result {
    parse_event_date(value)
        .map(|_| ())
        .map_err(|_| garde::Error::new("not a valid date"))
}

fn optional_valid_date(value: &Option<String>, ctx: &()) -> garde::Result {
    value.as_deref().map_or(Ok(()), |v| valid_date(v, ctx))
}

fn email_rejection(email: &str) -> String {
    if email.is_empty() {
        "Email cannot be empty.".to_string()
    } else {
        INVALID_EMAIL.to_string()
    }
}

fn password_rejection(password: &str) -> String {
    if password.is_empty() {
        "Password cannot be empty.".to_string()
    } else {
        "Password must be at least 6 characters long.".to_string()
    }
}

fn event_field_rejection(field: &str) -> String {
    match field {
        "date" => INVALID_DATE.to_string(),
        other => format!("{other} is required"),
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[garde(custom(not_blank))]
    pub name: String,
    #[garde(email, custom(dot_atom_local_part))]
    pub email: String,
    #[garde(length(chars, min = 6))]
    pub password: String,
    #[garde(custom(known_role))]
    pub role: Option<String>,
}

impl RequestBody for RegisterRequest {
    type Output = NewUser;

    fn rejection(&self, field: &str) -> String {
        match field {
            "name" => "Name cannot be empty.".to_string(),
            "email" => email_rejection(&self.email),
            "password" => password_rejection(&self.password),
            _ => INVALID_ROLE.to_string(),
        }
    }

    fn into_domain(self) -> DomainResult<NewUser> {
        let role = match self.role.as_deref() {
            None => Role::default(),
            Some(raw) => Role::parse(raw).ok_or_else(|| DomainError::validation(INVALID_ROLE))?,
        };
        Ok(NewUser::new(&self.name, &self.email, &self.password, role))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[garde(email, custom(dot_atom_local_part))]
    pub email: String,
    #[garde(length(chars, min = 6))]
    pub password: String,
}

/// Login input after validation.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl RequestBody for LoginRequest {
    type Output = Credentials;

    fn rejection(&self, field: &str) -> String {
        match field {
            "email" => email_rejection(&self.email),
            _ => password_rejection(&self.password),
        }
    }

    fn into_domain(self) -> DomainResult<Credentials> {
        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateEventRequest {
    #[garde(custom(not_blank))]
    pub title: String,
    #[garde(custom(not_blank))]
    pub description: String,
    #[garde(custom(valid_date))]
    pub date: String,
    #[garde(custom(not_blank))]
    pub time: String,
}

impl RequestBody for CreateEventRequest {
    type Output = EventDetails;

    fn rejection(&self, field: &str) -> String {
        event_field_rejection(field)
    }

    fn into_domain(self) -> DomainResult<EventDetails> {
        EventDetails::new(&self.title, &self.description, &self.date, &self.time)
    }
}

/// Unknown fields (e.g. `organizer`, `participants`) are ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateEventRequest {
    #[garde(custom(optional_not_blank))]
    pub title: Option<String>,
    #[garde(custom(optional_not_blank))]
    pub description: Option<String>,
    #[garde(custom(optional_valid_date))]
    pub date: Option<String>,
    #[garde(custom(optional_not_blank))]
    pub time: Option<String>,
}

impl RequestBody for UpdateEventRequest {
    type Output = EventPatch;

    fn rejection(&self, field: &str) -> String {
        event_field_rejection(field)
    }

    fn into_domain(self) -> DomainResult<EventPatch> {
        EventPatch::new(
            self.title.as_deref(),
            self.description.as_deref(),
            self.date.as_deref(),
            self.time.as_deref(),
        )
    }
}

// -------------------------
// Response envelope
// -------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(message: &'static str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message,
        data: Some(data),
    })
}

/// Envelope with no `data` field.
pub fn message_only(message: &'static str) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        message,
        data: None,
    })
}
