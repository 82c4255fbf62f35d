//! Form field extraction and numeric coercion.
//!
//! Bodies may be urlencoded or `multipart/form-data`. Fields are coerced by
//! their leading numeric prefix: `"12abc"` is 12, `"5.9"` is 5 as an integer,
//! and anything without a numeric prefix is zero.
//! Missing or unparsable input is never an error; [`Coerced`] records which
//! path was taken so callers can log it.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::database::record::PlateauMonitorRecord;

pub const PLATEAU_NUMBER: &str = "plateau_number";
pub const DURATION_SECONDS: &str = "duration_seconds";

/// Outcome of coercing one raw field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced<T> {
    /// The whole value was numeric.
    Exact(T),
    /// A numeric prefix was used and the rest ignored.
    Prefix(T),
    /// The field was not submitted.
    Missing,
    /// The field had no numeric prefix.
    Invalid,
}

impl<T: Default> Coerced<T> {
    /// Coerced value, zero for `Missing` and `Invalid`
    pub fn value(self) -> T {
        match self {
            Coerced::Exact(v) | Coerced::Prefix(v) => v,
            Coerced::Missing | Coerced::Invalid => T::default(),
        }
    }

    /// Whether the submitted text was (partly) discarded
    pub fn is_lossy(&self) -> bool {
        matches!(self, Coerced::Prefix(_) | Coerced::Invalid)
    }
}

impl Coerced<i64> {
    pub fn integer(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Coerced::Missing;
        };
        let Some(prefix) = NumericPrefix::scan(raw) else {
            return Coerced::Invalid;
        };

        let value = if prefix.is_integral {
            prefix.text.parse::<i64>().unwrap_or_else(|_| saturate(prefix.text))
        } else {
            // Float-shaped text truncates toward zero; `as` saturates at the bounds
            prefix.text.parse::<f64>().map(|f| f as i64).unwrap_or(0)
        };
        prefix.wrap(value)
    }
}

impl Coerced<f64> {
    pub fn float(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Coerced::Missing;
        };
        let Some(prefix) = NumericPrefix::scan(raw) else {
            return Coerced::Invalid;
        };

        match prefix.text.parse::<f64>() {
            Ok(value) => prefix.wrap(value),
            Err(_) => Coerced::Invalid,
        }
    }
}

fn saturate(digits: &str) -> i64 {
    if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }
}

/// Longest leading `[+-]?(d+(.d*)?|.d+)([eE][+-]?d+)?` after ASCII whitespace
struct NumericPrefix<'a> {
    text: &'a str,
    is_integral: bool,
    complete: bool,
}

impl<'a> NumericPrefix<'a> {
    fn scan(raw: &'a str) -> Option<Self> {
        let trimmed = raw.trim_start_matches([' ', '\t', '\n', '\r', '\x0B', '\x0C']);
        let bytes = trimmed.as_bytes();
        let mut end = 0;

        if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
            end += 1;
        }

        let int_digits = count_digits(&bytes[end..]);
        end += int_digits;

        let mut frac_digits = 0;
        let mut is_integral = true;
        if bytes.get(end) == Some(&b'.') {
            frac_digits = count_digits(&bytes[end + 1..]);
            if int_digits > 0 || frac_digits > 0 {
                end += 1 + frac_digits;
                is_integral = false;
            }
        }

        if int_digits == 0 && frac_digits == 0 {
            return None;
        }

        if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
                exp_end += 1;
            }
            let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
            if exp_digits > 0 {
                end = exp_end + exp_digits;
                is_integral = false;
            }
        }

        let rest = &trimmed[end..];
        Some(Self {
            text: &trimmed[..end],
            is_integral,
            complete: rest.trim_matches([' ', '\t', '\n', '\r', '\x0B', '\x0C']).is_empty(),
        })
    }

    fn wrap<T>(&self, value: T) -> Coerced<T> {
        if self.complete {
            Coerced::Exact(value)
        } else {
            Coerced::Prefix(value)
        }
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// The raw fields of a plateau submission, before coercion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateauForm {
    pub plateau_number: Option<String>,
    pub duration_seconds: Option<String>,
}

impl PlateauForm {
    /// Pick the two known fields out of a urlencoded body. Unknown fields are
    /// ignored and a repeated field keeps its last value.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = PlateauForm::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            form.set(&key, value.into_owned());
        }
        form
    }

    /// Pick the two known fields out of a multipart body, with the same rules
    /// as [`PlateauForm::from_urlencoded`]. File parts are skipped. A malformed
    /// body keeps whatever fields were read before the error; only an
    /// oversized body is rejected.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, Response> {
        let mut form = PlateauForm::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return form.after_multipart_error(e.into_response()),
            };
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.text().await {
                Ok(value) => form.set(&name, value),
                Err(e) => return form.after_multipart_error(e.into_response()),
            }
        }
        Ok(form)
    }

    fn after_multipart_error(self, rejection: Response) -> Result<Self, Response> {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(rejection);
        }
        tracing::warn!(status = %rejection.status(), "stopped reading malformed multipart body");
        Ok(self)
    }

    fn set(&mut self, key: &str, value: String) {
        match key {
            PLATEAU_NUMBER => self.plateau_number = Some(value),
            DURATION_SECONDS => self.duration_seconds = Some(value),
            _ => {}
        }
    }

    pub fn plateau_number(&self) -> Coerced<i64> {
        Coerced::integer(self.plateau_number.as_deref())
    }

    pub fn duration_seconds(&self) -> Coerced<f64> {
        Coerced::float(self.duration_seconds.as_deref())
    }

    pub fn into_record(self) -> PlateauMonitorRecord {
        let plateau_number = self.plateau_number();
        let duration_seconds = self.duration_seconds();

        if plateau_number.is_lossy() {
            tracing::warn!(
                field = PLATEAU_NUMBER,
                raw = ?self.plateau_number,
                coerced = plateau_number.value(),
                "coerced non-numeric input"
            );
        }
        if duration_seconds.is_lossy() {
            tracing::warn!(
                field = DURATION_SECONDS,
                raw = ?self.duration_seconds,
                coerced = duration_seconds.value(),
                "coerced non-numeric input"
            );
        }

        PlateauMonitorRecord {
            plateau_number: plateau_number.value(),
            duration_seconds: duration_seconds.value(),
        }
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Reads `multipart/form-data` bodies as multipart and every other body as
/// urlencoded, whatever its declared type. Only an oversized body is rejected.
#[async_trait]
impl<S> FromRequest<S> for PlateauForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            return match Multipart::from_request(req, state).await {
                Ok(multipart) => PlateauForm::from_multipart(multipart).await,
                Err(rejection) => {
                    // e.g. no boundary: nothing can be read, so no fields
                    tracing::warn!("unreadable multipart request: {}", rejection.body_text());
                    Ok(PlateauForm::default())
                }
            };
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(PlateauForm::from_urlencoded(&body))
    }
}
