use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Request body read from either an urlencoded form or JSON.
///
/// Anything that is not a form is parsed as JSON and an empty body counts as
/// `{}`, so absent fields reach the handler as `None` instead of a rejection.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid_input(e.body_text()))?;
            return Ok(Payload(value));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &body
        };
        serde_json::from_slice(body)
            .map(Payload)
            .map_err(|e| AppError::invalid_input(format!("invalid JSON body: {e}")))
    }
}

/// Query string parameters; malformed ones are reported as `InvalidInput`.
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        Ok(Params(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Creds {
        username: Option<String>,
        password: Option<String>,
    }

    async fn parse(content_type: Option<&str>, body: &'static str) -> Result<Creds, AppError> {
        let mut req = Request::builder().method("POST").uri("/login");
        if let Some(ct) = content_type {
            req = req.header(CONTENT_TYPE, ct);
        }
        let req = req.body(Body::from(body)).unwrap();
        Payload::<Creds>::from_request(req, &()).await.map(|p| p.0)
    }

    #[tokio::test]
    async fn reads_json_and_forms() {
        let creds = parse(Some("application/json"), r#"{"username":"a","password":"b"}"#)
            .await
            .unwrap();
        assert_eq!(creds.username.as_deref(), Some("a"));

        let creds = parse(Some("application/x-www-form-urlencoded"), "username=a&password=b")
            .await
            .unwrap();
        assert_eq!(creds.password.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn empty_body_means_no_fields() {
        let creds = parse(None, "").await.unwrap();
        assert!(creds.username.is_none());
        assert!(creds.password.is_none());
    }

    #[tokio::test]
    async fn query_params_reject_duplicates_as_invalid_input() {
        let (mut parts, _) = Request::builder()
            .uri("/login?username=a&password=b")
            .body(())
            .unwrap()
            .into_parts();
        let Params(creds) = Params::<Creds>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(creds.username.as_deref(), Some("a"));

        let (mut parts, _) = Request::builder()
            .uri("/login?username=a&username=b")
            .body(())
            .unwrap()
            .into_parts();
        let err = Params::<Creds>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn garbage_is_invalid_input() {
        let err = parse(Some("application/json"), "{not json").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
