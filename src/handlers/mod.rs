//! HTTP handlers module
//!
//! One submodule per resource. Handlers stay thin: extract, check the
//! caller, call the matching service, and wrap the result in JSON.
//!
//! Extractor rejections are routed through [`AscesaError`] so malformed
//! bodies, query strings and path segments get the same error envelope as
//! everything else.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};

use crate::utils::errors::AscesaError;

pub mod auth;
pub mod benefits;
pub mod documents;
pub mod health;
pub mod partners;
pub mod payments;
pub mod users;

/// `Json` with the application error envelope on rejection
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AscesaError))]
pub struct AppJson<T>(pub T);

/// `Query` with the application error envelope on rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AscesaError))]
pub struct AppQuery<T>(pub T);

/// `Path` with the application error envelope on rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AscesaError))]
pub struct AppPath<T>(pub T);

/// `Multipart` with the application error envelope on rejection
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AscesaError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Self(multipart))
    }
}
