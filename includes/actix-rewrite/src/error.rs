//! Error and Result module

use actix_web::ResponseError;
use derive_more::{Display, Error, From};

/// Errors which occur when loading rules or applying them to requests
#[derive(Debug, Display, From, Error)]
#[non_exhaustive]
pub enum Error {
    #[display("Internal Io Error")]
    IoError(std::io::Error),

    #[display("Invalid apache rewrite rules")]
    ApacheError(url_rewrite::error::ApacheError),

    #[display("Invalid iis rewrite rules")]
    IisError(url_rewrite::error::IisError),

    #[display("Invalid rewrite rule")]
    BuildError(url_rewrite::error::BuildError),

    #[display("Rewrite returned invalid status code")]
    InvalidStatus(actix_http::error::InvalidStatusCode),

    #[display("Rewrite generated an invalid uri")]
    InvalidUri(actix_http::uri::InvalidUri),
}

impl ResponseError for Error {
    /// Returns `500 Internal Server Error`.
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
    }
}
