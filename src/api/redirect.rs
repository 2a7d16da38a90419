//! Shortlink resolution
//!
//! `GET /{code}`: look the code up, rebuild the Telegram deep-link into the
//! archive channel, re-shorten it, and answer with a 302. Misses and
//! malformed codes get a plain 404; the handler never propagates a fault.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::config::get_config;
use crate::services::Shortener;
use crate::storage::Storage;
use crate::utils::is_valid_code;

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        storage: web::Data<Arc<dyn Storage>>,
        shortener: web::Data<Arc<Shortener>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if !is_valid_code(&code) {
            // Malformed code: no store lookup
            trace!("Rejected invalid code: {}", &code);
            return Self::not_found_response();
        }

        Self::process_redirect(code, storage, shortener).await
    }

    async fn process_redirect(
        code: String,
        storage: web::Data<Arc<dyn Storage>>,
        shortener: web::Data<Arc<Shortener>>,
    ) -> HttpResponse {
        match storage.get(&code).await {
            Ok(Some(record)) => {
                let archive_channel = get_config().telegram.archive_channel_id;
                let deep_link = record.deep_link(archive_channel);

                // Re-shortened at read time, never stored
                let target = shortener.shorten(&deep_link).await;

                HttpResponse::build(StatusCode::FOUND)
                    .insert_header(("Location", target))
                    .finish()
            }
            Ok(None) => {
                debug!("Shortlink not found: {}", &code);
                Self::not_found_response()
            }
            Err(e) => {
                error!("Store lookup failed for '{}': {}", &code, e);
                Self::error_response()
            }
        }
    }

    /// Catch-all for paths that are not a single code segment
    pub async fn not_found() -> HttpResponse {
        Self::not_found_response()
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("Invalid shortlink!")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("Internal Server Error")
    }
}

/// Redirect route configuration
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::head().to(RedirectService::handle_redirect))
}
