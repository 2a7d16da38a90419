//! HTTP surface of the resolver

pub mod redirect;

pub use redirect::{RedirectService, redirect_routes};
