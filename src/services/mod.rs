//! Service layer for business logic
//!
//! Shared between the bot dispatcher and the HTTP resolver; the Telegram
//! client only appears behind the `Forwarder`/`Notifier` seams.

pub mod admins;
pub mod archive;
pub mod shortener;

pub use admins::AdminStore;
pub use archive::{ArchiveService, ContentSummary, Forwarder, Notifier};
pub use shortener::Shortener;
