//! # Sanctuary (church website backend)
//!
//! `sanctuary` serves the dynamic parts of a congregation's website: visitor
//! forms (prayer requests, newsletter, event sign-ups, volunteering, contact),
//! the photo and video galleries, and the YouTube live-stream switch.
//!
//! ## Admin access
//!
//! Content management sits behind a single shared admin password. Logging in
//! yields one opaque session token that expires after a fixed window; a new
//! login replaces it. See [`admin`] for the provisioning rules and their
//! caveats.
//!
//! ## Live updates
//!
//! Media and live-stream mutations are announced on an in-process change
//! feed ([`feed`]) that public pages follow over Server-Sent Events and answer
//! by re-fetching the affected table.

pub mod admin;
pub mod api;
pub mod cli;
pub mod feed;
pub mod live;
pub mod media;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
