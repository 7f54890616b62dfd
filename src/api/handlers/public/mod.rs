//! Visitor-facing forms and read models. No authentication; every write is
//! validated here before it reaches the database.

pub mod contact;
pub mod events;
pub mod gallery;
pub mod newsletter;
pub mod prayer;
mod storage;
pub mod types;
pub mod volunteers;

use crate::api::handlers::{non_blank, normalize_email, valid_email};

const INVALID_EMAIL: &str = "Invalid email address";

/// Required email: trimmed, lowercased and format checked.
fn required_email(email: Option<&str>, missing: &'static str) -> Result<String, &'static str> {
    let email = non_blank(email).ok_or(missing)?;
    checked_email(&email)
}

/// Optional email: blank means absent, anything else must be well formed.
fn optional_email(email: Option<&str>) -> Result<Option<String>, &'static str> {
    non_blank(email).map(|email| checked_email(&email)).transpose()
}

fn checked_email(email: &str) -> Result<String, &'static str> {
    let email = normalize_email(email);
    if valid_email(&email) {
        Ok(email)
    } else {
        Err(INVALID_EMAIL)
    }
}
