use super::handlers::{admin, changes, health, public};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Routes added outside (like `/`, `/openapi.json` or the static media
/// directory) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(admin::auth::admin_auth))
        .routes(routes!(admin::videos::video_upload))
        .routes(routes!(admin::photos::photo_upload))
        .routes(routes!(admin::youtube::youtube_integration))
        .routes(routes!(public::prayer::prayer_request))
        .routes(routes!(public::newsletter::newsletter_subscription))
        .routes(routes!(public::events::event_registration))
        .routes(routes!(public::volunteers::ministry_volunteer))
        .routes(routes!(public::contact::contact_submission))
        .routes(routes!(public::gallery::videos))
        .routes(routes!(public::gallery::photos))
        .routes(routes!(changes::changes));

    router.get_openapi_mut().tags = Some(vec![
        tag("admin", "Admin session and content management"),
        tag("forms", "Visitor form submissions"),
        tag("media", "Public galleries and the change feed"),
        tag("health", "Service and database status"),
    ]);

    router
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (
            optional_str(name),
            optional_str(email.trim_end_matches('>')),
        ),
        None => (optional_str(author), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Sanctuary"));
            assert_eq!(contact.email.as_deref(), Some("team@sanctuary.church"));
        }

        let license = doc.info.license;
        assert!(license.is_some_and(|license| license.name == "BSD-3-Clause"));
    }

    #[test]
    fn openapi_documents_every_function() {
        let doc = openapi();
        for path in [
            "/health",
            "/functions/admin-auth",
            "/functions/video-upload",
            "/functions/photo-upload",
            "/functions/youtube-integration",
            "/functions/prayer-request",
            "/functions/newsletter-subscription",
            "/functions/event-registration",
            "/functions/ministry-volunteer",
            "/functions/contact-submission",
            "/v1/videos",
            "/v1/photos",
            "/v1/changes",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let tags = doc.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "admin"));
        assert!(tags.iter().any(|tag| tag.name == "forms"));
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Team Sanctuary <team@sanctuary.church>"),
            (Some("Team Sanctuary"), Some("team@sanctuary.church"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<a@b.c>"), (None, Some("a@b.c")));
        assert_eq!(parse_author(""), (None, None));
    }
}
