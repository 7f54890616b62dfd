//! Persistence for the visitor forms.
//!
//! Each write returns an outcome enum so handlers can map business rejections
//! (duplicates, closed events) to 4xx without inspecting database errors.

use super::types::{
    ContactSubmission, EventRegistration, EventSummary, MinistrySummary, PrayerRequest,
    Subscription, Volunteer,
};
use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use time::OffsetDateTime;
use tracing::{info_span, Instrument};
use uuid::Uuid;

const PRAYER_COLUMNS: &str = "id, name, email, phone, request, \
     COALESCE(is_urgent, FALSE) AS is_urgent, COALESCE(is_confidential, FALSE) AS is_confidential, \
     COALESCE(status, 'active') AS status, created_at";

const SUBSCRIPTION_COLUMNS: &str = "id, email, first_name, last_name, \
     COALESCE(subscription_type, 'weekly') AS subscription_type, \
     COALESCE(is_active, FALSE) AS is_active, created_at";

const REGISTRATION_COLUMNS: &str = "id, event_id, first_name, last_name, email, phone, \
     special_needs, emergency_contact, emergency_phone, \
     COALESCE(attendance_status, 'registered') AS attendance_status, registration_date";

const VOLUNTEER_COLUMNS: &str = "id, ministry_id, first_name, last_name, email, phone, \
     COALESCE(position, 'Volunteer') AS position, emergency_contact, emergency_phone, \
     COALESCE(is_active, FALSE) AS is_active, created_at";

const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone, subject, message, \
     COALESCE(status, 'new') AS status, created_at";

pub(crate) struct NewPrayerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub request: String,
    pub is_urgent: bool,
    pub is_confidential: bool,
}

pub(crate) struct NewSubscription {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub subscription_type: String,
}

pub(crate) struct NewRegistration {
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub special_needs: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

pub(crate) struct NewVolunteer {
    pub ministry_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

pub(crate) struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug)]
pub(crate) enum SubscriptionOutcome {
    Created(Subscription),
    Reactivated(Subscription),
    AlreadySubscribed,
}

#[derive(Debug)]
pub(crate) enum RegistrationOutcome {
    Registered(EventRegistration, EventSummary),
    EventNotFound,
    DeadlinePassed,
    Full,
    AlreadyRegistered,
}

#[derive(Debug)]
pub(crate) enum VolunteerOutcome {
    Registered(Volunteer, MinistrySummary),
    MinistryNotFound,
    AlreadyVolunteering,
}

/// Why an event no longer takes registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Closed {
    DeadlinePassed,
    Full,
}

/// Registration window and capacity check. A missing or non-positive
/// capacity means unlimited.
pub(crate) fn registration_closed(
    deadline: Option<OffsetDateTime>,
    capacity: Option<i32>,
    taken: i64,
    now: OffsetDateTime,
) -> Option<Closed> {
    if deadline.is_some_and(|deadline| now > deadline) {
        return Some(Closed::DeadlinePassed);
    }
    match capacity {
        Some(capacity) if capacity > 0 && taken >= i64::from(capacity) => Some(Closed::Full),
        _ => None,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn prayer_from_row(row: &PgRow) -> PrayerRequest {
    PrayerRequest {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        request: row.get("request"),
        is_urgent: row.get("is_urgent"),
        is_confidential: row.get("is_confidential"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

fn subscription_from_row(row: &PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        subscription_type: row.get("subscription_type"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

fn registration_from_row(row: &PgRow) -> EventRegistration {
    EventRegistration {
        id: row.get("id"),
        event_id: row.get("event_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        special_needs: row.get("special_needs"),
        emergency_contact: row.get("emergency_contact"),
        emergency_phone: row.get("emergency_phone"),
        attendance_status: row.get("attendance_status"),
        registration_date: row.get("registration_date"),
    }
}

fn volunteer_from_row(row: &PgRow) -> Volunteer {
    Volunteer {
        id: row.get("id"),
        ministry_id: row.get("ministry_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        position: row.get("position"),
        emergency_contact: row.get("emergency_contact"),
        emergency_phone: row.get("emergency_phone"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

fn contact_from_row(row: &PgRow) -> ContactSubmission {
    ContactSubmission {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        subject: row.get("subject"),
        message: row.get("message"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

pub(crate) async fn insert_prayer_request(
    pool: &PgPool,
    prayer: &NewPrayerRequest,
) -> Result<PrayerRequest> {
    let query = format!(
        r"
        INSERT INTO prayer_requests (name, email, phone, request, is_urgent, is_confidential, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'active')
        RETURNING {PRAYER_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(&prayer.name)
        .bind(prayer.email.as_deref())
        .bind(prayer.phone.as_deref())
        .bind(&prayer.request)
        .bind(prayer.is_urgent)
        .bind(prayer.is_confidential)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert prayer request")?;
    Ok(prayer_from_row(&row))
}

/// Subscribe, reactivating a lapsed subscription for the same address.
pub(crate) async fn subscribe(
    pool: &PgPool,
    subscription: &NewSubscription,
) -> Result<SubscriptionOutcome> {
    let query = "SELECT id, COALESCE(is_active, FALSE) AS is_active \
                 FROM newsletter_subscriptions WHERE lower(email) = $1 LIMIT 1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let existing = sqlx::query(query)
        .bind(&subscription.email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up subscription")?;

    if let Some(existing) = existing {
        if existing.get::<bool, _>("is_active") {
            return Ok(SubscriptionOutcome::AlreadySubscribed);
        }
        let id: Uuid = existing.get("id");
        let query = format!(
            r"
            UPDATE newsletter_subscriptions
            SET is_active = TRUE, first_name = $2, last_name = $3, subscription_type = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(subscription.first_name.as_deref())
            .bind(subscription.last_name.as_deref())
            .bind(&subscription.subscription_type)
            .fetch_one(pool)
            .instrument(span)
            .await
            .context("failed to reactivate subscription")?;
        return Ok(SubscriptionOutcome::Reactivated(subscription_from_row(&row)));
    }

    let query = format!(
        r"
        INSERT INTO newsletter_subscriptions (email, first_name, last_name, subscription_type, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    match sqlx::query(&query)
        .bind(&subscription.email)
        .bind(subscription.first_name.as_deref())
        .bind(subscription.last_name.as_deref())
        .bind(&subscription.subscription_type)
        .fetch_one(pool)
        .instrument(span)
        .await
    {
        Ok(row) => Ok(SubscriptionOutcome::Created(subscription_from_row(&row))),
        // A concurrent request subscribed the same address first.
        Err(err) if is_unique_violation(&err) => Ok(SubscriptionOutcome::AlreadySubscribed),
        Err(err) => Err(err).context("failed to create subscription"),
    }
}

/// Register for an event. All checks run under the event row lock so the
/// capacity count cannot go stale before the insert.
pub(crate) async fn register_for_event(
    pool: &PgPool,
    registration: &NewRegistration,
    now: OffsetDateTime,
) -> Result<RegistrationOutcome> {
    let mut tx = pool.begin().await?;

    let query = "SELECT id, title, date::text AS date, location, capacity, registration_deadline \
                 FROM events WHERE id = $1 AND COALESCE(is_active, FALSE) FOR UPDATE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let Some(event) = sqlx::query(query)
        .bind(registration.event_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to load event")?
    else {
        return Ok(RegistrationOutcome::EventNotFound);
    };

    let query = "SELECT COUNT(*) FROM event_registrations \
                 WHERE event_id = $1 AND attendance_status IN ('registered', 'attended')";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let taken: i64 = sqlx::query_scalar(query)
        .bind(registration.event_id)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to count registrations")?;

    match registration_closed(
        event.get("registration_deadline"),
        event.get("capacity"),
        taken,
        now,
    ) {
        Some(Closed::DeadlinePassed) => return Ok(RegistrationOutcome::DeadlinePassed),
        Some(Closed::Full) => return Ok(RegistrationOutcome::Full),
        None => {}
    }

    let query = "SELECT EXISTS (SELECT 1 FROM event_registrations \
                 WHERE event_id = $1 AND lower(email) = $2 \
                 AND COALESCE(attendance_status, 'registered') <> 'cancelled')";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let duplicate: bool = sqlx::query_scalar(query)
        .bind(registration.event_id)
        .bind(&registration.email)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to check existing registration")?;
    if duplicate {
        return Ok(RegistrationOutcome::AlreadyRegistered);
    }

    let query = format!(
        r"
        INSERT INTO event_registrations
            (event_id, first_name, last_name, email, phone, special_needs,
             emergency_contact, emergency_phone, attendance_status, registration_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'registered', NOW())
        RETURNING {REGISTRATION_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(registration.event_id)
        .bind(&registration.first_name)
        .bind(&registration.last_name)
        .bind(&registration.email)
        .bind(registration.phone.as_deref())
        .bind(registration.special_needs.as_deref())
        .bind(registration.emergency_contact.as_deref())
        .bind(registration.emergency_phone.as_deref())
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert registration")?;

    tx.commit().await?;

    let summary = EventSummary {
        id: event.get("id"),
        title: event.get("title"),
        date: event.get("date"),
        location: event.get("location"),
    };
    Ok(RegistrationOutcome::Registered(
        registration_from_row(&row),
        summary,
    ))
}

pub(crate) async fn register_volunteer(
    pool: &PgPool,
    volunteer: &NewVolunteer,
) -> Result<VolunteerOutcome> {
    let query = "SELECT id, name FROM ministries WHERE id = $1 AND COALESCE(is_active, FALSE)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let Some(ministry) = sqlx::query(query)
        .bind(volunteer.ministry_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to load ministry")?
    else {
        return Ok(VolunteerOutcome::MinistryNotFound);
    };

    let query = "SELECT EXISTS (SELECT 1 FROM ministry_volunteers \
                 WHERE ministry_id = $1 AND lower(email) = $2 AND COALESCE(is_active, FALSE))";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let duplicate: bool = sqlx::query_scalar(query)
        .bind(volunteer.ministry_id)
        .bind(&volunteer.email)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check existing volunteer")?;
    if duplicate {
        return Ok(VolunteerOutcome::AlreadyVolunteering);
    }

    let query = format!(
        r"
        INSERT INTO ministry_volunteers
            (ministry_id, first_name, last_name, email, phone, position,
             emergency_contact, emergency_phone, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
        RETURNING {VOLUNTEER_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(volunteer.ministry_id)
        .bind(&volunteer.first_name)
        .bind(&volunteer.last_name)
        .bind(&volunteer.email)
        .bind(volunteer.phone.as_deref())
        .bind(&volunteer.position)
        .bind(volunteer.emergency_contact.as_deref())
        .bind(volunteer.emergency_phone.as_deref())
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert volunteer")?;

    let summary = MinistrySummary {
        id: ministry.get("id"),
        name: ministry.get("name"),
    };
    Ok(VolunteerOutcome::Registered(volunteer_from_row(&row), summary))
}

pub(crate) async fn insert_contact(pool: &PgPool, contact: &NewContact) -> Result<ContactSubmission> {
    let query = format!(
        r"
        INSERT INTO contact_submissions (first_name, last_name, email, phone, subject, message, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'new')
        RETURNING {CONTACT_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(contact.phone.as_deref())
        .bind(&contact.subject)
        .bind(&contact.message)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert contact submission")?;
    Ok(contact_from_row(&row))
}
