use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrayerRequestInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub is_urgent: Option<bool>,
    #[serde(default)]
    pub is_confidential: Option<bool>,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct PrayerRequest {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub request: String,
    pub is_urgent: bool,
    pub is_confidential: bool,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PrayerRequestResponse {
    pub success: bool,
    pub data: PrayerRequest,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub subscription_type: Option<String>,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub subscription_type: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub data: Subscription,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reactivated: bool,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationInput {
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub special_needs: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub special_needs: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub attendance_status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub registration_date: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    /// Event date as stored (`YYYY-MM-DD`).
    pub date: String,
    pub location: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct EventRegistrationResponse {
    pub success: bool,
    pub data: EventRegistration,
    pub event: EventSummary,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerInput {
    #[serde(default)]
    pub ministry_id: Option<Uuid>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct Volunteer {
    pub id: Uuid,
    pub ministry_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct MinistrySummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VolunteerResponse {
    pub success: bool,
    pub data: Volunteer,
    pub ministry: MinistrySummary,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ContactResponse {
    pub success: bool,
    pub data: ContactSubmission,
}
