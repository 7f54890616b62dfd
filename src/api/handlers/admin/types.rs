use crate::live::PublicLiveSettings;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AdminAuthRequest {
    Login {
        password: String,
    },
    Verify {
        #[serde(default, alias = "sessionToken")]
        token: Option<String>,
    },
}

impl std::fmt::Debug for AdminAuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { .. } => f.write_str("Login { .. }"),
            Self::Verify { .. } => f.write_str("Verify { .. }"),
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyResponse {
    pub valid: bool,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct VideoRequest {
    #[serde(default, alias = "sessionToken")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub action: VideoAction,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum VideoAction {
    Upload {
        #[serde(rename = "videoData")]
        video_data: NewVideo,
    },
    List,
    Delete {
        #[serde(rename = "videoData")]
        video_data: VideoRef,
    },
}

/// Video metadata. Either `fileUrl` points at an already hosted file or
/// `file` carries the base64 content to store in the `videos` bucket.
#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default, alias = "is_featured")]
    pub is_featured: Option<bool>,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub video_id: Uuid,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<i32>,
    pub file_size: Option<i64>,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VideoResponse {
    pub success: bool,
    pub video: Video,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VideoListResponse {
    pub videos: Vec<Video>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PhotoRequest {
    #[serde(default, alias = "sessionToken")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub action: PhotoAction,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PhotoAction {
    Upload(NewPhoto),
    Delete {
        #[serde(rename = "photoId")]
        photo_id: Uuid,
    },
}

#[derive(ToSchema, Deserialize, Default)]
pub struct NewPhoto {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "isFeatured")]
    pub is_featured: Option<bool>,
    /// Base64 file content, optionally as a `data:` URL.
    pub file: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl std::fmt::Debug for NewPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPhoto")
            .field("title", &self.title)
            .field("category", &self.category)
            .field("file_name", &self.file_name)
            .field("file_len", &self.file.len())
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct Photo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub category: String,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PhotoResponse {
    pub success: bool,
    pub photo: Photo,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PhotoListResponse {
    pub photos: Vec<Photo>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct YoutubeRequest {
    #[serde(default, alias = "sessionToken")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub action: YoutubeAction,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum YoutubeAction {
    Configure {
        #[serde(rename = "youtubeData")]
        youtube_data: YoutubeConfig,
    },
    GoLive {
        #[serde(default, rename = "youtubeData")]
        youtube_data: Option<GoLiveData>,
    },
    StopLive,
    Status,
}

#[derive(ToSchema, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub live_stream_key: Option<String>,
}

impl std::fmt::Debug for YoutubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeConfig")
            .field("channel_id", &self.channel_id)
            .field("channel_name", &self.channel_name)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct GoLiveData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct YoutubeSettingsResponse {
    pub success: bool,
    pub settings: PublicLiveSettings,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LiveResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct YoutubeStatusResponse {
    pub settings: Option<PublicLiveSettings>,
}
