use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use uuid::Uuid;
use validator::Validate;

pub mod handler;
pub mod repo;
pub mod video;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub featured: bool,
    pub external_url: Option<String>,
    pub read_time: Option<String>,
    pub author: String,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Episode {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    pub duration_minutes: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_title: Option<String>,
    pub featured_image_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: ContentStatus,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub video_type: VideoKind,
    pub video_id: Option<String>,
    pub episode_id: Option<Uuid>,
    pub duration_seconds: Option<i32>,
    pub featured: bool,
    pub is_published: bool,
    pub lead_magnet_enabled: bool,
    pub lead_magnet_title: Option<String>,
    pub tags: Vec<String>,
    pub view_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub post_count: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "content_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "video_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    Youtube,
    Vimeo,
    Direct,
    LiveStream,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    /// Empty or missing slug is derived from the title.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[serde(default, deserialize_with = "tags_field")]
    pub tags: Vec<String>,
    pub status: ContentStatus,
    #[serde(default)]
    pub featured: bool,
    pub external_url: Option<String>,
    pub read_time: Option<String>,
    pub author: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "opt_tags_field")]
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub featured: Option<bool>,
    pub external_url: Option<String>,
    pub read_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEpisode {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    pub description: Option<String>,
    pub episode_number: i32,
    #[serde(default = "default_season")]
    pub season_number: i32,
    pub duration_minutes: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_title: Option<String>,
    pub featured_image_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: ContentStatus,
}

fn default_season() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEpisode {
    pub title: Option<String>,
    pub description: Option<String>,
    pub episode_number: Option<i32>,
    pub season_number: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_title: Option<String>,
    pub featured_image_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVideo {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Video URL is required"))]
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub video_type: VideoKind,
    pub episode_id: Option<Uuid>,
    pub duration_seconds: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub lead_magnet_enabled: bool,
    pub lead_magnet_title: Option<String>,
    #[serde(default, deserialize_with = "tags_field")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub episode_id: Option<Uuid>,
    pub duration_seconds: Option<i32>,
    pub featured: Option<bool>,
    pub is_published: Option<bool>,
    pub lead_magnet_enabled: Option<bool>,
    pub lead_magnet_title: Option<String>,
    #[serde(default, deserialize_with = "opt_tags_field")]
    pub tags: Option<Vec<String>>,
}

/// Dashboard counters derived from the fetched collections. Pure and
/// recomputed after every refetch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContentStats {
    pub total_posts: usize,
    pub published_posts: usize,
    pub total_episodes: usize,
    pub total_videos: usize,
    pub total_categories: usize,
}

pub fn compute_stats(
    posts: &[Post],
    episodes: &[Episode],
    videos: &[Video],
    categories: &[Category],
) -> ContentStats {
    ContentStats {
        total_posts: posts.len(),
        published_posts: posts
            .iter()
            .filter(|p| p.status == ContentStatus::Published)
            .count(),
        total_episodes: episodes.len(),
        total_videos: videos.len(),
        total_categories: categories.len(),
    }
}

/// URL slug for a post: the explicit value when the editor supplied one,
/// otherwise derived from the title.
pub fn derive_slug(title: &str, provided: Option<&str>) -> String {
    match provided {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => slug::slugify(title),
    }
}

/// Split a comma-joined editor string into stored tags. Whitespace is
/// trimmed and empty entries are dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Editors submit tags either as a list or as one comma-joined string.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagsField {
    Joined(String),
    List(Vec<String>),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsField::Joined(raw) => parse_tags(&raw),
            TagsField::List(tags) => tags,
        }
    }
}

fn tags_field<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    TagsField::deserialize(de).map(TagsField::into_tags)
}

fn opt_tags_field<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<TagsField>::deserialize(de)?;
    Ok(raw.map(TagsField::into_tags))
}
