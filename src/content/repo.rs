use axum::async_trait;
use slug::slugify;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::content::{
    video, Category, ContentStatus, CreateEpisode, CreatePost, CreateVideo, Episode, Post,
    UpdateEpisode, UpdatePost, UpdateVideo, Video, VideoKind,
};

// Tables carry an app suffix so they can share a hosted store with
// unrelated data.
const POSTS_TABLE: &str = "blog_posts_clr";
const EPISODES_TABLE: &str = "podcast_episodes_clr";
const VIDEOS_TABLE: &str = "video_content_clr";
const CATEGORIES_TABLE: &str = "blog_categories_clr";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("content store unavailable: {source}")]
    StoreUnavailable { source: sqlx::Error },
}

impl From<sqlx::Error> for RepoError {
    fn from(source: sqlx::Error) -> Self {
        RepoError::StoreUnavailable { source }
    }
}

impl From<validator::ValidationErrors> for RepoError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RepoError::Validation(errors.to_string())
    }
}

/// Typed access to the four content collections. The trait is the seam
/// between the admin controller and the backing store; production code
/// uses [`ContentRepository`], tests use an in-memory store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError>;
    async fn list_episodes(&self) -> Result<Vec<Episode>, RepoError>;
    async fn list_videos(&self) -> Result<Vec<Video>, RepoError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    async fn create_post(&self, draft: CreatePost) -> Result<Uuid, RepoError>;
    async fn update_post(&self, id: Uuid, patch: UpdatePost) -> Result<(), RepoError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_episode(&self, draft: CreateEpisode) -> Result<Uuid, RepoError>;
    async fn update_episode(&self, id: Uuid, patch: UpdateEpisode) -> Result<(), RepoError>;
    async fn delete_episode(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_video(&self, draft: CreateVideo) -> Result<Uuid, RepoError>;
    async fn update_video(&self, id: Uuid, patch: UpdateVideo) -> Result<(), RepoError>;
    async fn delete_video(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Set exactly when a row is created with status published; updates only
/// backfill it if it is still null.
pub fn publication_stamp(status: ContentStatus) -> Option<chrono::DateTime<chrono::Utc>> {
    (status == ContentStatus::Published).then(chrono::Utc::now)
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            "SELECT * FROM {POSTS_TABLE} ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_episodes(&self) -> Result<Vec<Episode>, RepoError> {
        let rows = sqlx::query_as::<_, Episode>(&format!(
            "SELECT * FROM {EPISODES_TABLE} ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_videos(&self) -> Result<Vec<Video>, RepoError> {
        let rows = sqlx::query_as::<_, Video>(&format!(
            "SELECT * FROM {VIDEOS_TABLE} ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT * FROM {CATEGORIES_TABLE} ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_post(&self, draft: CreatePost) -> Result<Uuid, RepoError> {
        draft.validate()?;

        let slug = super::derive_slug(&draft.title, draft.slug.as_deref());
        let published_at = publication_stamp(draft.status);

        let id = sqlx::query_scalar::<_, Uuid>(&format!(
            r#"
            INSERT INTO {POSTS_TABLE}
                (title, slug, excerpt, content, category, tags, status, featured,
                 external_url, read_time, author, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#
        ))
        .bind(&draft.title)
        .bind(&slug)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(clean_tags(draft.tags))
        .bind(draft.status)
        .bind(draft.featured)
        .bind(&draft.external_url)
        .bind(&draft.read_time)
        .bind(&draft.author)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_post(&self, id: Uuid, patch: UpdatePost) -> Result<(), RepoError> {
        // A title change recomputes the slug; the slug is never locked.
        let slug = patch.title.as_deref().map(slugify);
        let tags = patch.tags.map(clean_tags);

        let result = sqlx::query(&format!(
            r#"
            UPDATE {POSTS_TABLE} SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                excerpt = COALESCE($4, excerpt),
                content = COALESCE($5, content),
                category = COALESCE($6, category),
                tags = COALESCE($7, tags),
                status = COALESCE($8, status),
                featured = COALESCE($9, featured),
                external_url = COALESCE($10, external_url),
                read_time = COALESCE($11, read_time),
                published_at = CASE
                    WHEN $8::content_status = 'published'::content_status
                        THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(slug)
        .bind(&patch.excerpt)
        .bind(&patch.content)
        .bind(&patch.category)
        .bind(tags)
        .bind(patch.status)
        .bind(patch.featured)
        .bind(&patch.external_url)
        .bind(&patch.read_time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("post"));
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        // Deleting an already-gone row reports success.
        sqlx::query(&format!("DELETE FROM {POSTS_TABLE} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_episode(&self, draft: CreateEpisode) -> Result<Uuid, RepoError> {
        draft.validate()?;
        if draft.episode_number < 1 {
            return Err(RepoError::Validation(
                "Episode number must be positive".to_string(),
            ));
        }

        let published_at = publication_stamp(draft.status);

        let id = sqlx::query_scalar::<_, Uuid>(&format!(
            r#"
            INSERT INTO {EPISODES_TABLE}
                (title, description, episode_number, season_number, duration_minutes,
                 guest_name, guest_title, featured_image_url, audio_url, status, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.episode_number)
        .bind(draft.season_number)
        .bind(draft.duration_minutes)
        .bind(&draft.guest_name)
        .bind(&draft.guest_title)
        .bind(&draft.featured_image_url)
        .bind(&draft.audio_url)
        .bind(draft.status)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_episode(&self, id: Uuid, patch: UpdateEpisode) -> Result<(), RepoError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {EPISODES_TABLE} SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                episode_number = COALESCE($4, episode_number),
                season_number = COALESCE($5, season_number),
                duration_minutes = COALESCE($6, duration_minutes),
                guest_name = COALESCE($7, guest_name),
                guest_title = COALESCE($8, guest_title),
                featured_image_url = COALESCE($9, featured_image_url),
                audio_url = COALESCE($10, audio_url),
                status = COALESCE($11, status),
                published_at = CASE
                    WHEN $11::content_status = 'published'::content_status
                        THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.episode_number)
        .bind(patch.season_number)
        .bind(patch.duration_minutes)
        .bind(&patch.guest_name)
        .bind(&patch.guest_title)
        .bind(&patch.featured_image_url)
        .bind(&patch.audio_url)
        .bind(patch.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("episode"));
        }
        Ok(())
    }

    async fn delete_episode(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query(&format!("DELETE FROM {EPISODES_TABLE} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_video(&self, draft: CreateVideo) -> Result<Uuid, RepoError> {
        draft.validate()?;

        let (video_url, video_id, thumbnail_url) = if draft.video_type == VideoKind::Youtube {
            match video::normalize_youtube(&draft.video_url, draft.thumbnail_url.as_deref()) {
                Some(n) => (n.video_url, Some(n.video_id), Some(n.thumbnail_url)),
                None => (draft.video_url.clone(), None, draft.thumbnail_url.clone()),
            }
        } else {
            (draft.video_url.clone(), None, draft.thumbnail_url.clone())
        };

        let id = sqlx::query_scalar::<_, Uuid>(&format!(
            r#"
            INSERT INTO {VIDEOS_TABLE}
                (title, description, video_url, thumbnail_url, video_type, video_id,
                 episode_id, duration_seconds, featured, is_published,
                 lead_magnet_enabled, lead_magnet_title, tags, view_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 0)
            RETURNING id
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&video_url)
        .bind(&thumbnail_url)
        .bind(draft.video_type)
        .bind(&video_id)
        .bind(draft.episode_id)
        .bind(draft.duration_seconds)
        .bind(draft.featured)
        .bind(draft.is_published)
        .bind(draft.lead_magnet_enabled)
        .bind(&draft.lead_magnet_title)
        .bind(clean_tags(draft.tags))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_video(&self, id: Uuid, patch: UpdateVideo) -> Result<(), RepoError> {
        // A changed URL on a YouTube video is re-normalized to the embed
        // form, which needs the stored video_type.
        let (video_url, video_id) = match &patch.video_url {
            Some(raw) => {
                let kind = sqlx::query_scalar::<_, VideoKind>(&format!(
                    "SELECT video_type FROM {VIDEOS_TABLE} WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(RepoError::NotFound("video"))?;

                if kind == VideoKind::Youtube {
                    match video::normalize_youtube(raw, patch.thumbnail_url.as_deref()) {
                        Some(n) => (Some(n.video_url), Some(n.video_id)),
                        None => (Some(raw.clone()), None),
                    }
                } else {
                    (Some(raw.clone()), None)
                }
            }
            None => (None, None),
        };
        let tags = patch.tags.map(clean_tags);

        let result = sqlx::query(&format!(
            r#"
            UPDATE {VIDEOS_TABLE} SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                video_url = COALESCE($4, video_url),
                video_id = COALESCE($5, video_id),
                thumbnail_url = COALESCE($6, thumbnail_url),
                episode_id = COALESCE($7, episode_id),
                duration_seconds = COALESCE($8, duration_seconds),
                featured = COALESCE($9, featured),
                is_published = COALESCE($10, is_published),
                lead_magnet_enabled = COALESCE($11, lead_magnet_enabled),
                lead_magnet_title = COALESCE($12, lead_magnet_title),
                tags = COALESCE($13, tags)
            WHERE id = $1
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(video_url)
        .bind(video_id)
        .bind(&patch.thumbnail_url)
        .bind(patch.episode_id)
        .bind(patch.duration_seconds)
        .bind(patch.featured)
        .bind(patch.is_published)
        .bind(patch.lead_magnet_enabled)
        .bind(&patch.lead_magnet_title)
        .bind(tags)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("video"));
        }
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query(&format!("DELETE FROM {VIDEOS_TABLE} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl ContentRepository {
    /// Published posts, newest first. Public pages never see drafts.
    pub async fn list_published_posts(&self) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            "SELECT * FROM {POSTS_TABLE} WHERE status = 'published' ORDER BY published_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_post_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT * FROM {POSTS_TABLE} WHERE slug = $1 AND status = 'published'"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound("post"))
    }

    pub async fn list_published_episodes(&self) -> Result<Vec<Episode>, RepoError> {
        let rows = sqlx::query_as::<_, Episode>(&format!(
            "SELECT * FROM {EPISODES_TABLE} WHERE status = 'published' ORDER BY episode_number DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_published_videos(&self) -> Result<Vec<Video>, RepoError> {
        let rows = sqlx::query_as::<_, Video>(&format!(
            "SELECT * FROM {VIDEOS_TABLE} WHERE is_published = TRUE ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
