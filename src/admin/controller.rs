use uuid::Uuid;

use crate::admin::{DashboardSnapshot, EditState, ALL_CATEGORIES_SLUG};
use crate::content::repo::{ContentStore, RepoError};
use crate::content::{
    compute_stats, Category, CreateEpisode, CreatePost, CreateVideo, UpdateEpisode, UpdatePost,
    UpdateVideo,
};

/// Sequences repository calls for the admin dashboard and owns the edit
/// state. One instance serves the whole dashboard; callers serialize
/// access, so no two mutations are ever in flight at once.
pub struct AdminDashboard<S> {
    store: S,
    /// Bumped by `reset`; list results fetched under an older generation
    /// are discarded instead of being applied to fresh state.
    generation: u64,
    post_edit: EditState,
    episode_edit: EditState,
    video_edit: EditState,
    data: DashboardSnapshot,
}

impl<S: ContentStore> AdminDashboard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            generation: 0,
            post_edit: EditState::Idle,
            episode_edit: EditState::Idle,
            video_edit: EditState::Idle,
            data: DashboardSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.data
    }

    pub fn post_edit(&self) -> EditState {
        self.post_edit
    }

    pub fn episode_edit(&self) -> EditState {
        self.episode_edit
    }

    pub fn video_edit(&self) -> EditState {
        self.video_edit
    }

    /// Abandon whatever was in flight, e.g. on navigation away. Pending
    /// fetches started before this call will be discarded on arrival.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.post_edit = EditState::Idle;
        self.episode_edit = EditState::Idle;
        self.video_edit = EditState::Idle;
    }

    /// Re-list all four collections and tag the result with the
    /// generation that was current when the fetch started.
    pub async fn fetch_snapshot(&self) -> Result<(u64, DashboardSnapshot), RepoError> {
        let generation = self.generation;
        let posts = self.store.list_posts().await?;
        let episodes = self.store.list_episodes().await?;
        let videos = self.store.list_videos().await?;
        let categories = self.store.list_categories().await?;
        let stats = compute_stats(&posts, &episodes, &videos, &categories);
        Ok((
            generation,
            DashboardSnapshot {
                posts,
                episodes,
                videos,
                categories,
                stats,
            },
        ))
    }

    /// Apply a fetched snapshot unless it was superseded by a `reset`.
    /// Returns whether it was applied.
    pub fn apply_snapshot(&mut self, generation: u64, snapshot: DashboardSnapshot) -> bool {
        if generation != self.generation {
            tracing::debug!("discarding stale dashboard snapshot");
            return false;
        }
        self.data = snapshot;
        true
    }

    pub async fn refresh_all(&mut self) -> Result<(), RepoError> {
        let (generation, snapshot) = self.fetch_snapshot().await?;
        self.apply_snapshot(generation, snapshot);
        Ok(())
    }

    /// Post-mutation refetch. The mutation already succeeded, so a
    /// failure here is logged and swallowed; the previous lists stay.
    async fn refresh_after_mutation(&mut self) {
        if let Err(err) = self.refresh_all().await {
            tracing::warn!("refresh after mutation failed, keeping cached lists: {}", err);
        }
    }

    pub fn begin_create_post(&mut self) {
        self.post_edit = EditState::Creating;
    }

    pub fn begin_edit_post(&mut self, id: Uuid) {
        self.post_edit = EditState::Editing(id);
    }

    pub fn cancel_post(&mut self) {
        self.post_edit = EditState::Idle;
    }

    /// Create-or-update by edit state. On failure the edit state (and
    /// with it the user's draft) is kept.
    pub async fn save_post(&mut self, form: CreatePost) -> Result<Option<Uuid>, RepoError> {
        let created = match self.post_edit {
            EditState::Creating => Some(self.store.create_post(form).await?),
            EditState::Editing(id) => {
                self.store.update_post(id, post_patch(form)).await?;
                None
            }
            EditState::Idle => {
                return Err(RepoError::Validation("No post edit in progress".to_string()))
            }
        };
        self.post_edit = EditState::Idle;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    pub async fn delete_post(&mut self, id: Uuid, confirmed: bool) -> Result<(), RepoError> {
        require_confirmation(confirmed)?;
        self.store.delete_post(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub fn begin_create_episode(&mut self) {
        self.episode_edit = EditState::Creating;
    }

    pub fn begin_edit_episode(&mut self, id: Uuid) {
        self.episode_edit = EditState::Editing(id);
    }

    pub fn cancel_episode(&mut self) {
        self.episode_edit = EditState::Idle;
    }

    pub async fn save_episode(&mut self, form: CreateEpisode) -> Result<Option<Uuid>, RepoError> {
        let created = match self.episode_edit {
            EditState::Creating => Some(self.store.create_episode(form).await?),
            EditState::Editing(id) => {
                self.store.update_episode(id, episode_patch(form)).await?;
                None
            }
            EditState::Idle => {
                return Err(RepoError::Validation(
                    "No episode edit in progress".to_string(),
                ))
            }
        };
        self.episode_edit = EditState::Idle;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    pub async fn delete_episode(&mut self, id: Uuid, confirmed: bool) -> Result<(), RepoError> {
        require_confirmation(confirmed)?;
        self.store.delete_episode(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub fn begin_create_video(&mut self) {
        self.video_edit = EditState::Creating;
    }

    pub fn begin_edit_video(&mut self, id: Uuid) {
        self.video_edit = EditState::Editing(id);
    }

    pub fn cancel_video(&mut self) {
        self.video_edit = EditState::Idle;
    }

    pub async fn save_video(&mut self, form: CreateVideo) -> Result<Option<Uuid>, RepoError> {
        let created = match self.video_edit {
            EditState::Creating => Some(self.store.create_video(form).await?),
            EditState::Editing(id) => {
                self.store.update_video(id, video_patch(form)).await?;
                None
            }
            EditState::Idle => {
                return Err(RepoError::Validation(
                    "No video edit in progress".to_string(),
                ))
            }
        };
        self.video_edit = EditState::Idle;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    pub async fn delete_video(&mut self, id: Uuid, confirmed: bool) -> Result<(), RepoError> {
        require_confirmation(confirmed)?;
        self.store.delete_video(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Categories offered in the post editor. The "all" sentinel is a
    /// filter value, never a real category.
    pub fn category_options(&self) -> Vec<Category> {
        self.data
            .categories
            .iter()
            .filter(|c| c.slug != ALL_CATEGORIES_SLUG)
            .cloned()
            .collect()
    }
}

fn require_confirmation(confirmed: bool) -> Result<(), RepoError> {
    if confirmed {
        Ok(())
    } else {
        Err(RepoError::Validation(
            "Deletion requires explicit confirmation".to_string(),
        ))
    }
}

fn post_patch(form: CreatePost) -> UpdatePost {
    UpdatePost {
        title: Some(form.title),
        excerpt: form.excerpt,
        content: form.content,
        category: Some(form.category),
        tags: Some(form.tags),
        status: Some(form.status),
        featured: Some(form.featured),
        external_url: form.external_url,
        read_time: form.read_time,
    }
}

fn episode_patch(form: CreateEpisode) -> UpdateEpisode {
    UpdateEpisode {
        title: Some(form.title),
        description: form.description,
        episode_number: Some(form.episode_number),
        season_number: Some(form.season_number),
        duration_minutes: form.duration_minutes,
        guest_name: form.guest_name,
        guest_title: form.guest_title,
        featured_image_url: form.featured_image_url,
        audio_url: form.audio_url,
        status: Some(form.status),
    }
}

fn video_patch(form: CreateVideo) -> UpdateVideo {
    UpdateVideo {
        title: Some(form.title),
        description: form.description,
        video_url: Some(form.video_url),
        thumbnail_url: form.thumbnail_url,
        episode_id: form.episode_id,
        duration_seconds: form.duration_seconds,
        featured: Some(form.featured),
        is_published: Some(form.is_published),
        lead_magnet_enabled: Some(form.lead_magnet_enabled),
        lead_magnet_title: form.lead_magnet_title,
        tags: Some(form.tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::content::repo::publication_stamp;
    use crate::content::video::normalize_youtube;
    use crate::content::{
        derive_slug, ContentStatus, Episode, Post, UpdateEpisode, Video, VideoKind,
    };

    /// In-memory stand-in for the row store, mirroring its write-time
    /// derivations (slug, publication stamp, YouTube normalization).
    #[derive(Default)]
    struct MemStore {
        posts: Mutex<Vec<Post>>,
        episodes: Mutex<Vec<Episode>>,
        videos: Mutex<Vec<Video>>,
        categories: Mutex<Vec<Category>>,
        fail_lists: AtomicBool,
        fail_mutations: AtomicBool,
    }

    impl MemStore {
        fn check_lists(&self) -> Result<(), RepoError> {
            if self.fail_lists.load(Ordering::SeqCst) {
                Err(RepoError::StoreUnavailable {
                    source: sqlx::Error::PoolClosed,
                })
            } else {
                Ok(())
            }
        }

        fn check_mutations(&self) -> Result<(), RepoError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                Err(RepoError::StoreUnavailable {
                    source: sqlx::Error::PoolClosed,
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ContentStore for MemStore {
        async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
            self.check_lists()?;
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn list_episodes(&self) -> Result<Vec<Episode>, RepoError> {
            self.check_lists()?;
            Ok(self.episodes.lock().unwrap().clone())
        }

        async fn list_videos(&self) -> Result<Vec<Video>, RepoError> {
            self.check_lists()?;
            Ok(self.videos.lock().unwrap().clone())
        }

        async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
            self.check_lists()?;
            Ok(self.categories.lock().unwrap().clone())
        }

        async fn create_post(&self, draft: CreatePost) -> Result<Uuid, RepoError> {
            self.check_mutations()?;
            let now = chrono::Utc::now();
            let id = Uuid::new_v4();
            self.posts.lock().unwrap().push(Post {
                id,
                slug: derive_slug(&draft.title, draft.slug.as_deref()),
                title: draft.title,
                excerpt: draft.excerpt,
                content: draft.content,
                category: draft.category,
                tags: draft.tags,
                status: draft.status,
                featured: draft.featured,
                external_url: draft.external_url,
                read_time: draft.read_time,
                author: draft.author,
                published_at: publication_stamp(draft.status),
                created_at: now,
                updated_at: now,
            });
            Ok(id)
        }

        async fn update_post(&self, id: Uuid, patch: UpdatePost) -> Result<(), RepoError> {
            self.check_mutations()?;
            let mut posts = self.posts.lock().unwrap();
            let post = posts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepoError::NotFound("post"))?;
            if let Some(title) = patch.title {
                post.slug = derive_slug(&title, None);
                post.title = title;
            }
            if let Some(status) = patch.status {
                post.status = status;
                if status == ContentStatus::Published && post.published_at.is_none() {
                    post.published_at = Some(chrono::Utc::now());
                }
            }
            if let Some(category) = patch.category {
                post.category = category;
            }
            if let Some(tags) = patch.tags {
                post.tags = tags;
            }
            Ok(())
        }

        async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
            self.check_mutations()?;
            self.posts.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn create_episode(&self, draft: CreateEpisode) -> Result<Uuid, RepoError> {
            self.check_mutations()?;
            let now = chrono::Utc::now();
            let id = Uuid::new_v4();
            self.episodes.lock().unwrap().push(Episode {
                id,
                title: draft.title,
                description: draft.description,
                episode_number: draft.episode_number,
                season_number: draft.season_number,
                duration_minutes: draft.duration_minutes,
                guest_name: draft.guest_name,
                guest_title: draft.guest_title,
                featured_image_url: draft.featured_image_url,
                audio_url: draft.audio_url,
                status: draft.status,
                published_at: publication_stamp(draft.status),
                created_at: now,
                updated_at: now,
            });
            Ok(id)
        }

        async fn update_episode(&self, id: Uuid, patch: UpdateEpisode) -> Result<(), RepoError> {
            self.check_mutations()?;
            let mut episodes = self.episodes.lock().unwrap();
            let ep = episodes
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or(RepoError::NotFound("episode"))?;
            if let Some(title) = patch.title {
                ep.title = title;
            }
            if let Some(status) = patch.status {
                ep.status = status;
                if status == ContentStatus::Published && ep.published_at.is_none() {
                    ep.published_at = Some(chrono::Utc::now());
                }
            }
            Ok(())
        }

        async fn delete_episode(&self, id: Uuid) -> Result<(), RepoError> {
            self.check_mutations()?;
            self.episodes.lock().unwrap().retain(|e| e.id != id);
            Ok(())
        }

        async fn create_video(&self, draft: CreateVideo) -> Result<Uuid, RepoError> {
            self.check_mutations()?;
            let id = Uuid::new_v4();
            let (video_url, video_id, thumbnail_url) = if draft.video_type == VideoKind::Youtube {
                match normalize_youtube(&draft.video_url, draft.thumbnail_url.as_deref()) {
                    Some(n) => (n.video_url, Some(n.video_id), Some(n.thumbnail_url)),
                    None => (draft.video_url, None, draft.thumbnail_url),
                }
            } else {
                (draft.video_url, None, draft.thumbnail_url)
            };
            self.videos.lock().unwrap().push(Video {
                id,
                title: draft.title,
                description: draft.description,
                video_url,
                thumbnail_url,
                video_type: draft.video_type,
                video_id,
                episode_id: draft.episode_id,
                duration_seconds: draft.duration_seconds,
                featured: draft.featured,
                is_published: draft.is_published,
                lead_magnet_enabled: draft.lead_magnet_enabled,
                lead_magnet_title: draft.lead_magnet_title,
                tags: draft.tags,
                view_count: 0,
                created_at: chrono::Utc::now(),
            });
            Ok(id)
        }

        async fn update_video(&self, id: Uuid, patch: UpdateVideo) -> Result<(), RepoError> {
            self.check_mutations()?;
            let mut videos = self.videos.lock().unwrap();
            let video = videos
                .iter_mut()
                .find(|v| v.id == id)
                .ok_or(RepoError::NotFound("video"))?;
            if let Some(url) = patch.video_url {
                if video.video_type == VideoKind::Youtube {
                    match normalize_youtube(&url, None) {
                        Some(n) => {
                            video.video_url = n.video_url;
                            video.video_id = Some(n.video_id);
                        }
                        None => video.video_url = url,
                    }
                } else {
                    video.video_url = url;
                }
            }
            Ok(())
        }

        async fn delete_video(&self, id: Uuid) -> Result<(), RepoError> {
            self.check_mutations()?;
            self.videos.lock().unwrap().retain(|v| v.id != id);
            Ok(())
        }
    }

    fn post_form(title: &str, category: &str, status: ContentStatus) -> CreatePost {
        CreatePost {
            title: title.to_string(),
            slug: None,
            excerpt: None,
            content: None,
            category: category.to_string(),
            tags: vec![],
            status,
            featured: false,
            external_url: None,
            read_time: None,
            author: "Host".to_string(),
        }
    }

    fn video_form(url: &str) -> CreateVideo {
        CreateVideo {
            title: "Clip".to_string(),
            description: None,
            video_url: url.to_string(),
            thumbnail_url: None,
            video_type: VideoKind::Youtube,
            episode_id: None,
            duration_seconds: None,
            featured: false,
            is_published: true,
            lead_magnet_enabled: false,
            lead_magnet_title: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn create_draft_post_has_no_publication_time() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        dash.save_post(post_form("Culture Not Chaos", "leadership", ContentStatus::Draft))
            .await
            .unwrap();

        let snap = dash.snapshot();
        assert_eq!(snap.posts.len(), 1);
        assert_eq!(snap.posts[0].slug, "culture-not-chaos");
        assert!(snap.posts[0].published_at.is_none());
        assert_eq!(snap.stats.total_posts, 1);
        assert_eq!(snap.stats.published_posts, 0);
        assert_eq!(dash.post_edit(), EditState::Idle);
    }

    #[tokio::test]
    async fn create_published_post_stamps_publication_time() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        dash.save_post(post_form("Line Check", "operations", ContentStatus::Published))
            .await
            .unwrap();

        let post = &dash.snapshot().posts[0];
        let stamped = post.published_at.expect("publication time must be set");
        assert!((chrono::Utc::now() - stamped).num_seconds() < 5);
    }

    #[tokio::test]
    async fn edit_publish_backfills_timestamp_once() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        let id = dash
            .save_post(post_form("Slow Burn", "operations", ContentStatus::Draft))
            .await
            .unwrap()
            .unwrap();

        dash.begin_edit_post(id);
        dash.save_post(post_form("Slow Burn", "operations", ContentStatus::Published))
            .await
            .unwrap();
        let first = dash.snapshot().posts[0].published_at.unwrap();

        dash.begin_edit_post(id);
        dash.save_post(post_form("Slow Burn", "operations", ContentStatus::Published))
            .await
            .unwrap();
        let second = dash.snapshot().posts[0].published_at.unwrap();
        assert_eq!(first, second, "publication time must not be rewritten");
    }

    #[tokio::test]
    async fn save_without_edit_in_progress_is_refused() {
        let mut dash = AdminDashboard::new(MemStore::default());
        let err = dash
            .save_post(post_form("Orphan", "leadership", ContentStatus::Draft))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_save_keeps_the_edit_state() {
        let store = MemStore::default();
        store.fail_mutations.store(true, Ordering::SeqCst);
        let mut dash = AdminDashboard::new(store);

        dash.begin_create_post();
        let result = dash
            .save_post(post_form("Lost Draft", "leadership", ContentStatus::Draft))
            .await;
        assert!(result.is_err());
        assert_eq!(dash.post_edit(), EditState::Creating, "draft must not be lost");
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        let id = dash
            .save_post(post_form("Keep Me", "leadership", ContentStatus::Draft))
            .await
            .unwrap()
            .unwrap();

        let err = dash.delete_post(id, false).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(dash.snapshot().posts.len(), 1);

        dash.delete_post(id, true).await.unwrap();
        assert!(dash.snapshot().posts.iter().all(|p| p.id != id));
        assert_eq!(dash.snapshot().stats.total_posts, 0);
    }

    #[tokio::test]
    async fn deleting_an_already_gone_row_succeeds() {
        let mut dash = AdminDashboard::new(MemStore::default());
        assert!(dash.delete_post(Uuid::new_v4(), true).await.is_ok());
    }

    #[tokio::test]
    async fn failed_refresh_after_save_keeps_previous_lists() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        dash.save_post(post_form("First", "leadership", ContentStatus::Draft))
            .await
            .unwrap();
        assert_eq!(dash.snapshot().posts.len(), 1);

        // Second save succeeds but the refetch fails; the cached lists
        // stay at the last good state and the save still reports success.
        dash.store.fail_lists.store(true, Ordering::SeqCst);
        dash.begin_create_post();
        let result = dash
            .save_post(post_form("Second", "leadership", ContentStatus::Draft))
            .await;
        assert!(result.is_ok());
        assert_eq!(dash.snapshot().posts.len(), 1);
    }

    #[tokio::test]
    async fn stale_snapshot_is_discarded_after_reset() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_post();
        dash.save_post(post_form("Live", "leadership", ContentStatus::Draft))
            .await
            .unwrap();

        let (generation, snapshot) = dash.fetch_snapshot().await.unwrap();
        dash.reset();
        assert!(!dash.apply_snapshot(generation, snapshot));
    }

    #[tokio::test]
    async fn category_options_exclude_the_all_sentinel() {
        let store = MemStore::default();
        store.categories.lock().unwrap().extend([
            Category {
                slug: "all".to_string(),
                name: "All".to_string(),
                post_count: 0,
            },
            Category {
                slug: "leadership".to_string(),
                name: "Leadership".to_string(),
                post_count: 3,
            },
        ]);
        let mut dash = AdminDashboard::new(store);
        dash.refresh_all().await.unwrap();

        let options = dash.category_options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].slug, "leadership");
    }

    #[tokio::test]
    async fn updating_a_short_link_normalizes_to_embed_form() {
        let mut dash = AdminDashboard::new(MemStore::default());
        dash.begin_create_video();
        let id = dash
            .save_video(video_form("https://youtu.be/abc12345678"))
            .await
            .unwrap()
            .unwrap();

        dash.begin_edit_video(id);
        dash.save_video(video_form("https://youtu.be/abc12345678"))
            .await
            .unwrap();

        let video = &dash.snapshot().videos[0];
        assert_eq!(video.video_url, "https://www.youtube.com/embed/abc12345678");
        assert_eq!(video.video_id.as_deref(), Some("abc12345678"));
        assert_eq!(video.view_count, 0);
    }
}
