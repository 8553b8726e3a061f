use serde::Serialize;
use uuid::Uuid;

use crate::content::{Category, ContentStats, Episode, Post, Video};

pub mod controller;
pub mod handler;

/// Reserved category slug meaning "all categories" in the public filter
/// bar. It must never be offered as a target category for a post.
pub const ALL_CATEGORIES_SLUG: &str = "all";

/// What the dashboard is doing with one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Creating,
    Editing(Uuid),
}

/// Everything the dashboard shows, refetched wholesale after every
/// mutation so the derived stats never drift from the lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub posts: Vec<Post>,
    pub episodes: Vec<Episode>,
    pub videos: Vec<Video>,
    pub categories: Vec<Category>,
    pub stats: ContentStats,
}
