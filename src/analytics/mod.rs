use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use uuid::Uuid;

pub mod handler;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "video_event_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Load,
    Play,
    Pause,
    Complete,
    LeadCapture,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoEvent {
    pub id: Uuid,
    pub video_id: Uuid,
    pub session_id: String,
    pub user_email: Option<String>,
    pub event_type: EventKind,
    pub watch_time_seconds: Option<i32>,
    pub completion_percentage: Option<f64>,
    pub device_type: Option<String>,
    pub referrer_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    pub session_id: String,
    pub event_type: EventKind,
    pub user_email: Option<String>,
    pub watch_time_seconds: Option<i32>,
    pub completion_percentage: Option<f64>,
    pub device_type: Option<String>,
    pub referrer_url: Option<String>,
}

/// Per-video aggregates derived from raw event rows. Pure, so the same
/// rows always summarize the same way.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct VideoStats {
    pub plays: usize,
    pub unique_sessions: usize,
    pub completions: usize,
    pub lead_captures: usize,
    pub avg_completion_percentage: f64,
}

pub fn summarize(events: &[VideoEvent]) -> VideoStats {
    let mut sessions: Vec<&str> = events.iter().map(|e| e.session_id.as_str()).collect();
    sessions.sort_unstable();
    sessions.dedup();

    let completions_seen: Vec<f64> = events
        .iter()
        .filter_map(|e| e.completion_percentage)
        .collect();
    let avg = if completions_seen.is_empty() {
        0.0
    } else {
        completions_seen.iter().sum::<f64>() / completions_seen.len() as f64
    };

    VideoStats {
        plays: events
            .iter()
            .filter(|e| e.event_type == EventKind::Play)
            .count(),
        unique_sessions: sessions.len(),
        completions: events
            .iter()
            .filter(|e| e.event_type == EventKind::Complete)
            .count(),
        lead_captures: events
            .iter()
            .filter(|e| e.event_type == EventKind::LeadCapture)
            .count(),
        avg_completion_percentage: avg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(session: &str, kind: EventKind, completion: Option<f64>) -> VideoEvent {
        VideoEvent {
            id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            session_id: session.to_string(),
            user_email: None,
            event_type: kind,
            watch_time_seconds: None,
            completion_percentage: completion,
            device_type: None,
            referrer_url: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn empty_event_set_summarizes_to_zeroes() {
        assert_eq!(summarize(&[]), VideoStats::default());
    }

    #[test]
    fn sessions_are_deduplicated_and_plays_counted() {
        let events = vec![
            event("s1", EventKind::Load, None),
            event("s1", EventKind::Play, None),
            event("s1", EventKind::Pause, Some(40.0)),
            event("s2", EventKind::Play, None),
            event("s2", EventKind::Complete, Some(100.0)),
        ];
        let stats = summarize(&events);
        assert_eq!(stats.plays, 2);
        assert_eq!(stats.unique_sessions, 2);
        assert_eq!(stats.completions, 1);
        assert!((stats.avg_completion_percentage - 70.0).abs() < f64::EPSILON);
    }
}
