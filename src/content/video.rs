//! YouTube URL normalization for stored videos.
//!
//! Editors paste whatever link form they have handy; everything is
//! canonicalized to the embed form before it hits the store.

const ID_LEN: usize = 11;

/// Pull the 11-character video id out of any of the known URL shapes:
/// `watch?v=`, `youtu.be/`, `embed/`, or a bare token.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let url = url.trim();

    for marker in ["watch?v=", "youtu.be/", "embed/"] {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            return take_id(rest);
        }
    }

    // Bare 11-character token
    if url.len() == ID_LEN && url.chars().all(is_id_char) {
        return Some(url.to_string());
    }

    None
}

fn take_id(rest: &str) -> Option<String> {
    let id: String = rest.chars().take_while(|&c| is_id_char(c)).collect();
    if id.len() == ID_LEN {
        Some(id)
    } else {
        None
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Canonical fields derived from a raw YouTube link.
pub struct NormalizedVideo {
    pub video_url: String,
    pub video_id: String,
    pub thumbnail_url: String,
}

/// Rewrite a raw link to the embed form and synthesize a thumbnail when
/// the editor did not supply one. Returns `None` when no id can be
/// extracted; the raw URL is then stored as-is.
pub fn normalize_youtube(raw_url: &str, thumbnail: Option<&str>) -> Option<NormalizedVideo> {
    let id = extract_youtube_id(raw_url)?;
    let thumbnail_url = match thumbnail {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", id),
    };
    Some(NormalizedVideo {
        video_url: format!("https://www.youtube.com/embed/{}", id),
        video_id: id,
        thumbnail_url,
    })
}
