use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    pub first_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Option<String>,
    pub source_page: Option<String>,
    pub conversion_source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadMagnetResponse {
    pub download_url: String,
}
