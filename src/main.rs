use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod admin;
mod analytics;
mod auth;
mod config;
mod contact;
mod content;
mod email;
mod error;
mod response;
mod subscribe;

use admin::controller::AdminDashboard;
use config::settings::Settings;
use content::repo::ContentRepository;
use email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    settings: Settings,
    email: EmailService,
    dashboard: Arc<Mutex<AdminDashboard<ContentRepository>>>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> PgPool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(app_state: &AppState) -> Settings {
        app_state.settings.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Settings::new();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    info!("content store connected");

    if settings.emergency.enabled {
        tracing::warn!(
            "emergency admin access is ENABLED for {} operator(s)",
            settings.emergency.admin_emails.len()
        );
    }

    let email = EmailService::new(&settings.smtp)?;
    let dashboard = Arc::new(Mutex::new(AdminDashboard::new(ContentRepository::new(
        pool.clone(),
    ))));

    let app_state = AppState {
        pool,
        settings: settings.clone(),
        email,
        dashboard,
    };

    let auth_router = Router::new()
        .route("/sign-in", post(auth::handler::sign_in))
        .route("/sign-out", post(auth::handler::sign_out))
        .route("/me", get(auth::handler::me));

    let content_router = Router::new()
        .route("/posts", get(content::handler::list_posts))
        .route("/posts/:slug", get(content::handler::get_post))
        .route("/episodes", get(content::handler::list_episodes))
        .route("/videos", get(content::handler::list_videos))
        .route("/categories", get(content::handler::list_categories));

    let admin_router = Router::new()
        .route("/dashboard", get(admin::handler::dashboard))
        .route("/categories", get(admin::handler::category_options))
        .route("/posts", post(admin::handler::create_post))
        .route(
            "/posts/:id",
            axum::routing::put(admin::handler::update_post).delete(admin::handler::delete_post),
        )
        .route("/episodes", post(admin::handler::create_episode))
        .route(
            "/episodes/:id",
            axum::routing::put(admin::handler::update_episode)
                .delete(admin::handler::delete_episode),
        )
        .route("/videos", post(admin::handler::create_video))
        .route(
            "/videos/:id",
            axum::routing::put(admin::handler::update_video).delete(admin::handler::delete_video),
        )
        .route("/videos/:id/stats", get(analytics::handler::video_stats));

    let contact_router = Router::new()
        .route("/", post(contact::handler::submit))
        .route("/fields/:kind", get(contact::handler::field_specs));

    let subscribe_router = Router::new()
        .route("/newsletter", post(subscribe::handler::newsletter))
        .route("/lead-magnet", post(subscribe::handler::lead_magnet));

    let app = Router::new()
        .route("/", get(|| async { "Chefcast API" }))
        .nest("/api/auth", auth_router)
        .nest("/api/content", content_router)
        .nest("/api/admin", admin_router)
        .nest("/api/contact", contact_router)
        .nest("/api/subscribe", subscribe_router)
        .route("/api/videos/:id/events", post(analytics::handler::track_event))
        .with_state(app_state);

    info!("Server running on http://localhost:{}", settings.port);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
