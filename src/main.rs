//! Byline - a small blogging platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use byline::{
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCommentRepository, SqlxContactRepository, SqlxFollowRepository,
            SqlxGroupRepository, SqlxPostRepository, SqlxResetTokenRepository,
            SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        CommentService, ContactService, FollowService, GroupService, Mailer, PostService,
        UserService,
    },
    templates,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "byline=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Byline...");

    // Load configuration
    let config_path =
        std::env::var("BYLINE_CONFIG").unwrap_or_else(|_| "config.yml".to_string());
    let config = Config::load_with_env(Path::new(&config_path))?;
    tracing::info!("Configuration loaded from {}", config_path);

    // A broken template tree should stop the process here, not at the
    // first request.
    templates::startup_check()?;

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected");

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let config = Arc::new(config);
    let mailer = Arc::new(Mailer::new(config.mail.clone()));

    // Create repositories and services
    let user_service = Arc::new(UserService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
        SqlxResetTokenRepository::boxed(pool.clone()),
        mailer.clone(),
        &config.auth,
        config.server.base_url.clone(),
    ));
    let post_service = Arc::new(PostService::new(
        SqlxPostRepository::boxed(pool.clone()),
        SqlxGroupRepository::boxed(pool.clone()),
        config.pages.per_page,
    ));
    let group_service = Arc::new(GroupService::new(SqlxGroupRepository::boxed(pool.clone())));
    let comment_service = Arc::new(CommentService::new(
        SqlxCommentRepository::boxed(pool.clone()),
        SqlxPostRepository::boxed(pool.clone()),
        config.pages.per_page,
    ));
    let follow_service = Arc::new(FollowService::new(SqlxFollowRepository::boxed(pool.clone())));
    let contact_service = Arc::new(ContactService::new(
        SqlxContactRepository::boxed(pool.clone()),
        mailer,
    ));

    // Build application state
    let state = AppState {
        config: config.clone(),
        user_service: user_service.clone(),
        post_service,
        group_service,
        comment_service,
        follow_service,
        contact_service,
    };

    // Sweep expired sessions and reset tokens every hour
    {
        let users = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match users.cleanup_expired().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "Removed expired sessions and reset tokens");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Failed to clean up expired credentials: {}", e),
                }
            }
        });
    }

    // Build router
    let app = web::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
