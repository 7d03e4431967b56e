use classroom_backend::{build_router, config, database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    config::init_config()?;
    let config = config::get_config();

    let pool = database::pool::create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    let app = build_router(AppState::new(pool));

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    tracing::info!("listening on {}", config.server_address);
    axum::serve(listener, app).await?;

    Ok(())
}
