pub mod api;
pub mod config;
pub mod events;

use api::AppState;
use config::Config;
use events::DatabaseClient;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum NotifierError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ValidationError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run() -> Result<(), NotifierError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_async())
}

pub async fn run_async() -> Result<(), NotifierError> {
    let config = Config::from_env()?;
    serve(config).await
}

pub async fn serve(config: Config) -> Result<(), NotifierError> {
    let state = AppState {
        service_name: config.service_name.clone(),
        database: DatabaseClient::new(&config.database_url)?,
    };
    let app = api::router(state);

    let addr = format!("{}:{}", config.listener.host, config.listener.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, service = %config.service_name, "notifier listening");
    axum::serve(listener, app).await?;
    Ok(())
}
