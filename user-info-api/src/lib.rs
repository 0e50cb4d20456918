pub mod api;
pub mod config;
pub mod store;

use api::AppState;
use config::Config;
use store::UserStore;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum UserInfoError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run() -> Result<(), UserInfoError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_async())
}

pub async fn run_async() -> Result<(), UserInfoError> {
    let config = Config::from_env()?;
    serve(config).await
}

pub async fn serve(config: Config) -> Result<(), UserInfoError> {
    let store = UserStore::new(config.user_data_file);
    // Load eagerly so startup logs show the table size; a failure here is not
    // fatal, the store retries lazily once the file shows up.
    store.ensure_loaded();

    let state = AppState {
        store,
        defaults: config.defaults,
        hide_passwords: config.hide_passwords,
    };
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "user-info API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
