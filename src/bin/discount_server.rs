use ecom_discounts::server::{build_router, AppState};
use ecom_discounts::utils::{logger, validation::Validate};
use ecom_discounts::{ServiceConfig, StoreApiClient};
use std::env;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 設定檔路徑：第一個參數或 DISCOUNT_SERVER_CONFIG
    let config = match env::args()
        .nth(1)
        .or_else(|| env::var("DISCOUNT_SERVER_CONFIG").ok())
    {
        Some(path) => ServiceConfig::from_file(&path)?,
        None => ServiceConfig::default(),
    };

    logger::init_server_logger(&config.logging.level, config.logging.json);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        return Err(e.into());
    }

    let store_api = match &config.store_api {
        Some(settings) => {
            tracing::info!("🔗 Usage limits counted via {}", settings.base_url);
            Some(StoreApiClient::new(settings)?)
        }
        None => {
            tracing::warn!("⚠️ No Store API configured, usage limited rules will be refused");
            None
        }
    };

    let app = build_router(AppState::new(store_api));

    let addr = config.bind_address();
    tracing::info!("🚀 Starting discount server on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
