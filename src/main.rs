use clap::Parser;
use ecom_discounts::utils::error::{DiscountError, ErrorSeverity};
use ecom_discounts::utils::{logger, validation::Validate};
use ecom_discounts::{
    ApplyDiscountRequest, CliConfig, DisabledOrderHistory, DiscountEngine, OrderHistory,
    ServiceConfig, StoreApiClient,
};
use std::io::Read;

fn read_request(path: &str) -> Result<ApplyDiscountRequest, DiscountError> {
    let content = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&content).map_err(|e| DiscountError::RequestError {
        message: format!("{}: {}", path, e),
    })
}

async fn run(config: &CliConfig) -> Result<String, DiscountError> {
    let service_config = match &config.config {
        Some(path) => {
            let service_config = ServiceConfig::from_file(path)?;
            service_config.validate()?;
            Some(service_config)
        }
        None => None,
    };

    let history: Box<dyn OrderHistory> =
        match config.store_api_settings(service_config.as_ref()) {
            Some(settings) => {
                settings.validate()?;
                tracing::info!("🔗 Usage limits counted via {}", settings.base_url);
                Box::new(StoreApiClient::new(&settings)?)
            }
            None => {
                tracing::debug!("No Store API configured, usage limited rules will be refused");
                Box::new(DisabledOrderHistory)
            }
        };

    let request = read_request(&config.request)?;
    let engine = DiscountEngine::new(history);
    let response = match config.evaluation_time()? {
        Some(now) => engine.apply_at(&request, now).await,
        None => engine.apply(&request).await,
    };

    let output = if config.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting ecom-discounts CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!(
                "❌ Evaluation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
