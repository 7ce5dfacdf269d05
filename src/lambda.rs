use ecom_discounts::utils::{logger, validation::Validate};
use ecom_discounts::{
    ApplyDiscountRequest, ApplyDiscountResponse, DisabledOrderHistory, DiscountEngine,
    LambdaConfig, OrderHistory, StoreApiClient,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;

async fn function_handler(
    engine: &DiscountEngine<Box<dyn OrderHistory>>,
    event: LambdaEvent<ApplyDiscountRequest>,
) -> Result<ApplyDiscountResponse, Error> {
    tracing::info!("Evaluating apply_discount request {}", event.context.request_id);

    let response = engine.apply(&event.payload).await;

    tracing::info!(
        "apply_discount completed: discount={}",
        response.discount_value()
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 創建Lambda配置
    let lambda_config = LambdaConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    lambda_config
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    let history: Box<dyn OrderHistory> = match &lambda_config.store_api {
        Some(settings) => Box::new(
            StoreApiClient::new(settings)
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?,
        ),
        None => Box::new(DisabledOrderHistory),
    };
    let engine = Arc::new(DiscountEngine::new(history));

    run(service_fn(move |event| {
        let engine = Arc::clone(&engine);
        async move { function_handler(&engine, event).await }
    }))
    .await
}
