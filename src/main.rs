use anyhow::Context;
use api_assembly::app::petstore;
use api_assembly::utils::{error::ErrorCategory, logger, validation::Validate};
use api_assembly::{ApiConfig, CliConfig, Dispatcher, Method, Request};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => ApiConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ApiConfig::default(),
    };

    // 初始化日誌
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting api-assembly");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let api = petstore::new_api(&config).context("Failed to assemble the pet store API")?;
    let dispatcher = Dispatcher::new(Arc::new(api));

    let method: Method = cli.method.parse()?;
    let mut request = Request::new(method, &cli.path);
    if let Some(content_type) = &cli.content_type {
        request = request.content_type(content_type);
    }
    if let Some(accept) = &cli.accept {
        request = request.accept(accept);
    }
    if let Some(body) = &cli.body {
        request = request.body(body.clone());
    }
    if let (Some(user), Some(password)) = (&cli.user, &cli.password) {
        request = request.basic_auth(user, password);
    }
    if let Some(key) = &cli.api_key {
        request = request.header(petstore::API_KEY_HEADER, key.clone());
    }

    match dispatcher.dispatch(request).await {
        Ok(response) => {
            println!("{}", response.status);
            if let Some(content_type) = &response.content_type {
                println!("Content-Type: {}", content_type);
            }
            if let Some(principal) = &response.principal {
                println!("Principal: {}", principal);
            }
            if !response.body.is_empty() {
                println!();
                println!("{}", response.body_text());
            }
        }
        Err(failure) => {
            tracing::error!(
                "❌ Request failed while {}: {} (Category: {:?})",
                failure.state,
                failure.error,
                failure.error.category()
            );
            eprintln!("❌ {} {}", failure.status_code(), failure.error);

            // 設定錯誤與請求錯誤使用不同的退出碼
            let exit_code = match failure.error.category() {
                ErrorCategory::Configuration | ErrorCategory::System => 3,
                ErrorCategory::Handler => 2,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
