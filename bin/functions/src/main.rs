use std::process::ExitCode;
use storefront_functions::{ErrorPayload, FunctionsConfig, RuntimeClient, handlers, run};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();

    let config = match FunctionsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let http = reqwest::Client::new();
    let runtime = RuntimeClient::new(http.clone(), &config.runtime_api);

    let handler = match handlers::from_env(&config, http) {
        Ok(handler) => handler,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize function");
            if let Err(report_error) = runtime.post_init_error(&ErrorPayload::from(&e)).await {
                tracing::error!(error = %report_error, "failed to report init error");
            }
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(handler = handler.name(), "function initialized");

    match run(&runtime, handler.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "runtime loop stopped");
            ExitCode::FAILURE
        }
    }
}
