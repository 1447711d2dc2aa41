use actix_web::{http::header, web, App, HttpServer};
use actix_cors::Cors;
use dotenv::dotenv;
use lingua_server::{configure_app, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn cors_for(config: &Settings) -> Cors {
    config
        .cors
        .origins()
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> lingua_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded for environment: {}", config.environment);

    if config.uses_default_secret() && config.environment != "development" {
        warn!("Using the default JWT secret outside development; set APP_AUTH__JWT_SECRET");
    }

    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Backend listening on http://{}:{}", config.server.host, config.server.port);

    let server_state = state.clone();
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors_for(&server_config))
            .app_data(server_state.clone())
            .configure(configure_app)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    state.shutdown().await?;
    info!("Server stopped");
    Ok(())
}
