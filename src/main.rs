use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use docquiz_server::{
    app_state::AppState,
    auth::{AuthMiddleware, JwtService},
    config::Config,
    graphql::create_schema,
    handlers,
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    config.validate_for_production();

    let bind_addr = (config.web_server_host.clone(), config.web_server_port);
    let max_upload_bytes = config.max_upload_bytes;
    let reconcile_interval = Duration::from_secs(config.reconcile_interval_secs);
    let jwt_service = web::Data::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ));

    let app_state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    if let Err(e) = app_state.quiz_reconciler.run_once().await {
        log::error!("Startup reconciliation failed: {}", e);
    }
    let reconciler = app_state.quiz_reconciler.clone().spawn(reconcile_interval);

    let schema = web::Data::new(create_schema(app_state.clone()));
    let state = web::Data::new(app_state);

    log::info!("Starting HTTP server on {}:{}", bind_addr.0, bind_addr.1);
    log::info!("GraphiQL playground: http://{}:{}/graphql", bind_addr.0, bind_addr.1);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(schema.clone())
            .app_data(jwt_service.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(AuthMiddleware)
            .wrap(Cors::permissive())
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(r#"%a "%r" %s %b %T %{x-request-id}o"#))
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await;

    reconciler.abort();
    result
}
