use actix_cors::Cors;
use actix_web::middleware::{Condition, Logger};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use std::net::TcpListener;

use odoo_api_connector::clients::OdooClient;
use odoo_api_connector::config::AppSettings;
use odoo_api_connector::middleware::{
    HostFilter, MaxBodySize, RateLimitMiddleware, SecurityHeaders,
};
use odoo_api_connector::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Upstream client is created once so the authenticated session is
    // shared by every worker thread.
    let odoo_client = match OdooClient::new(&app_settings.odoo) {
        Ok(client) => web::Data::new(client),
        Err(e) => {
            log::error!("Failed to initialize Odoo client: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Odoo client initialized for {}", app_settings.odoo.url);

    // Rate limit counters likewise live outside the factory closure so
    // all workers share one store.
    let rate_limiter = match RateLimitMiddleware::from_spec(&app_settings.rate_limit.spec) {
        Ok(limiter) => limiter,
        Err(e) => {
            log::error!("Failed to parse rate limit spec: {}", e);
            std::process::exit(1);
        }
    };

    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr.clone())?;

    HttpServer::new(move || {
        // Clone the data for the factory closure
        let app_settings = app_settings.clone();
        let odoo_client = odoo_client.clone();
        let rate_limiter = rate_limiter.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default();

        // Add allowed origins based on configuration
        if app_settings.server.cors_origins.contains(&"*".to_string()) {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        // Common CORS settings for all origins
        cors = cors.allow_any_method().allow_any_header();

        // Middleware run outermost-first in the reverse of wrap order:
        // Logger, SecurityHeaders, HostFilter, Cors, MaxBodySize,
        // RateLimit, then the route handlers.
        App::new()
            .app_data(odoo_client)
            .configure(configure_routes)
            .wrap(Condition::new(
                app_settings.rate_limit.enabled,
                rate_limiter,
            ))
            .wrap(Condition::new(
                app_settings.security.enable_max_body_size,
                MaxBodySize::new(app_settings.security.max_request_body_bytes),
            ))
            .wrap(cors)
            .wrap(HostFilter::new(app_settings.server.allowed_hosts.clone()))
            .wrap(Condition::new(
                app_settings.security.enable_headers,
                SecurityHeaders,
            ))
            .wrap(Logger::default())
    })
    .listen(listener)?
    .run()
    .await
}
