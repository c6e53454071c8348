use actix_web::{web, App, HttpResponse, HttpServer};
use listing_service::handlers;
use listing_service::metrics;
use listing_service::middleware::JwtAuth;
use listing_service::services::{
    AppealService, AuditTrail, ListingClassifier, ListingService, ModerationService, Notifier,
};
use listing_service::Config;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting listing service");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = %config.http_port,
        "Configuration loaded"
    );

    // Initialize database pool using shared library
    let db_config = db_pool::DbConfig::from_env(&config.service_name)
        .map_err(|e| anyhow::anyhow!("database configuration error: {}", e))?;
    db_config.log_config();
    let db = Arc::new(db_pool::create_pool(db_config).await?);

    // Run migrations
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&*db).await?;
    tracing::info!("Migrations completed");

    // Load the prohibited-term list for the classifier
    let classifier = Arc::new(ListingClassifier::new(&config.prohibited_terms_path)?);
    tracing::info!(
        terms_path = %config.prohibited_terms_path,
        "Listing classifier initialized"
    );

    // Wire services
    let audit = AuditTrail::new(db.clone());
    let notifier = Notifier::new(db.clone());
    let moderation = ModerationService::new(db.clone(), audit.clone(), notifier.clone());
    let listings = ListingService::new(
        db.clone(),
        classifier,
        audit.clone(),
        notifier.clone(),
        config.report_alert_threshold,
    );
    let appeals = AppealService::new(
        db.clone(),
        audit.clone(),
        notifier.clone(),
        moderation.clone(),
    );

    let addr = format!("0.0.0.0:{}", config.http_port);
    tracing::info!("Starting HTTP server on {}", addr);

    let jwt_secret = config.jwt_secret.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(listings.clone()))
            .app_data(web::Data::new(moderation.clone()))
            .app_data(web::Data::new(appeals.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(audit.clone()))
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuth::new(jwt_secret.clone()))
                    .configure(handlers::properties::register_routes)
                    .configure(handlers::appeals::register_routes)
                    .configure(handlers::notifications::register_routes)
                    .configure(handlers::audit::register_routes),
            )
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
