use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

static LISTINGS_SUBMITTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "listing_service_listings_submitted_total",
            "Listings submitted, labeled by the moderation status assigned at creation",
        ),
        &["status"],
    )
    .expect("failed to create listing_service_listings_submitted_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register listing_service_listings_submitted_total");
    counter
});

static MODERATION_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "listing_service_moderation_decisions_total",
            "Admin moderation decisions, labeled by outcome",
        ),
        &["decision"],
    )
    .expect("failed to create listing_service_moderation_decisions_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register listing_service_moderation_decisions_total");
    counter
});

static APPEALS_FILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "listing_service_appeals_filed_total",
        "Appeals filed by agents",
    )
    .expect("failed to create listing_service_appeals_filed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register listing_service_appeals_filed_total");
    counter
});

static APPEALS_RESOLVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "listing_service_appeals_resolved_total",
            "Appeal resolutions, labeled by decision",
        ),
        &["decision"],
    )
    .expect("failed to create listing_service_appeals_resolved_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register listing_service_appeals_resolved_total");
    counter
});

static NOTIFICATIONS_DISPATCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "listing_service_notifications_dispatched_total",
        "Notification records successfully written",
    )
    .expect("failed to create listing_service_notifications_dispatched_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register listing_service_notifications_dispatched_total");
    counter
});

pub fn observe_listing_submitted(status: &str) {
    LISTINGS_SUBMITTED_TOTAL.with_label_values(&[status]).inc();
}

pub fn observe_moderation_decision(decision: &str) {
    MODERATION_DECISIONS_TOTAL
        .with_label_values(&[decision])
        .inc();
}

pub fn observe_appeal_filed() {
    APPEALS_FILED_TOTAL.inc();
}

pub fn observe_appeal_resolved(decision: &str) {
    APPEALS_RESOLVED_TOTAL.with_label_values(&[decision]).inc();
}

pub fn observe_notification_dispatched() {
    NOTIFICATIONS_DISPATCHED_TOTAL.inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
