use chrono::Utc;
/// Unit tests for listing-service core functionality
///
/// This test module covers:
/// - Status enum serialization and state machines
/// - Initial moderation status assignment (classifier + submitter role)
/// - Notification payload construction
/// - Error to HTTP status mapping
use listing_service::error::AppError;
use listing_service::models::*;
use listing_service::services::{ListingClassifier, ModerationService, Verdict};
use std::io::Write;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn policy_terms_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# test policy list").unwrap();
    writeln!(file, "moneygram").unwrap();
    writeln!(file, "western union").unwrap();
    writeln!(file, "no children").unwrap();
    file
}

#[test]
fn test_moderation_status_serialization() {
    for status in [
        ModerationStatus::Pending,
        ModerationStatus::Approved,
        ModerationStatus::Rejected,
        ModerationStatus::Flagged,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: ModerationStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
        assert_eq!(json, format!("\"{}\"", status.as_str()));
    }
}

#[test]
fn test_appeal_status_serialization() {
    for status in [
        AppealStatus::Pending,
        AppealStatus::Approved,
        AppealStatus::Rejected,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: AppealStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}

#[test]
fn test_admin_clean_listing_is_approved_on_submission() {
    let file = policy_terms_file();
    let classifier = ListingClassifier::new(file.path()).unwrap();

    let verdict = classifier.classify(
        "Luxury Condo",
        "Spacious two-bedroom condo with city views and parking.",
    );
    assert!(!verdict.flagged);

    let (status, notes) = ModerationService::initial_status(UserRole::Admin, &verdict);
    assert_eq!(status, ModerationStatus::Approved);
    assert!(notes.is_none());
}

#[test]
fn test_agent_listing_with_scam_keyword_is_flagged() {
    let file = policy_terms_file();
    let classifier = ListingClassifier::new(file.path()).unwrap();

    let verdict = classifier.classify(
        "Great apartment",
        "Secure the unit today, payment by Western Union accepted.",
    );
    assert!(verdict.flagged);

    let (status, notes) = ModerationService::initial_status(UserRole::Agent, &verdict);
    assert_eq!(status, ModerationStatus::Flagged);
    assert!(notes.unwrap().contains("western union"));
}

#[test]
fn test_agent_clean_listing_enters_queue_as_pending() {
    let file = policy_terms_file();
    let classifier = ListingClassifier::new(file.path()).unwrap();

    let verdict = classifier.classify("Family home", "Four bedrooms, large garden, near schools.");
    let (status, notes) = ModerationService::initial_status(UserRole::Agent, &verdict);
    assert_eq!(status, ModerationStatus::Pending);
    assert!(notes.is_none());
}

#[test]
fn test_flagged_verdict_overrides_admin_bypass() {
    let verdict = Verdict {
        flagged: true,
        matched_terms: vec!["moneygram".to_string()],
    };
    let (status, _) = ModerationService::initial_status(UserRole::Admin, &verdict);
    assert_eq!(status, ModerationStatus::Flagged);
}

#[test]
fn test_appeal_state_machine_only_exits_pending() {
    assert!(AppealStatus::Pending.can_transition_to(AppealStatus::Approved));
    assert!(AppealStatus::Pending.can_transition_to(AppealStatus::Rejected));

    for terminal in [AppealStatus::Approved, AppealStatus::Rejected] {
        for next in [
            AppealStatus::Pending,
            AppealStatus::Approved,
            AppealStatus::Rejected,
        ] {
            assert!(!terminal.can_transition_to(next));
        }
    }
}

#[test]
fn test_rejected_listing_can_only_be_revived_to_approved() {
    assert!(ModerationStatus::Rejected.can_transition_to(ModerationStatus::Approved));
    assert!(!ModerationStatus::Rejected.can_transition_to(ModerationStatus::Pending));
    assert!(!ModerationStatus::Rejected.can_transition_to(ModerationStatus::Flagged));
    // the revival path is not an admin-queue decision
    assert!(!ModerationStatus::Rejected.awaiting_review());
}

#[test]
fn test_admin_fanout_payload_points_back_to_appeal() {
    let appeal_id = Uuid::new_v4();
    let payload = NotificationPayload::new(
        NotificationKind::Info,
        "New appeal submitted",
        "An agent appealed the rejection of listing \"Family home\".",
    )
    .related_to(TargetKind::Appeal, appeal_id);

    assert_eq!(payload.kind, NotificationKind::Info);
    assert_eq!(payload.related, Some((TargetKind::Appeal, appeal_id)));
}

#[test]
fn test_notification_model_serialization() {
    let notification = Notification {
        id: Uuid::new_v4(),
        recipient_id: Uuid::new_v4(),
        title: "Listing approved".to_string(),
        message: "Your listing is now live.".to_string(),
        kind: NotificationKind::Success,
        related_type: Some("property".to_string()),
        related_id: Some(Uuid::new_v4()),
        is_read: false,
        created_at: Utc::now(),
        read_at: None,
    };

    let json = serde_json::to_string(&notification).unwrap();
    let parsed: Notification = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.kind, NotificationKind::Success);
    assert!(!parsed.is_read);
}

#[test]
fn test_error_kinds_map_to_expected_status_codes() {
    use actix_web::error::ResponseError;
    use actix_web::http::StatusCode;

    let cases = [
        (
            AppError::Forbidden("only agents can submit appeals".into()),
            StatusCode::FORBIDDEN,
        ),
        (
            AppError::NotFound("property not found".into()),
            StatusCode::NOT_FOUND,
        ),
        (
            AppError::InvalidState("only rejected listings can be appealed".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::Conflict("an appeal for this listing is already pending".into()),
            StatusCode::CONFLICT,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status_code(), expected);
    }
}
