mod common;

use chrono::Duration;
use roomgate::error::AppError;
use roomgate::models::Student;
use tokio::task::JoinSet;

use common::{at, fixture};

#[tokio::test]
async fn tap_during_active_course_creates_pending_request() {
    let fx = fixture(at(9, 15));

    let view = fx
        .service
        .create_request("CARD-7", 5, Some("Forgot my badge".to_string()))
        .await
        .expect("tap should succeed");

    assert_eq!(view.status, "Pending");
    assert_eq!(view.student_id, 42);
    assert_eq!(view.student_name, "Mara Illes");
    assert_eq!(view.instructor_id, 7);
    assert_eq!(view.course_id, Some(9));
    assert_eq!(view.course_name.as_deref(), Some("Databases"));
    assert_eq!(view.room_number, "1.25");
    assert_eq!(view.building_name, "Informatics Building");
    assert_eq!(view.request_time, at(9, 15));
    assert_eq!(view.reason.as_deref(), Some("Forgot my badge"));
    assert_eq!(view.response_time, None);

    // Exactly one open attendance interval and one success audit entry.
    let attendance = fx.store.attendance_records();
    assert_eq!(attendance.len(), 1);
    assert_eq!(attendance[0].student_id, 42);
    assert_eq!(attendance[0].course_id, 9);
    assert!(attendance[0].exit_time.is_none());

    let audit = fx.store.audit_entries();
    assert_eq!(audit.len(), 1);
    assert!(audit[0].success);
    assert_eq!(audit[0].course_id, Some(9));
    assert_eq!(audit[0].nfc_id_used, "CARD-7");
}

#[tokio::test]
async fn second_tap_fails_with_already_checked_in() {
    let fx = fixture(at(9, 15));

    fx.service
        .create_request("CARD-7", 5, None)
        .await
        .expect("first tap should succeed");

    fx.clock.advance(Duration::minutes(1));
    let err = fx
        .service
        .create_request("CARD-7", 5, None)
        .await
        .expect_err("second tap should fail");
    assert!(matches!(err, AppError::AlreadyCheckedIn));

    // No second interval or request; the failed attempt is still audited.
    assert_eq!(fx.store.attendance_records().len(), 1);
    assert_eq!(fx.store.requests().len(), 1);

    let audit = fx.store.audit_entries();
    assert_eq!(audit.len(), 2);
    let failed = &audit[1];
    assert!(!failed.success);
    assert_eq!(failed.student_id, 42);
    assert_eq!(failed.course_id, Some(9));
    assert_eq!(
        failed.failure_reason.as_deref(),
        Some("Student is already checked into this class")
    );
}

#[tokio::test]
async fn unknown_nfc_id_creates_only_an_audit_entry() {
    let fx = fixture(at(9, 15));

    let err = fx
        .service
        .create_request("CARD-404", 5, None)
        .await
        .expect_err("unknown token should fail");
    assert!(matches!(err, AppError::StudentNotFound));

    assert!(fx.store.attendance_records().is_empty());
    assert!(fx.store.requests().is_empty());

    let audit = fx.store.audit_entries();
    assert_eq!(audit.len(), 1);
    assert!(!audit[0].success);
    assert_eq!(audit[0].student_id, 0);
    assert_eq!(audit[0].course_id, None);
    assert_eq!(audit[0].nfc_id_used, "CARD-404");
    assert_eq!(
        audit[0].failure_reason.as_deref(),
        Some("Student not found with provided NFC ID")
    );
}

#[tokio::test]
async fn tap_outside_any_course_window_fails_with_no_active_course() {
    let fx = fixture(at(11, 0));

    let err = fx
        .service
        .create_request("CARD-7", 5, None)
        .await
        .expect_err("tap outside the window should fail");
    assert!(matches!(err, AppError::NoActiveCourse));

    // The student was resolved, so the audit entry is tied to them but
    // carries no course.
    let audit = fx.store.audit_entries();
    assert_eq!(audit.len(), 1);
    assert!(!audit[0].success);
    assert_eq!(audit[0].student_id, 42);
    assert_eq!(audit[0].course_id, None);
}

#[tokio::test]
async fn phone_surrogate_resolves_like_the_card() {
    let fx = fixture(at(9, 15));

    let view = fx
        .service
        .create_request("PHONE-7", 5, None)
        .await
        .expect("phone tap should succeed");
    assert_eq!(view.student_id, 42);
    assert_eq!(view.status, "Pending");
}

#[tokio::test]
async fn card_id_wins_over_a_colliding_phone_id() {
    let fx = fixture(at(9, 15));
    // Another student whose phone surrogate collides with student 42's card.
    fx.store.add_student(Student {
        id: 43,
        name: "Bence Toth".to_string(),
        email: "bence@uni.example".to_string(),
        card_id: None,
        phone_id: Some("CARD-7".to_string()),
    });

    let view = fx
        .service
        .create_request("CARD-7", 5, None)
        .await
        .expect("tap should succeed");
    assert_eq!(view.student_id, 42);
}

#[tokio::test]
async fn concurrent_taps_open_exactly_one_interval() {
    let fx = fixture(at(9, 15));

    let mut taps = JoinSet::new();
    for _ in 0..8 {
        let service = fx.service.clone();
        taps.spawn(async move { service.create_request("CARD-7", 5, None).await });
    }

    let mut successes = 0;
    let mut already_checked_in = 0;
    while let Some(joined) = taps.join_next().await {
        match joined.expect("task should not panic") {
            Ok(view) => {
                assert_eq!(view.status, "Pending");
                successes += 1;
            }
            Err(AppError::AlreadyCheckedIn) => already_checked_in += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_checked_in, 7);
    assert_eq!(fx.store.attendance_records().len(), 1);
    assert_eq!(fx.store.requests().len(), 1);
}
