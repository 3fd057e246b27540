mod common;

use chrono::Duration;
use roomgate::error::AppError;
use roomgate::models::{Course, RequestStatus};

use common::{add_second_student, at, fixture};

#[tokio::test]
async fn approval_settles_the_request_and_stamps_response_time() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    fx.clock.set(at(9, 20));
    let view = fx
        .service
        .update_request_status(created.id, RequestStatus::Approved)
        .await
        .expect("approval should succeed");

    assert_eq!(view.status, "Approved");
    assert_eq!(view.response_time, Some(at(9, 20)));

    // Approval does not close the presence interval; exits are external.
    let attendance = fx.store.attendance_records();
    assert_eq!(attendance.len(), 1);
    assert!(attendance[0].exit_time.is_none());
}

#[tokio::test]
async fn settled_requests_reject_further_transitions() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    fx.clock.set(at(9, 20));
    fx.service
        .update_request_status(created.id, RequestStatus::Approved)
        .await
        .unwrap();

    fx.clock.set(at(9, 25));
    let err = fx
        .service
        .update_request_status(created.id, RequestStatus::Denied)
        .await
        .expect_err("second transition should fail");
    assert!(matches!(err, AppError::InvalidTransition));

    // The losing call must not touch response_time.
    let view = fx.service.request_by_id(created.id).await.unwrap();
    assert_eq!(view.status, "Approved");
    assert_eq!(view.response_time, Some(at(9, 20)));
}

#[tokio::test]
async fn updating_a_missing_request_fails_with_not_found() {
    let fx = fixture(at(9, 15));
    let err = fx
        .service
        .update_request_status(9999, RequestStatus::Denied)
        .await
        .expect_err("missing request should fail");
    assert!(matches!(err, AppError::RequestNotFound));
}

#[tokio::test]
async fn only_approved_or_denied_are_legal_targets() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    for status in [RequestStatus::Pending, RequestStatus::Expired] {
        let err = fx
            .service
            .update_request_status(created.id, status)
            .await
            .expect_err("non-decision target should fail");
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn instructor_can_settle_by_student_within_ongoing_lecture() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    fx.clock.set(at(9, 18));
    let view = fx
        .service
        .approve_student_entry(7, 42, true)
        .await
        .expect("instructor approval should succeed");
    assert_eq!(view.id, created.id);
    assert_eq!(view.status, "Approved");
    assert_eq!(view.response_time, Some(at(9, 18)));
}

#[tokio::test]
async fn instructor_denial_settles_the_request() {
    let fx = fixture(at(9, 15));
    fx.service.create_request("CARD-7", 5, None).await.unwrap();

    let view = fx.service.approve_student_entry(7, 42, false).await.unwrap();
    assert_eq!(view.status, "Denied");
}

#[tokio::test]
async fn instructor_settlement_without_a_pending_request_fails() {
    let fx = fixture(at(9, 15));
    let err = fx
        .service
        .approve_student_entry(7, 42, true)
        .await
        .expect_err("nothing pending to settle");
    assert!(matches!(err, AppError::RequestNotFound));
}

#[tokio::test]
async fn instructor_settlement_outside_their_lecture_fails() {
    let fx = fixture(at(9, 15));
    fx.service.create_request("CARD-7", 5, None).await.unwrap();

    // The lecture is over; the pending request is out of reach of this path.
    fx.clock.set(at(11, 0));
    let err = fx
        .service
        .approve_student_entry(7, 42, true)
        .await
        .expect_err("no ongoing lecture");
    assert!(matches!(err, AppError::RequestNotFound));
}

#[tokio::test]
async fn stale_pending_requests_expire_once() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    fx.clock.advance(Duration::hours(25));
    let expired = fx.service.expire_old_requests(24).await.unwrap();
    assert_eq!(expired, 1);

    let view = fx.service.request_by_id(created.id).await.unwrap();
    assert_eq!(view.status, "Expired");
    // Expiry is not a response.
    assert_eq!(view.response_time, None);

    // Idempotent: an immediate re-run changes nothing.
    let expired_again = fx.service.expire_old_requests(24).await.unwrap();
    assert_eq!(expired_again, 0);

    // And the sweep result is terminal for instructors too.
    let err = fx
        .service
        .update_request_status(created.id, RequestStatus::Approved)
        .await
        .expect_err("expired request cannot be approved");
    assert!(matches!(err, AppError::InvalidTransition));
}

#[tokio::test]
async fn expiry_rejects_an_out_of_range_horizon() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    // Horizons chrono cannot represent must come back as validation errors,
    // not panics, and must not sweep anything.
    for hours in [10_000_000_000_i64, i64::MAX] {
        let err = fx
            .service
            .expire_old_requests(hours)
            .await
            .expect_err("out-of-range horizon should be rejected");
        assert!(matches!(err, AppError::Validation(_)));
    }

    let view = fx.service.request_by_id(created.id).await.unwrap();
    assert_eq!(view.status, "Pending");
}

#[tokio::test]
async fn expiry_ignores_settled_requests_no_matter_how_old() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();
    fx.service
        .update_request_status(created.id, RequestStatus::Denied)
        .await
        .unwrap();

    fx.clock.advance(Duration::hours(48));
    let expired = fx.service.expire_old_requests(24).await.unwrap();
    assert_eq!(expired, 0);

    let view = fx.service.request_by_id(created.id).await.unwrap();
    assert_eq!(view.status, "Denied");
}

#[tokio::test]
async fn expiry_spares_requests_newer_than_the_cutoff() {
    let fx = fixture(at(9, 15));
    let stale = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    // Next day's lecture in the same room; a fresh tap for it.
    fx.store.add_course(Course {
        id: 10,
        name: "Databases".to_string(),
        instructor_id: 7,
        room_id: 5,
        start_time: at(9, 0) + Duration::days(1),
        end_time: at(10, 30) + Duration::days(1),
    });
    fx.clock.set(at(10, 15) + Duration::days(1));
    let fresh = fx.service.create_request("CARD-7", 5, None).await.unwrap();

    let expired = fx.service.expire_old_requests(24).await.unwrap();
    assert_eq!(expired, 1);
    assert_eq!(
        fx.service.request_by_id(stale.id).await.unwrap().status,
        "Expired"
    );
    assert_eq!(
        fx.service.request_by_id(fresh.id).await.unwrap().status,
        "Pending"
    );
}

#[tokio::test]
async fn sweeper_and_approval_race_has_exactly_one_winner() {
    let fx = fixture(at(9, 15));
    let created = fx.service.create_request("CARD-7", 5, None).await.unwrap();
    fx.clock.advance(Duration::hours(25));

    let (approval, sweep) = tokio::join!(
        fx.service
            .update_request_status(created.id, RequestStatus::Approved),
        fx.service.expire_old_requests(24),
    );

    let expired = sweep.expect("sweep itself should not fail");
    match approval {
        Ok(view) => {
            assert_eq!(view.status, "Approved");
            assert_eq!(expired, 0);
        }
        Err(AppError::InvalidTransition) => {
            assert_eq!(expired, 1);
            let view = fx.service.request_by_id(created.id).await.unwrap();
            assert_eq!(view.status, "Expired");
        }
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn dashboard_views_filter_and_order_by_request_time() {
    let fx = fixture(at(9, 10));
    add_second_student(&fx);

    let first = fx.service.create_request("CARD-7", 5, None).await.unwrap();
    fx.clock.set(at(9, 20));
    let second = fx.service.create_request("CARD-8", 5, None).await.unwrap();

    // Newest first.
    let by_instructor = fx.service.requests_by_instructor(7, None).await.unwrap();
    assert_eq!(
        by_instructor.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    let by_student = fx.service.requests_by_student(42).await.unwrap();
    assert_eq!(by_student.len(), 1);
    assert_eq!(by_student[0].id, first.id);

    // Settling one request drops it from every pending view.
    fx.service
        .update_request_status(first.id, RequestStatus::Approved)
        .await
        .unwrap();

    let approved_only = fx
        .service
        .requests_by_instructor(7, Some(RequestStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved_only.len(), 1);
    assert_eq!(approved_only[0].id, first.id);

    let pending_in_room = fx.service.pending_requests_by_room(5).await.unwrap();
    assert_eq!(pending_in_room.len(), 1);
    assert_eq!(pending_in_room[0].id, second.id);

    let ongoing = fx.service.pending_for_ongoing_lecture(7).await.unwrap();
    assert_eq!(ongoing.len(), 1);
    assert_eq!(ongoing[0].id, second.id);

    // After the lecture the ongoing view is empty even though the request
    // is still pending.
    fx.clock.set(at(11, 0));
    assert!(fx
        .service
        .pending_for_ongoing_lecture(7)
        .await
        .unwrap()
        .is_empty());

    let missing = fx.service.request_by_id(9999).await;
    assert!(matches!(missing, Err(AppError::RequestNotFound)));
}
