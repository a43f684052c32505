// libs/scheduling-cell/tests/booking_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use uuid::Uuid;

use directory_cell::models::{
    ConsultationType, RegisterDoctorRequest, RegisterPatientRequest, UpsertPolicyRequest,
};
use directory_cell::services::directory::DirectoryService;
use directory_cell::{DirectoryReader, DirectoryState};
use scheduling_cell::models::{
    AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
    RescheduleAppointmentRequest, SchedulingError,
};
use scheduling_cell::services::booking::BookingService;
use scheduling_cell::services::conflict::ConflictDetectionService;
use scheduling_cell::SchedulingState;
use shared_config::AppConfig;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, day, hour, min, 0).unwrap()
}

struct TestSetup {
    scheduling: Arc<SchedulingState>,
    doctor_id: Uuid,
    patient_id: Uuid,
}

impl TestSetup {
    async fn new() -> Self {
        let directory = Arc::new(DirectoryState::new());
        let scheduling = Arc::new(SchedulingState::new(
            Arc::clone(&directory) as Arc<dyn DirectoryReader>,
            &AppConfig::default(),
        ));

        let directory_service = DirectoryService::new(Arc::clone(&directory));
        let doctor = directory_service
            .register_doctor(RegisterDoctorRequest {
                full_name: "Dr. Jane Smith".to_string(),
                specialty: "Dermatology".to_string(),
            })
            .await
            .unwrap();
        let patient = directory_service
            .register_patient(RegisterPatientRequest {
                full_name: "John Doe".to_string(),
            })
            .await
            .unwrap();
        directory_service
            .upsert_policy(
                doctor.id,
                UpsertPolicyRequest {
                    consultation_type: ConsultationType::Video,
                    fee: 75.0,
                    session_duration_minutes: 30,
                },
            )
            .await
            .unwrap();

        Self {
            scheduling,
            doctor_id: doctor.id,
            patient_id: patient.id,
        }
    }

    fn booking(&self) -> BookingService {
        BookingService::new(Arc::clone(&self.scheduling))
    }

    fn request(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            start_time: start,
            end_time: end,
            consultation_type: ConsultationType::Video,
        }
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn booking_snapshots_fee_and_duration_from_policy() {
    let setup = TestSetup::new().await;

    let appointment = setup
        .booking()
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.consultation_fee, 75.0);
    assert_eq!(appointment.session_duration_minutes, 30);
    assert_eq!(appointment.previous_appointment_id, None);
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    let result = booking
        .book_appointment(setup.request(ts(7, 9, 15), ts(7, 9, 45)))
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict));
}

#[tokio::test]
async fn touching_bookings_do_not_conflict() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    let adjacent = booking
        .book_appointment(setup.request(ts(7, 9, 30), ts(7, 10, 0)))
        .await;

    assert!(adjacent.is_ok());
}

#[tokio::test]
async fn cancelled_window_can_be_rebooked() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let first = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    scheduling_cell::services::lifecycle::LifecycleService::new(Arc::clone(&setup.scheduling))
        .cancel(first.id, "Travel plans changed".to_string())
        .await
        .unwrap();

    let second = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn concurrent_bookings_for_one_window_commit_exactly_once() {
    let setup = TestSetup::new().await;

    let attempts = (0..8).map(|_| {
        let scheduling = Arc::clone(&setup.scheduling);
        let request = setup.request(ts(7, 9, 0), ts(7, 9, 30));
        async move { BookingService::new(scheduling).book_appointment(request).await }
    });
    let results = join_all(attempts).await;

    let committed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_matches!(result, Err(SchedulingError::Conflict));
    }
}

#[tokio::test]
async fn booking_validation_rejects_bad_windows_and_parties() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    // Inverted window.
    let result = booking
        .book_appointment(setup.request(ts(7, 10, 0), ts(7, 9, 0)))
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));

    // Start in the past.
    let past = Utc.with_ymd_and_hms(2020, 1, 7, 9, 0, 0).unwrap();
    let result = booking
        .book_appointment(setup.request(past, past + chrono::Duration::minutes(30)))
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));

    // Doctor booking themselves.
    let mut request = setup.request(ts(7, 9, 0), ts(7, 9, 30));
    request.patient_id = setup.doctor_id;
    assert_matches!(
        booking.book_appointment(request).await,
        Err(SchedulingError::Validation(_))
    );

    // Unknown patient.
    let mut request = setup.request(ts(7, 9, 0), ts(7, 9, 30));
    request.patient_id = Uuid::new_v4();
    assert_matches!(
        booking.book_appointment(request).await,
        Err(SchedulingError::PatientNotFound)
    );

    // Consultation type without a policy.
    let mut request = setup.request(ts(7, 9, 0), ts(7, 9, 30));
    request.consultation_type = ConsultationType::Clinic;
    assert_matches!(
        booking.book_appointment(request).await,
        Err(SchedulingError::ConsultationNotOffered(ConsultationType::Clinic))
    );
}

// ==============================================================================
// RESCHEDULE
// ==============================================================================

#[tokio::test]
async fn reschedule_links_replacement_and_cancels_original() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let original = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    let replacement = booking
        .reschedule_appointment(
            original.id,
            RescheduleAppointmentRequest {
                new_start_time: ts(8, 11, 0),
                new_end_time: ts(8, 11, 30),
            },
        )
        .await
        .unwrap();

    assert_eq!(replacement.previous_appointment_id, Some(original.id));
    assert_eq!(replacement.status, AppointmentStatus::Confirmed);

    let original = booking.get_appointment(original.id).await.unwrap();
    assert_eq!(original.status, AppointmentStatus::Cancelled);
    assert!(original.cancellation_reason.is_some());
    assert!(original.cancelled_at.is_some());
}

#[tokio::test]
async fn reschedule_may_overlap_the_window_it_vacates() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let original = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    // Shift by 15 minutes: overlaps the original window, which no
    // longer counts because the original is being replaced.
    let replacement = booking
        .reschedule_appointment(
            original.id,
            RescheduleAppointmentRequest {
                new_start_time: ts(7, 9, 15),
                new_end_time: ts(7, 9, 45),
            },
        )
        .await;
    assert!(replacement.is_ok());
}

#[tokio::test]
async fn reschedule_into_another_booking_is_rejected() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let original = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    booking
        .book_appointment(setup.request(ts(7, 11, 0), ts(7, 11, 30)))
        .await
        .unwrap();

    let result = booking
        .reschedule_appointment(
            original.id,
            RescheduleAppointmentRequest {
                new_start_time: ts(7, 11, 15),
                new_end_time: ts(7, 11, 45),
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Conflict));

    // The failed reschedule left the original untouched.
    let original = booking.get_appointment(original.id).await.unwrap();
    assert_eq!(original.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn cancelled_appointment_cannot_be_rescheduled() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let original = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    scheduling_cell::services::lifecycle::LifecycleService::new(Arc::clone(&setup.scheduling))
        .cancel(original.id, "Patient request".to_string())
        .await
        .unwrap();

    let result = booking
        .reschedule_appointment(
            original.id,
            RescheduleAppointmentRequest {
                new_start_time: ts(8, 11, 0),
                new_end_time: ts(8, 11, 30),
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::IllegalTransition { .. }));
}

// ==============================================================================
// SEARCH AND CONFLICT QUERIES
// ==============================================================================

#[tokio::test]
async fn search_filters_by_status_and_range() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();

    let first = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();
    booking
        .book_appointment(setup.request(ts(9, 9, 0), ts(9, 9, 30)))
        .await
        .unwrap();
    scheduling_cell::services::lifecycle::LifecycleService::new(Arc::clone(&setup.scheduling))
        .cancel(first.id, "Patient request".to_string())
        .await
        .unwrap();

    let confirmed = booking
        .search_appointments(AppointmentSearchQuery {
            patient_id: None,
            doctor_id: Some(setup.doctor_id),
            status: Some(AppointmentStatus::Confirmed),
            from_date: None,
            to_date: None,
        })
        .await;
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].scheduled_start, ts(9, 9, 0));

    let early = booking
        .search_appointments(AppointmentSearchQuery {
            patient_id: Some(setup.patient_id),
            doctor_id: None,
            status: None,
            from_date: Some(ts(7, 0, 0)),
            to_date: Some(ts(8, 0, 0)),
        })
        .await;
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].id, first.id);
}

#[tokio::test]
async fn conflict_check_reports_overlapping_active_appointments() {
    let setup = TestSetup::new().await;
    let booking = setup.booking();
    let conflicts = ConflictDetectionService::new(Arc::clone(&setup.scheduling));

    let appointment = booking
        .book_appointment(setup.request(ts(7, 9, 0), ts(7, 9, 30)))
        .await
        .unwrap();

    let response = conflicts
        .check_conflicts(setup.doctor_id, ts(7, 9, 15), ts(7, 9, 45), None)
        .await;
    assert!(response.has_conflict);
    assert_eq!(response.conflicting_appointments.len(), 1);
    assert_eq!(response.conflicting_appointments[0].id, appointment.id);

    // Touching window, and the excluded appointment itself.
    let response = conflicts
        .check_conflicts(setup.doctor_id, ts(7, 9, 30), ts(7, 10, 0), None)
        .await;
    assert!(!response.has_conflict);
    let response = conflicts
        .check_conflicts(setup.doctor_id, ts(7, 9, 0), ts(7, 9, 30), Some(appointment.id))
        .await;
    assert!(!response.has_conflict);
}
