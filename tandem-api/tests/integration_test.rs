//! Domain-level walkthroughs of the booking lifecycle, exercised without a
//! database: seat accounting, the transition table, settlement effects, and
//! the rating aggregate all compose here the same way the repositories drive
//! them.

use chrono::{Duration, Utc};
use tandem_booking::lifecycle::{authorize_transition, validate_creation, Actor};
use tandem_booking::settlement::CompletionEffects;
use tandem_booking::{Booking, BookingStatus, PaymentStatus};
use tandem_review::ledger;
use tandem_review::rating;
use tandem_ride::{Location, Ride};

fn post_ride(driver: &str, seats: i32, fare: i64) -> Ride {
    let now = Utc::now();
    Ride::new(
        driver.to_string(),
        Location {
            address: "North Station".to_string(),
            city: "Accra".to_string(),
            lat: 5.60,
            lng: -0.17,
        },
        Location {
            address: "Harbour Road".to_string(),
            city: "Takoradi".to_string(),
            lat: 4.90,
            lng: -1.76,
        },
        now + Duration::hours(8),
        seats,
        fare,
        "USD".to_string(),
        now,
    )
    .unwrap()
}

fn request_booking(ride: &mut Ride, passenger: &str, seats: i32) -> Booking {
    validate_creation(ride, passenger, false).unwrap();
    ride.reserve_seats(seats).unwrap();
    Booking::new(
        ride.id,
        passenger.to_string(),
        Some(format!("{passenger}@example.com")),
        seats,
        ride.fare_per_seat,
        ride.currency.clone(),
        Utc::now(),
    )
    .unwrap()
}

#[test]
fn two_passengers_contend_for_four_seats() {
    let mut ride = post_ride("driver-1", 4, 2000);

    // Passenger A books 3 of 4 seats.
    let booking_a = request_booking(&mut ride, "passenger-a", 3);
    assert_eq!(ride.available_seats, 1);
    assert_eq!(booking_a.total_fare, 6000);

    // Passenger B asks for 2 and is refused; availability is untouched.
    assert!(ride.reserve_seats(2).is_err());
    assert_eq!(ride.available_seats, 1);

    // Driver rejects A's request; the pool refills.
    authorize_transition(Actor::Driver, booking_a.status, BookingStatus::Rejected).unwrap();
    ride.release_seats(booking_a.seats_booked).unwrap();
    assert_eq!(ride.available_seats, 4);
}

#[test]
fn full_trip_pipeline_settles_exactly_once() {
    let mut ride = post_ride("driver-1", 4, 2500);
    let mut booking = request_booking(&mut ride, "passenger-a", 2);

    // Drive the booking along the whole chain the way the driver would.
    let chain = [
        BookingStatus::Confirmed,
        BookingStatus::ComingForPickup,
        BookingStatus::PickedUp,
        BookingStatus::InTransit,
        BookingStatus::DroppedOff,
    ];
    for target in chain {
        authorize_transition(Actor::Driver, booking.status, target).unwrap();
        booking.status = target;
    }

    // Completion pays the snapshotted fare to the driver, once.
    let effects = CompletionEffects::for_booking(&booking).unwrap();
    assert_eq!(effects.earnings_increment, 5000);
    assert_eq!(effects.ride_count_increment, 1);
    assert_eq!(effects.payment_status, PaymentStatus::Paid);
    booking.status = BookingStatus::Completed;

    // A repeated completion request finds a terminal booking and fails.
    assert!(CompletionEffects::for_booking(&booking).is_err());
    assert!(
        authorize_transition(Actor::Driver, booking.status, BookingStatus::Completed).is_err()
    );
}

#[test]
fn skipping_a_pipeline_stage_is_refused() {
    let mut ride = post_ride("driver-1", 4, 2500);
    let mut booking = request_booking(&mut ride, "passenger-a", 1);

    authorize_transition(Actor::Driver, booking.status, BookingStatus::Confirmed).unwrap();
    booking.status = BookingStatus::Confirmed;

    // Confirmed → PickedUp skips ComingForPickup.
    let err =
        authorize_transition(Actor::Driver, booking.status, BookingStatus::PickedUp).unwrap_err();
    assert!(err.to_string().contains("CONFIRMED"));
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[test]
fn cascade_cancel_overrides_passenger_only_rule() {
    let mut ride = post_ride("driver-1", 4, 1500);
    let booking_a = request_booking(&mut ride, "passenger-a", 1);
    let booking_b = request_booking(&mut ride, "passenger-b", 2);

    // Both get confirmed.
    for booking in [&booking_a, &booking_b] {
        authorize_transition(Actor::Driver, booking.status, BookingStatus::Confirmed).unwrap();
    }

    // The driver alone cannot cancel a confirmed booking...
    assert!(authorize_transition(
        Actor::Driver,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled
    )
    .is_err());
    // ...but the ride-level cascade acts as the system and may.
    assert!(authorize_transition(
        Actor::System,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled
    )
    .is_ok());
    assert!(authorize_transition(
        Actor::System,
        BookingStatus::Pending,
        BookingStatus::Cancelled
    )
    .is_ok());
}

#[test]
fn fare_snapshot_survives_price_edit() {
    let mut ride = post_ride("driver-1", 4, 2000);
    let booking = request_booking(&mut ride, "passenger-a", 2);
    assert_eq!(booking.total_fare, 4000);

    // Driver re-prices the ride while the request is still pending; the
    // booking keeps the fare it was created with.
    ride.apply_update(None, None, Some(9000), booking.seats_booked, Utc::now()).unwrap();
    assert_eq!(ride.fare_per_seat, 9000);
    assert_eq!(booking.total_fare, 4000);
}

#[test]
fn review_flow_feeds_the_rating_aggregate() {
    let mut ride = post_ride("driver-1", 4, 2000);
    let booking = request_booking(&mut ride, "passenger-a", 1);

    // No review before completion.
    assert!(ledger::validate_creation(
        booking.status,
        "passenger-a",
        &booking.passenger_id,
        &ride.driver_id
    )
    .is_err());

    // After completion the passenger reviews the driver.
    let (review_type, reviewee) = ledger::validate_creation(
        BookingStatus::Completed,
        "passenger-a",
        &booking.passenger_id,
        &ride.driver_id,
    )
    .unwrap();
    assert_eq!(review_type, tandem_review::ReviewType::PassengerToDriver);
    assert_eq!(reviewee, "driver-1");

    // Aggregate over this driver's visible ratings.
    assert_eq!(rating::recompute(&[5, 4, 3]), Some(4.0));
    assert_eq!(rating::recompute(&[5, 5, 4, 4, 4]), Some(4.4));
    // Deleting a review means recomputing over what is left.
    assert_eq!(rating::recompute(&[5, 4, 4, 4]), Some(4.3));
}
