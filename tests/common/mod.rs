#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use roomgate::clock::ManualClock;
use roomgate::models::{Building, Course, Instructor, Room, Student};
use roomgate::services::AdmissionService;
use roomgate::store::{AdmissionStore, MemoryStore};

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<AdmissionService>,
}

/// Clock helper: times on the fixture's lecture day.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
}

/// One building, room 5, instructor 7, student 42 (card "CARD-7", phone
/// "PHONE-7"), and course 9 active in room 5 between 09:00 and 10:30.
pub fn fixture(start: DateTime<Utc>) -> Fixture {
    let store = Arc::new(MemoryStore::new());

    store.add_building(Building {
        id: 1,
        name: "Informatics Building".to_string(),
    });
    store.add_room(Room {
        id: 5,
        building_id: 1,
        room_number: "1.25".to_string(),
        capacity: 30,
    });
    store.add_instructor(Instructor {
        id: 7,
        name: "Eszter Kovacs".to_string(),
        email: "kovacs@uni.example".to_string(),
    });
    store.add_student(Student {
        id: 42,
        name: "Mara Illes".to_string(),
        email: "mara@uni.example".to_string(),
        card_id: Some("CARD-7".to_string()),
        phone_id: Some("PHONE-7".to_string()),
    });
    store.add_course(Course {
        id: 9,
        name: "Databases".to_string(),
        instructor_id: 7,
        room_id: 5,
        start_time: at(9, 0),
        end_time: at(10, 30),
    });

    let clock = Arc::new(ManualClock::new(start));
    let service = Arc::new(AdmissionService::new(
        store.clone() as Arc<dyn AdmissionStore>,
        clock.clone(),
    ));

    Fixture {
        store,
        clock,
        service,
    }
}

/// A second student with their own card, for multi-student scenarios.
pub fn add_second_student(fixture: &Fixture) {
    fixture.store.add_student(Student {
        id: 43,
        name: "Bence Toth".to_string(),
        email: "bence@uni.example".to_string(),
        card_id: Some("CARD-8".to_string()),
        phone_id: None,
    });
}
