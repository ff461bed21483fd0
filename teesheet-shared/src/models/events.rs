//! Payload bodies carried inside flight domain events. Timestamps are unix
//! seconds, the same shape the event stream consumers already read.

use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct FlightCreatedPayload {
    pub flight_id: Uuid,
    pub booking_number: String,
    pub course_id: Uuid,
    pub tee_date: NaiveDate,
    pub tee_time: String,
    pub starting_hole: u8,
    pub player_count: u8,
    pub created_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PlayersUpdatedPayload {
    pub flight_id: Uuid,
    pub previous_count: u8,
    pub player_count: u8,
    pub updated_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct FlightCancelledPayload {
    pub flight_id: Uuid,
    pub previous_status: String,
    pub reason: Option<String>,
    pub cancelled_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct FlightCheckedInPayload {
    pub flight_id: Uuid,
    pub players_checked_in: u8,
    pub checked_in_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct StatusChangedPayload {
    pub flight_id: Uuid,
    pub from: String,
    pub to: String,
    pub changed_at: i64,
}
