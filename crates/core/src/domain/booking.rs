use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::customer::CustomerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown booking status `{0}`")]
pub struct UnknownBookingStatus(pub String);

impl std::str::FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(UnknownBookingStatus(other.to_string())),
        }
    }
}

/// The fixed appointment catalog. The booking-type validator matches against
/// these labels but falls back to accepting free text, so `Booking.booking_type`
/// is a string, not this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentType {
    GeneralCheckup,
    SpecialistConsultation,
    FollowUpVisit,
    Vaccination,
    LabTests,
    DentalCare,
    EyeExamination,
    PhysicalTherapy,
    MentalHealthConsultation,
    PediatricCare,
    Other,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 11] = [
        Self::GeneralCheckup,
        Self::SpecialistConsultation,
        Self::FollowUpVisit,
        Self::Vaccination,
        Self::LabTests,
        Self::DentalCare,
        Self::EyeExamination,
        Self::PhysicalTherapy,
        Self::MentalHealthConsultation,
        Self::PediatricCare,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralCheckup => "General Checkup",
            Self::SpecialistConsultation => "Specialist Consultation",
            Self::FollowUpVisit => "Follow-up Visit",
            Self::Vaccination => "Vaccination",
            Self::LabTests => "Lab Tests",
            Self::DentalCare => "Dental Care",
            Self::EyeExamination => "Eye Examination",
            Self::PhysicalTherapy => "Physical Therapy",
            Self::MentalHealthConsultation => "Mental Health Consultation",
            Self::PediatricCare => "Pediatric Care",
            Self::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub booking_type: String,
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    /// Canonical 24-hour `HH:MM`.
    pub time: String,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer_id: CustomerId,
    pub booking_type: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{AppointmentType, BookingStatus};

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("RESCHEDULED".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn catalog_covers_every_label_once() {
        let mut labels: Vec<&str> =
            AppointmentType::ALL.iter().map(AppointmentType::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), AppointmentType::ALL.len());
    }
}
