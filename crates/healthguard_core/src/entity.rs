//! Well-known collections of the HealthGuard backend.

use std::fmt;
use std::str::FromStr;

/// One logical entity type, each stored in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Login accounts.
    Users,
    /// Per-user profile details (role, contact, clinical attributes).
    UserProfiles,
    /// Diagnoses and visit notes.
    MedicalRecords,
    /// Prescriptions issued by doctors.
    Prescriptions,
    /// Medication catalogue.
    Medications,
    /// Patient medicine reminders.
    MedicineReminders,
    /// Booked appointments.
    Appointments,
    /// Vital signs and other measurements.
    HealthMetrics,
    /// Diet plans.
    DietPlans,
    /// AI consultation transcripts.
    AiConsultations,
    /// Emergency contacts.
    EmergencyContacts,
    /// Patient reviews of doctors.
    DoctorReviews,
    /// Clinics.
    Clinics,
    /// One-time passwords awaiting verification.
    OtpStore,
    /// Active subscriptions.
    Subscriptions,
    /// Subscription plan catalogue.
    SubscriptionPlans,
}

impl EntityKind {
    /// Every well-known collection, in registration order.
    pub const ALL: [EntityKind; 16] = [
        Self::Users,
        Self::UserProfiles,
        Self::MedicalRecords,
        Self::Prescriptions,
        Self::Medications,
        Self::MedicineReminders,
        Self::Appointments,
        Self::HealthMetrics,
        Self::DietPlans,
        Self::AiConsultations,
        Self::EmergencyContacts,
        Self::DoctorReviews,
        Self::Clinics,
        Self::OtpStore,
        Self::Subscriptions,
        Self::SubscriptionPlans,
    ];

    /// Collection name, which is also the durable unit's file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::UserProfiles => "user_profiles",
            Self::MedicalRecords => "medical_records",
            Self::Prescriptions => "prescriptions",
            Self::Medications => "medications",
            Self::MedicineReminders => "medicine_reminders",
            Self::Appointments => "appointments",
            Self::HealthMetrics => "health_metrics",
            Self::DietPlans => "diet_plans",
            Self::AiConsultations => "ai_consultations",
            Self::EmergencyContacts => "emergency_contacts",
            Self::DoctorReviews => "doctor_reviews",
            Self::Clinics => "clinics",
            Self::OtpStore => "otp_store",
            Self::Subscriptions => "subscriptions",
            Self::SubscriptionPlans => "subscription_plans",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}
