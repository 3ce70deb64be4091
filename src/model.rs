// Booking documents, destination records and request payloads

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_CURRENCY: &str = "IDR";
pub const STANDARD_PACKAGE: &str = "Standard Package";
pub const PACKAGE_INCLUSIONS: [&str; 4] = [
    "Akomodasi",
    "Tour guide",
    "Transportasi lokal",
    "Tiket masuk objek wisata",
];

// Catalog record, read-only from the engine's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub price: PriceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }

    // Lifecycle used when transitions are enforced.
    // Terminal states: completed, cancelled, no_show.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (
                BookingStatus::Pending,
                BookingStatus::Confirmed | BookingStatus::Cancelled | BookingStatus::NoShow
            ) | (
                BookingStatus::Confirmed,
                BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
            )
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    #[default]
    BankTransfer,
    EWallet,
    Cash,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    #[default]
    Customer,
    Admin,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Customer {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

impl Customer {
    // Trims every field and lowercases the email, the way records are stored
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            phone: self.phone.trim().to_string(),
            whatsapp: self
                .whatsapp
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty()),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Guests {
    #[serde(default = "default_adults")]
    #[validate(range(min = 1, message = "at least one adult is required"))]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

fn default_adults() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    pub number_of_guests: Guests,
    // Whole days, derived from the two dates
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub inclusions: Vec<String>,
}

impl Package {
    pub fn standard(destination_name: &str, duration: i64) -> Self {
        Self {
            name: STANDARD_PACKAGE.to_string(),
            description: format!(
                "Paket wisata {} hari {} malam ke {}",
                duration,
                duration - 1,
                destination_name
            ),
            inclusions: PACKAGE_INCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub base_price: f64,
    pub tax_and_fees: f64,
    pub discount: f64,
    pub total_price: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialRequests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

// Context captured when a booking is made through the voice assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub conversation_steps: Vec<String>,
    pub created_via_voice: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: CancelledBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub refund_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub destination_id: String,
    pub customer: Customer,
    pub trip_details: TripDetails,
    pub package: Package,
    pub pricing: Pricing,
    pub special_requests: SpecialRequests,
    pub metadata: BookingMetadata,
    pub payment: Payment,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Optimistic concurrency token, owned by the store
    pub version: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    #[serde(deserialize_with = "flexible_date::deserialize")]
    pub check_in_date: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_date::deserialize")]
    pub check_out_date: DateTime<Utc>,
    #[serde(default = "default_guests")]
    #[validate]
    pub number_of_guests: Guests,
}

fn default_guests() -> Guests {
    Guests {
        adults: 1,
        children: 0,
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "destinationId is required"))]
    pub destination_id: String,
    #[validate]
    pub customer: Customer,
    #[validate]
    pub trip_details: TripRequest,
    #[serde(default)]
    pub special_requests: SpecialRequests,
    #[serde(default, alias = "aiMetadata")]
    pub metadata: BookingMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<CancelledBy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Refund {
    pub amount: f64,
    pub percentage: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub booking: Booking,
    pub refund: Refund,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates
// (read as midnight UTC).
pub mod flexible_date {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&BookingStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
        let status: BookingStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(status, BookingStatus::Confirmed);
        assert!(serde_json::from_str::<BookingStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_status_transitions() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Completed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!NoShow.can_transition_to(Confirmed));
    }

    #[test]
    fn test_customer_normalization() {
        let customer = Customer {
            name: "  Siti Rahma ".into(),
            email: " Siti.Rahma@Example.COM ".into(),
            phone: " 0812-3456-7890".into(),
            whatsapp: Some("   ".into()),
        }
        .normalized();

        assert_eq!(customer.name, "Siti Rahma");
        assert_eq!(customer.email, "siti.rahma@example.com");
        assert_eq!(customer.phone, "0812-3456-7890");
        assert_eq!(customer.whatsapp, None);
    }

    #[test]
    fn test_create_request_validation() {
        let body = serde_json::json!({
            "destinationId": "dst-001",
            "customer": {"name": "", "email": "not-an-email", "phone": "0812"},
            "tripDetails": {
                "checkInDate": "2026-11-01",
                "checkOutDate": "2026-11-03",
                "numberOfGuests": {"adults": 0}
            }
        });
        let request: CreateBookingRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err().to_string();
        assert!(errors.contains("name"), "{errors}");
        assert!(errors.contains("email"), "{errors}");
        assert!(errors.contains("adults"), "{errors}");
    }

    #[test]
    fn test_create_request_defaults() {
        let body = serde_json::json!({
            "destinationId": "dst-001",
            "customer": {"name": "Budi", "email": "budi@example.com", "phone": "0812"},
            "tripDetails": {
                "checkInDate": "2026-11-01T00:00:00Z",
                "checkOutDate": "2026-11-03"
            },
            "aiMetadata": {"sessionId": "s-1", "createdViaVoice": true}
        });
        let request: CreateBookingRequest = serde_json::from_value(body).unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.trip_details.number_of_guests.adults, 1);
        assert_eq!(request.trip_details.number_of_guests.children, 0);
        assert_eq!(
            request.trip_details.check_out_date,
            Utc.with_ymd_and_hms(2026, 11, 3, 0, 0, 0).unwrap()
        );
        assert!(request.metadata.created_via_voice);
        assert_eq!(request.special_requests, SpecialRequests::default());
    }

    #[test]
    fn test_flexible_date_rejects_garbage() {
        assert!(flexible_date::parse("next tuesday").is_none());
        assert_eq!(
            flexible_date::parse("2026-11-01T10:30:00+07:00"),
            Some(Utc.with_ymd_and_hms(2026, 11, 1, 3, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_standard_package_description() {
        let package = Package::standard("Gunung Bromo", 3);
        assert_eq!(package.name, "Standard Package");
        assert_eq!(package.description, "Paket wisata 3 hari 2 malam ke Gunung Bromo");
        assert_eq!(package.inclusions.len(), 4);
    }
}
