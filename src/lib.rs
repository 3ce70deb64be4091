// Wanderly booking engine: pricing, booking lifecycle and cancellation refunds

pub mod booking_code;
pub mod clock;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod pricing;
pub mod store;

// Re-export key types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, EngineConfig, RetryConfig};
pub use confirmation::Confirmation;
pub use error::{BookingError, BookingResult, StoreError};
pub use lifecycle::{BookingEngine, CreatedBooking};
pub use model::{Booking, BookingStatus, Destination, PaymentStatus};
pub use pricing::{PricingError, PricingInput, Quote};
pub use store::{BookingStore, DestinationStore, InMemoryBookingStore, InMemoryDestinationStore};
