// Persistence collaborators for the booking engine
//
// The engine talks to storage only through `BookingStore` and
// `DestinationStore`. The in-memory implementations back the server binary
// and the tests; a database-backed store would implement the same traits.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{StoreError, StoreResult},
    model::{normalize_email, Booking, BookingStatus, Destination, PriceRange},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub offset: usize,
    pub limit: usize,
}

#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    // Assigns `id`, `version` and both timestamps. Fails with
    // `DuplicateCode` if the booking code is taken.
    async fn insert(&self, booking: Booking) -> StoreResult<Booking>;

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Booking>>;

    // Newest first
    async fn find_by_email(&self, email: &str) -> StoreResult<Vec<Booking>>;

    // One page, newest first, plus the total number of matches
    async fn list(&self, filter: &BookingFilter) -> StoreResult<(Vec<Booking>, u64)>;

    // Compare-and-swap on `version`; bumps it and `updated_at` on success
    async fn replace(&self, booking: Booking, expected_version: u64) -> StoreResult<Booking>;
}

#[async_trait]
pub trait DestinationStore: Send + Sync + 'static {
    async fn find(&self, id: &str) -> StoreResult<Option<Destination>>;
}

struct StoredBooking {
    // Insertion order, breaks ties between equal `created_at`
    seq: u64,
    booking: Booking,
}

pub struct InMemoryBookingStore {
    bookings: DashMap<String, StoredBooking>,
    clock: Arc<dyn Clock>,
    next_seq: AtomicU64,
    fail_next_writes: AtomicUsize,
}

impl InMemoryBookingStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: DashMap::new(),
            clock,
            next_seq: AtomicU64::new(0),
            fail_next_writes: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    // Make the next `count` writes fail with a backend error
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_next_writes.store(count, Ordering::SeqCst);
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let pending = self
            .fail_next_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match pending {
            Ok(_) => Err(StoreError::Backend("simulated write failure".to_string())),
            Err(_) => Ok(()),
        }
    }

    fn collect_newest_first<F>(&self, predicate: F) -> Vec<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let mut matches: Vec<(u64, Booking)> = self
            .bookings
            .iter()
            .filter(|entry| predicate(&entry.booking))
            .map(|entry| (entry.seq, entry.booking.clone()))
            .collect();

        matches.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        matches.into_iter().map(|(_, booking)| booking).collect()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, mut booking: Booking) -> StoreResult<Booking> {
        self.check_injected_failure()?;

        match self.bookings.entry(booking.booking_code.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCode(booking.booking_code)),
            Entry::Vacant(slot) => {
                let now = self.clock.now();
                booking.id = Uuid::new_v4();
                booking.version = 1;
                booking.created_at = now;
                booking.updated_at = now;

                slot.insert(StoredBooking {
                    seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                    booking: booking.clone(),
                });
                Ok(booking)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.get(code).map(|entry| entry.booking.clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Vec<Booking>> {
        let email = normalize_email(email);
        Ok(self.collect_newest_first(|b| b.customer.email == email))
    }

    async fn list(&self, filter: &BookingFilter) -> StoreResult<(Vec<Booking>, u64)> {
        let matches = self.collect_newest_first(|b| match filter.status {
            Some(status) => b.status == status,
            None => true,
        });
        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();
        Ok((page, total))
    }

    async fn replace(&self, mut booking: Booking, expected_version: u64) -> StoreResult<Booking> {
        self.check_injected_failure()?;

        let mut stored = self
            .bookings
            .get_mut(&booking.booking_code)
            .ok_or_else(|| StoreError::NotFound(booking.booking_code.clone()))?;

        if stored.booking.version != expected_version {
            return Err(StoreError::VersionConflict {
                code: booking.booking_code,
                expected: expected_version,
                found: stored.booking.version,
            });
        }

        booking.id = stored.booking.id;
        booking.created_at = stored.booking.created_at;
        booking.updated_at = self.clock.now();
        booking.version = expected_version + 1;
        stored.booking = booking.clone();
        Ok(booking)
    }
}

#[derive(Default)]
pub struct InMemoryDestinationStore {
    destinations: DashMap<String, Destination>,
}

impl InMemoryDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed_data() -> Self {
        let store = Self::new();
        for destination in seed_destinations() {
            store.insert(destination);
        }
        store
    }

    pub fn insert(&self, destination: Destination) {
        self.destinations.insert(destination.id.clone(), destination);
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

#[async_trait]
impl DestinationStore for InMemoryDestinationStore {
    async fn find(&self, id: &str) -> StoreResult<Option<Destination>> {
        Ok(self.destinations.get(id).map(|d| d.value().clone()))
    }
}

// Indonesian catalog the demo ships with
pub fn seed_destinations() -> Vec<Destination> {
    let rows: [(&str, &str, &str, f64, f64); 12] = [
        ("pulau-komodo", "Pulau Komodo", "Nusa Tenggara Timur", 3_000_000.0, 8_000_000.0),
        ("gunung-bromo", "Gunung Bromo", "Jawa Timur", 500_000.0, 2_000_000.0),
        ("raja-ampat", "Raja Ampat", "Papua Barat", 5_000_000.0, 15_000_000.0),
        ("danau-toba", "Danau Toba", "Sumatera Utara", 300_000.0, 1_500_000.0),
        ("borobudur", "Borobudur", "Jawa Tengah", 100_000.0, 500_000.0),
        ("bali-tanah-lot", "Bali - Tanah Lot", "Bali", 500_000.0, 5_000_000.0),
        ("nusa-penida", "Nusa Penida", "Bali", 400_000.0, 2_000_000.0),
        ("prambanan", "Prambanan", "Yogyakarta", 200_000.0, 1_000_000.0),
        ("gili-trawangan", "Gili Trawangan", "Lombok", 400_000.0, 3_000_000.0),
        ("labuan-bajo", "Labuan Bajo", "Nusa Tenggara Timur", 1_500_000.0, 5_000_000.0),
        ("bunaken", "Bunaken", "Sulawesi Utara", 1_000_000.0, 4_000_000.0),
        ("kawah-ijen", "Kawah Ijen", "Jawa Timur", 300_000.0, 1_500_000.0),
    ];

    rows.iter()
        .map(|(id, name, city, min, max)| Destination {
            id: id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            country: "Indonesia".to_string(),
            price: PriceRange {
                min: *min,
                max: *max,
                currency: "IDR".to_string(),
            },
        })
        .collect()
}
