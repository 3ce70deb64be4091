// Booking lifecycle: creation, lookup, status/payment updates, cancellation
//
// The engine holds no booking state of its own. Every mutation is a
// read-modify-write against the store guarded by the booking's version;
// losing a race re-reads and re-applies the change.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    booking_code::{self, CodeGenerator, RandomCodeGenerator},
    clock::Clock,
    config::EngineConfig,
    confirmation::Confirmation,
    error::{BookingError, BookingResult, StoreError},
    model::{
        Booking, BookingStatus, CancelOutcome, CancelRequest, Cancellation, CreateBookingRequest,
        ListQuery, Package, Page, Payment, PaymentStatus, Pricing, Refund, StatusUpdate,
        TripDetails,
    },
    pricing::{self, PricingInput},
    store::{BookingFilter, BookingStore, DestinationStore},
};

#[derive(Debug, Clone, Serialize)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub confirmation: Confirmation,
}

pub struct BookingEngine {
    bookings: Arc<dyn BookingStore>,
    destinations: Arc<dyn DestinationStore>,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    config: EngineConfig,
}

impl BookingEngine {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        destinations: Arc<dyn DestinationStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            bookings,
            destinations,
            clock,
            codes: Arc::new(RandomCodeGenerator),
            config,
        }
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn create(&self, mut request: CreateBookingRequest) -> BookingResult<CreatedBooking> {
        request.destination_id = request.destination_id.trim().to_string();
        request.customer = request.customer.normalized();
        request.validate()?;

        let destination = self
            .destinations
            .find(&request.destination_id)
            .await?
            .ok_or_else(|| BookingError::DestinationNotFound(request.destination_id.clone()))?;

        let trip = &request.trip_details;
        if trip.check_in_date < self.clock.today() {
            return Err(BookingError::InvalidCheckIn);
        }
        if trip.check_out_date <= trip.check_in_date {
            return Err(BookingError::InvalidCheckOut);
        }

        let guests = trip.number_of_guests;
        let quote = pricing::calculate(&PricingInput {
            price_min: destination.price.min,
            adults: guests.adults,
            children: guests.children,
            check_in: trip.check_in_date,
            check_out: trip.check_out_date,
        })?;

        let now = self.clock.now();
        let booking = Booking {
            id: Uuid::nil(),
            booking_code: String::new(),
            destination_id: destination.id.clone(),
            customer: request.customer,
            trip_details: TripDetails {
                check_in_date: trip.check_in_date,
                check_out_date: trip.check_out_date,
                number_of_guests: guests,
                duration: quote.duration,
            },
            package: Package::standard(&destination.name, quote.duration),
            pricing: Pricing {
                base_price: quote.base_price,
                tax_and_fees: quote.tax_and_fees,
                discount: quote.discount,
                total_price: quote.total_price,
                currency: destination.price.currency.clone(),
            },
            special_requests: request.special_requests,
            metadata: request.metadata,
            payment: Payment::default(),
            status: BookingStatus::Pending,
            confirmation_sent_at: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let booking = self.insert_with_fresh_code(booking).await?;
        info!(
            booking_code = %booking.booking_code,
            destination = %destination.id,
            duration = booking.trip_details.duration,
            total_price = booking.pricing.total_price,
            "booking created"
        );

        let confirmation = Confirmation::new(&booking, &destination);
        Ok(CreatedBooking {
            booking,
            confirmation,
        })
    }

    pub async fn get_by_code(&self, code: &str) -> BookingResult<Booking> {
        debug!(booking_code = code, "looking up booking");
        self.find_existing(code).await
    }

    pub async fn list_by_email(&self, email: &str) -> BookingResult<Vec<Booking>> {
        let bookings = self.bookings.find_by_email(email).await?;
        debug!(count = bookings.len(), "bookings found for customer");
        Ok(bookings)
    }

    pub async fn list(&self, query: &ListQuery) -> BookingResult<Page<Booking>> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.config.default_page_limit)
            .clamp(1, self.config.max_page_limit.max(1));

        let (items, total) = self
            .bookings
            .list(&BookingFilter {
                status: query.status,
                offset: (page as usize - 1) * limit as usize,
                limit: limit as usize,
            })
            .await?;

        Ok(Page {
            items,
            total,
            total_pages: total.div_ceil(limit as u64),
            current_page: page,
        })
    }

    /// Overwrite the booking status and/or payment status.
    ///
    /// A completed payment always confirms the booking and stamps `paidAt`
    /// and `confirmationSentAt`, whatever the previous status was. Explicit
    /// status changes are only checked against the lifecycle when
    /// `enforce_status_transitions` is set.
    pub async fn update_status(&self, code: &str, update: StatusUpdate) -> BookingResult<Booking> {
        let enforce = self.config.enforce_status_transitions;

        let (booking, previous) = self
            .modify(code, |booking| {
                let previous = booking.status;
                let now = self.clock.now();

                if let Some(status) = update.status {
                    if enforce && !booking.status.can_transition_to(status) {
                        return Err(BookingError::IllegalTransition {
                            from: booking.status,
                            to: status,
                        });
                    }
                    booking.status = status;
                }

                if let Some(payment_status) = update.payment_status {
                    booking.payment.status = payment_status;
                    if payment_status == PaymentStatus::Completed {
                        booking.payment.paid_at = Some(now);
                        booking.status = BookingStatus::Confirmed;
                        booking.confirmation_sent_at = Some(now);
                    }
                }

                Ok(previous)
            })
            .await?;

        info!(
            booking_code = code,
            from = %previous,
            to = %booking.status,
            payment = ?booking.payment.status,
            "booking status updated"
        );
        Ok(booking)
    }

    pub async fn cancel(&self, code: &str, request: CancelRequest) -> BookingResult<CancelOutcome> {
        let enforce = self.config.enforce_status_transitions;
        let cancelled_by = request.cancelled_by.unwrap_or_default();
        let reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let (booking, refund) = self
            .modify(code, |booking| {
                if booking.status == BookingStatus::Cancelled {
                    return Err(BookingError::AlreadyCancelled(code.to_string()));
                }
                if enforce && !booking.status.can_transition_to(BookingStatus::Cancelled) {
                    return Err(BookingError::IllegalTransition {
                        from: booking.status,
                        to: BookingStatus::Cancelled,
                    });
                }

                let now = self.clock.now();
                let days_until_check_in = pricing::days_between(now, booking.trip_details.check_in_date);
                let percentage = pricing::refund_percentage(days_until_check_in);
                let amount = pricing::refund_amount(booking.pricing.total_price, percentage);

                booking.status = BookingStatus::Cancelled;
                booking.cancellation = Some(Cancellation {
                    cancelled_at: now,
                    cancelled_by,
                    reason: reason.clone(),
                    refund_amount: amount,
                });

                Ok(Refund { amount, percentage })
            })
            .await?;

        info!(
            booking_code = code,
            refund_percentage = refund.percentage,
            refund_amount = refund.amount,
            "booking cancelled"
        );
        Ok(CancelOutcome { booking, refund })
    }

    async fn find_existing(&self, code: &str) -> BookingResult<Booking> {
        if !booking_code::is_valid_code(code) {
            return Err(BookingError::BookingNotFound(code.to_string()));
        }
        self.bookings
            .find_by_code(code)
            .await?
            .ok_or_else(|| BookingError::BookingNotFound(code.to_string()))
    }

    async fn insert_with_fresh_code(&self, mut booking: Booking) -> BookingResult<Booking> {
        let today = self.clock.now().date_naive();
        let attempts = self.config.max_code_attempts.max(1);

        for attempt in 1..=attempts {
            booking.booking_code = self.codes.generate(today);
            match self.bookings.insert(booking.clone()).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::DuplicateCode(code)) => {
                    warn!(booking_code = %code, attempt, "booking code collision");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::DuplicateCode(booking.booking_code).into())
    }

    // Read the booking, apply `change`, write it back if nobody else wrote
    // in between. Conflicts are retried with backoff up to
    // `retry.max_retries` times; `change` runs again on the fresh copy.
    async fn modify<F, T>(&self, code: &str, mut change: F) -> BookingResult<(Booking, T)>
    where
        F: FnMut(&mut Booking) -> BookingResult<T> + Send,
        T: Send,
    {
        let retry = &self.config.retry;
        let mut retry_count = 0;

        loop {
            let mut booking = self.find_existing(code).await?;
            let expected_version = booking.version;
            let outcome = change(&mut booking)?;

            match self.bookings.replace(booking, expected_version).await {
                Ok(saved) => return Ok((saved, outcome)),
                Err(StoreError::VersionConflict { found, .. }) if retry_count < retry.max_retries => {
                    let backoff = retry.backoff(retry_count);
                    warn!(
                        booking_code = code,
                        expected_version,
                        found,
                        retry = retry_count + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "concurrent booking update, retrying"
                    );
                    retry_count += 1;
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
