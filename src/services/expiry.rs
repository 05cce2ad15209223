use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as Batch},
        inventory_item::{self, Entity as InventoryItem, ItemStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Number of fractional days below which a batch is critical (tier 3).
const PRIORITY_CRITICAL_DAYS: f64 = 7.0;
/// Upper bound (exclusive) of the high-urgency tier (tier 2).
const PRIORITY_HIGH_DAYS: f64 = 30.0;
/// Upper bound (exclusive) of the medium-urgency tier (tier 1).
const PRIORITY_MEDIUM_DAYS: f64 = 90.0;

/// A batch is expired iff its expiry date is strictly before the calendar
/// date of `now`. Compared as calendar dates in UTC so the answer is stable
/// across time of day.
pub fn classify_expired(expiry_date: NaiveDate, now: DateTime<Utc>) -> bool {
    expiry_date < now.date_naive()
}

/// Fractional days from `now` until midnight UTC of the expiry date.
/// Negative once the expiry date has passed.
pub fn days_until_expiry(expiry_date: NaiveDate, now: DateTime<Utc>) -> f64 {
    let expiry_midnight = expiry_date.and_time(NaiveTime::MIN).and_utc();
    (expiry_midnight - now).num_seconds() as f64 / 86_400.0
}

/// Urgency tier for a batch given its expiry date.
///
/// Tier boundaries are exact, no rounding: `d < 7` is 3 (critical, including
/// already-expired batches), `7 <= d < 30` is 2, `30 <= d < 90` is 1 and
/// `d >= 90` is 0.
pub fn compute_priority(expiry_date: NaiveDate, now: DateTime<Utc>) -> i16 {
    let d = days_until_expiry(expiry_date, now);
    if d < PRIORITY_CRITICAL_DAYS {
        3
    } else if d < PRIORITY_HIGH_DAYS {
        2
    } else if d < PRIORITY_MEDIUM_DAYS {
        1
    } else {
        0
    }
}

/// The expiry engine: owns every write to the derived batch fields
/// (`is_expired`, `priority_level`) and the in-stock aggregation. API callers
/// never touch those columns directly.
#[derive(Clone)]
pub struct ExpiryEngine {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ExpiryEngine {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Flips `is_expired` on every batch whose expiry date is before the
    /// calendar date of `now`. Returns the number of rows changed.
    ///
    /// The update predicate (`is_expired = false AND expiry_date < today`)
    /// makes the pass idempotent and safe to run concurrently; the flag is
    /// one-directional and nothing in the system ever resets it.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let today = now.date_naive();

        let result = Batch::update_many()
            .col_expr(batch::Column::IsExpired, Expr::value(true))
            .col_expr(batch::Column::UpdatedAt, Expr::value(now))
            .filter(batch::Column::IsExpired.eq(false))
            .filter(batch::Column::ExpiryDate.lt(today))
            .exec(db)
            .await?;

        let updated = result.rows_affected;
        if updated > 0 {
            info!(updated, "expiry sweep updated batches");
        }

        self.event_sender
            .send(Event::BatchesSwept { updated })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Recomputes `priority_level` for every batch from `now`, writing only
    /// the rows whose tier changed. Returns the number of rows changed.
    ///
    /// Priority is otherwise a snapshot taken at batch creation; this is the
    /// explicit on-demand refresh for operators who need current tiers.
    #[instrument(skip(self))]
    pub async fn refresh_priorities(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        let batches = Batch::find().all(db).await?;

        let mut updated = 0u64;
        for existing in batches {
            let priority = compute_priority(existing.expiry_date, now);
            if priority != existing.priority_level {
                let mut active: batch::ActiveModel = existing.into();
                active.priority_level = Set(priority);
                active.update(db).await?;
                updated += 1;
            }
        }

        if updated > 0 {
            info!(updated, "priority refresh updated batches");
        }

        self.event_sender
            .send(Event::PrioritiesRefreshed { updated })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Count of inventory items under the batch with status exactly
    /// `in_stock`. Computed on demand, never cached on the batch row.
    #[instrument(skip(self))]
    pub async fn aggregate_stock(&self, batch_id: Uuid) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        let count = InventoryItem::find()
            .filter(inventory_item::Column::BatchId.eq(batch_id))
            .filter(inventory_item::Column::Status.eq(ItemStatus::InStock.as_ref()))
            .count(db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `now` positioned so that exactly `days` fractional days remain until
    /// midnight UTC of the expiry date.
    fn now_before_expiry(expiry: NaiveDate, days: f64) -> DateTime<Utc> {
        let midnight = expiry.and_time(NaiveTime::MIN).and_utc();
        midnight - Duration::seconds((days * 86_400.0).round() as i64)
    }

    #[test_case(6.99, 3; "just under a week is critical")]
    #[test_case(7.0, 2; "exactly a week drops to high")]
    #[test_case(29.99, 2; "just under thirty days stays high")]
    #[test_case(30.0, 1; "exactly thirty days drops to medium")]
    #[test_case(89.99, 1; "just under ninety days stays medium")]
    #[test_case(90.0, 0; "exactly ninety days is routine")]
    #[test_case(-1.0, 3; "past expiry is critical")]
    #[test_case(-400.0, 3; "long past expiry is critical")]
    fn priority_tier_boundaries(days: f64, expected: i16) {
        let expiry = date(2026, 6, 15);
        let now = now_before_expiry(expiry, days);
        assert_eq!(compute_priority(expiry, now), expected);
    }

    #[test]
    fn classification_is_date_only() {
        let expiry = date(2026, 3, 10);

        // Any time of day on the expiry date itself: not yet expired.
        let on_the_day = Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 59).unwrap();
        assert!(!classify_expired(expiry, on_the_day));

        // First instant of the following day: expired.
        let day_after = Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap();
        assert!(classify_expired(expiry, day_after));
    }

    #[test]
    fn days_until_expiry_is_fractional() {
        let expiry = date(2026, 3, 10);
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap();
        let d = days_until_expiry(expiry, now);
        assert!((d - 1.5).abs() < 1e-9);
    }
}
