use chrono::{DateTime, Duration, Utc};
use retail_core::CustomerCooldown;
use serde::Serialize;

pub const DEFAULT_COOLDOWN_SECONDS: i64 = 300;

/// Fixed quiescent period between a customer's accepted orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    period: Duration,
}

impl CooldownPolicy {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::zero()),
        }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(Duration::seconds(seconds))
    }

    /// Eligible when no record exists, the record is unset, or at least one
    /// full period has elapsed. Exactly `period` counts as eligible.
    pub fn can_place_order(&self, cooldown: Option<&CustomerCooldown>, now: DateTime<Utc>) -> bool {
        match cooldown {
            None => true,
            Some(c) if c.is_unset() => true,
            Some(c) => c.elapsed(now) >= self.period,
        }
    }

    /// Time left before the next order is accepted, never negative.
    pub fn remaining(&self, cooldown: Option<&CustomerCooldown>, now: DateTime<Utc>) -> Duration {
        match cooldown {
            Some(c) if !c.is_unset() => self.remaining_since(c.last_order_time, now),
            _ => Duration::zero(),
        }
    }

    pub fn remaining_since(&self, last_order_time: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (self.period - (now - last_order_time)).max(Duration::zero())
    }

    /// A stored last-order time at or before this instant no longer blocks.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.period
    }

    pub fn status(&self, cooldown: Option<&CustomerCooldown>, now: DateTime<Utc>) -> CooldownStatus {
        let remaining = self.remaining(cooldown, now);
        CooldownStatus {
            can_order: self.can_place_order(cooldown, now),
            cooldown_remaining_seconds: remaining_seconds(remaining),
            cooldown_remaining_minutes: remaining_minutes(remaining),
            last_order_time: cooldown.filter(|c| !c.is_unset()).map(|c| c.last_order_time),
        }
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_COOLDOWN_SECONDS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownStatus {
    pub can_order: bool,
    pub cooldown_remaining_seconds: i64,
    pub cooldown_remaining_minutes: f64,
    pub last_order_time: Option<DateTime<Utc>>,
}

/// Whole seconds, truncated.
pub fn remaining_seconds(remaining: Duration) -> i64 {
    remaining.num_seconds()
}

/// Minutes rounded to one decimal place.
pub fn remaining_minutes(remaining: Duration) -> f64 {
    let minutes = remaining.num_milliseconds() as f64 / 60_000.0;
    (minutes * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(now: DateTime<Utc>, ago: Duration) -> CustomerCooldown {
        CustomerCooldown::new("CUST10001", now - ago)
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let policy = CooldownPolicy::default();
        let now = Utc::now();
        let period = Duration::seconds(DEFAULT_COOLDOWN_SECONDS);

        let just_short = at(now, period - Duration::milliseconds(1));
        let exact = at(now, period);
        let past = at(now, period + Duration::milliseconds(1));

        assert!(!policy.can_place_order(Some(&just_short), now));
        assert!(policy.can_place_order(Some(&exact), now));
        assert!(policy.can_place_order(Some(&past), now));
    }

    #[test]
    fn test_absent_or_unset_is_eligible() {
        let policy = CooldownPolicy::default();
        let now = Utc::now();
        assert!(policy.can_place_order(None, now));

        let unset = CustomerCooldown::new("CUST10001", DateTime::<Utc>::from_timestamp(0, 0).unwrap());
        assert!(policy.can_place_order(Some(&unset), now));
        assert_eq!(policy.remaining(Some(&unset), now), Duration::zero());
    }

    #[test]
    fn test_remaining_is_clamped() {
        let policy = CooldownPolicy::from_seconds(300);
        let now = Utc::now();

        let recent = at(now, Duration::seconds(60));
        assert_eq!(policy.remaining(Some(&recent), now), Duration::seconds(240));

        let old = at(now, Duration::minutes(10));
        assert_eq!(policy.remaining(Some(&old), now), Duration::zero());
    }

    #[test]
    fn test_status_payload() {
        let policy = CooldownPolicy::from_seconds(300);
        let now = Utc::now();
        let recent = at(now, Duration::seconds(90));

        let status = policy.status(Some(&recent), now);
        assert!(!status.can_order);
        assert_eq!(status.cooldown_remaining_seconds, 210);
        assert_eq!(status.cooldown_remaining_minutes, 3.5);
        assert_eq!(status.last_order_time, Some(recent.last_order_time));

        let fresh = policy.status(None, now);
        assert!(fresh.can_order);
        assert_eq!(fresh.cooldown_remaining_seconds, 0);
        assert_eq!(fresh.last_order_time, None);
    }

    #[test]
    fn test_cutoff() {
        let policy = CooldownPolicy::from_seconds(300);
        let now = Utc::now();
        assert_eq!(policy.cutoff(now), now - Duration::seconds(300));
    }
}
