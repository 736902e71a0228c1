//! Explicit configuration for the core: everything that would otherwise be
//! a process-wide global (signing secret, defaults, the clock) lives here
//! and is passed into each operation.

use crate::config::Config;
use crate::core::snapshot::{DEFAULT_SLOT_MINUTES, MAX_SLOT_MINUTES};
use crate::models::pay_period::PeriodType;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub const FALLBACK_TIMEZONE: Tz = chrono_tz::America::New_York;
pub const FALLBACK_PERIOD_TYPE: PeriodType = PeriodType::Biweekly;

pub fn fallback_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

#[derive(Debug, Clone)]
pub struct CoreContext {
    pub signing_secret: Option<Vec<u8>>,
    pub default_timezone: Tz,
    pub default_period_type: PeriodType,
    pub default_biweekly_anchor: NaiveDate,
    pub default_slot_minutes: i64,
    pub clock: Clock,
}

impl Default for CoreContext {
    fn default() -> Self {
        Self {
            signing_secret: None,
            default_timezone: FALLBACK_TIMEZONE,
            default_period_type: FALLBACK_PERIOD_TYPE,
            default_biweekly_anchor: fallback_anchor(),
            default_slot_minutes: DEFAULT_SLOT_MINUTES,
            clock: Clock::System,
        }
    }
}

impl CoreContext {
    /// Build from the loaded configuration. Bad defaults degrade to the fixed
    /// fallbacks instead of failing.
    pub fn from_config(cfg: &Config) -> Self {
        let default_timezone = cfg.default_timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!(timezone = %cfg.default_timezone, "invalid default_timezone, using fallback");
            FALLBACK_TIMEZONE
        });

        let default_period_type =
            PeriodType::from_db_str(&cfg.default_period_type).unwrap_or_else(|| {
                warn!(period_type = %cfg.default_period_type, "invalid default_period_type, using fallback");
                FALLBACK_PERIOD_TYPE
            });

        let default_biweekly_anchor = NaiveDate::parse_from_str(&cfg.biweekly_anchor, "%Y-%m-%d")
            .unwrap_or_else(|_| {
                warn!(anchor = %cfg.biweekly_anchor, "invalid biweekly_anchor, using fallback");
                fallback_anchor()
            });

        let signing_secret = cfg
            .effective_signing_secret()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes);

        Self {
            signing_secret,
            default_timezone,
            default_period_type,
            default_biweekly_anchor,
            default_slot_minutes: if (1..=MAX_SLOT_MINUTES).contains(&cfg.default_slot_minutes) {
                cfg.default_slot_minutes
            } else {
                DEFAULT_SLOT_MINUTES
            },
            clock: Clock::System,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Clock::Fixed(now);
        self
    }

    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.signing_secret = Some(secret.to_vec());
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self.clock {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => t,
        }
    }

    pub fn secret(&self) -> Option<&[u8]> {
        self.signing_secret.as_deref()
    }
}
