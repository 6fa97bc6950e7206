//! Site clock
//!
//! The platform writes each timestamp twice, in site-local time and in UTC.
//! `SiteClock` carries the site's fixed offset and converts between the two.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, SubsecRound, Utc};

use crate::config::{ConfigError, SiteConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteClock {
    offset: FixedOffset,
}

impl SiteClock {
    /// Clock for a site `offset_minutes` east of UTC.
    pub fn new(offset_minutes: i32) -> Result<Self, ConfigError> {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "gmt offset of {} minutes is out of range",
                    offset_minutes
                ))
            })?;
        Ok(Self { offset })
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        Self::new(config.gmt_offset_minutes)
    }

    /// A clock on UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant, truncated to the whole second the columns can hold.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }

    /// Site-local wall time of `instant`.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    /// UTC wall time of a site-local wall time, or `None` when the
    /// conversion leaves chrono's representable range.
    pub fn to_gmt(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        local.checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
    }
}

impl Default for SiteClock {
    fn default() -> Self {
        Self::utc()
    }
}
