use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

// Upstream quotes are refreshed only during these KST hours, at most twice per
// KST day and at least 30 minutes apart.
pub const UPDATE_HOURS_KST: [u32; 2] = [8, 20];
const MAX_REFRESHES_PER_DAY: u32 = UPDATE_HOURS_KST.len() as u32;
const MIN_REFRESH_GAP_MINUTES: i64 = 30;

pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn kst_date(now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&kst()).date_naive()
}

pub fn is_update_hour(now_utc: DateTime<Utc>) -> bool {
    UPDATE_HOURS_KST.contains(&now_utc.with_timezone(&kst()).hour())
}

/// Bookkeeping for the twice-a-day upstream refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub last_refresh: DateTime<Utc>,
    pub last_refresh_date: NaiveDate,
    pub refreshes_today: u32,
}

impl RefreshState {
    pub fn first(now_utc: DateTime<Utc>) -> Self {
        Self {
            last_refresh: now_utc,
            last_refresh_date: kst_date(now_utc),
            refreshes_today: 1,
        }
    }

    /// State after a successful refresh at `now_utc`.
    pub fn next(self, now_utc: DateTime<Utc>) -> Self {
        let today = kst_date(now_utc);
        let refreshes_today = if self.last_refresh_date == today {
            self.refreshes_today + 1
        } else {
            1
        };
        Self {
            last_refresh: now_utc,
            last_refresh_date: today,
            refreshes_today,
        }
    }
}

pub fn should_refresh(now_utc: DateTime<Utc>, state: Option<&RefreshState>) -> bool {
    let Some(state) = state else {
        return is_update_hour(now_utc);
    };

    if state.last_refresh_date != kst_date(now_utc) {
        return is_update_hour(now_utc);
    }
    if state.refreshes_today >= MAX_REFRESHES_PER_DAY {
        return false;
    }
    if !is_update_hour(now_utc) {
        return false;
    }
    now_utc - state.last_refresh >= Duration::minutes(MIN_REFRESH_GAP_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn kst_date_rolls_over_at_15_utc() {
        assert_eq!(
            kst_date(utc(2026, 1, 5, 14, 59)),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
        assert_eq!(
            kst_date(utc(2026, 1, 5, 15, 0)),
            NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()
        );
    }

    #[test]
    fn first_refresh_waits_for_update_hour() {
        // 23:00 UTC = 08:00 KST next day
        assert!(should_refresh(utc(2026, 1, 4, 23, 10), None));
        // 03:00 UTC = 12:00 KST
        assert!(!should_refresh(utc(2026, 1, 5, 3, 0), None));
    }

    #[test]
    fn second_refresh_needs_gap_and_update_hour() {
        let morning = utc(2026, 1, 4, 23, 5); // 08:05 KST on 01-05
        let state = RefreshState::first(morning);

        // Same hour, 10 minutes later.
        assert!(!should_refresh(utc(2026, 1, 4, 23, 15), Some(&state)));
        // 08:40 KST: gap elapsed and still inside an update hour.
        assert!(should_refresh(utc(2026, 1, 4, 23, 40), Some(&state)));
        // Midday is never an update hour.
        assert!(!should_refresh(utc(2026, 1, 5, 4, 0), Some(&state)));
        // 20:10 KST
        assert!(should_refresh(utc(2026, 1, 5, 11, 10), Some(&state)));
    }

    #[test]
    fn stops_after_two_refreshes_until_next_day() {
        let state = RefreshState::first(utc(2026, 1, 4, 23, 5)).next(utc(2026, 1, 5, 11, 5));
        assert_eq!(state.refreshes_today, 2);
        assert!(!should_refresh(utc(2026, 1, 5, 11, 50), Some(&state)));

        // Next KST day at 08:xx resets the counter.
        assert!(should_refresh(utc(2026, 1, 5, 23, 1), Some(&state)));
        let next_day = state.next(utc(2026, 1, 5, 23, 1));
        assert_eq!(next_day.refreshes_today, 1);
    }
}
