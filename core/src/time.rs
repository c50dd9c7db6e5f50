use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use tracing::debug;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Time left until midnight, split for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub date_label: String,
}

impl Countdown {
    fn from_remaining(remaining: TimeDelta, date_label: String) -> Self {
        let total_secs = u64::try_from(remaining.num_milliseconds() / 1000).unwrap_or(0);
        Self {
            hours: total_secs / 3600,
            minutes: (total_secs % 3600) / 60,
            seconds: total_secs % 60,
            date_label,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Counts down to the next local midnight. The target midnight and the date
/// label are cached and only move when the day rolls over (or the wall clock
/// jumps to another day).
#[derive(Debug, Default, Clone)]
pub struct CountdownClock {
    target: Option<DateTime<Utc>>,
    label_date: Option<NaiveDate>,
    date_label: String,
}

impl CountdownClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> Countdown {
        self.tick_at(&Local::now())
    }

    pub fn tick_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Countdown {
        let now_utc = now.with_timezone(&Utc);
        let today = now.date_naive();

        let remaining = self
            .target
            .filter(|_| self.label_date == Some(today))
            .map(|target| target.signed_duration_since(now_utc))
            .filter(|left| *left > TimeDelta::zero());

        let remaining = match remaining {
            Some(left) => left,
            None => {
                let target = next_midnight(now);
                self.target = Some(target);
                self.label_date = Some(today);
                self.date_label = format_date_label(today);
                debug!(date = %self.date_label, "countdown retargeted");
                target.signed_duration_since(now_utc)
            }
        };

        Countdown::from_remaining(remaining, self.date_label.clone())
    }

    pub fn date_label(&self) -> &str {
        &self.date_label
    }
}

/// Long-form date, e.g. "January 5, 2025".
pub fn format_date_label(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let fallback = now.with_timezone(&Utc) + TimeDelta::days(1);

    let Some(tomorrow) = now.date_naive().checked_add_days(Days::new(1)) else {
        return fallback;
    };
    // Some zones skip midnight for DST; take the first local time that exists.
    let mut candidate = tomorrow.and_time(NaiveTime::MIN);
    for _ in 0..8 {
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt.with_timezone(&Utc);
        }
        candidate += TimeDelta::minutes(30);
    }
    fallback
}

/// Repeating timer: fires on the first poll, then once per interval.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now < next => false,
            Some(next) => {
                let following = next + self.interval;
                // fell more than a whole interval behind: don't burst
                self.next = Some(if following <= now {
                    now + self.interval
                } else {
                    following
                });
                true
            }
            None => {
                self.next = Some(now + self.interval);
                true
            }
        }
    }

    /// How long an event loop may block before the next tick is due.
    pub fn timeout(&self, now: Instant) -> Duration {
        self.next
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}
