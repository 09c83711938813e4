//! Mood statistics over the current day, week, month and year.
//!
//! Windows are calendar-aligned in the caller's time zone and converted to
//! half-open UTC ranges `[start, end)`, so each covers its last day in full.
//! The week starts on Monday. Each window is aggregated with its own
//! `GROUP BY` and the four run concurrently.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::JournalError;
use crate::models::entry::{MAX_INTENSITY, MoodLabel};

/// A half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatWindows {
    pub day: TimeWindow,
    pub week: TimeWindow,
    pub month: TimeWindow,
    pub year: TimeWindow,
}

impl StatWindows {
    /// The four windows containing `now`, aligned to midnights in `now`'s zone.
    pub fn anchored_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let month_start = first_of_month(today);
        let next_month = first_of_month(month_start + Duration::days(31));
        let year_start = today - Duration::days(i64::from(today.ordinal0()));
        let next_year = {
            let probe = year_start + Duration::days(366);
            probe - Duration::days(i64::from(probe.ordinal0()))
        };

        let window = |start: NaiveDate, end: NaiveDate| TimeWindow {
            start: local_midnight(&tz, start),
            end: local_midnight(&tz, end),
        };

        Self {
            day: window(today, today + Duration::days(1)),
            week: window(week_start, week_start + Duration::days(7)),
            month: window(month_start, next_month),
            year: window(year_start, next_year),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Start of `date` in `tz`. Where midnight falls in a DST gap, the earliest
/// valid instant of the day is used.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    (0..=2)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Intensity and entry count for one mood label in one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LabelTotals {
    pub label: MoodLabel,
    pub total_intensity: i64,
    pub total_entries: i64,
}

/// The aggregate for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub per_label: Vec<LabelTotals>,
    pub total_entry: i64,
    /// Mean intensity as a percentage of the maximum. Zero for an empty window.
    pub mood_percentage: f64,
}

impl MoodSummary {
    pub fn fold(mut per_label: Vec<LabelTotals>) -> Self {
        per_label.sort_by_key(|t| t.label);
        let total_entry: i64 = per_label.iter().map(|t| t.total_entries).sum();
        let total_intensity: i64 = per_label.iter().map(|t| t.total_intensity).sum();
        let mood_percentage = if total_entry == 0 {
            0.0
        } else {
            (total_intensity as f64 * 100.0) / (total_entry as f64 * f64::from(MAX_INTENSITY))
        };
        Self {
            per_label,
            total_entry,
            mood_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodStats {
    pub day: MoodSummary,
    pub week: MoodSummary,
    pub month: MoodSummary,
    pub year: MoodSummary,
}

async fn window_totals(
    pool: &PgPool,
    user_id: Uuid,
    window: TimeWindow,
) -> Result<MoodSummary, JournalError> {
    let rows = sqlx::query_as::<_, LabelTotals>(
        "SELECT mood_label AS label, \
           SUM(mood_intensity)::BIGINT AS total_intensity, \
           COUNT(*) AS total_entries \
         FROM entries \
         WHERE user_id = $1 AND NOT is_deleted AND posted_at >= $2 AND posted_at < $3 \
         GROUP BY mood_label",
    )
    .bind(user_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;
    Ok(MoodSummary::fold(rows))
}

/// Mood statistics of the user's live entries for the windows around `now`.
pub async fn mood_stats<Tz: TimeZone>(
    pool: &PgPool,
    user_id: Uuid,
    now: &DateTime<Tz>,
) -> Result<MoodStats, JournalError> {
    let windows = StatWindows::anchored_at(now);
    let (day, week, month, year) = tokio::try_join!(
        window_totals(pool, user_id, windows.day),
        window_totals(pool, user_id, windows.week),
        window_totals(pool, user_id, windows.month),
        window_totals(pool, user_id, windows.year),
    )?;
    Ok(MoodStats {
        day,
        week,
        month,
        year,
    })
}
