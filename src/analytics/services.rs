use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::dto::{AnalyticsResponse, ApplicationsByStatus, AverageTimePerStage, MonthlyCount};
use crate::applications::{repo::ApplicationStore, repo_types::ApplicationStatus};
use crate::db::StoreError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Dashboard numbers for one user as of `now`.
#[instrument(skip(store, now))]
pub async fn summary(
    store: &dyn ApplicationStore,
    user_id: Uuid,
    now: OffsetDateTime,
) -> Result<AnalyticsResponse, StoreError> {
    let mut by_status = ApplicationsByStatus::default();
    for (status, count) in store.status_counts(user_id).await? {
        *lane_count(&mut by_status, status) += count;
    }
    let total = by_status.applied + by_status.interviewing + by_status.offer + by_status.rejected;

    let applications_over_time = store
        .monthly_counts(user_id)
        .await?
        .into_iter()
        .map(|(date, count)| MonthlyCount { date, count })
        .collect();

    let applied = store
        .application_dates(user_id, ApplicationStatus::Applied)
        .await?;
    let interviewing = store
        .application_dates(user_id, ApplicationStatus::Interviewing)
        .await?;
    let average_time_per_stage = AverageTimePerStage {
        applied: round_to(average_days(&applied, now), 1),
        interviewing: round_to(average_days(&interviewing, now), 1),
    };

    let success_rate = if total > 0 {
        round_to(by_status.offer as f64 / total as f64, 3)
    } else {
        0.0
    };
    debug!(total, success_rate, "analytics computed");

    Ok(AnalyticsResponse {
        total_applications: total,
        by_status,
        applications_over_time,
        average_time_per_stage,
        success_rate,
    })
}

fn lane_count(counts: &mut ApplicationsByStatus, status: ApplicationStatus) -> &mut i64 {
    match status {
        ApplicationStatus::Applied => &mut counts.applied,
        ApplicationStatus::Interviewing => &mut counts.interviewing,
        ApplicationStatus::Offer => &mut counts.offer,
        ApplicationStatus::Rejected => &mut counts.rejected,
    }
}

/// Whole days elapsed, floored (a date in the future counts as negative days).
fn whole_days_since(date: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - date).whole_seconds().div_euclid(SECONDS_PER_DAY)
}

fn average_days(dates: &[OffsetDateTime], now: OffsetDateTime) -> f64 {
    if dates.is_empty() {
        return 0.0;
    }
    let total: i64 = dates.iter().map(|d| whole_days_since(*d, now)).sum();
    total as f64 / dates.len() as f64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
