use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{
    Application, ApplicationStatus, DateRange, Interview, InterviewResult, InterviewStatus, InterviewType,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMetrics {
    pub total_applications: usize,
    pub active_applications: usize,
    pub rejected_applications: usize,
    pub successful_applications: usize,
    pub no_response_count: usize,
    /// Percentages, 0 when there is nothing to divide by.
    pub response_rate: f64,
    pub offer_rate: f64,
    pub interview_conversion_rate: f64,
    pub interview_to_offer_rate: f64,
    pub total_interviews: usize,
    pub completed_interviews: usize,
    pub scheduled_interviews: usize,
    /// Days from applying to the first scheduled interview.
    pub average_days_to_interview: Option<f64>,
    /// Days from applying to the offer, accepted applications only.
    pub average_days_to_offer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub company_name: String,
    pub applications: usize,
    pub interviews: usize,
    pub offers: usize,
    pub success_rate: f64,
    /// Furthest pipeline stage reached at this company.
    pub best_status: ApplicationStatus,
}

/// Counts since the start of the current week (Sunday) and month, over all records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub applications_this_week: usize,
    pub applications_this_month: usize,
    pub interviews_this_week: usize,
    pub interviews_this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub applications: usize,
    pub interviews: usize,
    pub offers: usize,
    pub rejections: usize,
    pub response_rate: f64,
}

impl MonthlyTrend {
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeBucket {
    pub range: &'static str,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStageStats {
    pub stage: InterviewType,
    pub count: usize,
    pub completed: usize,
    /// Passed share of completed interviews.
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
    }
}

fn is_offer(status: ApplicationStatus) -> bool {
    matches!(status, ApplicationStatus::Offer | ApplicationStatus::Accepted)
}

pub fn calculate(applications: &[Application], interviews: &[Interview]) -> AnalyticsMetrics {
    let total = applications.len();
    let count = |f: fn(&Application) -> bool| applications.iter().filter(|a| f(a)).count();

    let active = count(|a| a.status.is_active());
    let rejected = count(|a| a.status == ApplicationStatus::Rejected);
    let accepted = count(|a| a.status == ApplicationStatus::Accepted);
    let responded = count(|a| a.status.has_response());

    let total_interviews = interviews.len();
    let completed = interviews
        .iter()
        .filter(|i| i.status == InterviewStatus::Completed)
        .count();
    let scheduled = interviews
        .iter()
        .filter(|i| i.status == InterviewStatus::Scheduled)
        .count();

    let days_to_interview: Vec<i64> = applications
        .iter()
        .filter_map(|app| {
            let applied = app.applied_date?;
            let first = interviews
                .iter()
                .filter(|i| i.application_id == app.id)
                .filter_map(|i| i.scheduled_at)
                .min()?;
            Some((first - applied).num_days())
        })
        .collect();

    let days_to_offer: Vec<i64> = applications
        .iter()
        .filter(|app| app.status == ApplicationStatus::Accepted)
        .filter_map(|app| Some((app.offer_date? - app.applied_date?).num_days()))
        .collect();

    AnalyticsMetrics {
        total_applications: total,
        active_applications: active,
        rejected_applications: rejected,
        successful_applications: accepted,
        no_response_count: total - responded,
        response_rate: percent(responded, total),
        offer_rate: percent(accepted, total),
        interview_conversion_rate: percent(total_interviews, total),
        interview_to_offer_rate: percent(accepted, total_interviews),
        total_interviews,
        completed_interviews: completed,
        scheduled_interviews: scheduled,
        average_days_to_interview: average(&days_to_interview),
        average_days_to_offer: average(&days_to_offer),
    }
}

/// Applications whose applied date falls in `period`; all of them when it is unbounded.
pub fn applications_in(applications: &[Application], period: &DateRange) -> Vec<Application> {
    applications
        .iter()
        .filter(|a| period.contains(a.applied_date))
        .cloned()
        .collect()
}

/// Interviews scheduled within `period`; all of them when it is unbounded.
pub fn interviews_in(interviews: &[Interview], period: &DateRange) -> Vec<Interview> {
    interviews
        .iter()
        .filter(|i| period.contains(i.scheduled_at))
        .cloned()
        .collect()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

pub fn recent_activity(applications: &[Application], interviews: &[Interview], now: DateTime<Utc>) -> RecentActivity {
    let today = now.date_naive();
    let week_start = midnight(today - Duration::days(i64::from(today.weekday().num_days_from_sunday())));
    let month_start = midnight(today.with_day(1).unwrap_or(today));

    let since = |date: Option<DateTime<Utc>>, start: DateTime<Utc>| date.is_some_and(|d| d >= start);
    RecentActivity {
        applications_this_week: applications.iter().filter(|a| since(a.applied_date, week_start)).count(),
        applications_this_month: applications.iter().filter(|a| since(a.applied_date, month_start)).count(),
        interviews_this_week: interviews.iter().filter(|i| since(i.scheduled_at, week_start)).count(),
        interviews_this_month: interviews.iter().filter(|i| since(i.scheduled_at, month_start)).count(),
    }
}

/// One row per calendar month. The window is `period` when bounded, otherwise
/// the last `months` months up to `now`.
pub fn monthly_trends(
    applications: &[Application],
    interviews: &[Interview],
    months: u32,
    period: &DateRange,
    now: DateTime<Utc>,
) -> Vec<MonthlyTrend> {
    let first_of = |d: DateTime<Utc>| {
        let date = d.date_naive();
        date.with_day(1).unwrap_or(date)
    };
    let last = first_of(period.end.unwrap_or(now));
    let first = match period.start {
        Some(start) => first_of(start),
        None => last
            .checked_sub_months(Months::new(months.max(1) - 1))
            .unwrap_or(last),
    };

    let mut trends = Vec::new();
    let mut month = first;
    while month <= last {
        let Some(next) = month.checked_add_months(Months::new(1)) else { break };
        let window = |d: Option<DateTime<Utc>>| d.is_some_and(|d| d >= midnight(month) && d < midnight(next));

        let month_apps: Vec<&Application> = applications.iter().filter(|a| window(a.applied_date)).collect();
        let responded = month_apps.iter().filter(|a| a.status.has_response()).count();
        trends.push(MonthlyTrend {
            year: month.year(),
            month: month.month(),
            applications: month_apps.len(),
            interviews: interviews.iter().filter(|i| window(i.scheduled_at)).count(),
            offers: month_apps.iter().filter(|a| is_offer(a.status)).count(),
            rejections: month_apps
                .iter()
                .filter(|a| a.status == ApplicationStatus::Rejected)
                .count(),
            response_rate: percent(responded, month_apps.len()),
        });
        month = next;
    }
    trends
}

const RESPONSE_BUCKETS: [(&str, i64, i64); 4] = [
    ("0-7 days", 0, 7),
    ("7-14 days", 7, 14),
    ("14-30 days", 14, 30),
    ("30+ days", 30, i64::MAX),
];

/// Age since applying of applications that heard back, bucketed.
pub fn response_time_distribution(applications: &[Application], now: DateTime<Utc>) -> Vec<ResponseTimeBucket> {
    let ages: Vec<i64> = applications
        .iter()
        .filter(|a| a.status.has_response())
        .filter_map(|a| a.applied_date)
        .map(|applied| (now - applied).num_days())
        .collect();

    RESPONSE_BUCKETS
        .iter()
        .map(|&(range, min, max)| {
            let count = ages.iter().filter(|&&days| days >= min && days < max).count();
            ResponseTimeBucket {
                range,
                count,
                percentage: percent(count, ages.len()),
            }
        })
        .collect()
}

/// Per interview type, busiest first.
pub fn interview_stage_stats(interviews: &[Interview]) -> Vec<InterviewStageStats> {
    let mut stats: Vec<InterviewStageStats> = InterviewType::ALL
        .iter()
        .filter_map(|&stage| {
            let of_stage: Vec<&Interview> = interviews.iter().filter(|i| i.kind == stage).collect();
            if of_stage.is_empty() {
                return None;
            }
            let completed: Vec<&&Interview> = of_stage
                .iter()
                .filter(|i| i.status == InterviewStatus::Completed)
                .collect();
            let passed = completed
                .iter()
                .filter(|i| i.result == Some(InterviewResult::Passed))
                .count();
            Some(InterviewStageStats {
                stage,
                count: of_stage.len(),
                completed: completed.len(),
                success_rate: percent(passed, completed.len()),
            })
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Change from `previous` to `current`; moves under 1% are neutral.
pub fn trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        return Trend {
            direction: TrendDirection::Neutral,
            percentage: 0.0,
        };
    }
    let change = (current - previous) / previous * 100.0;
    let direction = if change.abs() < 1.0 {
        TrendDirection::Neutral
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    Trend {
        direction,
        percentage: change,
    }
}

/// Count per status, most common first. Statuses with no applications are omitted.
pub fn status_distribution(applications: &[Application]) -> Vec<StatusCount> {
    let total = applications.len();
    let mut counts: Vec<StatusCount> = ApplicationStatus::ALL
        .iter()
        .map(|status| {
            let count = applications.iter().filter(|a| a.status == *status).count();
            StatusCount {
                status: *status,
                count,
                percentage: percent(count, total),
            }
        })
        .filter(|s| s.count > 0)
        .collect();
    // Stable sort keeps pipeline order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Per-company rollup, busiest companies first, at most `limit` entries.
pub fn company_stats(applications: &[Application], interviews: &[Interview], limit: usize) -> Vec<CompanyStats> {
    let mut by_company: HashMap<String, CompanyStats> = HashMap::new();
    let mut company_of: HashMap<&str, String> = HashMap::new();

    for app in applications {
        let key = app.company_name.trim().to_lowercase();
        company_of.insert(app.id.as_str(), key.clone());

        let stats = by_company.entry(key).or_insert_with(|| CompanyStats {
            company_name: app.company_name.trim().to_string(),
            applications: 0,
            interviews: 0,
            offers: 0,
            success_rate: 0.0,
            best_status: app.status,
        });
        stats.applications += 1;
        if is_offer(app.status) {
            stats.offers += 1;
        }
        if app.status.progress() > stats.best_status.progress() {
            stats.best_status = app.status;
        }
    }

    for interview in interviews {
        if let Some(stats) = company_of
            .get(interview.application_id.as_str())
            .and_then(|key| by_company.get_mut(key))
        {
            stats.interviews += 1;
        }
    }

    let mut stats: Vec<CompanyStats> = by_company
        .into_values()
        .map(|mut s| {
            s.success_rate = percent(s.offers, s.applications);
            s
        })
        .collect();
    stats.sort_by(|a, b| {
        b.applications
            .cmp(&a.applications)
            .then_with(|| a.company_name.cmp(&b.company_name))
    });
    stats.truncate(limit);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn app(company: &str, status: ApplicationStatus) -> Application {
        Application::new(company, "Engineer", status)
    }

    #[test]
    fn test_empty_inputs_give_zero_rates() {
        let metrics = calculate(&[], &[]);
        assert_eq!(metrics, AnalyticsMetrics::default());
        assert!(status_distribution(&[]).is_empty());
    }

    #[test]
    fn test_rates_and_counts() {
        let apps = vec![
            app("Acme", ApplicationStatus::Applied),
            app("Acme", ApplicationStatus::Interviewing),
            app("Globex", ApplicationStatus::Rejected),
            app("Initech", ApplicationStatus::Accepted),
        ];
        let interviews = vec![
            Interview::new(&apps[1].id, 1, InterviewType::PhoneScreen),
            Interview::new(&apps[3].id, 1, InterviewType::Video),
        ];

        let metrics = calculate(&apps, &interviews);
        assert_eq!(metrics.total_applications, 4);
        assert_eq!(metrics.active_applications, 2);
        assert_eq!(metrics.rejected_applications, 1);
        assert_eq!(metrics.successful_applications, 1);
        assert_eq!(metrics.no_response_count, 1);
        assert_eq!(metrics.response_rate, 75.0);
        assert_eq!(metrics.offer_rate, 25.0);
        assert_eq!(metrics.interview_conversion_rate, 50.0);
        assert_eq!(metrics.interview_to_offer_rate, 50.0);
        assert_eq!(metrics.scheduled_interviews, 2);
    }

    #[test]
    fn test_average_days() {
        let applied = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut accepted = app("Acme", ApplicationStatus::Accepted);
        accepted.applied_date = Some(applied);
        accepted.offer_date = Some(applied + Duration::days(30));

        let mut first = Interview::new(&accepted.id, 1, InterviewType::PhoneScreen);
        first.scheduled_at = Some(applied + Duration::days(10));
        let mut second = Interview::new(&accepted.id, 2, InterviewType::OnSite);
        second.scheduled_at = Some(applied + Duration::days(20));

        let metrics = calculate(&[accepted], &[second, first]);
        assert_eq!(metrics.average_days_to_interview, Some(10.0));
        assert_eq!(metrics.average_days_to_offer, Some(30.0));
    }

    #[test]
    fn test_status_distribution() {
        let apps = vec![
            app("A", ApplicationStatus::Applied),
            app("B", ApplicationStatus::Applied),
            app("C", ApplicationStatus::Rejected),
            app("D", ApplicationStatus::Target),
        ];
        let dist = status_distribution(&apps);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist[0].status, ApplicationStatus::Applied);
        assert_eq!(dist[0].percentage, 50.0);
        assert_eq!(dist[1].status, ApplicationStatus::Target);
        let sum: usize = dist.iter().map(|s| s.count).sum();
        assert_eq!(sum, apps.len());
    }

    #[test]
    fn test_company_stats() {
        let apps = vec![
            app("Acme", ApplicationStatus::Rejected),
            app("acme ", ApplicationStatus::Offer),
            app("Globex", ApplicationStatus::Applied),
        ];
        let interviews = vec![Interview::new(&apps[1].id, 1, InterviewType::Technical)];

        let stats = company_stats(&apps, &interviews, 10);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].company_name, "Acme");
        assert_eq!(stats[0].applications, 2);
        assert_eq!(stats[0].interviews, 1);
        assert_eq!(stats[0].offers, 1);
        assert_eq!(stats[0].success_rate, 50.0);
        assert_eq!(stats[0].best_status, ApplicationStatus::Offer);

        assert_eq!(company_stats(&apps, &interviews, 1).len(), 1);
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn applied(company: &str, status: ApplicationStatus, date: DateTime<Utc>) -> Application {
        let mut a = app(company, status);
        a.applied_date = Some(date);
        a
    }

    #[test]
    fn test_period_filters() {
        let apps = vec![
            applied("A", ApplicationStatus::Applied, at(2024, 1, 10)),
            applied("B", ApplicationStatus::Applied, at(2024, 2, 10)),
            app("C", ApplicationStatus::Target),
        ];
        let period = DateRange::new(Some(at(2024, 2, 1)), Some(at(2024, 2, 29)));
        let in_feb = applications_in(&apps, &period);
        assert_eq!(in_feb.len(), 1);
        assert_eq!(in_feb[0].company_name, "B");
        assert_eq!(applications_in(&apps, &DateRange::default()).len(), 3);

        let mut interview = Interview::new(&apps[0].id, 1, InterviewType::Video);
        interview.scheduled_at = Some(at(2024, 2, 2));
        let unscheduled = Interview::new(&apps[0].id, 2, InterviewType::Final);
        assert_eq!(interviews_in(&[interview, unscheduled], &period).len(), 1);
    }

    #[test]
    fn test_recent_activity_week_starts_sunday() {
        // Wednesday 2024-03-13; week began Sunday the 10th
        let now = at(2024, 3, 13);
        let apps = vec![
            applied("A", ApplicationStatus::Applied, at(2024, 3, 10)),
            applied("B", ApplicationStatus::Applied, at(2024, 3, 9)),
            applied("C", ApplicationStatus::Applied, at(2024, 2, 28)),
        ];
        let mut interview = Interview::new(&apps[0].id, 1, InterviewType::Video);
        interview.scheduled_at = Some(at(2024, 3, 1));

        let activity = recent_activity(&apps, &[interview], now);
        assert_eq!(activity.applications_this_week, 1);
        assert_eq!(activity.applications_this_month, 2);
        assert_eq!(activity.interviews_this_week, 0);
        assert_eq!(activity.interviews_this_month, 1);
    }

    #[test]
    fn test_monthly_trends() {
        let apps = vec![
            applied("A", ApplicationStatus::Rejected, at(2024, 1, 31)),
            applied("B", ApplicationStatus::Offer, at(2024, 3, 1)),
            applied("C", ApplicationStatus::Applied, at(2024, 3, 20)),
        ];
        let mut interview = Interview::new(&apps[1].id, 1, InterviewType::PhoneScreen);
        interview.scheduled_at = Some(at(2024, 3, 5));

        let trends = monthly_trends(&apps, &[interview], 3, &DateRange::default(), at(2024, 3, 25));
        let labels: Vec<String> = trends.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(trends[0].rejections, 1);
        assert_eq!(trends[1].applications, 0);
        assert_eq!(trends[1].response_rate, 0.0);
        assert_eq!(trends[2].applications, 2);
        assert_eq!(trends[2].offers, 1);
        assert_eq!(trends[2].interviews, 1);
        assert_eq!(trends[2].response_rate, 50.0);

        let period = DateRange::new(Some(at(2023, 12, 15)), Some(at(2024, 1, 2)));
        let trends = monthly_trends(&apps, &[], 6, &period, at(2024, 3, 25));
        assert_eq!(trends.len(), 2);
        assert_eq!((trends[0].year, trends[0].month), (2023, 12));
    }

    #[test]
    fn test_response_time_distribution() {
        let now = at(2024, 6, 30);
        let apps = vec![
            applied("A", ApplicationStatus::Interviewing, now - Duration::days(3)),
            applied("B", ApplicationStatus::Rejected, now - Duration::days(7)),
            applied("C", ApplicationStatus::Offer, now - Duration::days(45)),
            applied("D", ApplicationStatus::Applied, now - Duration::days(2)),
            app("E", ApplicationStatus::Rejected),
        ];
        let buckets = response_time_distribution(&apps, now);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1]);
        assert_eq!(buckets[0].range, "0-7 days");
        let share: f64 = buckets.iter().map(|b| b.percentage).sum();
        assert!((share - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_interview_stage_stats() {
        let mut passed = Interview::new("a", 1, InterviewType::Technical);
        passed.status = InterviewStatus::Completed;
        passed.result = Some(InterviewResult::Passed);
        let mut failed = Interview::new("b", 1, InterviewType::Technical);
        failed.status = InterviewStatus::Completed;
        failed.result = Some(InterviewResult::Failed);
        let pending = Interview::new("c", 1, InterviewType::Technical);
        let screen = Interview::new("d", 1, InterviewType::PhoneScreen);

        let stats = interview_stage_stats(&[screen, passed, failed, pending]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].stage, InterviewType::Technical);
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].completed, 2);
        assert_eq!(stats[0].success_rate, 50.0);
        assert_eq!(stats[1].success_rate, 0.0);
    }

    #[test]
    fn test_trend() {
        assert_eq!(trend(5.0, 0.0).direction, TrendDirection::Neutral);
        assert_eq!(trend(12.0, 10.0).direction, TrendDirection::Up);
        assert_eq!(trend(12.0, 10.0).percentage, 20.0);
        assert_eq!(trend(5.0, 10.0).direction, TrendDirection::Down);
        assert_eq!(trend(100.5, 100.0).direction, TrendDirection::Neutral);
    }
}
