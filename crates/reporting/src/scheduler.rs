//! Recurring report schedules held in memory.
//!
//! Times are interpreted in UTC. `calculate_next_run` is pure so callers and
//! tests can pass their own clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use webpro_core::{WebProError, WebProResult};

pub const DEFAULT_RUN_TIME: &str = "09:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReport {
    pub id: Uuid,
    pub report_id: Option<String>,
    pub client_id: String,
    pub client_name: String,
    pub frequency: ScheduleFrequency,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: Option<u32>,
    /// 1..=31; short months run on their last day.
    pub day_of_month: Option<u32>,
    /// `HH:MM`, UTC.
    pub time: String,
    pub recipients: Vec<String>,
    pub template_id: Option<String>,
    pub is_active: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchedule {
    pub report_id: Option<String>,
    pub client_id: String,
    pub client_name: String,
    pub frequency: ScheduleFrequency,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub time: Option<String>,
    pub recipients: Vec<String>,
    pub template_id: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub client_name: Option<String>,
    pub frequency: Option<ScheduleFrequency>,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub time: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl ScheduleUpdate {
    fn changes_timing(&self) -> bool {
        self.frequency.is_some()
            || self.day_of_week.is_some()
            || self.day_of_month.is_some()
            || self.time.is_some()
    }
}

fn parse_time(time: &str) -> WebProResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| WebProError::Config(format!("invalid schedule time {time:?}: {e}")))
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn monthly_candidate(year: i32, month: u32, day: u32, time: NaiveTime) -> Option<DateTime<Utc>> {
    let day = day.clamp(1, last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).map(|d| Utc.from_utc_datetime(&d.and_time(time)))
}

/// Next run strictly after `now`.
///
/// Weekly and monthly schedules without their anchor day behave as daily.
pub fn calculate_next_run(
    frequency: ScheduleFrequency,
    day_of_week: Option<u32>,
    day_of_month: Option<u32>,
    time: &str,
    now: DateTime<Utc>,
) -> WebProResult<DateTime<Utc>> {
    let at = parse_time(time)?;
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));

    let next = match (frequency, day_of_week, day_of_month) {
        (ScheduleFrequency::Weekly, Some(target), _) => {
            if target > 6 {
                return Err(WebProError::Config(format!("day of week out of range: {target}")));
            }
            let current = today.weekday().num_days_from_sunday() as i64;
            let mut days = target as i64 - current;
            if days < 0 || (days == 0 && today <= now) {
                days += 7;
            }
            today + Duration::days(days)
        }
        (ScheduleFrequency::Monthly, _, Some(target)) => {
            if !(1..=31).contains(&target) {
                return Err(WebProError::Config(format!("day of month out of range: {target}")));
            }
            let (year, month) = (now.year(), now.month());
            let this_month = monthly_candidate(year, month, target, at);
            match this_month {
                Some(candidate) if candidate > now => candidate,
                _ => {
                    let (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                    monthly_candidate(year, month, target, at).ok_or_else(|| {
                        WebProError::Config(format!("no day {target} in {year}-{month:02}"))
                    })?
                }
            }
        }
        _ => {
            if today <= now {
                today + Duration::days(1)
            } else {
                today
            }
        }
    };
    Ok(next)
}

#[derive(Default)]
pub struct ReportScheduler {
    schedules: DashMap<Uuid, ScheduledReport>,
}

impl ReportScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schedule(&self, new: NewSchedule, now: DateTime<Utc>) -> WebProResult<ScheduledReport> {
        let time = new.time.unwrap_or_else(|| DEFAULT_RUN_TIME.to_string());
        let next_run = calculate_next_run(new.frequency, new.day_of_week, new.day_of_month, &time, now)?;
        let schedule = ScheduledReport {
            id: Uuid::new_v4(),
            report_id: new.report_id,
            client_id: new.client_id,
            client_name: new.client_name,
            frequency: new.frequency,
            day_of_week: new.day_of_week,
            day_of_month: new.day_of_month,
            time,
            recipients: new.recipients,
            template_id: new.template_id,
            is_active: true,
            last_run: None,
            next_run,
            created_at: now,
        };
        info!(schedule_id = %schedule.id, client = %schedule.client_name, next_run = %schedule.next_run, "report schedule added");
        self.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    pub fn get(&self, id: &Uuid) -> Option<ScheduledReport> {
        self.schedules.get(id).map(|s| s.clone())
    }

    /// All schedules, oldest first.
    pub fn list(&self) -> Vec<ScheduledReport> {
        let mut all: Vec<ScheduledReport> = self.schedules.iter().map(|s| s.clone()).collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    /// Apply `update`; `Ok(None)` when the id is unknown.
    pub fn update_schedule(
        &self,
        id: &Uuid,
        update: ScheduleUpdate,
        now: DateTime<Utc>,
    ) -> WebProResult<Option<ScheduledReport>> {
        let Some(mut entry) = self.schedules.get_mut(id) else {
            return Ok(None);
        };
        let mut modified = entry.clone();
        let retime = update.changes_timing();
        if let Some(name) = update.client_name {
            modified.client_name = name;
        }
        if let Some(frequency) = update.frequency {
            modified.frequency = frequency;
        }
        if let Some(dow) = update.day_of_week {
            modified.day_of_week = Some(dow);
        }
        if let Some(dom) = update.day_of_month {
            modified.day_of_month = Some(dom);
        }
        if let Some(time) = update.time {
            modified.time = time;
        }
        if let Some(recipients) = update.recipients {
            modified.recipients = recipients;
        }
        if let Some(active) = update.is_active {
            modified.is_active = active;
        }
        if retime {
            modified.next_run = calculate_next_run(
                modified.frequency,
                modified.day_of_week,
                modified.day_of_month,
                &modified.time,
                now,
            )?;
        }
        *entry = modified.clone();
        Ok(Some(modified))
    }

    pub fn delete_schedule(&self, id: &Uuid) -> bool {
        self.schedules.remove(id).is_some()
    }

    /// Flip `is_active`; returns the new state.
    pub fn toggle_schedule(&self, id: &Uuid) -> Option<bool> {
        self.schedules.get_mut(id).map(|mut s| {
            s.is_active = !s.is_active;
            s.is_active
        })
    }

    /// Record a run of an active schedule and advance `next_run`.
    pub fn execute(&self, id: &Uuid, now: DateTime<Utc>) -> WebProResult<bool> {
        let Some(mut schedule) = self.schedules.get_mut(id) else {
            return Ok(false);
        };
        if !schedule.is_active {
            return Ok(false);
        }
        let next_run = calculate_next_run(
            schedule.frequency,
            schedule.day_of_week,
            schedule.day_of_month,
            &schedule.time,
            now,
        )?;
        schedule.next_run = next_run;
        schedule.last_run = Some(now);
        info!(schedule_id = %id, client = %schedule.client_name, next_run = %schedule.next_run, "report schedule executed");
        Ok(true)
    }

    pub fn due_schedules(&self, now: DateTime<Utc>) -> Vec<ScheduledReport> {
        let mut due: Vec<ScheduledReport> = self
            .schedules
            .iter()
            .filter(|s| s.is_active && s.next_run <= now)
            .map(|s| s.clone())
            .collect();
        due.sort_by_key(|s| s.next_run);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn new_schedule(frequency: ScheduleFrequency) -> NewSchedule {
        NewSchedule {
            report_id: None,
            client_id: "client-1".into(),
            client_name: "Acme".into(),
            frequency,
            day_of_week: None,
            day_of_month: None,
            time: Some("09:00".into()),
            recipients: vec!["ops@acme.example".into()],
            template_id: None,
        }
    }

    #[test]
    fn test_daily_rolls_to_tomorrow_once_past() {
        let before = utc(2024, 5, 6, 8, 0);
        assert_eq!(
            calculate_next_run(ScheduleFrequency::Daily, None, None, "09:00", before).unwrap(),
            utc(2024, 5, 6, 9, 0)
        );
        let exactly = utc(2024, 5, 6, 9, 0);
        assert_eq!(
            calculate_next_run(ScheduleFrequency::Daily, None, None, "09:00", exactly).unwrap(),
            utc(2024, 5, 7, 9, 0)
        );
    }

    #[test]
    fn test_weekly_targets_day_of_week() {
        // 2024-05-06 is a Monday.
        let monday = utc(2024, 5, 6, 12, 0);
        let friday = calculate_next_run(ScheduleFrequency::Weekly, Some(5), None, "09:00", monday).unwrap();
        assert_eq!(friday, utc(2024, 5, 10, 9, 0));
        let next_monday = calculate_next_run(ScheduleFrequency::Weekly, Some(1), None, "09:00", monday).unwrap();
        assert_eq!(next_monday, utc(2024, 5, 13, 9, 0));
        let sunday = calculate_next_run(ScheduleFrequency::Weekly, Some(0), None, "09:00", monday).unwrap();
        assert_eq!(sunday, utc(2024, 5, 12, 9, 0));
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let mid_jan = utc(2024, 1, 31, 10, 0);
        let next = calculate_next_run(ScheduleFrequency::Monthly, None, Some(31), "09:00", mid_jan).unwrap();
        assert_eq!(next, utc(2024, 2, 29, 9, 0));

        let early = utc(2023, 4, 2, 0, 0);
        let this_month = calculate_next_run(ScheduleFrequency::Monthly, None, Some(31), "06:30", early).unwrap();
        assert_eq!(this_month, utc(2023, 4, 30, 6, 30));

        let december = utc(2024, 12, 20, 0, 0);
        let rollover = calculate_next_run(ScheduleFrequency::Monthly, None, Some(15), "09:00", december).unwrap();
        assert_eq!(rollover, utc(2025, 1, 15, 9, 0));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let now = utc(2024, 5, 6, 0, 0);
        assert!(calculate_next_run(ScheduleFrequency::Daily, None, None, "25:00", now).is_err());
        assert!(calculate_next_run(ScheduleFrequency::Weekly, Some(7), None, "09:00", now).is_err());
        assert!(calculate_next_run(ScheduleFrequency::Monthly, None, Some(0), "09:00", now).is_err());
    }

    #[test]
    fn test_schedule_lifecycle() {
        let scheduler = ReportScheduler::new();
        let now = utc(2024, 5, 6, 8, 0);
        let schedule = scheduler.add_schedule(new_schedule(ScheduleFrequency::Daily), now).unwrap();
        assert!(schedule.is_active);
        assert_eq!(schedule.next_run, utc(2024, 5, 6, 9, 0));

        assert!(scheduler.due_schedules(now).is_empty());
        let later = utc(2024, 5, 6, 9, 30);
        assert_eq!(scheduler.due_schedules(later).len(), 1);

        assert!(scheduler.execute(&schedule.id, later).unwrap());
        let after = scheduler.get(&schedule.id).unwrap();
        assert_eq!(after.last_run, Some(later));
        assert_eq!(after.next_run, utc(2024, 5, 7, 9, 0));
        assert!(scheduler.due_schedules(later).is_empty());

        assert_eq!(scheduler.toggle_schedule(&schedule.id), Some(false));
        assert!(!scheduler.execute(&schedule.id, later).unwrap());

        assert!(scheduler.delete_schedule(&schedule.id));
        assert!(scheduler.list().is_empty());
        assert_eq!(scheduler.toggle_schedule(&schedule.id), None);
    }

    #[test]
    fn test_update_recomputes_next_run_on_timing_change() {
        let scheduler = ReportScheduler::new();
        let now = utc(2024, 5, 6, 8, 0);
        let schedule = scheduler.add_schedule(new_schedule(ScheduleFrequency::Daily), now).unwrap();

        let renamed = scheduler
            .update_schedule(
                &schedule.id,
                ScheduleUpdate {
                    client_name: Some("Acme Group".into()),
                    ..ScheduleUpdate::default()
                },
                utc(2024, 5, 6, 10, 0),
            )
            .unwrap()
            .unwrap();
        assert_eq!(renamed.next_run, schedule.next_run);

        let weekly = scheduler
            .update_schedule(
                &schedule.id,
                ScheduleUpdate {
                    frequency: Some(ScheduleFrequency::Weekly),
                    day_of_week: Some(3),
                    ..ScheduleUpdate::default()
                },
                now,
            )
            .unwrap()
            .unwrap();
        assert_eq!(weekly.next_run, utc(2024, 5, 8, 9, 0));
        assert!(scheduler
            .update_schedule(&Uuid::new_v4(), ScheduleUpdate::default(), now)
            .unwrap()
            .is_none());
    }
}
