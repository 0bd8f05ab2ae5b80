use std::collections::BTreeMap;

use sqlx::PgPool;
use time::{Date, Duration};
use uuid::Uuid;

use super::dto::{Dashboard, DayProgress, DayStats, RecentMeal};
use crate::{error::AppResult, meals::repo::{self as meals_repo, Meal}, validation::format_date};

/// Length of the trailing window, today included.
pub const WEEK_DAYS: i64 = 7;
pub const RECENT_MEALS: i64 = 5;

/// `WEEK_DAYS` consecutive dates ending at `today`, oldest first.
pub fn window(today: Date) -> Vec<String> {
    (0..WEEK_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub(Duration::days(back)))
        .map(format_date)
        .collect()
}

/// Rolls stored meal totals up per date. `window_meals` may contain meals
/// outside the window; they are ignored. Dates without meals are zero-filled.
pub fn build_dashboard(today: Date, window_meals: &[Meal], recent: Vec<Meal>) -> Dashboard {
    let dates = window(today);
    let mut per_day: BTreeMap<&str, DayStats> = dates
        .iter()
        .map(|d| (d.as_str(), DayStats::default()))
        .collect();

    for meal in window_meals {
        if let Some(stats) = per_day.get_mut(meal.date.as_str()) {
            stats.add(meal);
        }
    }

    let today_key = format_date(today);
    let today_stats = per_day.get(today_key.as_str()).cloned().unwrap_or_default();

    let weekly_progress = dates
        .iter()
        .map(|d| DayProgress {
            date: d.clone(),
            stats: per_day.get(d.as_str()).cloned().unwrap_or_default(),
        })
        .collect();

    Dashboard {
        today_stats,
        weekly_progress,
        recent_meals: recent.into_iter().map(RecentMeal::from).collect(),
    }
}

pub async fn load_dashboard(db: &PgPool, user_id: Uuid, today: Date) -> AppResult<Dashboard> {
    let dates = window(today);
    let (from, to) = match (dates.first(), dates.last()) {
        (Some(from), Some(to)) => (from.clone(), to.clone()),
        _ => {
            let t = format_date(today);
            (t.clone(), t)
        }
    };
    let window_meals = meals_repo::list_in_range(db, user_id, &from, &to).await?;
    let recent = meals_repo::list_by_user(db, user_id, None, RECENT_MEALS, 0).await?;
    Ok(build_dashboard(today, &window_meals, recent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Macros;
    use time::{macros::date, OffsetDateTime};

    fn meal(date: &str, calories: f64, protein: f64, carbs: f64, fat: f64, age_secs: i64) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: format!("meal on {date}"),
            meal_type: "lunch".into(),
            date: date.into(),
            time: None,
            total_calories: calories,
            total_protein: protein,
            total_carbs: carbs,
            total_fat: fat,
            created_at: OffsetDateTime::now_utc() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn window_is_seven_days_oldest_first() {
        let w = window(date!(2024 - 03 - 02));
        assert_eq!(w.len(), 7);
        assert_eq!(w.first().unwrap(), "2024-02-25");
        assert_eq!(w.last().unwrap(), "2024-03-02");
    }

    #[test]
    fn today_stats_sum_only_today() {
        let today = date!(2024 - 05 - 10);
        let meals = vec![
            meal("2024-05-10", 300.0, 10.0, 54.0, 6.0, 10),
            meal("2024-05-10", 500.0, 30.0, 40.0, 20.0, 20),
            meal("2024-05-09", 900.0, 1.0, 1.0, 1.0, 30),
        ];
        let d = build_dashboard(today, &meals, vec![]);
        assert_eq!(d.today_stats.macros, Macros::new(800.0, 40.0, 94.0, 26.0));
        assert_eq!(d.today_stats.meal_count, 2);
    }

    #[test]
    fn weekly_progress_zero_fills_and_ignores_outside_dates() {
        let today = date!(2024 - 05 - 10);
        let meals = vec![
            meal("2024-05-04", 100.0, 1.0, 1.0, 1.0, 0),
            meal("2024-05-03", 999.0, 9.0, 9.0, 9.0, 0), // one day too old
            meal("2024-05-08", 250.0, 2.0, 2.0, 2.0, 0),
        ];
        let d = build_dashboard(today, &meals, vec![]);

        assert_eq!(d.weekly_progress.len(), 7);
        assert_eq!(d.weekly_progress[0].date, "2024-05-04");
        assert_eq!(d.weekly_progress[0].stats.macros.calories, 100.0);
        assert_eq!(d.weekly_progress[4].date, "2024-05-08");
        assert_eq!(d.weekly_progress[4].stats.macros.calories, 250.0);

        let zero_days = d
            .weekly_progress
            .iter()
            .filter(|p| p.stats == DayStats::default())
            .count();
        assert_eq!(zero_days, 5);
        let week_total: f64 = d.weekly_progress.iter().map(|p| p.stats.macros.calories).sum();
        assert_eq!(week_total, 350.0);
    }

    #[test]
    fn today_stats_match_recent_meals_of_today() {
        let today = date!(2024 - 05 - 10);
        let meals = vec![
            meal("2024-05-10", 320.0, 12.0, 40.0, 9.0, 5),
            meal("2024-05-09", 610.0, 35.0, 70.0, 18.0, 50),
            meal("2024-05-10", 150.0, 5.0, 27.0, 3.0, 100),
        ];
        let mut recent = meals.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let d = build_dashboard(today, &meals, recent);

        let today_key = format_date(today);
        let from_recent: Macros = d
            .recent_meals
            .iter()
            .filter(|m| m.date == today_key)
            .map(|m| Macros::new(m.calories, m.protein, m.carbs, m.fat))
            .sum();
        assert_eq!(d.today_stats.macros, from_recent);
        assert_eq!(d.weekly_progress.last().unwrap().stats, d.today_stats);
    }

    #[test]
    fn recent_meals_are_a_plain_projection() {
        let m = meal("2024-05-10", 123.0, 4.0, 5.0, 6.0, 0);
        let d = build_dashboard(date!(2024 - 05 - 10), &[], vec![m.clone()]);
        assert_eq!(d.recent_meals.len(), 1);
        assert_eq!(d.recent_meals[0].id, m.id);
        assert_eq!(d.recent_meals[0].calories, 123.0);
        // meals passed only as recent do not feed the per-day sums
        assert_eq!(d.today_stats, DayStats::default());
    }

    #[test]
    fn serialized_shape() {
        let d = build_dashboard(date!(2024 - 05 - 10), &[], vec![]);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["today_stats"]["calories"], 0.0);
        assert_eq!(v["today_stats"]["meal_count"], 0);
        assert_eq!(v["weekly_progress"].as_array().unwrap().len(), 7);
        assert_eq!(v["weekly_progress"][6]["date"], "2024-05-10");
        assert!(v["recent_meals"].as_array().unwrap().is_empty());
    }
}
