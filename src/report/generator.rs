use crate::domain::{Project, Todo};
use crate::persistence::atomic_write;
use crate::report::analytics::AnalyticsAggregator;
use crate::time_utils::format_time_spent;
use anyhow::{Context, Result};
use chrono::TimeZone;
use std::path::Path;

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Render a markdown focus report for `todos` as of `now` (epoch ms)
pub fn generate_report<Tz: TimeZone>(
    todos: &[Todo],
    projects: &[Project],
    tz: Tz,
    now: i64,
) -> String {
    let report_date = tz
        .timestamp_millis_opt(now)
        .single()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let analytics = AnalyticsAggregator::with_timezone(todos, tz);
    let total = analytics.total_focus_time();
    let completed = todos.iter().filter(|t| t.completed).count();
    let open = todos.len() - completed;

    let mut report = String::new();

    // Header
    report.push_str(&format!("# Focus Report - {}\n\n", report_date));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!("- **Total Focus Time:** {}\n", format_time_spent(total)));
    report.push_str(&format!("- **Completed Tasks:** {}\n", completed));
    report.push_str(&format!("- **Open Tasks:** {}\n", open));
    let attributed = todos.iter().filter(|t| t.focus_seconds().is_some()).count();
    if completed > 0 {
        let pct = (attributed as f64 / completed as f64) * 100.0;
        report.push_str(&format!(
            "- **Completed During a Session:** {} ({})\n",
            attributed,
            format_percent(pct)
        ));
    }
    report.push('\n');

    // Projects Section
    if !projects.is_empty() {
        report.push_str("## Projects\n\n");

        let mut rows: Vec<(&str, u64, usize)> = projects
            .iter()
            .map(|p| project_row(todos, Some(p.id.as_str()), &p.name))
            .collect();
        let unfiled = project_row(todos, None, "Unfiled");
        if unfiled.2 > 0 {
            rows.push(unfiled);
        }
        rows.sort_by(|a, b| b.1.cmp(&a.1)); // Sort by time spent

        for (name, seconds, done) in rows {
            report.push_str(&format!(
                "- **{}:** {} ({} completed)\n",
                name,
                format_time_spent(seconds),
                done
            ));
        }
        report.push('\n');
    }

    let tasks = analytics.by_task();
    if !tasks.is_empty() {
        report.push_str("## By Task\n\n");
        for task in &tasks {
            let times = if task.completion_count == 1 { "time" } else { "times" };
            report.push_str(&format!(
                "- **{}:** {} (completed {} {})\n",
                task.task_name,
                format_time_spent(task.total_time_spent),
                task.completion_count,
                times
            ));
        }
        report.push('\n');
    }

    let days = analytics.by_day();
    if !days.is_empty() {
        report.push_str("## By Day\n\n");
        for day in &days {
            report.push_str(&format!(
                "- **{}:** {} across {} tasks\n",
                day.date,
                format_time_spent(day.total_time_spent),
                day.task_count
            ));
        }
        report.push('\n');
    }

    let weeks = analytics.by_week();
    if !weeks.is_empty() {
        report.push_str("## By Week\n\n");
        for week in &weeks {
            report.push_str(&format!(
                "- **{} to {}:** {} across {} tasks\n",
                week.week_start,
                week.week_end,
                format_time_spent(week.total_time_spent),
                week.task_count
            ));
        }
        report.push('\n');
    }

    let months = analytics.by_month();
    if !months.is_empty() {
        report.push_str("## By Month\n\n");
        for month in &months {
            report.push_str(&format!(
                "- **{}:** {} across {} tasks\n",
                month.month_name,
                format_time_spent(month.total_time_spent),
                month.task_count
            ));
        }
        report.push('\n');
    }

    report
}

/// Write a rendered report to `path`
pub fn write_report(path: &Path, report: &str) -> Result<()> {
    atomic_write(path, report)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

/// Name, attributed seconds and completed count for one project
fn project_row<'a>(todos: &[Todo], project_id: Option<&str>, name: &'a str) -> (&'a str, u64, usize) {
    let members = todos
        .iter()
        .filter(|t| t.completed && t.project_id.as_deref() == project_id);
    let (seconds, count) = members.fold((0u64, 0), |(secs, n), t| {
        (secs.saturating_add(t.focus_seconds().unwrap_or(0)), n + 1)
    });
    (name, seconds, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp_millis()
    }

    fn completed(text: &str, seconds: u64, when: i64, project: Option<&Project>) -> Todo {
        let mut todo = Todo::new(text, project.map(|p| p.id.clone()), when).unwrap();
        todo.completed = true;
        todo.completed_at = Some(when);
        todo.session_id = Some(1);
        todo.time_spent = Some(seconds);
        todo
    }

    #[test]
    fn test_report_sections() {
        let project = Project::new("Thesis", 0).unwrap();
        let todos = vec![
            completed("Write intro", 1500, at(2024, 1, 8), Some(&project)),
            completed("Write intro", 900, at(2024, 1, 9), Some(&project)),
            completed("Email", 150, at(2024, 1, 9), None),
            Todo::new("Still open", None, 0).unwrap(),
        ];

        let report = generate_report(&todos, &[project], Utc, at(2024, 1, 10));

        assert!(report.starts_with("# Focus Report - 2024-01-10\n"));
        assert!(report.contains("- **Total Focus Time:** 42m 30s\n"));
        assert!(report.contains("- **Completed Tasks:** 3\n"));
        assert!(report.contains("- **Open Tasks:** 1\n"));
        assert!(report.contains("- **Thesis:** 40m (2 completed)\n"));
        assert!(report.contains("- **Unfiled:** 2m 30s (1 completed)\n"));
        assert!(report.contains("- **Write intro:** 40m (completed 2 times)\n"));
        assert!(report.contains("- **2024-01-09:** 17m 30s across 2 tasks\n"));
        assert!(report.contains("- **2024-01-08 to 2024-01-14:** 42m 30s across 3 tasks\n"));
        assert!(report.contains("- **January 2024:** 42m 30s across 3 tasks\n"));
    }

    #[test]
    fn test_empty_report_has_only_summary() {
        let report = generate_report(&[], &[], Utc, at(2024, 1, 10));
        assert!(report.contains("- **Total Focus Time:** 0s\n"));
        assert!(!report.contains("## By Task"));
        assert!(!report.contains("## Projects"));
    }

    #[test]
    fn test_write_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("report.md");
        write_report(&path, "# Focus Report\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Focus Report\n");
    }
}
