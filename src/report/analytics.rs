use crate::domain::Todo;
use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};
use std::collections::{BTreeMap, HashMap};

/// Focus time for every completion of one task text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAnalytics {
    pub task_name: String,
    pub total_time_spent: u64,
    pub completion_count: usize,
    /// Latest completion, epoch ms
    pub last_completed: i64,
}

/// Focus time for one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAnalytics {
    /// YYYY-MM-DD
    pub date: String,
    pub total_time_spent: u64,
    pub task_count: usize,
}

/// Focus time for one Monday-to-Sunday week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekAnalytics {
    pub week_start: String,
    pub week_end: String,
    pub total_time_spent: u64,
    pub task_count: usize,
}

/// Focus time for one calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthAnalytics {
    /// YYYY-MM
    pub month: String,
    /// e.g. "January 2024"
    pub month_name: String,
    pub total_time_spent: u64,
    pub task_count: usize,
}

#[derive(Default)]
struct Bucket {
    total_time_spent: u64,
    task_count: usize,
}

impl Bucket {
    fn add(&mut self, seconds: u64) {
        self.total_time_spent = self.total_time_spent.saturating_add(seconds);
        self.task_count += 1;
    }
}

/// Read-only summaries of attributed focus time.
///
/// Calendar grouping happens in the aggregator's timezone.
pub struct AnalyticsAggregator<'a, Tz: TimeZone> {
    todos: &'a [Todo],
    tz: Tz,
}

impl<'a> AnalyticsAggregator<'a, Local> {
    pub fn local(todos: &'a [Todo]) -> Self {
        Self::with_timezone(todos, Local)
    }
}

impl<'a, Tz: TimeZone> AnalyticsAggregator<'a, Tz> {
    pub fn with_timezone(todos: &'a [Todo], tz: Tz) -> Self {
        Self { todos, tz }
    }

    /// Sum of attributed seconds over completed tasks
    pub fn total_focus_time(&self) -> u64 {
        self.todos
            .iter()
            .filter(|t| t.completed)
            .filter_map(Todo::focus_seconds)
            .fold(0, u64::saturating_add)
    }

    /// Totals per task text, largest first
    pub fn by_task(&self) -> Vec<TaskAnalytics> {
        let mut tasks: Vec<TaskAnalytics> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (todo, seconds, completed_at) in attributed(self.todos) {
            match index.get(todo.text.as_str()) {
                Some(&i) => {
                    let entry = &mut tasks[i];
                    entry.total_time_spent = entry.total_time_spent.saturating_add(seconds);
                    entry.completion_count += 1;
                    entry.last_completed = entry.last_completed.max(completed_at);
                }
                None => {
                    index.insert(&todo.text, tasks.len());
                    tasks.push(TaskAnalytics {
                        task_name: todo.text.clone(),
                        total_time_spent: seconds,
                        completion_count: 1,
                        last_completed: completed_at,
                    });
                }
            }
        }

        // Stable: ties keep first-seen order
        tasks.sort_by(|a, b| b.total_time_spent.cmp(&a.total_time_spent));
        tasks
    }

    /// Totals per completion day, most recent first
    pub fn by_day(&self) -> Vec<DayAnalytics> {
        let mut days: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        for (_, seconds, completed_at) in attributed(self.todos) {
            if let Some(date) = self.local_date(completed_at) {
                days.entry(date).or_default().add(seconds);
            }
        }

        days.into_iter()
            .rev()
            .map(|(date, bucket)| DayAnalytics {
                date: date.format("%Y-%m-%d").to_string(),
                total_time_spent: bucket.total_time_spent,
                task_count: bucket.task_count,
            })
            .collect()
    }

    /// Totals per week starting Monday, most recent first
    pub fn by_week(&self) -> Vec<WeekAnalytics> {
        let mut weeks: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        for (_, seconds, completed_at) in attributed(self.todos) {
            if let Some(date) = self.local_date(completed_at) {
                weeks.entry(week_start(date)).or_default().add(seconds);
            }
        }

        weeks
            .into_iter()
            .rev()
            .map(|(start, bucket)| WeekAnalytics {
                week_start: start.format("%Y-%m-%d").to_string(),
                week_end: (start + Duration::days(6)).format("%Y-%m-%d").to_string(),
                total_time_spent: bucket.total_time_spent,
                task_count: bucket.task_count,
            })
            .collect()
    }

    /// Totals per calendar month, most recent first
    pub fn by_month(&self) -> Vec<MonthAnalytics> {
        let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();
        for (_, seconds, completed_at) in attributed(self.todos) {
            if let Some(date) = self.local_date(completed_at) {
                months.entry((date.year(), date.month())).or_default().add(seconds);
            }
        }

        months
            .into_iter()
            .rev()
            .filter_map(|((year, month), bucket)| {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some(MonthAnalytics {
                    month: first.format("%Y-%m").to_string(),
                    month_name: first.format("%B %Y").to_string(),
                    total_time_spent: bucket.total_time_spent,
                    task_count: bucket.task_count,
                })
            })
            .collect()
    }

    fn local_date(&self, millis: i64) -> Option<NaiveDate> {
        self.tz
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.date_naive())
    }
}

/// Completed tasks with positive focus time and a completion timestamp
fn attributed(todos: &[Todo]) -> impl Iterator<Item = (&Todo, u64, i64)> {
    todos.iter().filter(|t| t.completed).filter_map(|t| {
        let seconds = t.focus_seconds()?;
        let completed_at = t.completed_at?;
        Some((t, seconds, completed_at))
    })
}

/// Monday of the week containing `date`; Sunday belongs to the preceding Monday
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis()
    }

    fn done(text: &str, seconds: Option<u64>, completed_at: Option<i64>) -> Todo {
        let mut todo = Todo::new(text, None, 0).unwrap();
        todo.completed = true;
        todo.time_spent = seconds;
        todo.completed_at = completed_at;
        todo.session_id = seconds.map(|_| 1);
        todo
    }

    #[test]
    fn test_total_focus_time() {
        let mut open = Todo::new("open", None, 0).unwrap();
        open.time_spent = Some(999);
        let todos = vec![
            done("a", Some(60), Some(at(2024, 1, 1, 9))),
            done("b", Some(30), None),
            done("c", Some(0), Some(at(2024, 1, 1, 9))),
            done("d", None, Some(at(2024, 1, 1, 9))),
            open,
        ];
        let agg = AnalyticsAggregator::with_timezone(&todos, Utc);
        assert_eq!(agg.total_focus_time(), 90);
    }

    #[test]
    fn test_by_task_groups_identical_text() {
        let todos = vec![
            done("Write report", Some(600), Some(at(2024, 1, 2, 9))),
            done("Email", Some(100), Some(at(2024, 1, 2, 10))),
            done("Write report", Some(300), Some(at(2024, 1, 3, 9))),
        ];
        let tasks = AnalyticsAggregator::with_timezone(&todos, Utc).by_task();

        assert_eq!(
            tasks,
            vec![
                TaskAnalytics {
                    task_name: "Write report".to_string(),
                    total_time_spent: 900,
                    completion_count: 2,
                    last_completed: at(2024, 1, 3, 9),
                },
                TaskAnalytics {
                    task_name: "Email".to_string(),
                    total_time_spent: 100,
                    completion_count: 1,
                    last_completed: at(2024, 1, 2, 10),
                },
            ]
        );
    }

    #[test]
    fn test_by_task_ties_keep_first_seen_order() {
        let todos = vec![
            done("b", Some(60), Some(at(2024, 1, 2, 9))),
            done("a", Some(60), Some(at(2024, 1, 2, 9))),
        ];
        let names: Vec<String> = AnalyticsAggregator::with_timezone(&todos, Utc)
            .by_task()
            .into_iter()
            .map(|t| t.task_name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_huge_totals_saturate() {
        let todos = vec![
            done("big", Some(u64::MAX), Some(at(2024, 1, 2, 9))),
            done("big", Some(u64::MAX), Some(at(2024, 1, 2, 10))),
        ];
        let agg = AnalyticsAggregator::with_timezone(&todos, Utc);
        assert_eq!(agg.total_focus_time(), u64::MAX);
        assert_eq!(agg.by_task()[0].total_time_spent, u64::MAX);
        assert_eq!(agg.by_task()[0].completion_count, 2);
        assert_eq!(agg.by_day()[0].total_time_spent, u64::MAX);
    }

    #[test]
    fn test_by_task_many_distinct_texts() {
        let todos: Vec<Todo> = (0..500)
            .map(|i| done(&format!("task {}", i % 250), Some(10), Some(at(2024, 1, 2, 9))))
            .collect();
        let tasks = AnalyticsAggregator::with_timezone(&todos, Utc).by_task();
        assert_eq!(tasks.len(), 250);
        assert_eq!(tasks[0].task_name, "task 0");
        assert!(tasks.iter().all(|t| t.total_time_spent == 20 && t.completion_count == 2));
    }

    #[test]
    fn test_grouped_queries_skip_unattributed() {
        let todos = vec![
            done("no time", None, Some(at(2024, 1, 2, 9))),
            done("zero", Some(0), Some(at(2024, 1, 2, 9))),
            done("no date", Some(60), None),
        ];
        let agg = AnalyticsAggregator::with_timezone(&todos, Utc);
        assert!(agg.by_task().is_empty());
        assert!(agg.by_day().is_empty());
        assert!(agg.by_week().is_empty());
        assert!(agg.by_month().is_empty());
    }

    #[test]
    fn test_by_day_sorted_descending() {
        let todos = vec![
            done("a", Some(60), Some(at(2024, 3, 1, 9))),
            done("b", Some(30), Some(at(2024, 3, 2, 9))),
            done("c", Some(15), Some(at(2024, 3, 2, 18))),
        ];
        let days = AnalyticsAggregator::with_timezone(&todos, Utc).by_day();
        assert_eq!(
            days,
            vec![
                DayAnalytics { date: "2024-03-02".to_string(), total_time_spent: 45, task_count: 2 },
                DayAnalytics { date: "2024-03-01".to_string(), total_time_spent: 60, task_count: 1 },
            ]
        );
    }

    #[test]
    fn test_sunday_belongs_to_preceding_monday() {
        // 2024-01-07 is a Sunday, 2024-01-08 a Monday
        let todos = vec![
            done("mon", Some(10), Some(at(2024, 1, 1, 9))),
            done("sun", Some(20), Some(at(2024, 1, 7, 22))),
            done("next mon", Some(40), Some(at(2024, 1, 8, 1))),
        ];
        let weeks = AnalyticsAggregator::with_timezone(&todos, Utc).by_week();
        assert_eq!(
            weeks,
            vec![
                WeekAnalytics {
                    week_start: "2024-01-08".to_string(),
                    week_end: "2024-01-14".to_string(),
                    total_time_spent: 40,
                    task_count: 1,
                },
                WeekAnalytics {
                    week_start: "2024-01-01".to_string(),
                    week_end: "2024-01-07".to_string(),
                    total_time_spent: 30,
                    task_count: 2,
                },
            ]
        );
    }

    #[test]
    fn test_week_spanning_month_boundary() {
        // Thursday 2024-02-01 belongs to the week of Monday 2024-01-29
        let todos = vec![done("x", Some(5), Some(at(2024, 2, 1, 12)))];
        let weeks = AnalyticsAggregator::with_timezone(&todos, Utc).by_week();
        assert_eq!(weeks[0].week_start, "2024-01-29");
        assert_eq!(weeks[0].week_end, "2024-02-04");
    }

    #[test]
    fn test_by_month_names_and_order() {
        let todos = vec![
            done("a", Some(60), Some(at(2023, 12, 31, 9))),
            done("b", Some(30), Some(at(2024, 1, 15, 9))),
            done("c", Some(30), Some(at(2024, 1, 20, 9))),
        ];
        let months = AnalyticsAggregator::with_timezone(&todos, Utc).by_month();
        assert_eq!(
            months,
            vec![
                MonthAnalytics {
                    month: "2024-01".to_string(),
                    month_name: "January 2024".to_string(),
                    total_time_spent: 60,
                    task_count: 2,
                },
                MonthAnalytics {
                    month: "2023-12".to_string(),
                    month_name: "December 2023".to_string(),
                    total_time_spent: 60,
                    task_count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_grouping_uses_aggregator_timezone() {
        // 20:00 UTC on Jan 31 is already Feb 1 at UTC+9
        let todos = vec![done("late", Some(60), Some(at(2024, 1, 31, 20)))];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let utc_days = AnalyticsAggregator::with_timezone(&todos, Utc).by_day();
        let tokyo_days = AnalyticsAggregator::with_timezone(&todos, tokyo).by_day();
        let tokyo_months = AnalyticsAggregator::with_timezone(&todos, tokyo).by_month();

        assert_eq!(utc_days[0].date, "2024-01-31");
        assert_eq!(tokyo_days[0].date, "2024-02-01");
        assert_eq!(tokyo_months[0].month_name, "February 2024");
    }
}
