use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{AnalyticsReport, Baseline};

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}"))
}

fn signed(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:+.2}"))
}

fn write_baseline(output: &mut String, title: &str, baseline: &Baseline) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    if baseline.averages.peer_count == 0 {
        let _ = writeln!(output, "No earlier peer events to compare against.");
        return;
    }

    let averages = &baseline.averages;
    let diffs = &baseline.diffs;
    let _ = writeln!(output, "Averaged over {} earlier events.", averages.peer_count);
    let _ = writeln!(
        output,
        "- Attendees: {} avg ({})",
        number(averages.users_avg),
        signed(diffs.users_total)
    );
    let _ = writeln!(
        output,
        "- Members: {} avg ({})",
        number(averages.members_avg),
        signed(diffs.members_total)
    );
    let _ = writeln!(
        output,
        "- Returning: {} avg ({})",
        number(averages.returning_avg),
        signed(diffs.returning_total)
    );
}

pub fn build_report(report: &AnalyticsReport) -> String {
    let mut output = String::new();
    let current = &report.current;

    let _ = writeln!(output, "# Event Engagement Report");
    let _ = writeln!(
        output,
        "{} ({}) on {}",
        report.event_name,
        report.event_type,
        report.start_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    let _ = writeln!(output, "- Attendees: {}", current.users_total);
    let _ = writeln!(output, "- Members: {}", current.members_total);
    let _ = writeln!(output, "- Returning: {}", current.returning_total);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Previous Occurrence");
    match &report.previous {
        None => {
            let _ = writeln!(output, "No earlier occurrence in this series.");
        }
        Some(previous) => {
            let _ = writeln!(output, "Held {}", previous.start_at.format("%Y-%m-%d"));
            let _ = writeln!(
                output,
                "- Attendees: {} ({:+})",
                previous.totals.users_total, previous.diffs.users_total
            );
            let _ = writeln!(
                output,
                "- Members: {} ({:+})",
                previous.totals.members_total, previous.diffs.members_total
            );
            let _ = writeln!(
                output,
                "- Returning: {} ({:+})",
                previous.totals.returning_total, previous.diffs.returning_total
            );
        }
    }

    write_baseline(&mut output, "Compared With Same Type", &report.category_baseline);
    if let Some(series) = &report.series_baseline {
        write_baseline(&mut output, "Compared With Series", series);
    }

    output
}

/// One CSV line per event in a club export.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub event_id: Uuid,
    pub event_name: String,
    pub event_type: String,
    pub start_at: String,
    pub users_total: u64,
    pub members_total: u64,
    pub returning_total: u64,
    pub previous_event_id: Option<Uuid>,
    pub previous_users_diff: Option<f64>,
    pub category_peer_count: usize,
    pub category_users_avg: Option<f64>,
    pub category_users_diff: Option<f64>,
    pub series_peer_count: Option<usize>,
    pub series_users_avg: Option<f64>,
    pub series_users_diff: Option<f64>,
}

impl From<&AnalyticsReport> for ExportRow {
    fn from(report: &AnalyticsReport) -> Self {
        let series = report.series_baseline.as_ref();
        Self {
            event_id: report.event_id,
            event_name: report.event_name.clone(),
            event_type: report.event_type.clone(),
            start_at: report.start_at.to_rfc3339(),
            users_total: report.current.users_total,
            members_total: report.current.members_total,
            returning_total: report.current.returning_total,
            previous_event_id: report.previous.as_ref().map(|previous| previous.event_id),
            previous_users_diff: report.previous.as_ref().map(|previous| previous.diffs.users_total),
            category_peer_count: report.category_baseline.averages.peer_count,
            category_users_avg: report.category_baseline.averages.users_avg,
            category_users_diff: report.category_baseline.diffs.users_total,
            series_peer_count: series.map(|series| series.averages.peer_count),
            series_users_avg: series.and_then(|series| series.averages.users_avg),
            series_users_diff: series.and_then(|series| series.diffs.users_total),
        }
    }
}

pub fn write_csv<W: std::io::Write>(writer: W, reports: &[AnalyticsReport]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for report in reports {
        writer.serialize(ExportRow::from(report))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyze_snapshot;
    use crate::fixtures::{self, FIRST_EVENT_ID, SECOND_EVENT_ID};

    #[test]
    fn markdown_lists_every_block() {
        let report = analyze_snapshot(&fixtures::launch_club(), SECOND_EVENT_ID).unwrap();
        let markdown = build_report(&report);

        assert!(markdown.starts_with("# Event Engagement Report"));
        assert!(markdown.contains("- Attendees: 3"));
        assert!(markdown.contains("- Attendees: 2 (+1)"));
        assert!(markdown.contains("- Attendees: 2.00 avg (+1.00)"));
        assert!(markdown.contains("## Compared With Series"));
    }

    #[test]
    fn markdown_explains_missing_baselines() {
        let report = analyze_snapshot(&fixtures::launch_club(), FIRST_EVENT_ID).unwrap();
        let markdown = build_report(&report);

        assert!(markdown.contains("No earlier occurrence in this series."));
        assert!(markdown.contains("No earlier peer events to compare against."));
        assert!(!markdown.contains("avg"));
    }

    #[test]
    fn csv_has_one_row_per_report_with_blank_nulls() {
        let club = fixtures::launch_club();
        let reports = vec![
            analyze_snapshot(&club, FIRST_EVENT_ID).unwrap(),
            analyze_snapshot(&club, SECOND_EVENT_ID).unwrap(),
        ];

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &reports).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("event_id,event_name,event_type"));
        assert!(lines[1].contains(",2,2,0,,,0,,,0,,"));
        assert!(lines[2].contains(&FIRST_EVENT_ID.to_string()));
    }
}
