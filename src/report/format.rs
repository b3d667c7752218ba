use super::{Report, ReportKind};
use clap::ValueEnum;
use std::io::{self, Write};

/// Spacing used when a fixed-width line does not fit.
const OVERFLOW_GAP: usize = 10;

/// Which rate figures appear on tick reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RateColumns {
    /// Lifetime and interval rate
    Both,
    /// Lifetime rate only
    Lifetime,
}

pub trait ReportFormatter {
    /// Writes the whole report to `out`. Callers flush afterwards.
    fn write_report(&self, out: &mut dyn Write, report: &Report) -> io::Result<()>;
}

/// `key<padding>numbers`, each line padded to `width` columns.
#[derive(Debug, Clone)]
pub struct FixedWidth {
    pub width: usize,
    pub rates: RateColumns,
}

/// Aligned columns under a header row.
#[derive(Debug, Clone)]
pub struct Table {
    pub rates: RateColumns,
}

struct Columns {
    headers: Vec<&'static str>,
    rows: Vec<(String, Vec<String>)>,
}

fn columns(report: &Report, rates: RateColumns) -> Columns {
    let with_interval = report.kind == ReportKind::Interval;
    let with_interval_rate = with_interval && rates == RateColumns::Both;

    let mut headers = vec!["TOTAL"];
    if with_interval {
        headers.push("INTERVAL");
    }
    headers.push("RATE/MIN");
    if with_interval_rate {
        headers.push("INTERVAL/MIN");
    }

    let rows = report
        .rows
        .iter()
        .map(|row| {
            let mut fields = vec![row.total.to_string()];
            if with_interval {
                fields.push(row.interval.to_string());
            }
            fields.push(format!("{:.2}", row.lifetime_rate));
            if with_interval_rate {
                fields.push(format!("{:.2}", row.interval_rate));
            }
            (row.key.clone(), fields)
        })
        .collect();

    Columns { headers, rows }
}

fn write_title(out: &mut dyn Write, report: &Report) -> io::Result<()> {
    let at = report.generated_at.format("%Y-%m-%d %H:%M:%S");
    match report.kind {
        ReportKind::Interval => writeln!(
            out,
            "--- {at} queries in last {:.2} min ({} total, {} this interval) ---",
            report.interval_minutes,
            report.total_count(),
            report.interval_count()
        ),
        ReportKind::Final => writeln!(
            out,
            "--- {at} totals for run over {:.2} min ({} total) ---",
            report.lifetime_minutes,
            report.total_count()
        ),
    }
}

impl ReportFormatter for FixedWidth {
    fn write_report(&self, out: &mut dyn Write, report: &Report) -> io::Result<()> {
        write_title(out, report)?;

        for (key, fields) in columns(report, self.rates).rows {
            let numbers = fields.join(" ");
            let spaces = self
                .width
                .checked_sub(key.len() + numbers.len())
                .filter(|&n| n > 0)
                .unwrap_or(OVERFLOW_GAP);
            writeln!(out, "{key}{}{numbers}", " ".repeat(spaces))?;
        }
        Ok(())
    }
}

impl ReportFormatter for Table {
    fn write_report(&self, out: &mut dyn Write, report: &Report) -> io::Result<()> {
        write_title(out, report)?;

        let columns = columns(report, self.rates);
        let key_width = columns
            .rows
            .iter()
            .map(|(key, _)| key.len())
            .max()
            .unwrap_or(0)
            .max("KEY".len());
        let widths: Vec<usize> = columns
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                columns
                    .rows
                    .iter()
                    .map(|(_, fields)| fields[i].len())
                    .max()
                    .unwrap_or(0)
                    .max(header.len())
            })
            .collect();

        write!(out, "{:<key_width$}", "KEY")?;
        for (header, width) in columns.headers.iter().zip(&widths) {
            write!(out, "  {header:>width$}")?;
        }
        writeln!(out)?;

        for (key, fields) in &columns.rows {
            write!(out, "{key:<key_width$}")?;
            for (field, width) in fields.iter().zip(&widths) {
                write!(out, "  {field:>width$}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportRow;
    use chrono::{Local, TimeZone};

    fn report(kind: ReportKind) -> Report {
        Report {
            kind,
            generated_at: Local
                .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Local::now),
            lifetime_minutes: 2.0,
            interval_minutes: 1.0,
            rows: vec![
                ReportRow {
                    key: "a.com.".to_string(),
                    total: 3,
                    interval: 1,
                    lifetime_rate: 1.5,
                    interval_rate: 1.0,
                },
                ReportRow {
                    key: "b.com.".to_string(),
                    total: 1,
                    interval: 0,
                    lifetime_rate: 0.5,
                    interval_rate: 0.0,
                },
            ],
        }
    }

    fn render(formatter: &dyn ReportFormatter, report: &Report) -> Vec<String> {
        let mut out = Vec::new();
        formatter.write_report(&mut out, report).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_fixed_width_pads_to_width() {
        let formatter = FixedWidth {
            width: 30,
            rates: RateColumns::Both,
        };
        let lines = render(&formatter, &report(ReportKind::Interval));

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("queries in last 1.00 min (4 total, 1 this interval)"));
        assert_eq!(lines[1], format!("a.com.{}3 1 1.50 1.00", " ".repeat(11)));
        assert_eq!(lines[1].len(), 30);
        assert_eq!(lines[2], format!("b.com.{}1 0 0.50 0.00", " ".repeat(11)));
    }

    #[test]
    fn test_fixed_width_overflow_uses_gap() {
        let formatter = FixedWidth {
            width: 5,
            rates: RateColumns::Lifetime,
        };
        let lines = render(&formatter, &report(ReportKind::Final));
        assert!(lines[0].contains("totals for run over 2.00 min (4 total)"));
        assert_eq!(lines[1], format!("a.com.{}3 1.50", " ".repeat(OVERFLOW_GAP)));
    }

    #[test]
    fn test_fixed_width_exact_fit_keeps_key_apart() {
        let formatter = FixedWidth {
            width: 19,
            rates: RateColumns::Both,
        };
        let lines = render(&formatter, &report(ReportKind::Interval));
        assert_eq!(lines[1], format!("a.com.{}3 1 1.50 1.00", " ".repeat(OVERFLOW_GAP)));
        assert_eq!(lines[2], format!("b.com.{}1 0 0.50 0.00", " ".repeat(OVERFLOW_GAP)));
    }

    #[test]
    fn test_table_interval_columns() {
        let formatter = Table {
            rates: RateColumns::Both,
        };
        let lines = render(&formatter, &report(ReportKind::Interval));
        assert_eq!(lines[1], "KEY     TOTAL  INTERVAL  RATE/MIN  INTERVAL/MIN");
        assert_eq!(lines[2], "a.com.      3         1      1.50          1.00");
        assert_eq!(lines[3], "b.com.      1         0      0.50          0.00");
    }

    #[test]
    fn test_table_lifetime_only_and_final() {
        let formatter = Table {
            rates: RateColumns::Lifetime,
        };
        let lines = render(&formatter, &report(ReportKind::Interval));
        assert_eq!(lines[1], "KEY     TOTAL  INTERVAL  RATE/MIN");

        let formatter = Table {
            rates: RateColumns::Both,
        };
        let lines = render(&formatter, &report(ReportKind::Final));
        assert_eq!(lines[1], "KEY     TOTAL  RATE/MIN");
        assert_eq!(lines[2], "a.com.      3      1.50");
    }

    #[test]
    fn test_empty_report_has_title_and_header() {
        let mut empty = report(ReportKind::Final);
        empty.rows.clear();
        let lines = render(
            &Table {
                rates: RateColumns::Both,
            },
            &empty,
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "KEY  TOTAL  RATE/MIN");
    }
}
