//! Report export: CSV table and JSON document per video.

use std::path::{Path, PathBuf};

use emosync_models::{AnalysisReport, ReportRow, REPORT_COLUMNS};

use crate::error::{WorkerError, WorkerResult};

/// Files written for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Render rows as CSV with a header line.
///
/// The `smoothed_emotion` column is present only when at least one row has a
/// smoothed label. Fields containing commas, quotes or line breaks are quoted.
pub fn render_csv(rows: &[ReportRow]) -> String {
    let with_smoothed = rows.iter().any(|r| r.smoothed_emotion.is_some());
    let width = if with_smoothed {
        REPORT_COLUMNS.len()
    } else {
        REPORT_COLUMNS.len() - 1
    };

    let mut out = String::new();
    out.push_str(&REPORT_COLUMNS[..width].join(","));
    out.push('\n');

    for row in rows {
        let cells = row.cells();
        let line: Vec<String> = cells[..width].iter().map(|c| csv_field(c.as_str())).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `<video_id>_analysis.csv` and `<video_id>_analysis.json` into `output_dir`.
pub async fn write_report(report: &AnalysisReport, output_dir: &Path) -> WorkerResult<ReportPaths> {
    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        WorkerError::report_failed(format!(
            "cannot create output dir {}: {}",
            output_dir.display(),
            e
        ))
    })?;

    let paths = ReportPaths {
        csv: output_dir.join(format!("{}_analysis.csv", report.video_id)),
        json: output_dir.join(format!("{}_analysis.json", report.video_id)),
    };

    tokio::fs::write(&paths.csv, render_csv(&report.rows)).await?;
    tokio::fs::write(&paths.json, serde_json::to_vec_pretty(report)?).await?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emosync_models::{ChangeFormat, CongruenceMetrics};

    fn row(second: u32, transcript: &str, smoothed: Option<&str>) -> ReportRow {
        ReportRow {
            second,
            facial_emotion: "happy".to_string(),
            text_emotion: "happy".to_string(),
            transcript: transcript.to_string(),
            congruence: "congruent".to_string(),
            change: "initial".to_string(),
            smoothed_emotion: smoothed.map(str::to_string),
        }
    }

    #[test]
    fn test_render_csv_without_smoothing() {
        let csv = render_csv(&[row(0, "great day", None)]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "second,facial_emotion,text_emotion,transcript,congruence,change"
        );
        assert_eq!(lines[1], "0,happy,happy,great day,congruent,initial");
    }

    #[test]
    fn test_render_csv_quotes_and_smoothed_column() {
        let csv = render_csv(&[
            row(0, "well, \"fine\"", Some("happy")),
            row(1, "ok", None),
        ]);
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].ends_with(",smoothed_emotion"));
        assert_eq!(
            lines[1],
            "0,happy,happy,\"well, \"\"fine\"\"\",congruent,initial,happy"
        );
        assert_eq!(lines[2], "1,happy,happy,ok,congruent,initial,");
    }

    #[test]
    fn test_render_csv_escapes_quotes_and_line_breaks() {
        let csv = render_csv(&[row(4, "he said \"no\"\nthen left", None), row(5, "a\r\nb", None)]);

        assert_eq!(
            csv,
            "second,facial_emotion,text_emotion,transcript,congruence,change\n\
             4,happy,happy,\"he said \"\"no\"\"\nthen left\",congruent,initial\n\
             5,happy,happy,\"a\r\nb\",congruent,initial\n"
        );
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = AnalysisReport::new(
            "v1",
            "none",
            &[],
            ChangeFormat::TriState,
            CongruenceMetrics::empty(),
            vec![],
        );

        let paths = write_report(&report, &dir.path().join("out")).await.unwrap();

        let csv = tokio::fs::read_to_string(&paths.csv).await.unwrap();
        assert!(csv.starts_with("second,"));
        let json = tokio::fs::read_to_string(&paths.json).await.unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.video_id, "v1");
        assert!(parsed.is_current_version());
    }
}
