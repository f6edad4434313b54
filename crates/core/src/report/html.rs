use std::path::{Path, PathBuf};

use base64::Engine;

use crate::report::performance_row::PerformanceRow;
use crate::report::report_error::ReportError;
use crate::shared::constants::AVERAGE_PERFORMANCE_COLUMN;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Influencer Performance Table</title>
<style>
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid black; text-align: center; padding: 8px; }
  th { background-color: #f2f2f2; }
  img { max-width: 100px; max-height: 100px; }
</style>
</head>
<body>
<h2>Influencer Performance Table</h2>
<table>
"#;

const TAIL: &str = "</table>\n</body>\n</html>\n";

/// Rendered page plus the image files that could not be found.
#[derive(Debug, Clone)]
pub struct HtmlTable {
    pub html: String,
    pub missing: Vec<PathBuf>,
}

/// Renders one table row per face with the thumbnail inlined as base64.
///
/// Each image is looked up by file name inside `frames_dir`; the directory
/// part stored in the results file is ignored.
pub fn render_table(rows: &[PerformanceRow], frames_dir: &Path) -> HtmlTable {
    let mut html = String::from(HEAD);
    html.push_str(&format!(
        "<tr><th>Face</th><th>{}</th></tr>\n",
        escape(AVERAGE_PERFORMANCE_COLUMN)
    ));
    let mut missing = Vec::new();

    for row in rows {
        let path = frames_dir.join(crate::report::ranking::short_name(&row.face_image));
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => {
                log::warn!("File not found: {}", path.display());
                missing.push(path);
                continue;
            }
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        html.push_str(&format!(
            "<tr><td><img src=\"data:image/jpeg;base64,{encoded}\" alt=\"{}\"></td>\
             <td>{:.2}</td></tr>\n",
            escape(&row.face_image),
            row.average_performance
        ));
    }

    html.push_str(TAIL);
    HtmlTable { html, missing }
}

pub fn write_table(path: &Path, table: &HtmlTable) -> Result<(), ReportError> {
    std::fs::write(path, &table.html).map_err(|e| ReportError::io(path, e))?;
    log::info!("HTML table saved to {}", path.display());
    Ok(())
}

/// Escapes text for use in HTML/SVG content and attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn frames_with(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"\xff\xd8\xff").unwrap();
        }
        dir
    }

    #[test]
    fn test_rows_are_inlined_in_order() {
        let dir = frames_with(&["face_1.jpg", "face_2.jpg"]);
        let rows = vec![
            PerformanceRow::new("old/place/face_2.jpg", 7.0),
            PerformanceRow::new("face_1.jpg", 4.2),
        ];

        let table = render_table(&rows, dir.path());
        assert!(table.missing.is_empty());
        assert_eq!(table.html.matches("data:image/jpeg;base64,/9j/").count(), 2);
        let first = table.html.find("<td>7.00</td>").unwrap();
        let second = table.html.find("<td>4.20</td>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_missing_images_are_skipped() {
        let dir = frames_with(&["face_1.jpg"]);
        let rows = vec![
            PerformanceRow::new("face_1.jpg", 1.0),
            PerformanceRow::new("face_9.jpg", 2.0),
        ];

        let table = render_table(&rows, dir.path());
        assert_eq!(table.missing, vec![dir.path().join("face_9.jpg")]);
        assert_eq!(table.html.matches("<img").count(), 1);
        assert!(!table.html.contains("2.00"));
    }

    #[test]
    fn test_empty_table_is_well_formed() {
        let dir = frames_with(&[]);
        let table = render_table(&[], dir.path());
        assert!(table.html.contains("<th>Average Performance</th>"));
        assert!(table.html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_alt_text_is_escaped() {
        let dir = frames_with(&["x\"y.jpg"]);
        let table = render_table(&[PerformanceRow::new("x\"y.jpg", 1.0)], dir.path());
        assert!(table.html.contains("alt=\"x&quot;y.jpg\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_write_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.html");
        let table = HtmlTable {
            html: "<html></html>".to_string(),
            missing: vec![],
        };
        write_table(&path, &table).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
