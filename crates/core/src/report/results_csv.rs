use std::io::{Read, Write};
use std::path::Path;

use crate::report::performance_row::PerformanceRow;
use crate::report::report_error::ReportError;
use crate::shared::constants::{AVERAGE_PERFORMANCE_COLUMN, FACE_IMAGE_COLUMN};

/// Writes rows with a `Face Image,Average Performance` header.
pub fn write_rows(path: &Path, rows: &[PerformanceRow]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| ReportError::io(path, e))?;
    write_to(file, rows).map_err(|e| ReportError::csv(path, e))?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_rows(path: &Path) -> Result<Vec<PerformanceRow>, ReportError> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::io(path, e))?;
    read_from(file).map_err(|e| ReportError::csv(path, e))
}

fn write_to<W: Write>(writer: W, rows: &[PerformanceRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serialize() emits headers lazily, an empty table still needs them.
        wtr.write_record([FACE_IMAGE_COLUMN, AVERAGE_PERFORMANCE_COLUMN])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Extra columns are ignored; header names are matched after trimming.
fn read_from<R: Read>(reader: R) -> Result<Vec<PerformanceRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");
        let rows = vec![
            PerformanceRow::new("frames/face_1.jpg", 12.5),
            PerformanceRow::new("frames/face_2.jpg", 3.0),
        ];

        write_rows(&path, &rows).unwrap();
        assert_eq!(read_rows(&path).unwrap(), rows);
    }

    #[test]
    fn test_header_names() {
        let mut buf = Vec::new();
        write_to(&mut buf, &[PerformanceRow::new("a.jpg", 1.5)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Face Image,Average Performance\na.jpg,1.5\n");
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let mut buf = Vec::new();
        write_to(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Face Image,Average Performance\n");
        assert!(read_from("Face Image,Average Performance\n".as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_read_ignores_extra_columns() {
        let data = "Index, Face Image , Average Performance \n0,frames/face_1.jpg, 4.25\n";
        let rows = read_from(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].face_image, "frames/face_1.jpg");
        assert_relative_eq!(rows[0].average_performance, 4.25);
    }

    #[test]
    fn test_read_rejects_non_numeric_performance() {
        let data = "Face Image,Average Performance\na.jpg,lots\n";
        assert!(read_from(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_rows(Path::new("/nonexistent/results.csv")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
