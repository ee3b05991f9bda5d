//! Persists the injection statistics table.
use std::{
    fs::File,
    io::{BufWriter, Error, Write},
    path::Path,
};
use tirf_common::Real;
use transition_detection::InjectionStats;

pub(crate) const STATS_FILE_NAME: &str = "injection_stats.csv";

const HEADER: &str = "filename,front_start,front_tau,back_start,back_tau,amp,duration,quality";

/// Fixed width 12 with three decimals; non-negative values carry a leading
/// space in place of the sign. Absent values are written as empty cells.
pub(crate) fn format_value(value: Option<Real>) -> String {
    match value {
        Some(value) if value.is_sign_negative() => format!("{value:>12.3}"),
        Some(value) => format!("{:>12}", format!(" {value:.3}")),
        None => String::new(),
    }
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

trait SavableRow {
    fn write_row<W: Write>(&self, writer: &mut W) -> Result<(), Error>;
}

impl SavableRow for InjectionStats {
    fn write_row<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            quote_field(&self.filename),
            format_value(self.front_start),
            format_value(self.front_tau),
            format_value(self.back_start),
            format_value(self.back_tau),
            format_value(self.amplitude),
            format_value(self.duration),
            self.quality
        )
    }
}

pub(crate) fn write_stats<W: Write>(writer: &mut W, rows: &[InjectionStats]) -> Result<(), Error> {
    writeln!(writer, "{HEADER}")?;
    for row in rows {
        row.write_row(writer)?;
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(path = %path.display(), rows = rows.len()))]
pub(crate) fn save_stats(path: &Path, rows: &[InjectionStats]) -> Result<(), Error> {
    let mut file = BufWriter::new(File::create(path)?);
    write_stats(&mut file, rows)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use transition_detection::DataQuality;

    #[test]
    fn printf_style_formatting() {
        assert_eq!(format_value(Some(3.14159)), "       3.142");
        assert_eq!(format_value(Some(-2.5)), "      -2.500");
        assert_eq!(format_value(Some(0.0)), "       0.000");
        assert_eq!(format_value(Some(1234567.0)), " 1234567.000");
        assert_eq!(format_value(Some(123456789.0)), " 123456789.000");
        assert_eq!(format_value(None), "");
    }

    #[test]
    fn table_layout() {
        let rows = vec![
            InjectionStats {
                filename: "run_01".into(),
                front_start: Some(10.0),
                front_tau: Some(4.0),
                back_start: Some(50.0),
                back_tau: Some(6.0),
                amplitude: Some(812.25),
                duration: Some(41.0),
                quality: DataQuality::Complete,
            },
            InjectionStats::failed("run,02"),
        ];
        let mut buffer = Vec::new();
        write_stats(&mut buffer, &rows).expect("writing to memory succeeds");
        let text = String::from_utf8(buffer).expect("output is utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.first().copied(), Some(HEADER));
        assert_eq!(
            lines.get(1).copied(),
            Some("run_01,      10.000,       4.000,      50.000,       6.000,     812.250,      41.000,complete")
        );
        assert_eq!(lines.get(2).copied(), Some("\"run,02\",,,,,,,failed"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(STATS_FILE_NAME);
        save_stats(&path, &[InjectionStats::new("empty", None, None)]).expect("file is written");
        let text = std::fs::read_to_string(&path).expect("file is readable");
        assert!(text.ends_with("empty,,,,,,,missing_both\n"));
    }
}
