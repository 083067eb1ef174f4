use crate::error::{ProcessingError, Result};
use crate::models::{GlobalResult, StationStats};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Renders the merged table as `<key>=<min>/<mean>/<max>` lines in raw byte
/// order of the keys.
pub struct ReportWriter;

impl ReportWriter {
    pub fn new() -> Self {
        Self
    }

    /// Display line for one station, without the key and terminator.
    /// The mean is rounded up to the next tenth in integer arithmetic.
    pub fn format_values(&self, stats: &StationStats) -> String {
        format!(
            "{}/{}/{}",
            format_tenths(i128::from(stats.min)),
            format_tenths(stats.mean_tenths_ceil()),
            format_tenths(i128::from(stats.max)),
        )
    }

    fn append_line(&self, buffer: &mut Vec<u8>, key: &[u8], stats: &StationStats) {
        buffer.extend_from_slice(key);
        buffer.push(b'=');
        buffer.extend_from_slice(self.format_values(stats).as_bytes());
        buffer.push(b'\n');
    }

    /// Write the whole report to any sink. Keys are emitted as raw bytes.
    pub fn write_to<W: Write>(&self, result: &GlobalResult, mut sink: W) -> io::Result<()> {
        let mut line = Vec::with_capacity(64);
        for (key, stats) in result.sorted() {
            line.clear();
            self.append_line(&mut line, key, stats);
            sink.write_all(&line)?;
        }
        sink.flush()
    }

    pub fn render(&self, result: &GlobalResult) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(result.len() * 32);
        for (key, stats) in result.sorted() {
            self.append_line(&mut buffer, key, stats);
        }
        buffer
    }

    /// Write the report file, creating parent directories as needed.
    pub fn write_report(&self, result: &GlobalResult, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProcessingError::output(path, e))?;
        }

        let file = File::create(path).map_err(|e| ProcessingError::output(path, e))?;
        self.write_to(result, BufWriter::new(file))
            .map_err(|e| ProcessingError::output(path, e))?;

        info!(path = %path.display(), stations = result.len(), "Report written");
        Ok(())
    }
}

/// `-3` renders as `-0.3`, `0` as `0.0`.
fn format_tenths(tenths: i128) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let magnitude = tenths.unsigned_abs();
    format!("{}{}.{}", sign, magnitude / 10, magnitude % 10)
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StationTable;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn table(entries: &[(&[u8], i64)]) -> StationTable {
        let mut table = StationTable::new();
        for (key, value) in entries {
            table.record(key, *value);
        }
        table
    }

    #[test]
    fn test_render_sorted_report() {
        let result = table(&[(b"Hamburg", 120), (b"Bulawayo", 89), (b"Hamburg", 120)]);
        let report = ReportWriter::new().render(&result);

        assert_eq!(
            String::from_utf8(report).unwrap(),
            "Bulawayo=8.9/8.9/8.9\nHamburg=12.0/12.0/12.0\n"
        );
    }

    #[test]
    fn test_mean_rounds_toward_positive_infinity() {
        let writer = ReportWriter::new();

        // mean of 12.3 and 12.4 is 12.35
        let up = table(&[(b"a", 123), (b"a", 124)]);
        assert_eq!(writer.format_values(up.get(b"a").unwrap()), "12.3/12.4/12.4");

        // mean of -12.3 and -12.4 is -12.35
        let down = table(&[(b"a", -123), (b"a", -124)]);
        assert_eq!(writer.format_values(down.get(b"a").unwrap()), "-12.4/-12.3/-12.3");

        // mean of -0.1 and 0.0 is -0.05
        let near_zero = table(&[(b"a", -1), (b"a", 0)]);
        assert_eq!(writer.format_values(near_zero.get(b"a").unwrap()), "-0.1/0.0/0.0");
    }

    #[test]
    fn test_exact_tenths_are_not_bumped() {
        let result = table(&[(b"x", 11), (b"x", 11), (b"x", -11)]);
        let line = ReportWriter::new().format_values(result.get(b"x").unwrap());
        // mean is 11/30 = 0.3666..
        assert_eq!(line, "-1.1/0.4/1.1");
    }

    #[test]
    fn test_mean_ceiling_holds_for_large_counts() {
        let writer = ReportWriter::new();

        // mean is 100.00000001 tenths, just above 10.0
        let above = StationStats { min: 100, max: 101, sum: 10_000_000_001, count: 100_000_000 };
        assert_eq!(writer.format_values(&above), "10.0/10.1/10.1");

        // mean is -100.00000001 tenths, just below -10.0
        let below = StationStats { min: -101, max: -100, sum: -10_000_000_001, count: 100_000_000 };
        assert_eq!(writer.format_values(&below), "-10.1/-10.0/-10.0");
    }

    #[test]
    fn test_format_tenths() {
        assert_eq!(format_tenths(0), "0.0");
        assert_eq!(format_tenths(-3), "-0.3");
        assert_eq!(format_tenths(89), "8.9");
        assert_eq!(format_tenths(-1234), "-123.4");
        assert_eq!(format_tenths(1_000_000_000_000_000), "100000000000000.0");
    }

    #[test]
    fn test_render_matches_write_to() {
        let result = table(&[(b"b", 5), (b"a", -7), (b"a", 3)]);
        let writer = ReportWriter::new();

        let mut written = Vec::new();
        writer.write_to(&result, &mut written).unwrap();

        assert_eq!(writer.render(&result), written);
    }

    #[test]
    fn test_non_utf8_keys_written_raw() {
        let result = table(&[(&[0xe9, b'x'], 10), (b"abc", -5)]);
        let report = ReportWriter::new().render(&result);

        let mut expected = b"abc=-0.5/-0.5/-0.5\n".to_vec();
        expected.extend_from_slice(&[0xe9, b'x']);
        expected.extend_from_slice(b"=1.0/1.0/1.0\n");
        assert_eq!(report, expected);
    }

    #[test]
    fn test_empty_result_writes_empty_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("output.txt");

        ReportWriter::new().write_report(&StationTable::new(), &path)?;

        assert!(path.exists());
        assert_eq!(std::fs::read(&path)?, Vec::<u8>::new());
        Ok(())
    }

    #[test]
    fn test_unwritable_path_is_output_error() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be opened as the output file
        let result = ReportWriter::new().write_report(&StationTable::new(), dir.path());
        assert!(matches!(result, Err(ProcessingError::OutputWrite { .. })));
    }
}
