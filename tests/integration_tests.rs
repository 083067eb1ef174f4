use clap::Parser;
use pretty_assertions::assert_eq;
use station_stats::cli::{run, Cli};
use station_stats::processors::{ChunkPlanner, ParallelProcessor};
use station_stats::readers::ReadMode;
use station_stats::writers::ReportWriter;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

fn input_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

fn parse_cli(args: &[&dyn AsRef<OsStr>]) -> Cli {
    let args = std::iter::once(OsStr::new("station-stats").to_os_string())
        .chain(args.iter().map(|arg| arg.as_ref().to_os_string()));
    Cli::try_parse_from(args).unwrap()
}

fn report_for(path: &Path, workers: usize, mode: ReadMode) -> String {
    let summary = ParallelProcessor::new(workers)
        .with_granularity(64)
        .with_read_mode(mode)
        .process_file(path, None)
        .unwrap();
    String::from_utf8(ReportWriter::new().render(&summary.result)).unwrap()
}

fn synthetic_measurements(rows: usize) -> Vec<u8> {
    let stations = ["Hamburg", "Bulawayo", "Palembang", "St. John's", "Cracow", "Zürich"];
    let mut data = Vec::new();
    for i in 0..rows {
        let whole = (i * 7 % 100) as i64 - 50;
        writeln!(data, "{};{}.{}", stations[i % stations.len()], whole, i % 10).unwrap();
    }
    data
}

#[test]
fn test_end_to_end_example() {
    let file = input_file(b"Hamburg;12.0\nBulawayo;8.9\nHamburg;12.0\n");
    let report = report_for(file.path(), 1, ReadMode::Mmap);

    assert_eq!(report, "Bulawayo=8.9/8.9/8.9\nHamburg=12.0/12.0/12.0\n");
}

#[test]
fn test_malformed_lines_do_not_affect_other_keys() {
    let clean = input_file(b"Hamburg;12.0\nBulawayo;8.9\nHamburg;-3.5\n");
    let noisy = input_file(
        b"Hamburg;12.0\nNoDelimiterHere\nBulawayo;8.9\n\n  \nHamburg;not-a-number\nHamburg;-3.5\nNoDelimiterHere",
    );

    assert_eq!(
        report_for(noisy.path(), 1, ReadMode::Mmap),
        report_for(clean.path(), 1, ReadMode::Mmap)
    );
}

#[test]
fn test_result_is_independent_of_worker_count_and_read_mode() {
    let file = input_file(&synthetic_measurements(4000));
    let baseline = report_for(file.path(), 1, ReadMode::Mmap);
    assert_eq!(baseline.lines().count(), 6);

    for workers in [2, 3, 5, 16, 64] {
        for mode in [ReadMode::Mmap, ReadMode::Buffered] {
            assert_eq!(report_for(file.path(), workers, mode), baseline);
        }
    }
}

#[test]
fn test_chunks_never_split_records() {
    let data = synthetic_measurements(1500);
    let file = input_file(&data);

    for workers in [1, 2, 7, 33] {
        let ranges = ChunkPlanner::with_granularity(32)
            .plan_file(file.path(), workers)
            .unwrap();
        assert!(ranges.len() <= workers);

        for window in ranges.windows(2) {
            assert_eq!(window[0].end, window[1].start);
        }
        for range in &ranges {
            assert!(range.end == data.len() as u64 || data[range.end as usize - 1] == b'\n');
        }
    }
}

#[test]
fn test_cli_process_writes_output_file() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let input = dir.path().join("measurements.txt");
    let output = dir.path().join("out").join("output.txt");
    std::fs::write(&input, "Hamburg;12.0\nBulawayo;8.9\nHamburg;12.0").unwrap();

    let cli = parse_cli(&[
        &"process",
        &"--input-file",
        &input,
        &"--output-file",
        &output,
        &"--workers",
        &"2",
        &"--quiet",
    ]);
    run(cli).unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "Bulawayo=8.9/8.9/8.9\nHamburg=12.0/12.0/12.0\n"
    );
}

#[test]
fn test_cli_no_valid_lines_gives_empty_output() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let input = dir.path().join("measurements.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, "NoDelimiterHere\n\n   \nalso bad\n").unwrap();

    let cli = parse_cli(&[&"process", &"-i", &input, &"-o", &output, &"-q"]);
    run(cli).unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_cli_missing_input_fails() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let input = dir.path().join("missing.txt");
    let output = dir.path().join("output.txt");

    let cli = parse_cli(&[&"process", &"-i", &input, &"-o", &output, &"-q"]);

    assert!(run(cli).is_err());
    assert!(!output.exists());
}
