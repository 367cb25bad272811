//! End-to-end tests for the statement pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use meisai_core::{
    Detection, EncodingDetector, ErrorKind, ExtractionFailure, MeisaiConfig, StatementError,
    StatementProcessor,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Detector that always reports the same candidate.
struct Fixed(&'static str, f32);

impl EncodingDetector for Fixed {
    fn detect(&self, _sample: &[u8]) -> Option<Detection> {
        Some(Detection::new(self.0, self.1))
    }
}

const PREAMBLE: [&str; 8] = [
    "イオンカードセレクト",
    "会員番号,****-****-****-1234",
    "お支払日,2025/02/10",
    "ご請求金額,\"74,370\"",
    ",,,,,,,",
    "ご利用明細",
    "お客様,本人",
    "利用日,利用者,利用先,支払方法,回数,支払回,利用金額,備考",
];

fn statement(details: &[&str]) -> String {
    let mut lines: Vec<&str> = PREAMBLE.to_vec();
    lines.extend_from_slice(details);
    lines.push("合計,,,,,,\"74,370\",");
    lines.join("\r\n")
}

fn write_cp932(dir: &Path, name: &str, text: &str) -> PathBuf {
    let (bytes, _, unmappable) = encoding_rs::SHIFT_JIS.encode(text);
    assert!(!unmappable, "fixture must be representable in cp932");
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn processor() -> StatementProcessor {
    StatementProcessor::default().with_detector(Fixed("SHIFT_JIS", 0.99))
}

fn extraction_failure(err: &StatementError) -> ExtractionFailure {
    match err {
        StatementError::DataExtraction { reason, .. } => *reason,
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_single_record_end_to_end() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["250115,本人,Store,1回払い,1,52,5280,Note"]),
    );

    let result = processor().process(&path, root.path()).unwrap();

    assert_eq!(result.total_count, 1);
    assert_eq!(result.metadata.encoding, "cp932");
    assert_eq!(result.metadata.rows_scanned, 2);

    let record = serde_json::to_value(&result.details[0]).unwrap();
    assert_eq!(
        record,
        serde_json::json!({
            "date": "2025/01/15",
            "year": 2025,
            "month": 1,
            "month_str": "2025年1月",
            "store": "Store",
            "user": "本人",
            "payment_method": "1回払い",
            "amount": 5280,
            "note": "Note",
        })
    );
    assert_eq!(result.summary.total_amount, 5280);
    assert_eq!(result.summary.date_range.start, "2025/01/15");
    assert_eq!(result.summary.date_range.end, "2025/01/15");
    assert_eq!(result.preview, result.details);
}

#[test]
fn test_summary_and_preview() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&[
            "250120,本人,イオンスタイル,1回払い,1,1,\"12,800\",",
            "241231,本人,ガソリンスタンド,1回払い,1,1,\"5,000\",",
            "250103,家族,書店,1回払い,1,1,1980,",
            "250105,本人,返品,1回払い,1,1,-1200,返金",
            "250110,本人,ドラッグストア,1回払い,1,1,\"3,450\",",
            "250111,家族,カフェ,1回払い,1,1,640,",
            "250201,本人,電気料金,1回払い,1,1,\"52,700\",",
        ]),
    );

    let result = processor().process(&path, root.path()).unwrap();

    assert_eq!(result.total_count, 7);
    assert_eq!(result.preview.len(), 5);
    assert_eq!(result.preview[..], result.details[..5]);
    assert_eq!(result.details[1].store, "ガソリンスタンド");
    assert_eq!(result.details[3].amount, -1200);
    assert_eq!(result.details[3].note, "返金");
    assert_eq!(result.summary.total_amount, 75370);
    assert_eq!(result.summary.date_range.start, "2024/12/31");
    assert_eq!(result.summary.date_range.end, "2025/02/01");
}

#[test]
fn test_preview_follows_config() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&[
            "250101,本人,A,1回払い,1,1,100,",
            "250102,本人,B,1回払い,1,1,200,",
            "250103,本人,C,1回払い,1,1,300,",
        ]),
    );

    let mut config = MeisaiConfig::default();
    config.output.preview_rows = 2;
    let result = StatementProcessor::new(config)
        .with_detector(Fixed("SHIFT_JIS", 0.99))
        .process(&path, root.path())
        .unwrap();

    assert_eq!(result.total_count, 3);
    let stores: Vec<_> = result.preview.iter().map(|r| r.store.as_str()).collect();
    assert_eq!(stores, vec!["A", "B"]);
}

#[test]
fn test_utf8_statement() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("statement.csv");
    fs::write(&path, statement(&["250301,本人,コンビニ,1回払い,1,1,\"1,080\",メモ"])).unwrap();

    let result = StatementProcessor::default()
        .with_detector(Fixed("utf-8", 0.99))
        .process(&path, root.path())
        .unwrap();

    assert_eq!(result.metadata.encoding, "utf-8");
    assert_eq!(result.details[0].store, "コンビニ");
    assert_eq!(result.details[0].amount, 1080);
    assert_eq!(result.details[0].note, "メモ");
}

#[test]
fn test_low_confidence_falls_back_to_cp932() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["250115,本人,イオン,1回払い,1,1,5280,"]),
    );

    let result = StatementProcessor::default()
        .with_detector(Fixed("windows-1252", 0.3))
        .process(&path, root.path())
        .unwrap();

    assert_eq!(result.metadata.encoding, "cp932");
    assert_eq!(result.details[0].store, "イオン");
}

#[test]
fn test_default_detector_on_cp932_statement() {
    let root = TempDir::new().unwrap();
    let details: Vec<String> = (1..=20)
        .map(|d| format!("2501{:02},本人,イオンモール店舗,1回払い,1,1,1000,お買い物", d))
        .collect();
    let details: Vec<&str> = details.iter().map(String::as_str).collect();
    let path = write_cp932(root.path(), "statement.csv", &statement(&details));

    let result = StatementProcessor::default().process(&path, root.path()).unwrap();

    assert!(
        ["cp932", "shift_jis"].contains(&result.metadata.encoding.as_str()),
        "unexpected encoding {}",
        result.metadata.encoding
    );
    assert_eq!(result.total_count, 20);
    assert_eq!(result.summary.total_amount, 20_000);
    assert_eq!(result.summary.date_range.end, "2025/01/20");
}

#[test]
fn test_empty_file() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("empty.csv");
    fs::write(&path, b"").unwrap();

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFileFormat);
}

#[test]
fn test_preamble_only() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(root.path(), "statement.csv", &statement(&[]));

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(extraction_failure(&err), ExtractionFailure::NoDataRows);
}

#[test]
fn test_short_file() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(root.path(), "statement.csv", &PREAMBLE[..5].join("\r\n"));

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(extraction_failure(&err), ExtractionFailure::NoDataSection);
}

#[test]
fn test_invalid_amount() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&[
            "250115,本人,A,1回払い,1,1,abc,",
            "250116,本人,B,1回払い,1,1,100,",
        ]),
    );

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(extraction_failure(&err), ExtractionFailure::InvalidAmounts);
    assert_eq!(err.details()["invalid_values"], serde_json::json!(["abc"]));
}

#[test]
fn test_invalid_month() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["251301,本人,A,1回払い,1,1,100,"]),
    );

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DateConversion);
}

#[test]
fn test_outside_allowed_dir() {
    let root = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let path = write_cp932(
        other.path(),
        "statement.csv",
        &statement(&["250115,本人,A,1回払い,1,1,100,"]),
    );

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathValidation);

    let traversal = root
        .path()
        .join("..")
        .join(other.path().file_name().unwrap())
        .join("statement.csv");
    let err = processor().process(&traversal, root.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathValidation);
}

#[test]
fn test_missing_file() {
    let root = TempDir::new().unwrap();
    let err = processor()
        .process(root.path().join("missing.csv"), root.path())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn test_size_limit_from_config() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["250115,本人,A,1回払い,1,1,100,"]),
    );

    let mut config = MeisaiConfig::default();
    config.guard.max_file_size = 64;
    let err = StatementProcessor::new(config)
        .with_detector(Fixed("SHIFT_JIS", 0.99))
        .process(&path, root.path())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FileSize);
    assert_eq!(err.to_report()["kind"], "file_size");
}

#[test]
fn test_default_root_from_config() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["250115,本人,A,1回払い,1,1,100,"]),
    );

    let mut config = MeisaiConfig::default();
    config.guard.allowed_dir = root.path().to_path_buf();
    let result = StatementProcessor::new(config)
        .with_detector(Fixed("SHIFT_JIS", 0.99))
        .process_in_default_root(&path)
        .unwrap();

    assert_eq!(result.total_count, 1);
}

#[test]
fn test_total_overflow_is_reported() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&[
            "250115,本人,A,1回払い,1,1,9000000000000000000,",
            "250116,本人,B,1回払い,1,1,9000000000000000000,",
        ]),
    );

    let err = processor().process(&path, root.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Processing);
    assert_eq!(err.details()["amount_overflow"], true);
    assert_eq!(err.details()["max_amount"], 9_000_000_000_000_000_000i64);
}

#[test]
fn test_large_amounts_that_fit() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&[
            "250115,本人,A,1回払い,1,1,9000000000000000000,",
            "250116,本人,B,1回払い,1,1,-9000000000000000000,",
            "250117,本人,C,1回払い,1,1,100,",
        ]),
    );

    let result = processor().process(&path, root.path()).unwrap();
    assert_eq!(result.summary.total_amount, 100);
}

#[test]
fn test_path_below_a_regular_file() {
    let root = TempDir::new().unwrap();
    let path = write_cp932(
        root.path(),
        "statement.csv",
        &statement(&["250115,本人,A,1回払い,1,1,100,"]),
    );

    let err = processor()
        .process(path.join("nested.csv"), root.path())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}
