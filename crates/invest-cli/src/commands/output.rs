//! 결과 출력 (JSON 요약, CSV 원장).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use invest_analytics::ComparisonReport;
use invest_core::{StrategyKind, StrategyLedger, SummaryRow, TableContract, SUMMARY_COLUMNS};

/// 값을 pretty JSON으로 파일 또는 stdout에 씁니다.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, value)?;
            info!(path = %path.display(), "JSON written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

/// 원장을 CSV로 씁니다. 컬럼과 자릿수는 테이블 계약을 따릅니다.
pub fn write_ledger_csv<W: Write>(
    writer: W,
    ledger: &StrategyLedger,
    contract: &TableContract,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let columns = TableContract::ledger_columns(ledger.kind);
    csv_writer.write_record(columns.iter().map(|c| c.name))?;
    for row in ledger.rows() {
        csv_writer.write_record(contract.ledger_record(ledger.kind, row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 요약 테이블을 CSV로 씁니다.
pub fn write_summary_csv<W: Write>(
    writer: W,
    rows: &[SummaryRow],
    contract: &TableContract,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SUMMARY_COLUMNS.iter().map(|c| c.name))?;
    for row in rows {
        csv_writer.write_record(contract.summary_record(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 원장 CSV 파일명 (예: `va_rebalance_ledger.csv`)
pub fn ledger_file_name(kind: StrategyKind) -> String {
    format!("{}_ledger.csv", kind.as_str().to_lowercase())
}

/// 비교 결과 전체를 디렉토리에 저장합니다.
///
/// 전략별 원장 CSV, `summary.csv`, `report.json`을 생성하고 생성된 경로를 반환합니다.
pub fn write_report_files(
    report: &ComparisonReport,
    dir: &Path,
    contract: &TableContract,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(report.ledgers.len() + 2);

    for ledger in &report.ledgers {
        let path = dir.join(ledger_file_name(ledger.kind));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_ledger_csv(file, ledger, contract)?;
        written.push(path);
    }

    let summary_path = dir.join("summary.csv");
    let file = File::create(&summary_path)
        .with_context(|| format!("Failed to create {}", summary_path.display()))?;
    write_summary_csv(file, &report.summaries, contract)?;
    written.push(summary_path);

    let report_path = dir.join("report.json");
    write_json(report, Some(&report_path))?;
    written.push(report_path);

    info!(dir = %dir.display(), files = written.len(), "Report files written");
    Ok(written)
}
