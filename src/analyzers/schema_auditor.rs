use arrow::datatypes::{DataType, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::models::Metric;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMismatch {
    pub column: String,
    pub got: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileFinding {
    Mismatches(Vec<ColumnMismatch>),
    Unreadable(String),
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub scanned_path: PathBuf,
    pub files_scanned: usize,
    pub findings: Vec<(PathBuf, FileFinding)>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Found {} parquet files under {}\n",
            self.files_scanned,
            self.scanned_path.display()
        );

        if self.is_clean() {
            summary.push_str("OK: All files match expected numeric types (DOUBLE).\n");
            return summary;
        }

        summary.push_str("MISMATCHES FOUND:\n");
        for (path, finding) in &self.findings {
            summary.push_str(&format!("{}\n", path.display()));
            match finding {
                FileFinding::Unreadable(error) => {
                    summary.push_str(&format!("  ERROR: {}\n", error));
                }
                FileFinding::Mismatches(mismatches) => {
                    for m in mismatches {
                        summary.push_str(&format!(
                            "  - {}: got {}, expected {}\n",
                            m.column, m.got, m.expected
                        ));
                    }
                }
            }
        }

        summary
    }
}

/// Checks stored files for metric columns that drifted away from `Float64`.
pub struct SchemaAuditor {
    expected: Vec<(Metric, DataType)>,
}

impl SchemaAuditor {
    pub fn new() -> Self {
        Self {
            expected: Metric::ALL
                .into_iter()
                .map(|m| (m, DataType::Float64))
                .collect(),
        }
    }

    /// Scan every `.parquet` file under `root/prefix`. Unreadable files are
    /// reported, not fatal.
    pub fn audit(&self, root: &Path, prefix: &str) -> Result<AuditReport> {
        let scan_root = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(root.to_path_buf(), |path, segment| path.join(segment));

        let mut report = AuditReport {
            scanned_path: scan_root.clone(),
            ..Default::default()
        };

        if !scan_root.exists() {
            info!(path = %scan_root.display(), "nothing to audit");
            return Ok(report);
        }

        for entry in WalkDir::new(&scan_root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("parquet")
            {
                continue;
            }

            report.files_scanned += 1;
            debug!(path = %path.display(), "auditing file");

            match read_schema(path) {
                Ok(schema) => {
                    let mismatches = self.compare(&schema);
                    if !mismatches.is_empty() {
                        report
                            .findings
                            .push((path.to_path_buf(), FileFinding::Mismatches(mismatches)));
                    }
                }
                Err(e) => report
                    .findings
                    .push((path.to_path_buf(), FileFinding::Unreadable(e.to_string()))),
            }
        }

        info!(
            files = report.files_scanned,
            findings = report.findings.len(),
            "audit complete"
        );
        Ok(report)
    }

    /// Mismatching metric columns; columns absent from the file are ignored.
    pub fn compare(&self, schema: &Schema) -> Vec<ColumnMismatch> {
        self.expected
            .iter()
            .filter_map(|(metric, want)| {
                let field = schema.field_with_name(metric.column_name()).ok()?;
                let got = type_name(field.data_type());
                let expected = type_name(want);
                (got != expected).then(|| ColumnMismatch {
                    column: metric.column_name().to_string(),
                    got,
                    expected,
                })
            })
            .collect()
    }
}

impl Default for SchemaAuditor {
    fn default() -> Self {
        Self::new()
    }
}

fn read_schema(path: &Path) -> Result<Schema> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    Ok(builder.schema().as_ref().clone())
}

/// Uppercase type name with temporal parameters collapsed.
pub fn type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Timestamp(_, _) => "TIMESTAMP".to_string(),
        DataType::Date32 | DataType::Date64 => "DATE".to_string(),
        DataType::Float64 => "DOUBLE".to_string(),
        DataType::Float32 => "FLOAT".to_string(),
        other => other.to_string().to_uppercase(),
    }
}
