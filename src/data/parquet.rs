//! Parquet export of run results

use crate::ledger::AuditRecord;
use crate::sim::EquityPoint;
use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn timestamp_field() -> Field {
    Field::new(
        "timestamp",
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )
}

/// Equity curve schema
pub fn equity_schema() -> Schema {
    Schema::new(vec![
        timestamp_field(),
        Field::new("equity", DataType::Utf8, false), // Store as string for Decimal precision
    ])
}

/// Audit trail schema
pub fn audit_schema() -> Schema {
    Schema::new(vec![
        timestamp_field(),
        Field::new("requested", DataType::Utf8, false),
        Field::new("applied", DataType::Utf8, false),
        Field::new("price", DataType::Utf8, false),
        Field::new("cash", DataType::Utf8, false),
        Field::new("holdings", DataType::UInt64, false),
        Field::new("equity", DataType::Utf8, false),
    ])
}

/// Paths written by `ParquetWriter::write_run`
#[derive(Debug, Clone)]
pub struct RunFiles {
    pub equity_path: PathBuf,
    pub audit_path: PathBuf,
}

/// Writes run results into one output directory
pub struct ParquetWriter {
    output_dir: PathBuf,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// File path for a run artefact
    pub fn file_path(&self, prefix: &str, run_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.parquet", prefix, run_id))
    }

    /// Write both the equity curve and the audit trail of a run
    ///
    /// `trail` and `curve` are paired by position: entry `i` of each belongs
    /// to the same committed step.
    pub fn write_run(
        &self,
        run_id: &str,
        curve: &[EquityPoint],
        trail: &[AuditRecord],
    ) -> anyhow::Result<RunFiles> {
        if curve.len() != trail.len() {
            anyhow::bail!(
                "Equity curve has {} points but audit trail has {} records",
                curve.len(),
                trail.len()
            );
        }
        let files = RunFiles {
            equity_path: self.file_path("equity_curve", run_id),
            audit_path: self.file_path("audit_trail", run_id),
        };
        self.write_equity_curve(&files.equity_path, curve)?;
        self.write_audit_trail(&files.audit_path, curve, trail)?;
        Ok(files)
    }

    /// Write the equity curve to a Parquet file
    pub fn write_equity_curve(&self, path: &Path, curve: &[EquityPoint]) -> anyhow::Result<()> {
        if curve.is_empty() {
            return Ok(());
        }

        let schema = Arc::new(equity_schema());
        let timestamps: Vec<i64> = curve.iter().map(|p| p.timestamp.timestamp_micros()).collect();
        let equity: Vec<String> = curve.iter().map(|p| p.equity.to_string()).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                Arc::new(StringArray::from(equity)) as ArrayRef,
            ],
        )?;
        self.write_batch(path, schema, &batch)?;

        tracing::debug!(path = ?path, count = curve.len(), "Wrote equity curve to Parquet");
        Ok(())
    }

    /// Write the audit trail, timestamped from the matching equity points
    pub fn write_audit_trail(
        &self,
        path: &Path,
        curve: &[EquityPoint],
        trail: &[AuditRecord],
    ) -> anyhow::Result<()> {
        if trail.is_empty() {
            return Ok(());
        }

        let schema = Arc::new(audit_schema());
        let rows = curve.iter().zip(trail);

        let timestamps: Vec<i64> = rows
            .clone()
            .map(|(p, _)| p.timestamp.timestamp_micros())
            .collect();
        let requested: Vec<&str> = rows.clone().map(|(_, r)| r.requested.as_str()).collect();
        let applied: Vec<&str> = rows.clone().map(|(_, r)| r.applied.as_str()).collect();
        let prices: Vec<String> = rows.clone().map(|(_, r)| r.price.to_string()).collect();
        let cash: Vec<String> = rows.clone().map(|(_, r)| r.cash.to_string()).collect();
        let holdings: Vec<u64> = rows.clone().map(|(_, r)| r.holdings).collect();
        let equity: Vec<String> = rows.map(|(_, r)| r.equity().to_string()).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                Arc::new(StringArray::from(requested)) as ArrayRef,
                Arc::new(StringArray::from(applied)) as ArrayRef,
                Arc::new(StringArray::from(prices)) as ArrayRef,
                Arc::new(StringArray::from(cash)) as ArrayRef,
                Arc::new(UInt64Array::from(holdings)) as ArrayRef,
                Arc::new(StringArray::from(equity)) as ArrayRef,
            ],
        )?;
        self.write_batch(path, schema, &batch)?;

        tracing::debug!(path = ?path, count = trail.len(), "Wrote audit trail to Parquet");
        Ok(())
    }

    fn write_batch(&self, path: &Path, schema: Arc<Schema>, batch: &RecordBatch) -> anyhow::Result<()> {
        self.ensure_dir()?;
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(batch)?;
        writer.close()?;
        Ok(())
    }
}

/// Read an equity curve written by `ParquetWriter`
pub fn read_equity_curve(path: &Path) -> anyhow::Result<Vec<EquityPoint>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::str::FromStr;

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut points = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let timestamps = batch
            .column(0)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column"))?;
        let equity = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| anyhow::anyhow!("Invalid equity column"))?;

        for i in 0..batch.num_rows() {
            let timestamp = DateTime::from_timestamp_micros(timestamps.value(i))
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?;
            points.push(EquityPoint {
                timestamp,
                equity: Decimal::from_str(equity.value(i))?,
            });
        }
    }

    Ok(points)
}
