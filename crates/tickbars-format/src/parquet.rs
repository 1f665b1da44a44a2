//! Apache Parquet output format.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, TimestampMicrosecondArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tickbars_aggregate::{SyntheticBar, price_to_f64};
use tickbars_types::Decimal;

use crate::{FormatError, Formatter, SeriesRow};

/// Parquet formatter.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Row group size (number of rows per group).
    row_group_size: usize,
    /// Compression codec.
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )
}

fn timestamps(values: Vec<i64>) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from(values).with_timezone("UTC"))
}

impl ParquetFormatter {
    /// Creates a new Parquet formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row group size.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Creates the Arrow schema for synthetic bars.
    fn bar_schema() -> Schema {
        Schema::new(vec![
            timestamp_field("start_time"),
            timestamp_field("end_time"),
            Field::new("first_source_index", DataType::UInt64, false),
            Field::new("source_index", DataType::UInt64, false),
            Field::new("fold_count", DataType::UInt32, false),
            Field::new("open", DataType::Float64, false),
            Field::new("high", DataType::Float64, false),
            Field::new("low", DataType::Float64, false),
            Field::new("close", DataType::Float64, false),
        ])
    }

    /// Creates the Arrow schema for output series rows; unset values are null.
    fn series_schema() -> Schema {
        Schema::new(vec![
            timestamp_field("timestamp"),
            Field::new("index", DataType::UInt64, false),
            Field::new("open", DataType::Float64, true),
            Field::new("high", DataType::Float64, true),
            Field::new("low", DataType::Float64, true),
            Field::new("close", DataType::Float64, true),
        ])
    }

    fn bars_to_batch(bars: &[SyntheticBar]) -> Result<RecordBatch, FormatError> {
        let price = |f: fn(&SyntheticBar) -> Decimal| -> ArrayRef {
            Arc::new(Float64Array::from_iter_values(bars.iter().map(|b| price_to_f64(f(b)))))
        };

        RecordBatch::try_new(
            Arc::new(Self::bar_schema()),
            vec![
                timestamps(bars.iter().map(|b| b.start_time.timestamp_micros()).collect()),
                timestamps(bars.iter().map(|b| b.end_time.timestamp_micros()).collect()),
                Arc::new(UInt64Array::from_iter_values(
                    bars.iter().map(|b| b.first_source_index as u64),
                )),
                Arc::new(UInt64Array::from_iter_values(
                    bars.iter().map(|b| b.source_index as u64),
                )),
                Arc::new(UInt32Array::from_iter_values(bars.iter().map(|b| b.fold_count))),
                price(|b| b.open),
                price(|b| b.high),
                price(|b| b.low),
                price(|b| b.close),
            ],
        )
        .map_err(|e| FormatError::Parquet(e.to_string()))
    }

    fn rows_to_batch(rows: &[SeriesRow]) -> Result<RecordBatch, FormatError> {
        let value = |f: fn(&SeriesRow) -> Option<f64>| -> ArrayRef {
            Arc::new(rows.iter().map(f).collect::<Float64Array>())
        };

        RecordBatch::try_new(
            Arc::new(Self::series_schema()),
            vec![
                timestamps(rows.iter().map(|r| r.timestamp.timestamp_micros()).collect()),
                Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.index as u64))),
                value(|r| r.open),
                value(|r| r.high),
                value(|r| r.low),
                value(|r| r.close),
            ],
        )
        .map_err(|e| FormatError::Parquet(e.to_string()))
    }

    fn write_batches<T, W>(
        &self,
        items: &[T],
        schema: Schema,
        to_batch: fn(&[T]) -> Result<RecordBatch, FormatError>,
        writer: W,
    ) -> Result<(), FormatError>
    where
        W: Write + Send,
    {
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, Arc::new(schema), Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        for chunk in items.chunks(self.row_group_size.max(1)) {
            let batch = to_batch(chunk)?;
            arrow_writer
                .write(&batch)
                .map_err(|e| FormatError::Parquet(e.to_string()))?;
        }

        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }
}

impl Formatter for ParquetFormatter {
    fn write_bars<W: Write + Send>(
        &self,
        bars: &[SyntheticBar],
        writer: W,
    ) -> Result<(), FormatError> {
        self.write_batches(bars, Self::bar_schema(), Self::bars_to_batch, writer)
    }

    fn write_series<W: Write + Send>(
        &self,
        rows: &[SeriesRow],
        writer: W,
    ) -> Result<(), FormatError> {
        self.write_batches(rows, Self::series_schema(), Self::rows_to_batch, writer)
    }

    fn extension(&self) -> &str {
        "parquet"
    }
}
