use crate::table::{ColumnData, Table};
use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::sync::Arc;

/// get field names by peeking into `file_path`
pub fn peek_parquet_field_names(file_path: &str) -> anyhow::Result<Vec<Box<str>>> {
    let file = File::open(file_path)?;
    let reader = SerializedFileReader::new(file)?;
    let metadata = reader.metadata();
    let fields = metadata.file_metadata().schema().get_fields();

    Ok(fields
        .iter()
        .map(|f| f.name().to_string().into_boxed_str())
        .collect())
}

impl ColumnData {
    fn arrow_type(&self) -> DataType {
        match self {
            ColumnData::Text(_) => DataType::Utf8,
            ColumnData::Float(_) => DataType::Float64,
            ColumnData::Int(_) => DataType::Int64,
        }
    }

    fn to_arrow(&self) -> ArrayRef {
        match self {
            ColumnData::Text(x) => {
                Arc::new(StringArray::from_iter_values(x.iter().map(|s| s.as_ref())))
            }
            ColumnData::Float(x) => Arc::new(Float64Array::from(x.clone())),
            ColumnData::Int(x) => Arc::new(Int64Array::from(x.clone())),
        }
    }

    fn empty_like(data_type: &DataType) -> anyhow::Result<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => Ok(ColumnData::Text(vec![])),
            DataType::Float32 | DataType::Float64 => Ok(ColumnData::Float(vec![])),
            DataType::Int32 | DataType::Int64 => Ok(ColumnData::Int(vec![])),
            other => Err(anyhow::anyhow!("unsupported parquet column type: {}", other)),
        }
    }

    /// Append the cells of one arrow array; nulls in text columns become
    /// empty strings
    fn extend_from_arrow(&mut self, array: &ArrayRef) -> anyhow::Result<()> {
        let any = array.as_any();
        match self {
            ColumnData::Text(x) => {
                if let Some(arr) = any.downcast_ref::<StringArray>() {
                    x.extend(arr.iter().map(|s| s.unwrap_or("").into()));
                } else if let Some(arr) = any.downcast_ref::<LargeStringArray>() {
                    x.extend(arr.iter().map(|s| s.unwrap_or("").into()));
                } else {
                    return Err(anyhow::anyhow!("expected a string array"));
                }
            }
            ColumnData::Float(x) => {
                if let Some(arr) = any.downcast_ref::<Float64Array>() {
                    x.extend(arr.iter().map(|v| v.filter(|v| v.is_finite())));
                } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
                    x.extend(
                        arr.iter()
                            .map(|v| v.map(|v| v as f64).filter(|v| v.is_finite())),
                    );
                } else {
                    return Err(anyhow::anyhow!("expected a float array"));
                }
            }
            ColumnData::Int(x) => {
                if let Some(arr) = any.downcast_ref::<Int64Array>() {
                    x.extend(arr.iter());
                } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
                    x.extend(arr.iter().map(|v| v.map(|v| v as i64)));
                } else {
                    return Err(anyhow::anyhow!("expected an integer array"));
                }
            }
        }
        Ok(())
    }
}

impl Table {
    /// Write the table as a single zstd-compressed row group. Numeric
    /// columns are nullable so that missing cells survive the round trip.
    pub fn to_parquet(&self, file_path: &str) -> anyhow::Result<()> {
        let fields: Vec<Field> = self
            .columns()
            .map(|(name, data)| Field::new(name, data.arrow_type(), data.is_numeric()))
            .collect();

        let schema = Arc::new(Schema::new(fields));
        let arrays: Vec<ArrayRef> = self.columns.iter().map(|c| c.to_arrow()).collect();
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let zstd_level = ZstdLevel::try_new(5)?;
        let writer_properties = WriterProperties::builder()
            .set_compression(Compression::ZSTD(zstd_level))
            .build();

        let file = File::create(file_path)?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(writer_properties))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    /// Read every supported column (utf8, float, integer) of a parquet
    /// file; other column types are skipped
    pub fn from_parquet(file_path: &str) -> anyhow::Result<Self> {
        let file = File::open(file_path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();

        let mut selected: Vec<(usize, ColumnData)> = vec![];
        for (j, field) in schema.fields().iter().enumerate() {
            match ColumnData::empty_like(field.data_type()) {
                Ok(data) => selected.push((j, data)),
                Err(e) => log::warn!("{}: skip `{}`: {}", file_path, field.name(), e),
            }
        }

        for batch in builder.build()? {
            let batch = batch?;
            for (j, data) in selected.iter_mut() {
                data.extend_from_arrow(batch.column(*j))?;
            }
        }

        let mut table = Table::new();
        for (j, data) in selected {
            table.push_column(schema.field(j).name(), data)?;
        }
        Ok(table)
    }
}
