//! # Parquet Reader for Fitted Tracks
//!
//! Ingestion of fitted track candidates from **Apache Parquet** into plain [`Track`]
//! values. The reader validates the schema once, projects only the columns used by the
//! analysis, and downcasts every column once per record batch.
//!
//! ## Expected Parquet Schema
//! -----------------
//! One row per track. Scalar leaf columns:
//! - `event_id: UInt32`, `track_id: Int32`, `ndf: Int32`
//! - `chi2: Float64`, `matching_degree: Float64`
//!
//! Vector columns are `List<Float64>`:
//! - 3-vectors (exactly 3 values): `vertex`, `vertex_truth`, `vertex_error`,
//!   `ip_momentum_error`
//! - Lorentz vectors (exactly 4 values, `px, py, pz, E`): `ip_momentum`, `ip_momentum_truth`
//! - hit, residual and pull sequences (`3·n` values, flattened `x, y, z` per hit): see
//!   [`HIT_COLUMNS`].
//!
//! ## Error Policy
//! -----------------
//! The track table is the input of a single-pass batch computation, so any schema
//! problem is fatal:
//! - a missing column → [`TrackQcError::MissingColumn`],
//! - a type mismatch → [`TrackQcError::InvalidColumnType`],
//! - a null value (row or list element) → [`TrackQcError::NullValue`],
//! - a vector of the wrong length → [`TrackQcError::InvalidVectorLength`].
//!
//! Rows are not required to be grouped by event; grouping happens in
//! [`TrackStore`](crate::tracks::track_store::TrackStore).
use arrow_array::types::{ArrowPrimitiveType, Float64Type, Int32Type, UInt32Type};
use arrow_array::{Array, Float64Array, ListArray, PrimitiveArray, RecordBatch};
use arrow_schema::{DataType, Schema};
use camino::Utf8Path;
use nalgebra::{Vector3, Vector4};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ProjectionMask};

use crate::constants::{Hits, DEFAULT_BATCH_SIZE};
use crate::trackqc_errors::TrackQcError;
use crate::tracks::{LorentzVector, Track};

type HitsField = fn(&mut Track) -> &mut Hits;
type Vector3Field = fn(&mut Track) -> &mut Vector3<f64>;
type LorentzField = fn(&mut Track) -> &mut LorentzVector;

const UINT32_COLUMNS: [&str; 1] = ["event_id"];
const INT32_COLUMNS: [&str; 2] = ["track_id", "ndf"];
const FLOAT64_COLUMNS: [&str; 2] = ["chi2", "matching_degree"];

/// Hit, residual and pull sequences, flattened as `x, y, z` triplets.
pub const HIT_COLUMNS: [(&str, HitsField); 17] = [
    ("true_track_hits", |t| &mut t.true_track_hits),
    ("track_hits", |t| &mut t.track_hits),
    ("predicted_track_hits", |t| &mut t.predicted_track_hits),
    ("filtered_track_hits", |t| &mut t.filtered_track_hits),
    ("smoothed_track_hits", |t| &mut t.smoothed_track_hits),
    ("true_predicted_residuals", |t| &mut t.true_predicted_residuals),
    ("true_filtered_residuals", |t| &mut t.true_filtered_residuals),
    ("true_smoothed_residuals", |t| &mut t.true_smoothed_residuals),
    ("predicted_residuals", |t| &mut t.predicted_residuals),
    ("filtered_residuals", |t| &mut t.filtered_residuals),
    ("smoothed_residuals", |t| &mut t.smoothed_residuals),
    ("true_predicted_pulls", |t| &mut t.true_predicted_pulls),
    ("true_filtered_pulls", |t| &mut t.true_filtered_pulls),
    ("true_smoothed_pulls", |t| &mut t.true_smoothed_pulls),
    ("predicted_pulls", |t| &mut t.predicted_pulls),
    ("filtered_pulls", |t| &mut t.filtered_pulls),
    ("smoothed_pulls", |t| &mut t.smoothed_pulls),
];

/// 3-vector columns, exactly 3 values per row.
pub const VECTOR3_COLUMNS: [(&str, Vector3Field); 4] = [
    ("ip_momentum_error", |t| &mut t.ip_momentum_error),
    ("vertex", |t| &mut t.vertex),
    ("vertex_truth", |t| &mut t.vertex_truth),
    ("vertex_error", |t| &mut t.vertex_error),
];

/// Lorentz-vector columns, exactly 4 values `(px, py, pz, E)` per row.
pub const LORENTZ_COLUMNS: [(&str, LorentzField); 2] = [
    ("ip_momentum", |t| &mut t.ip_momentum),
    ("ip_momentum_truth", |t| &mut t.ip_momentum_truth),
];

/// Names of every column read by [`parquet_to_tracks`], in schema-check order.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    UINT32_COLUMNS
        .into_iter()
        .chain(INT32_COLUMNS)
        .chain(FLOAT64_COLUMNS)
        .chain(VECTOR3_COLUMNS.iter().map(|(name, _)| *name))
        .chain(LORENTZ_COLUMNS.iter().map(|(name, _)| *name))
        .chain(HIT_COLUMNS.iter().map(|(name, _)| *name))
}

/// Load every track of a Parquet file.
///
/// Arguments
/// -----------------
/// * `parquet` – Path to the input Parquet file (schema in the module docs).
/// * `batch_size` – Optional Arrow reader batch size (default: 8192 rows).
///
/// Return
/// ----------
/// * The tracks in file order, with cleared deduplication flags.
pub(crate) fn parquet_to_tracks(
    parquet: &Utf8Path,
    batch_size: Option<usize>,
) -> Result<Vec<Track>, TrackQcError> {
    let file = std::fs::File::open(parquet)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    check_schema(builder.schema())?;

    let projection_indices: Vec<usize> = required_columns()
        .map(|name| {
            builder
                .schema()
                .index_of(name)
                .map_err(|_| TrackQcError::MissingColumn(name.to_string()))
        })
        .collect::<Result<_, _>>()?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), projection_indices);

    let reader = builder
        .with_projection(mask)
        .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let mut tracks = Vec::new();
    let mut row_offset = 0;
    for maybe_batch in reader {
        let batch = maybe_batch?;
        read_batch(&batch, row_offset, &mut tracks)?;
        row_offset += batch.num_rows();
    }

    log::debug!("Read {} track rows from {parquet}", tracks.len());
    Ok(tracks)
}

/// Validate names and types of every required column against the Arrow schema.
fn check_schema(schema: &Schema) -> Result<(), TrackQcError> {
    let expect = |name: &str,
                  ok: fn(&DataType) -> bool,
                  expected: &str|
     -> Result<(), TrackQcError> {
        let field = schema
            .field_with_name(name)
            .map_err(|_| TrackQcError::MissingColumn(name.to_string()))?;
        if ok(field.data_type()) {
            Ok(())
        } else {
            Err(TrackQcError::InvalidColumnType {
                column: name.to_string(),
                expected: expected.to_string(),
            })
        }
    };

    for name in UINT32_COLUMNS {
        expect(name, |dt| *dt == DataType::UInt32, "UInt32")?;
    }
    for name in INT32_COLUMNS {
        expect(name, |dt| *dt == DataType::Int32, "Int32")?;
    }
    for name in FLOAT64_COLUMNS {
        expect(name, |dt| *dt == DataType::Float64, "Float64")?;
    }
    let vector_columns = VECTOR3_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .chain(LORENTZ_COLUMNS.iter().map(|(name, _)| *name))
        .chain(HIT_COLUMNS.iter().map(|(name, _)| *name));
    for name in vector_columns {
        expect(name, is_float64_list, "List<Float64>")?;
    }
    Ok(())
}

fn is_float64_list(data_type: &DataType) -> bool {
    matches!(data_type, DataType::List(item) if *item.data_type() == DataType::Float64)
}

/// Typed view over one `List<Float64>` column of a batch.
struct ListColumn<'a> {
    name: &'static str,
    list: &'a ListArray,
    values: &'a Float64Array,
}

impl<'a> ListColumn<'a> {
    fn new(batch: &'a RecordBatch, name: &'static str) -> Result<Self, TrackQcError> {
        let list: &ListArray = column(batch, name, "List<Float64>")?;
        let values = list
            .values()
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| TrackQcError::InvalidColumnType {
                column: name.to_string(),
                expected: "List<Float64>".to_string(),
            })?;
        Ok(Self { name, list, values })
    }

    /// Values of one row; `row` is local to the batch, `file_row` is used in errors.
    fn row(&self, row: usize, file_row: usize) -> Result<&'a [f64], TrackQcError> {
        let null = || TrackQcError::NullValue {
            column: self.name.to_string(),
            row: file_row,
        };
        if self.list.is_null(row) {
            return Err(null());
        }
        let offsets = self.list.value_offsets();
        let (start, end) = (offsets[row] as usize, offsets[row + 1] as usize);
        if self.values.null_count() > 0 && (start..end).any(|j| self.values.is_null(j)) {
            return Err(null());
        }
        let values: &'a [f64] = self.values.values();
        Ok(&values[start..end])
    }

    fn bad_length(&self, file_row: usize, len: usize, expected: &str) -> TrackQcError {
        TrackQcError::InvalidVectorLength {
            column: self.name.to_string(),
            row: file_row,
            len,
            expected: expected.to_string(),
        }
    }

    fn vector3(&self, row: usize, file_row: usize) -> Result<Vector3<f64>, TrackQcError> {
        match self.row(row, file_row)? {
            [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
            other => Err(self.bad_length(file_row, other.len(), "3")),
        }
    }

    fn lorentz(&self, row: usize, file_row: usize) -> Result<LorentzVector, TrackQcError> {
        match self.row(row, file_row)? {
            [px, py, pz, e] => Ok(Vector4::new(*px, *py, *pz, *e)),
            other => Err(self.bad_length(file_row, other.len(), "4")),
        }
    }

    fn hits(&self, row: usize, file_row: usize) -> Result<Hits, TrackQcError> {
        let values = self.row(row, file_row)?;
        if values.len() % 3 != 0 {
            return Err(self.bad_length(file_row, values.len(), "a multiple of 3"));
        }
        Ok(values
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect())
    }
}

fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    expected: &str,
) -> Result<&'a A, TrackQcError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| TrackQcError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| TrackQcError::InvalidColumnType {
            column: name.to_string(),
            expected: expected.to_string(),
        })
}

fn scalar<T: ArrowPrimitiveType>(
    array: &PrimitiveArray<T>,
    name: &str,
    row: usize,
    file_row: usize,
) -> Result<T::Native, TrackQcError> {
    if array.is_null(row) {
        return Err(TrackQcError::NullValue {
            column: name.to_string(),
            row: file_row,
        });
    }
    Ok(array.value(row))
}

fn list_columns<'a, F: Copy>(
    batch: &'a RecordBatch,
    columns: &[(&'static str, F)],
) -> Result<Vec<(ListColumn<'a>, F)>, TrackQcError> {
    let mut views = Vec::with_capacity(columns.len());
    for (name, field) in columns {
        views.push((ListColumn::new(batch, *name)?, *field));
    }
    Ok(views)
}

/// Decode one record batch and append its tracks.
fn read_batch(
    batch: &RecordBatch,
    row_offset: usize,
    tracks: &mut Vec<Track>,
) -> Result<(), TrackQcError> {
    // Downcast once per batch, reuse typed views in the row loop.
    let event_id: &PrimitiveArray<UInt32Type> = column(batch, "event_id", "UInt32")?;
    let track_id: &PrimitiveArray<Int32Type> = column(batch, "track_id", "Int32")?;
    let ndf: &PrimitiveArray<Int32Type> = column(batch, "ndf", "Int32")?;
    let chi2: &PrimitiveArray<Float64Type> = column(batch, "chi2", "Float64")?;
    let matching_degree: &PrimitiveArray<Float64Type> =
        column(batch, "matching_degree", "Float64")?;

    let vector3_columns = list_columns(batch, &VECTOR3_COLUMNS)?;
    let lorentz_columns = list_columns(batch, &LORENTZ_COLUMNS)?;
    let hit_columns = list_columns(batch, &HIT_COLUMNS)?;

    tracks.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let file_row = row_offset + row;

        let mut track = Track {
            event_id: scalar(event_id, "event_id", row, file_row)?,
            track_id: scalar(track_id, "track_id", row, file_row)?,
            ndf: scalar(ndf, "ndf", row, file_row)?,
            chi2: scalar(chi2, "chi2", row, file_row)?,
            matching_degree: scalar(matching_degree, "matching_degree", row, file_row)?,
            ..Default::default()
        };

        for (col, field) in &vector3_columns {
            *field(&mut track) = col.vector3(row, file_row)?;
        }
        for (col, field) in &lorentz_columns {
            *field(&mut track) = col.lorentz(row, file_row)?;
        }
        for (col, field) in &hit_columns {
            *field(&mut track) = col.hits(row, file_row)?;
        }

        tracks.push(track);
    }
    Ok(())
}
