//! Host-side planner for radix sort and radix-select launches
//!
//! The planner validates a request and fixes everything the workers need
//! before they start: tile size, tiles per row, how many rows run at once,
//! how many workers share a row, how many digit passes run, the width of the
//! look-back records and carried indices, and the workspace size.

use super::config::{ScanStrategy, TilingConfig};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::normalize_dim;
use crate::tensor::Shape;
use std::ops::Range;
use tracing::debug;

/// Number of bins of one 8-bit digit
pub const BIN_NUM: usize = 256;

/// Smallest tile the utilization adjustment will produce
pub const SMALL_TILE_ELEMS: usize = 1024;

/// Scratchpad bytes kept back for histograms and bookkeeping
pub const RESERVED_SCRATCH_BYTES: usize = 16 * 1024;

/// Largest count a narrow (32-bit) record can hold
pub const NARROW_RECORD_MAX: usize = (1 << 30) - 1;

/// Per-element scratch besides the key, with 32-bit carried indices
const NARROW_INDEX_SCRATCH: usize = 10;

/// Per-element scratch besides the key, with 64-bit carried indices
const WIDE_INDEX_SCRATCH: usize = 14;

/// How rows are mapped onto workers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Each row fits one tile and is sorted by a single worker.
    SingleTile,
    /// Rows are split into tiles shared by several workers, with a
    /// cross-tile scan per digit pass.
    MultiTile,
}

/// Width of a packed look-back record word
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordWidth {
    /// 32-bit word, 30-bit value
    Narrow,
    /// 64-bit word, 62-bit value
    Wide,
}

/// Width of the carried index stream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    /// `u32` indices
    Narrow,
    /// `u64` indices
    Wide,
}

impl IndexWidth {
    /// Bytes per carried index
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Narrow => 4,
            Self::Wide => 8,
        }
    }
}

impl RecordWidth {
    /// Bytes per record word
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Narrow => 4,
            Self::Wide => 8,
        }
    }
}

/// Shapes and dtypes of caller-provided outputs
#[derive(Clone, Debug)]
pub struct OutputSpec {
    /// Shape of the values output
    pub values_shape: Shape,
    /// Dtype of the values output
    pub values_dtype: DType,
    /// Shape of the indices output
    pub indices_shape: Shape,
    /// Dtype of the indices output
    pub indices_dtype: DType,
}

/// Shape and dtype of caller-supplied starting indices
///
/// Preset indices are carried through the sort in place of positions, so
/// they come back permuted like the keys.
#[derive(Clone, Debug)]
pub struct PresetIndices {
    /// Shape of the preset indices
    pub shape: Shape,
    /// Dtype of the preset indices
    pub dtype: DType,
}

/// A full sort request along one dimension
#[derive(Clone, Debug)]
pub struct SortRequest {
    /// Input shape
    pub shape: Shape,
    /// Dimension to sort (negative counts from the end)
    pub dim: isize,
    /// Key dtype
    pub dtype: DType,
    /// Dtype of the returned indices
    pub index_dtype: DType,
    /// Sort in descending order
    pub descending: bool,
    /// Caller-provided outputs to validate against
    pub outputs: Option<OutputSpec>,
    /// Caller-supplied starting indices
    pub presets: Option<PresetIndices>,
}

impl SortRequest {
    /// Ascending sort of the last dimension with I64 indices
    pub fn new(shape: &[usize], dtype: DType) -> Self {
        Self {
            shape: Shape::from(shape),
            dim: -1,
            dtype,
            index_dtype: DType::I64,
            descending: false,
            outputs: None,
            presets: None,
        }
    }

    /// Set the dimension
    pub fn dim(mut self, dim: isize) -> Self {
        self.dim = dim;
        self
    }

    /// Set the order
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Set the index dtype
    pub fn index_dtype(mut self, index_dtype: DType) -> Self {
        self.index_dtype = index_dtype;
        self
    }

    /// Attach caller-provided outputs
    pub fn outputs(mut self, outputs: OutputSpec) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Carry caller-supplied indices instead of positions
    pub fn presets(mut self, presets: PresetIndices) -> Self {
        self.presets = Some(presets);
        self
    }
}

/// A top-k request along one dimension
#[derive(Clone, Debug)]
pub struct TopkRequest {
    /// Input shape
    pub shape: Shape,
    /// Dimension to select along (negative counts from the end)
    pub dim: isize,
    /// Key dtype
    pub dtype: DType,
    /// Dtype of the returned indices
    pub index_dtype: DType,
    /// Number of elements to select
    pub k: usize,
    /// Select the largest (true) or smallest (false) keys
    pub largest: bool,
    /// Order the selected keys
    pub sorted: bool,
}

impl TopkRequest {
    /// Top-k of the last dimension: largest, sorted, I64 indices
    pub fn new(shape: &[usize], dtype: DType, k: usize) -> Self {
        Self {
            shape: Shape::from(shape),
            dim: -1,
            dtype,
            index_dtype: DType::I64,
            k,
            largest: true,
            sorted: true,
        }
    }

    /// Set the dimension
    pub fn dim(mut self, dim: isize) -> Self {
        self.dim = dim;
        self
    }

    /// Select largest or smallest keys
    pub fn largest(mut self, largest: bool) -> Self {
        self.largest = largest;
        self
    }

    /// Order the result
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Set the index dtype
    pub fn index_dtype(mut self, index_dtype: DType) -> Self {
        self.index_dtype = index_dtype;
        self
    }
}

/// Execution plan of one radix launch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortPlan {
    /// Number of independent rows
    pub rows: usize,
    /// Length of the sort axis
    pub axis: usize,
    /// Key dtype
    pub dtype: DType,
    /// Output index dtype
    pub index_dtype: DType,
    /// Descending key order
    pub descending: bool,
    /// Elements per tile
    pub tile_elems: usize,
    /// Tiles per row
    pub tiles_per_row: usize,
    /// Rows processed concurrently
    pub rows_in_flight: usize,
    /// Workers sharing one row
    pub workers_per_row: usize,
    /// Rounds needed to cover every row
    pub row_rounds: usize,
    /// Workers of the launch
    pub workers: usize,
    /// Digit passes (key bytes)
    pub passes: usize,
    /// Look-back record width
    pub record_width: RecordWidth,
    /// Carried index width
    pub index_width: IndexWidth,
    /// Row-to-worker mapping
    pub schedule: Schedule,
    /// Cross-tile scan strategy
    pub scan: ScanStrategy,
}

impl SortPlan {
    /// Element range of `tile` within a row
    #[inline]
    pub fn tile_range(&self, tile: usize) -> Range<usize> {
        let start = tile * self.tile_elems;
        start..(start + self.tile_elems).min(self.axis)
    }

    /// Tiles served by lane `lane` of a row, in ascending order
    pub fn lane_tiles(&self, lane: usize) -> impl Iterator<Item = usize> + use<> {
        (lane..self.tiles_per_row).step_by(self.workers_per_row.max(1))
    }

    /// Row handled by `slot` during `round`, if any
    #[inline]
    pub fn row_of(&self, round: usize, slot: usize) -> Option<usize> {
        let row = round * self.rows_in_flight + slot;
        (row < self.rows).then_some(row)
    }

    /// Bytes of scratch the launch needs
    ///
    /// Per row slot: two record regions of `tiles × 256` words, two regions
    /// of 256 row totals, and a ping-pong pair of key and index buffers.
    pub fn workspace_bytes(&self) -> usize {
        let key_bytes = self.dtype.size_in_bytes();
        let index_bytes = self.index_width.size_in_bytes();
        let streams = 2 * self.axis * (key_bytes + index_bytes);
        let per_slot = match self.schedule {
            Schedule::SingleTile => streams,
            Schedule::MultiTile => {
                let records =
                    2 * self.tiles_per_row * BIN_NUM * self.record_width.size_in_bytes();
                let totals = 2 * BIN_NUM * std::mem::size_of::<u64>();
                records + totals + streams
            }
        };
        per_slot * self.rows_in_flight
    }
}

/// Execution plan of a radix-select launch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopkPlan {
    /// Tiling of the input rows
    pub base: SortPlan,
    /// Elements selected per row, clamped to the axis length
    pub k: usize,
    /// Select the largest keys
    pub largest: bool,
    /// Order the selected keys
    pub sorted: bool,
}

impl TopkPlan {
    /// Bytes of scratch the launch needs
    ///
    /// Selection never scatters, so it needs one key buffer, the row
    /// histograms, and a 2-bin record region for the final gather.
    pub fn workspace_bytes(&self) -> usize {
        let base = &self.base;
        let keys = base.axis * base.dtype.size_in_bytes();
        let totals = 2 * BIN_NUM * std::mem::size_of::<u64>();
        let records = base.tiles_per_row * 2 * base.record_width.size_in_bytes();
        (keys + totals + records) * base.rows_in_flight
    }

    /// Output shape: the input shape with the last dimension set to `k`
    ///
    /// A 0-d input keeps its shape, or becomes `[0]` when nothing is selected.
    pub fn out_shape(&self, input: &Shape) -> Shape {
        if input.ndim() == 0 && self.k == 0 {
            return Shape::from([0]);
        }
        input.with_last(self.k)
    }
}

/// Validate a sort request and compute its plan
///
/// A 0-d input sorts as one row of one element.
pub fn plan_sort(request: &SortRequest, config: &TilingConfig) -> Result<SortPlan> {
    config.validate()?;
    check_axis(&request.shape, request.dim)?;
    check_nonempty("sort", &request.shape)?;
    check_key_dtype(request.dtype, "sort")?;
    let (rows, axis) = request.shape.rows_and_axis();
    check_index_dtype(request.index_dtype, axis, "sort")?;

    if let Some(outputs) = &request.outputs {
        if outputs.values_shape != request.shape {
            return Err(Error::shape_mismatch(&request.shape, &outputs.values_shape));
        }
        if outputs.indices_shape != request.shape {
            return Err(Error::shape_mismatch(&request.shape, &outputs.indices_shape));
        }
        if outputs.values_dtype != request.dtype {
            return Err(Error::DTypeMismatch {
                lhs: request.dtype,
                rhs: outputs.values_dtype,
            });
        }
        if outputs.indices_dtype != request.index_dtype {
            return Err(Error::DTypeMismatch {
                lhs: request.index_dtype,
                rhs: outputs.indices_dtype,
            });
        }
    }

    // Presets are carried at their own width so every value comes back intact.
    let mut carried = None;
    if let Some(presets) = &request.presets {
        if presets.shape != request.shape {
            return Err(Error::shape_mismatch(&request.shape, &presets.shape));
        }
        check_index_dtype(presets.dtype, axis, "sort_with_preset_indices")?;
        if presets.dtype != request.index_dtype {
            return Err(Error::DTypeMismatch {
                lhs: request.index_dtype,
                rhs: presets.dtype,
            });
        }
        carried = Some(match presets.dtype {
            DType::I32 => IndexWidth::Narrow,
            _ => IndexWidth::Wide,
        });
    }

    let plan = build_plan(
        rows,
        axis,
        request.dtype,
        request.index_dtype,
        request.descending,
        carried,
        config,
    );
    debug!(
        rows = plan.rows,
        axis = plan.axis,
        dtype = %plan.dtype,
        schedule = ?plan.schedule,
        tile_elems = plan.tile_elems,
        tiles_per_row = plan.tiles_per_row,
        workers = plan.workers,
        rows_in_flight = plan.rows_in_flight,
        workspace_bytes = plan.workspace_bytes(),
        "planned radix sort"
    );
    Ok(plan)
}

/// Validate a top-k request and compute its plan
///
/// `k` larger than the axis is clamped to the axis length.
pub fn plan_topk(request: &TopkRequest, config: &TilingConfig) -> Result<TopkPlan> {
    config.validate()?;
    check_axis(&request.shape, request.dim)?;
    check_nonempty("topk", &request.shape)?;
    check_key_dtype(request.dtype, "topk")?;
    let (rows, axis) = request.shape.rows_and_axis();
    check_index_dtype(request.index_dtype, axis, "topk")?;

    // Largest-first selection is smallest-first selection of descending keys.
    let base = build_plan(
        rows,
        axis,
        request.dtype,
        request.index_dtype,
        request.largest,
        None,
        config,
    );
    let plan = TopkPlan {
        k: request.k.min(axis),
        largest: request.largest,
        sorted: request.sorted,
        base,
    };
    debug!(
        rows = plan.base.rows,
        axis = plan.base.axis,
        k = plan.k,
        largest = plan.largest,
        sorted = plan.sorted,
        schedule = ?plan.base.schedule,
        tile_elems = plan.base.tile_elems,
        workers = plan.base.workers,
        workspace_bytes = plan.workspace_bytes(),
        "planned radix select"
    );
    Ok(plan)
}

/// Plan for sorting already-validated rows, used to order top-k results
pub(crate) fn plan_rows(
    rows: usize,
    axis: usize,
    dtype: DType,
    index_dtype: DType,
    descending: bool,
    config: &TilingConfig,
) -> SortPlan {
    build_plan(rows, axis, dtype, index_dtype, descending, None, config)
}

fn check_axis(shape: &Shape, dim: isize) -> Result<()> {
    let ndim = shape.ndim().max(1);
    let dim = normalize_dim(dim, ndim)?;
    if dim != ndim - 1 {
        return Err(Error::UnsupportedAxis { dim, ndim });
    }
    Ok(())
}

fn check_nonempty(op: &'static str, shape: &Shape) -> Result<()> {
    if shape.numel() == 0 {
        return Err(Error::empty_input(op, shape));
    }
    Ok(())
}

fn check_key_dtype(dtype: DType, op: &'static str) -> Result<()> {
    if !dtype.is_sortable() {
        return Err(Error::unsupported_dtype(dtype, op));
    }
    Ok(())
}

fn check_index_dtype(index_dtype: DType, axis: usize, op: &'static str) -> Result<()> {
    if !index_dtype.is_index() {
        return Err(Error::unsupported_dtype(index_dtype, op));
    }
    if index_dtype == DType::I32 && axis > i32::MAX as usize {
        return Err(Error::invalid_argument(
            "index_dtype",
            format!("axis of length {axis} does not fit I32 indices"),
        ));
    }
    Ok(())
}

/// Tile size the scratchpad budget allows, a multiple of [`BIN_NUM`]
fn scratch_tile_elems(config: &TilingConfig, key_bytes: usize, index_width: IndexWidth) -> usize {
    let extra = match index_width {
        IndexWidth::Narrow => NARROW_INDEX_SCRATCH,
        IndexWidth::Wide => WIDE_INDEX_SCRATCH,
    };
    let usable = config
        .scratchpad_bytes
        .saturating_sub(RESERVED_SCRATCH_BYTES);
    let elems = usable / (key_bytes + extra);
    (elems / BIN_NUM * BIN_NUM).max(BIN_NUM)
}

fn build_plan(
    rows: usize,
    axis: usize,
    dtype: DType,
    index_dtype: DType,
    descending: bool,
    carried: Option<IndexWidth>,
    config: &TilingConfig,
) -> SortPlan {
    let index_width = match carried {
        Some(width) => width,
        None if axis <= i32::MAX as usize => IndexWidth::Narrow,
        None => IndexWidth::Wide,
    };
    let record_width = if axis <= NARROW_RECORD_MAX {
        RecordWidth::Narrow
    } else {
        RecordWidth::Wide
    };

    let tile_elems = match config.tile_elems {
        Some(tile) => tile,
        None => {
            let scratch = scratch_tile_elems(config, dtype.size_in_bytes(), index_width);
            utilization_tile(rows, axis, scratch, config.workers)
        }
    };
    let tiles_per_row = axis.div_ceil(tile_elems);

    let (schedule, rows_in_flight, workers_per_row) = if tiles_per_row == 1 {
        (Schedule::SingleTile, config.workers.min(rows), 1)
    } else {
        let workers_per_row = config.workers.min(tiles_per_row);
        let rows_in_flight = if config.workers <= tiles_per_row {
            1
        } else {
            (config.workers / tiles_per_row).min(rows).max(1)
        };
        (Schedule::MultiTile, rows_in_flight, workers_per_row)
    };

    SortPlan {
        rows,
        axis,
        dtype,
        index_dtype,
        descending,
        tile_elems,
        tiles_per_row,
        rows_in_flight,
        workers_per_row,
        row_rounds: rows.div_ceil(rows_in_flight),
        workers: rows_in_flight * workers_per_row,
        passes: dtype.radix_passes(),
        record_width,
        index_width,
        schedule,
        scan: config.scan,
    }
}

/// Shrink the tile when too few tiles would leave workers idle
///
/// Rows short enough for one small tile stay whole. Otherwise, when
/// `rows × tiles` is below the worker count, each row is spread over its
/// share of the workers, in tiles of at least [`SMALL_TILE_ELEMS`].
fn utilization_tile(rows: usize, axis: usize, scratch_tile: usize, workers: usize) -> usize {
    let tiles = axis.div_ceil(scratch_tile);
    if tiles == 1 && axis <= SMALL_TILE_ELEMS {
        return scratch_tile;
    }
    if rows.saturating_mul(tiles) >= workers {
        return scratch_tile;
    }
    let per_row = (workers / rows).max(1);
    let spread = axis
        .div_ceil(per_row)
        .next_multiple_of(BIN_NUM)
        .max(SMALL_TILE_ELEMS);
    spread.min(scratch_tile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize) -> TilingConfig {
        TilingConfig::default().with_workers(workers)
    }

    #[test]
    fn test_scratch_tile_is_bin_aligned() {
        let cfg = config(1);
        let tile = scratch_tile_elems(&cfg, 4, IndexWidth::Narrow);
        assert_eq!(tile % BIN_NUM, 0);
        // (192 KiB - 16 KiB) / 14 = 12873 -> 12800
        assert_eq!(tile, 12800);

        let tiny = TilingConfig::default().with_scratchpad_bytes(1024);
        assert_eq!(scratch_tile_elems(&tiny, 8, IndexWidth::Wide), BIN_NUM);
    }

    #[test]
    fn test_small_row_is_single_tile() {
        let plan = plan_sort(&SortRequest::new(&[10], DType::I32), &config(8)).unwrap();
        assert_eq!(plan.schedule, Schedule::SingleTile);
        assert_eq!(plan.tiles_per_row, 1);
        assert_eq!(plan.rows_in_flight, 1);
        assert_eq!(plan.workers, 1);
        assert_eq!(plan.passes, 4);
    }

    #[test]
    fn test_explicit_tile_override() {
        let cfg = config(2).with_tile_elems(4);
        let plan = plan_sort(&SortRequest::new(&[10], DType::I32), &cfg).unwrap();
        assert_eq!(plan.schedule, Schedule::MultiTile);
        assert_eq!(plan.tile_elems, 4);
        assert_eq!(plan.tiles_per_row, 3);
        assert_eq!(plan.workers_per_row, 2);
        assert_eq!(plan.rows_in_flight, 1);
        assert_eq!(plan.tile_range(2), 8..10);
        assert_eq!(plan.lane_tiles(0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(plan.lane_tiles(1).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_utilization_spreads_single_row() {
        // One row of 20000 fits two scratch tiles; eight workers would idle,
        // so the tile shrinks to ceil(20000 / 8) rounded up to 256.
        let plan = plan_sort(&SortRequest::new(&[20000], DType::F32), &config(8)).unwrap();
        assert_eq!(plan.tile_elems, 2560);
        assert_eq!(plan.tiles_per_row, 8);
        assert_eq!(plan.workers, 8);
    }

    #[test]
    fn test_utilization_keeps_minimum_tile() {
        let plan = plan_sort(&SortRequest::new(&[2000], DType::I32), &config(8)).unwrap();
        assert_eq!(plan.tile_elems, SMALL_TILE_ELEMS);
        assert_eq!(plan.tiles_per_row, 2);
        assert_eq!(plan.workers_per_row, 2);
        assert_eq!(plan.rows_in_flight, 1);
    }

    #[test]
    fn test_rows_share_workers() {
        let plan = plan_sort(&SortRequest::new(&[4, 2000], DType::I32), &config(8)).unwrap();
        assert_eq!(plan.tiles_per_row, 2);
        assert_eq!(plan.workers_per_row, 2);
        assert_eq!(plan.rows_in_flight, 4);
        assert_eq!(plan.row_rounds, 1);
        assert_eq!(plan.workers, 8);
    }

    #[test]
    fn test_row_rounds() {
        let cfg = config(4).with_tile_elems(256);
        let plan = plan_sort(&SortRequest::new(&[7, 512], DType::U16), &cfg).unwrap();
        assert_eq!(plan.tiles_per_row, 2);
        assert_eq!(plan.rows_in_flight, 2);
        assert_eq!(plan.row_rounds, 4);
        assert_eq!(plan.row_of(3, 0), Some(6));
        assert_eq!(plan.row_of(3, 1), None);
    }

    #[test]
    fn test_widths() {
        let plan = plan_sort(&SortRequest::new(&[64], DType::U8), &config(1)).unwrap();
        assert_eq!(plan.record_width, RecordWidth::Narrow);
        assert_eq!(plan.index_width, IndexWidth::Narrow);
        assert_eq!(plan.passes, 1);
    }

    #[test]
    fn test_workspace_bytes() {
        let cfg = config(2).with_tile_elems(4);
        let plan = plan_sort(&SortRequest::new(&[10], DType::I32), &cfg).unwrap();
        let records = 2 * 3 * BIN_NUM * 4;
        let totals = 2 * BIN_NUM * 8;
        let streams = 2 * 10 * (4 + 4);
        assert_eq!(plan.workspace_bytes(), records + totals + streams);
    }

    #[test]
    fn test_rejections() {
        let cfg = config(2);

        let err = plan_sort(&SortRequest::new(&[2, 3], DType::I32).dim(0), &cfg).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAxis { dim: 0, ndim: 2 }));

        let err = plan_sort(&SortRequest::new(&[2, 3], DType::I32).dim(2), &cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { .. }));

        let err = plan_sort(&SortRequest::new(&[4, 0], DType::I32), &cfg).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { op: "sort", .. }));

        let err = plan_sort(&SortRequest::new(&[4], DType::Bool), &cfg).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedDType {
                dtype: DType::Bool,
                ..
            }
        ));

        let err = plan_sort(
            &SortRequest::new(&[4], DType::F32).index_dtype(DType::U32),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedDType {
                dtype: DType::U32,
                ..
            }
        ));
    }

    #[test]
    fn test_output_validation() {
        let cfg = config(2);
        let outputs = OutputSpec {
            values_shape: Shape::from([4]),
            values_dtype: DType::F64,
            indices_shape: Shape::from([4]),
            indices_dtype: DType::I64,
        };
        let err = plan_sort(
            &SortRequest::new(&[4], DType::F32).outputs(outputs.clone()),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DTypeMismatch { .. }));

        let err = plan_sort(
            &SortRequest::new(&[5], DType::F64).outputs(outputs.clone()),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        assert!(plan_sort(&SortRequest::new(&[4], DType::F64).outputs(outputs), &cfg).is_ok());
    }

    #[test]
    fn test_scalar_is_one_element_row() {
        let cfg = config(2);
        let plan = plan_sort(&SortRequest::new(&[], DType::F32).dim(0), &cfg).unwrap();
        assert_eq!((plan.rows, plan.axis), (1, 1));
        assert_eq!(plan.schedule, Schedule::SingleTile);

        let err = plan_sort(&SortRequest::new(&[], DType::F32).dim(7), &cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { dim: 7, ndim: 1 }));

        let err = plan_sort(&SortRequest::new(&[], DType::Bool), &cfg).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedDType {
                dtype: DType::Bool,
                ..
            }
        ));

        let scalar = Shape::from(Vec::new());
        let plan = plan_topk(&TopkRequest::new(&[], DType::U8, 3), &cfg).unwrap();
        assert_eq!(plan.k, 1);
        assert!(plan.out_shape(&scalar).is_empty());
        let plan = plan_topk(&TopkRequest::new(&[], DType::U8, 0), &cfg).unwrap();
        assert_eq!(plan.out_shape(&scalar).as_slice(), &[0]);
    }

    #[test]
    fn test_presets_set_carried_width() {
        let cfg = config(2);
        let presets = |shape: &[usize], dtype| PresetIndices {
            shape: Shape::from(shape),
            dtype,
        };

        let request = SortRequest::new(&[3, 8], DType::U16)
            .index_dtype(DType::I64)
            .presets(presets(&[3, 8], DType::I64));
        assert_eq!(plan_sort(&request, &cfg).unwrap().index_width, IndexWidth::Wide);

        let request = SortRequest::new(&[3, 8], DType::U16)
            .index_dtype(DType::I32)
            .presets(presets(&[3, 8], DType::I32));
        assert_eq!(plan_sort(&request, &cfg).unwrap().index_width, IndexWidth::Narrow);

        let request = SortRequest::new(&[3, 8], DType::U16).presets(presets(&[8], DType::I64));
        assert!(matches!(
            plan_sort(&request, &cfg).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));

        let request = SortRequest::new(&[8], DType::U16).presets(presets(&[8], DType::U32));
        assert!(matches!(
            plan_sort(&request, &cfg).unwrap_err(),
            Error::UnsupportedDType {
                dtype: DType::U32,
                ..
            }
        ));

        let request = SortRequest::new(&[8], DType::U16).presets(presets(&[8], DType::I32));
        assert!(matches!(
            plan_sort(&request, &cfg).unwrap_err(),
            Error::DTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_topk_clamps_k() {
        let plan = plan_topk(&TopkRequest::new(&[3, 10], DType::I32, 25), &config(2)).unwrap();
        assert_eq!(plan.k, 10);
        assert!(plan.base.descending);
        assert_eq!(plan.out_shape(&Shape::from([3, 10])).as_slice(), &[3, 10]);

        let plan = plan_topk(
            &TopkRequest::new(&[10], DType::I32, 3).largest(false),
            &config(2),
        )
        .unwrap();
        assert_eq!(plan.k, 3);
        assert!(!plan.base.descending);
    }
}
