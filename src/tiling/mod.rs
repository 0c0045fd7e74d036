//! Tiling: launch configuration and the host-side planner
//!
//! Every radix launch is described by a [`SortPlan`] (or a [`TopkPlan`])
//! computed here from the request and the device's [`TilingConfig`]. All
//! input validation happens at this stage; the kernels assume a valid plan.

mod config;
mod plan;

pub use config::{DEFAULT_SCRATCHPAD_BYTES, ScanStrategy, TilingConfig};
pub(crate) use plan::plan_rows;
pub use plan::{
    BIN_NUM, IndexWidth, NARROW_RECORD_MAX, OutputSpec, PresetIndices, RESERVED_SCRATCH_BYTES,
    RecordWidth, SMALL_TILE_ELEMS, Schedule, SortPlan, SortRequest, TopkPlan, TopkRequest,
    plan_sort, plan_topk,
};
