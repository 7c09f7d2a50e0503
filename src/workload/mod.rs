//! Workload traces: reading, placeholder expansion, compilation and
//! distribution across client workers.

mod partition;
mod trace;

pub use partition::partition_round_robin;
pub use trace::{
    compile_trace, expand_placeholder, filler_value, list_workloads, query_lines, read_trace,
    trace_paths, TraceLine, Workload, WorkloadError, WorkloadResult, LOAD_SUFFIX, PLACEHOLDER,
    RUN_SUFFIX,
};
