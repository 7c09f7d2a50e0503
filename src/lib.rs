//! policy-bench - policy query compiler and controller load generator
//!
//! Layers, leaf first:
//! - `query`: parses predicate-based query lines
//! - `compiler`: rewrites parsed queries into canonical controller commands
//!   and compiles default-policy configs into the setup handshake
//! - `wire`: length-prefixed framing over TCP or a child process
//! - `workload`: trace files, `VAL` expansion, round-robin partitioning
//! - `loadgen`: load phase, concurrent run phase, latency aggregation
//! - `observability`: structured JSON logs, counters, phase scopes
//! - `cli`: command-line front end

pub mod cli;
pub mod compiler;
pub mod loadgen;
pub mod observability;
pub mod query;
pub mod wire;
pub mod workload;
