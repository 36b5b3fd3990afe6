//! camon - live performance monitor for compiler trace events
//!
//! This library aggregates timing events for source generator invocations,
//! server compilations and workspace operation blocks, and renders them as a
//! sortable live table, one-shot reports and CSV exports.

pub mod blocks;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod filter;
pub mod interval;
pub mod invocation;
pub mod live;
pub mod name_table;
pub mod projector;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod table;
pub mod trace_event;
