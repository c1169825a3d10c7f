//! Dataset assembly and pipeline orchestration for jaarverslag.
//!
//! This crate ties together collection, name normalization, document
//! fetching, and CSV persistence into per-source runs (`run_source`) and
//! the final merge of per-source tables (`merge_tables`).

pub mod assembler;
pub mod pipeline;
pub mod table;

pub use assembler::{attach_lead_texts, build_records};
pub use pipeline::{ProgressReporter, RunConfig, RunResult, SilentProgress, run_source};
pub use table::{DEFAULT_MERGED_FILE, MergeResult, merge_tables, read_table, table_file_name, write_table};
