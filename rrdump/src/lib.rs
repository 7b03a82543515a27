//! # rrdump
//!
//! Typed decoder for the XML dumps produced by `rrdtool dump`.
//!
//! rrdtool stores round-robin time series in a binary file whose layout is
//! platform-specific; its `dump` command is the portable way to read one.
//! This crate turns that dump into an [`Archive`] of plain Rust records, with
//! padded scalars trimmed, timestamps and durations given real types, and
//! unknown samples represented as NaN instead of failing the decode.
//!
//! ## Quick Start
//!
//! ```rust
//! use rrdump::{Archive, ConsolidationFn};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dump = br#"<?xml version="1.0" encoding="utf-8"?>
//! <rrd>
//!   <version>0003</version>
//!   <step>300</step>
//!   <lastupdate>1700000000</lastupdate>
//!   <ds>
//!     <name> load </name>
//!     <type> GAUGE </type>
//!     <minimal_heartbeat>600</minimal_heartbeat>
//!     <min>0.0000000000e+00</min>
//!     <max>NaN</max>
//!     <last_ds>1</last_ds>
//!     <value>0.0000000000e+00</value>
//!     <unknown_sec> 0 </unknown_sec>
//!   </ds>
//!   <rra>
//!     <cf>AVERAGE</cf>
//!     <pdp_per_row>1</pdp_per_row>
//!     <params><xff>5.0000000000e-01</xff></params>
//!     <cdp_prep>
//!       <ds>
//!         <primary_value>1.5</primary_value>
//!         <secondary_value>NaN</secondary_value>
//!         <value>NaN</value>
//!         <unknown_datapoints>0</unknown_datapoints>
//!       </ds>
//!     </cdp_prep>
//!     <database>
//!       <!-- 2023-11-14 22:05:00 UTC / 1699999500 --> <row><v>1.5</v></row>
//!       <!-- 2023-11-14 22:10:00 UTC / 1699999800 --> <row><v>U</v></row>
//!     </database>
//!   </rra>
//! </rrd>"#;
//!
//! let archive = Archive::decode(dump)?;
//! let rra = &archive.archives[0];
//! assert_eq!(rra.consolidation_fn(), Some(ConsolidationFn::Average));
//! assert_eq!(rra.rows[0].get(0).and_then(|v| v.known()), Some(1.5));
//! assert!(rra.rows[1].get(0).is_some_and(|v| v.is_unknown()));
//!
//! // Unknown samples serialize as null.
//! let json = serde_json::to_string(&rra.rows)?;
//! assert_eq!(json, r#"[["1.500000"],[null]]"#);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`decode`](mod@decode) — Structural decoder, the entry point
//! - [`schema`] — Record types: archive, data sources, round-robin archives, rows
//! - [`value`] — NaN-tolerant sample values
//! - [`coerce`] — Text-to-value rules for each field type
//! - [`markup`] — Element-tree construction and well-formedness checks
//! - [`source`] — Running `rrdtool dump` and reading saved dumps
//! - [`error`] — Error types

pub mod coerce;
pub mod decode;
pub mod error;
pub mod markup;
pub mod schema;
pub mod source;
pub mod value;

// Re-export primary API types at crate root for convenience.
pub use decode::decode;
pub use error::{AcquireError, FieldError, Result, RrdError, StructuralError};
pub use schema::{
    Archive, ConsolidationFn, ConsolidationState, DataSource, Params, RoundRobinArchive, Row,
};
pub use source::RrdTool;
pub use value::Value;
