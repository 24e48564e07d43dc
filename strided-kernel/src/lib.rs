//! Strided iteration driver for native routine dispatch.
//!
//! Native BLAS-style routines accept one `(count, pointer, increment)` triple
//! per operand. This crate plans how an n-dimensional strided shape is cut into
//! such runs and walks the remaining outer dimensions:
//!
//! - [`RunPlan::fused`]: fuse the maximal trailing extent with a uniform stride
//! - [`RunPlan::along_last_axis`]: keep the last axis as the run (reductions)
//! - [`for_each_outer`]: visit every outer index with per-operand offsets
//!
//! # Example
//!
//! ```rust
//! use strided_kernel::RunPlan;
//! use strided_view::{StridedArray, StridedError};
//!
//! let a = StridedArray::<f64>::from_fn_col_major(&[2, 3], |_| 0.0);
//! let plan = RunPlan::fused(a.dims(), &[a.strides()]).unwrap();
//! let mut runs = 0;
//! plan.for_each::<StridedError, _>(|_offsets, len, inner| {
//!     assert_eq!((len, inner[0]), (3, 2));
//!     runs += 1;
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(runs, 2);
//! ```

mod fuse;
mod run;

pub use fuse::{squeeze_unit_dims, trailing_run_rank};
pub use run::{for_each_outer, RunPlan};
