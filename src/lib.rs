//! Run-time loaded BLAS and LAPACK bindings for strided n-dimensional arrays.
//!
//! Native libraries are opened at run time and their routines resolved by
//! symbol name on first use. Operands are strided arrays of any rank: vector
//! routines loop over the outer dimensions and hand the longest uniform
//! trailing run to each native call; matrix routines treat the last two
//! dimensions as the matrix and loop over batches.
//!
//! # Layers
//!
//! - [`option`]: normalization of loose caller options (`"T"`, `true`, `112`)
//!   into closed enums carrying their CBLAS and LAPACKE codes
//! - [`Context`]: one loaded library per routine family, a symbol prefix and
//!   a cache of resolved addresses; [`BlasContext`] and [`LapackContext`]
//! - [`blas`] and [`lapack`]: typed entry points on
//!   [`StridedView`](strided_view::StridedView)s
//! - [`dynamic`]: entry points on format-tagged [`TypedArray`]s that pick the
//!   routine format from the operands
//! - [`inv`] and [`Linalg`]: operations composed from several routines
//!
//! # Example
//!
//! ```no_run
//! use strided_linalg::{BindingConfig, Linalg, OptionValue, TypedArray};
//! use strided_view::StridedArray;
//!
//! let linalg = Linalg::from_config(&BindingConfig::from_env())?;
//! let a = StridedArray::<f64>::from_fn_row_major(&[2, 2], |idx| {
//!     if idx[0] == idx[1] { 2.0 } else { 0.0 }
//! });
//! let a_inv = linalg.inv(TypedArray::from(a), OptionValue::from("getrf"))?;
//! let a_inv = a_inv.into_array::<f64>()?;
//! assert_eq!(a_inv.get(&[0, 0]), 0.5);
//! # Ok::<(), strided_linalg::LinalgError>(())
//! ```
//!
//! Tests and benchmarks can bind in-process functions instead of a shared
//! library through [`SymbolTable`] and [`Context::install`].

pub mod blas;
pub mod config;
pub(crate) mod dispatch;
pub mod dynamic;
mod error;
pub mod lapack;
pub mod layout;
mod linalg;
pub mod loader;
pub mod option;
mod registry;
pub mod routine;

pub use config::BindingConfig;
pub use error::{LinalgError, Result};
pub use lapack::{Eigenvalues, LuFactors};
pub use linalg::{inv, Linalg};
pub use loader::{LoadFlags, NativeLibrary, SymbolSource, SymbolTable};
pub use option::{Diag, InvDriver, NativeOption, OptionValue, Order, Side, Transpose, Uplo};
pub use registry::{BlasContext, Binding, Context, LapackContext};
pub use routine::{BlasRoutine, LapackRoutine, RoutineId};

pub use strided_view::{ElementFormat, StridedArray, TypedArray};
