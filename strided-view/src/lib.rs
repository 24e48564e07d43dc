//! Strided array types shared by the strided-linalg workspace.
//!
//! - [`StridedArray`]: owned dynamic-rank strided array
//! - [`StridedView`] / [`StridedViewMut`]: borrowed views handed to native routines
//! - [`ElementFormat`] / [`Element`]: the four BLAS element formats
//! - [`TypedArray`]: a strided array tagged with its format at runtime, with
//!   [`TypedArray::cast`] for format conversion
//!
//! # Example
//!
//! ```rust
//! use strided_view::{ElementFormat, StridedArray, TypedArray};
//!
//! let a = StridedArray::<f32>::from_fn_row_major(&[2, 3], |idx| (idx[0] * 3 + idx[1]) as f32);
//! let t = TypedArray::from(a).cast(ElementFormat::F64).unwrap();
//! assert_eq!(t.format(), ElementFormat::F64);
//! assert_eq!(t.dims(), &[2, 3]);
//! ```

pub mod format;
pub mod typed;
pub mod view;

pub use format::{ComplexElement, Element, ElementFormat, RealElement};
pub use typed::TypedArray;
pub use view::{col_major_strides, row_major_strides, StridedArray, StridedView, StridedViewMut};

/// Errors that can occur while building or converting strided arrays.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Negative stride where only non-negative strides are accepted.
    #[error("negative stride for dim {dim}")]
    NegativeStride { dim: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Integer overflow or out-of-range access while computing an offset.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// Conversion that would discard the imaginary part.
    #[error("cannot cast {from} to {to}")]
    LossyCast {
        from: &'static str,
        to: &'static str,
    },
}

/// Result type for strided array operations.
pub type Result<T> = std::result::Result<T, StridedError>;
