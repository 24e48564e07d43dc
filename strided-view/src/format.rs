//! Element formats understood by BLAS/LAPACK.
//!
//! Native libraries export one symbol per precision/complexity combination
//! (`sgemm`, `dgemm`, `cgemm`, `zgemm`). [`ElementFormat`] names those four
//! combinations and [`Element`] ties each Rust scalar type to its format.

use std::fmt;

use num_complex::{Complex32, Complex64};
use num_traits::{One, Zero};

use crate::typed::TypedArray;
use crate::StridedArray;

/// The closed set of numeric element formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementFormat {
    /// Single precision real (`s`).
    F32,
    /// Double precision real (`d`).
    F64,
    /// Single precision complex (`c`).
    C32,
    /// Double precision complex (`z`).
    C64,
}

impl ElementFormat {
    /// Number of formats; sizes per-format lookup tables.
    pub const COUNT: usize = 4;

    /// All formats in table order.
    pub const ALL: [ElementFormat; 4] = [
        ElementFormat::F32,
        ElementFormat::F64,
        ElementFormat::C32,
        ElementFormat::C64,
    ];

    /// Position of this format in [`ElementFormat::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ElementFormat::F32 => 0,
            ElementFormat::F64 => 1,
            ElementFormat::C32 => 2,
            ElementFormat::C64 => 3,
        }
    }

    /// The BLAS type letter (`s`, `d`, `c`, `z`).
    #[inline]
    pub fn blas_char(self) -> char {
        match self {
            ElementFormat::F32 => 's',
            ElementFormat::F64 => 'd',
            ElementFormat::C32 => 'c',
            ElementFormat::C64 => 'z',
        }
    }

    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, ElementFormat::C32 | ElementFormat::C64)
    }

    #[inline]
    pub fn is_double(self) -> bool {
        matches!(self, ElementFormat::F64 | ElementFormat::C64)
    }

    /// The real format with the same precision.
    pub fn real(self) -> ElementFormat {
        if self.is_double() {
            ElementFormat::F64
        } else {
            ElementFormat::F32
        }
    }

    /// Smallest format that represents values of both `self` and `other`.
    pub fn promote(self, other: ElementFormat) -> ElementFormat {
        match (self.is_complex() || other.is_complex(), self.is_double() || other.is_double()) {
            (false, false) => ElementFormat::F32,
            (false, true) => ElementFormat::F64,
            (true, false) => ElementFormat::C32,
            (true, true) => ElementFormat::C64,
        }
    }

    /// Short type name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ElementFormat::F32 => "f32",
            ElementFormat::F64 => "f64",
            ElementFormat::C32 => "Complex32",
            ElementFormat::C64 => "Complex64",
        }
    }
}

impl fmt::Display for ElementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type with a BLAS element format.
///
/// Implemented for `f32`, `f64`, `Complex32` and `Complex64` only.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + Send + Sync + Zero + One + 'static {
    /// The format tag of this type.
    const FORMAT: ElementFormat;

    /// The real type of the same precision (`Self` for real types).
    type Real: Element;

    /// Lift a real value into this type.
    fn from_real(re: Self::Real) -> Self;

    /// Wrap an owned array into the format-tagged container.
    fn wrap(array: StridedArray<Self>) -> TypedArray;

    /// Unwrap a format-tagged array holding exactly this type.
    fn unwrap(array: TypedArray) -> Option<StridedArray<Self>>;
}

/// Marker for the real element types (`f32`, `f64`).
pub trait RealElement: Element<Real = Self> {}

/// Marker for the complex element types (`Complex32`, `Complex64`).
pub trait ComplexElement: Element {}

macro_rules! impl_element {
    ($ty:ty, $real:ty, $format:ident, $variant:ident, |$re:ident| $lift:expr) => {
        impl Element for $ty {
            const FORMAT: ElementFormat = ElementFormat::$format;
            type Real = $real;

            #[inline]
            fn from_real($re: $real) -> Self {
                $lift
            }

            fn wrap(array: StridedArray<Self>) -> TypedArray {
                TypedArray::$variant(array)
            }

            fn unwrap(array: TypedArray) -> Option<StridedArray<Self>> {
                match array {
                    TypedArray::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(f32, f32, F32, F32, |re| re);
impl_element!(f64, f64, F64, F64, |re| re);
impl_element!(Complex32, f32, C32, C32, |re| Complex32::new(re, 0.0));
impl_element!(Complex64, f64, C64, C64, |re| Complex64::new(re, 0.0));

impl RealElement for f32 {}
impl RealElement for f64 {}
impl ComplexElement for Complex32 {}
impl ComplexElement for Complex64 {}
