//! Closed routine identifiers for the symbol registry.
//!
//! Each identifier maps an [`ElementFormat`] to the exported symbol stem
//! (`drotm`, `zdotc_sub`, `cheev`, ...). The context prepends its prefix to
//! form the full symbol name.

use std::fmt::Debug;

use strided_view::ElementFormat;

/// A routine family known to a [`Context`](crate::Context).
pub trait RoutineId: Copy + Eq + Debug + Send + Sync + 'static {
    /// Family name used in errors and logs ("BLAS", "LAPACK").
    const FAMILY: &'static str;
    /// Prefix active on a fresh context.
    const DEFAULT_PREFIX: &'static str;
    /// Every routine, in index order.
    const ALL: &'static [Self];

    /// Dense index in `0..ALL.len()`.
    fn index(self) -> usize;

    /// Logical name without type letter.
    fn name(self) -> &'static str;

    /// Exported symbol stem for `format`, or `None` if the routine has no
    /// variant for that format.
    fn stem(self, format: ElementFormat) -> Option<String>;

    /// Slot of `(self, format)` in a context's binding table.
    #[inline]
    fn slot(self, format: ElementFormat) -> usize {
        self.index() * ElementFormat::COUNT + format.index()
    }
}

/// CBLAS routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlasRoutine {
    Rot,
    Rotm,
    Swap,
    Scal,
    Copy,
    Axpy,
    Dot,
    Dotu,
    Dotc,
    Nrm2,
    Asum,
    Gemm,
    Trsm,
}

impl RoutineId for BlasRoutine {
    const FAMILY: &'static str = "BLAS";
    const DEFAULT_PREFIX: &'static str = "cblas_";
    const ALL: &'static [Self] = &[
        BlasRoutine::Rot,
        BlasRoutine::Rotm,
        BlasRoutine::Swap,
        BlasRoutine::Scal,
        BlasRoutine::Copy,
        BlasRoutine::Axpy,
        BlasRoutine::Dot,
        BlasRoutine::Dotu,
        BlasRoutine::Dotc,
        BlasRoutine::Nrm2,
        BlasRoutine::Asum,
        BlasRoutine::Gemm,
        BlasRoutine::Trsm,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            BlasRoutine::Rot => "rot",
            BlasRoutine::Rotm => "rotm",
            BlasRoutine::Swap => "swap",
            BlasRoutine::Scal => "scal",
            BlasRoutine::Copy => "copy",
            BlasRoutine::Axpy => "axpy",
            BlasRoutine::Dot => "dot",
            BlasRoutine::Dotu => "dotu",
            BlasRoutine::Dotc => "dotc",
            BlasRoutine::Nrm2 => "nrm2",
            BlasRoutine::Asum => "asum",
            BlasRoutine::Gemm => "gemm",
            BlasRoutine::Trsm => "trsm",
        }
    }

    fn stem(self, format: ElementFormat) -> Option<String> {
        let t = format.blas_char();
        let name = self.name();
        match self {
            BlasRoutine::Rot | BlasRoutine::Rotm | BlasRoutine::Dot => {
                (!format.is_complex()).then(|| format!("{t}{name}"))
            }
            // Complex dot products return through an out pointer.
            BlasRoutine::Dotu | BlasRoutine::Dotc => {
                format.is_complex().then(|| format!("{t}{name}_sub"))
            }
            // Complex norms carry the real result letter first: scnrm2, dzasum.
            BlasRoutine::Nrm2 | BlasRoutine::Asum => Some(match format {
                ElementFormat::C32 => format!("sc{name}"),
                ElementFormat::C64 => format!("dz{name}"),
                _ => format!("{t}{name}"),
            }),
            _ => Some(format!("{t}{name}")),
        }
    }
}

/// LAPACKE routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LapackRoutine {
    Getrf,
    Getrs,
    Gesv,
    Getri,
    Potrf,
    Potrs,
    Trtrs,
    /// Symmetric (real) or Hermitian (complex) eigenproblem.
    Syev,
}

impl RoutineId for LapackRoutine {
    const FAMILY: &'static str = "LAPACK";
    const DEFAULT_PREFIX: &'static str = "LAPACKE_";
    const ALL: &'static [Self] = &[
        LapackRoutine::Getrf,
        LapackRoutine::Getrs,
        LapackRoutine::Gesv,
        LapackRoutine::Getri,
        LapackRoutine::Potrf,
        LapackRoutine::Potrs,
        LapackRoutine::Trtrs,
        LapackRoutine::Syev,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            LapackRoutine::Getrf => "getrf",
            LapackRoutine::Getrs => "getrs",
            LapackRoutine::Gesv => "gesv",
            LapackRoutine::Getri => "getri",
            LapackRoutine::Potrf => "potrf",
            LapackRoutine::Potrs => "potrs",
            LapackRoutine::Trtrs => "trtrs",
            LapackRoutine::Syev => "syev",
        }
    }

    fn stem(self, format: ElementFormat) -> Option<String> {
        let t = format.blas_char();
        match self {
            LapackRoutine::Syev if format.is_complex() => Some(format!("{t}heev")),
            _ => Some(format!("{t}{}", self.name())),
        }
    }
}
