//! Format-dispatching entry points on [`TypedArray`] operands.
//!
//! Each function picks the routine format from its operands: the promotion of
//! every array format, widened to complex when a scalar has a nonzero
//! imaginary part. Operands are cast to that format (a complex operand never
//! narrows to real), options are normalized, and the typed routine in
//! [`blas`](crate::blas) or [`lapack`](crate::lapack) does the work. Arrays are
//! taken by value and returned after processing.
//!
//! ```no_run
//! use num_complex::Complex64;
//! use strided_linalg::{dynamic, BlasContext, OptionValue, TypedArray};
//!
//! let ctx = BlasContext::new();
//! ctx.load("libopenblas.so.0", None)?;
//! let x = TypedArray::from(vec![1.0f64, 2.0, 3.0]);
//! let y = TypedArray::from(vec![0.5f64; 3]);
//! let y = dynamic::axpy(&ctx, Complex64::new(2.0, 0.0), x, y)?;
//! assert_eq!(y.dims(), &[3]);
//! # let _ = OptionValue::Absent;
//! # Ok::<(), strided_linalg::LinalgError>(())
//! ```

use num_complex::Complex64;
use strided_view::{ElementFormat, StridedArray, TypedArray};

use crate::blas::{self, BlasScalar};
use crate::lapack::{self, LuFactors};
use crate::layout::{into_blas_layout, into_rhs_layout, matrix_strides};
use crate::option::{job, Diag, NativeOption, OptionValue, Order, Side, Transpose, Uplo};
use crate::registry::{BlasContext, LapackContext};
use crate::routine::BlasRoutine;
use crate::{LinalgError, Result};

/// Run `$body` with `$t` bound to the Rust type of `$format`.
///
/// The `real:` and `complex:` forms reject the other kind of format with
/// [`LinalgError::UnsupportedFormat`] for `$routine`.
macro_rules! dispatch_format {
    ($format:expr, |$t:ident| $body:block) => {
        match $format {
            ::strided_view::ElementFormat::F32 => {
                type $t = f32;
                $body
            }
            ::strided_view::ElementFormat::F64 => {
                type $t = f64;
                $body
            }
            ::strided_view::ElementFormat::C32 => {
                type $t = ::num_complex::Complex32;
                $body
            }
            ::strided_view::ElementFormat::C64 => {
                type $t = ::num_complex::Complex64;
                $body
            }
        }
    };
    (real: $format:expr, $routine:expr, |$t:ident| $body:block) => {
        match $format {
            ::strided_view::ElementFormat::F32 => {
                type $t = f32;
                $body
            }
            ::strided_view::ElementFormat::F64 => {
                type $t = f64;
                $body
            }
            format => Err($crate::LinalgError::UnsupportedFormat {
                routine: $crate::RoutineId::name($routine),
                format,
            }),
        }
    };
    (complex: $format:expr, $routine:expr, |$t:ident| $body:block) => {
        match $format {
            ::strided_view::ElementFormat::C32 => {
                type $t = ::num_complex::Complex32;
                $body
            }
            ::strided_view::ElementFormat::C64 => {
                type $t = ::num_complex::Complex64;
                $body
            }
            format => Err($crate::LinalgError::UnsupportedFormat {
                routine: $crate::RoutineId::name($routine),
                format,
            }),
        }
    };
}

pub(crate) use dispatch_format;

/// Promotion of the formats of `arrays`.
pub fn promoted_format(arrays: &[&TypedArray]) -> ElementFormat {
    arrays
        .iter()
        .map(|a| a.format())
        .reduce(ElementFormat::promote)
        .unwrap_or(ElementFormat::F64)
}

/// Widen `format` to complex if `scalar` has an imaginary part.
pub fn with_scalar(format: ElementFormat, scalar: Complex64) -> ElementFormat {
    if scalar.im != 0.0 {
        format.promote(ElementFormat::C32)
    } else {
        format
    }
}

#[inline]
fn scalar<T: BlasScalar>(z: Complex64) -> T {
    T::from_parts(z.re, z.im)
}

fn zeros<T: Copy + Default>(order: Order, dims: &[usize]) -> Result<StridedArray<T>> {
    Ok(StridedArray::with_strides(dims, &matrix_strides(order, dims))?)
}

// ============================================================================
// BLAS level 1
// ============================================================================

/// Plane rotation of `x` and `y`. Real formats only.
pub fn rot(
    ctx: &BlasContext,
    x: TypedArray,
    y: TypedArray,
    c: f64,
    s: f64,
) -> Result<(TypedArray, TypedArray)> {
    let format = promoted_format(&[&x, &y]);
    dispatch_format!(real: format, BlasRoutine::Rot, |T| {
        let mut x = x.into_array::<T>()?;
        let mut y = y.into_array::<T>()?;
        blas::rot_into(
            ctx,
            &mut x.view_mut(),
            &mut y.view_mut(),
            scalar(Complex64::new(c, 0.0)),
            scalar(Complex64::new(s, 0.0)),
        )?;
        Ok((x.into(), y.into()))
    })
}

/// Modified Givens rotation of `x` and `y` with a 5-element `param`.
/// Real formats only.
pub fn rotm(
    ctx: &BlasContext,
    x: TypedArray,
    y: TypedArray,
    param: TypedArray,
) -> Result<(TypedArray, TypedArray)> {
    let format = promoted_format(&[&x, &y]);
    dispatch_format!(real: format, BlasRoutine::Rotm, |T| {
        let mut x = x.into_array::<T>()?;
        let mut y = y.into_array::<T>()?;
        let param = param.into_array::<T>()?;
        blas::rotm_into(ctx, &mut x.view_mut(), &mut y.view_mut(), &param.view())?;
        Ok((x.into(), y.into()))
    })
}

/// Exchange `x` and `y`.
pub fn swap(ctx: &BlasContext, x: TypedArray, y: TypedArray) -> Result<(TypedArray, TypedArray)> {
    let format = promoted_format(&[&x, &y]);
    dispatch_format!(format, |T| {
        let mut x = x.into_array::<T>()?;
        let mut y = y.into_array::<T>()?;
        blas::swap_into(ctx, &mut x.view_mut(), &mut y.view_mut())?;
        Ok((x.into(), y.into()))
    })
}

/// `x <- alpha x`.
pub fn scal(ctx: &BlasContext, alpha: Complex64, x: TypedArray) -> Result<TypedArray> {
    let format = with_scalar(x.format(), alpha);
    dispatch_format!(format, |T| {
        let mut x = x.into_array::<T>()?;
        blas::scal_into(ctx, scalar::<T>(alpha), &mut x.view_mut())?;
        Ok(x.into())
    })
}

/// `y <- x`, in `y`'s format promoted with `x`'s.
pub fn copy(ctx: &BlasContext, x: TypedArray, y: TypedArray) -> Result<TypedArray> {
    let format = promoted_format(&[&x, &y]);
    dispatch_format!(format, |T| {
        let x = x.into_array::<T>()?;
        let mut y = y.into_array::<T>()?;
        blas::copy_into(ctx, &x.view(), &mut y.view_mut())?;
        Ok(y.into())
    })
}

/// `y <- alpha x + y`.
pub fn axpy(ctx: &BlasContext, alpha: Complex64, x: TypedArray, y: TypedArray) -> Result<TypedArray> {
    let format = with_scalar(promoted_format(&[&x, &y]), alpha);
    dispatch_format!(format, |T| {
        let x = x.into_array::<T>()?;
        let mut y = y.into_array::<T>()?;
        blas::axpy_into(ctx, scalar::<T>(alpha), &x.view(), &mut y.view_mut())?;
        Ok(y.into())
    })
}

/// Real dot product along the last axis.
pub fn dot(ctx: &BlasContext, x: TypedArray, y: TypedArray) -> Result<TypedArray> {
    let format = promoted_format(&[&x, &y]);
    dispatch_format!(real: format, BlasRoutine::Dot, |T| {
        let x = x.into_array::<T>()?;
        let y = y.into_array::<T>()?;
        Ok(blas::dot(ctx, &x.view(), &y.view())?.into())
    })
}

/// Unconjugated complex dot product along the last axis. Real operands are
/// promoted to complex.
pub fn dotu(ctx: &BlasContext, x: TypedArray, y: TypedArray) -> Result<TypedArray> {
    let format = promoted_format(&[&x, &y]).promote(ElementFormat::C32);
    dispatch_format!(complex: format, BlasRoutine::Dotu, |T| {
        let x = x.into_array::<T>()?;
        let y = y.into_array::<T>()?;
        Ok(blas::dotu(ctx, &x.view(), &y.view())?.into())
    })
}

/// Conjugated complex dot product along the last axis. Real operands are
/// promoted to complex.
pub fn dotc(ctx: &BlasContext, x: TypedArray, y: TypedArray) -> Result<TypedArray> {
    let format = promoted_format(&[&x, &y]).promote(ElementFormat::C32);
    dispatch_format!(complex: format, BlasRoutine::Dotc, |T| {
        let x = x.into_array::<T>()?;
        let y = y.into_array::<T>()?;
        Ok(blas::dotc(ctx, &x.view(), &y.view())?.into())
    })
}

/// Euclidean norm along the last axis; the result is real.
pub fn nrm2(ctx: &BlasContext, x: TypedArray) -> Result<TypedArray> {
    dispatch_format!(x.format(), |T| {
        let x = x.into_array::<T>()?;
        Ok(blas::nrm2(ctx, &x.view())?.into())
    })
}

/// Sum of absolute values along the last axis; the result is real.
pub fn asum(ctx: &BlasContext, x: TypedArray) -> Result<TypedArray> {
    dispatch_format!(x.format(), |T| {
        let x = x.into_array::<T>()?;
        Ok(blas::asum(ctx, &x.view())?.into())
    })
}

// ============================================================================
// BLAS level 3
// ============================================================================

fn gemm_output_dims(
    a: &[usize],
    b: &[usize],
    trans_a: Transpose,
    trans_b: Transpose,
) -> Result<Vec<usize>> {
    for (operand, dims) in [("a", a), ("b", b)] {
        if dims.len() < 2 {
            return Err(LinalgError::Dimension {
                operand,
                rank: dims.len(),
                expected: "at least 2",
            });
        }
    }
    let (ra, rb) = (a.len(), b.len());
    let m = match trans_a {
        Transpose::NoTrans => a[ra - 2],
        _ => a[ra - 1],
    };
    let n = match trans_b {
        Transpose::NoTrans => b[rb - 1],
        _ => b[rb - 2],
    };
    let mut dims = a[..ra - 2].to_vec();
    dims.extend([m, n]);
    Ok(dims)
}

/// `c <- alpha op(a) op(b) + beta c` over batches.
///
/// Without `c` a zero output of shape `batch ++ [m, n]` is allocated in
/// `order`. Operands that are not BLAS-compatible in `order` are copied first.
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    ctx: &BlasContext,
    a: TypedArray,
    b: TypedArray,
    c: Option<TypedArray>,
    alpha: Complex64,
    beta: Complex64,
    order: OptionValue<'_>,
    trans_a: OptionValue<'_>,
    trans_b: OptionValue<'_>,
) -> Result<TypedArray> {
    let order = Order::normalize(order)?;
    let trans_a = Transpose::normalize(trans_a)?;
    let trans_b = Transpose::normalize(trans_b)?;
    let mut format = promoted_format(&[&a, &b]);
    if let Some(c) = &c {
        format = format.promote(c.format());
    }
    let format = with_scalar(with_scalar(format, alpha), beta);

    dispatch_format!(format, |T| {
        let a = into_blas_layout(a.into_array::<T>()?, order)?;
        let b = into_blas_layout(b.into_array::<T>()?, order)?;
        let mut c = match c {
            Some(c) => into_blas_layout(c.into_array::<T>()?, order)?,
            None => zeros(order, &gemm_output_dims(a.dims(), b.dims(), trans_a, trans_b)?)?,
        };
        blas::gemm_into(
            ctx,
            order,
            trans_a,
            trans_b,
            scalar::<T>(alpha),
            &a.view(),
            &b.view(),
            scalar::<T>(beta),
            &mut c.view_mut(),
        )?;
        Ok(c.into())
    })
}

/// Triangular solve `op(a) x = alpha b` (left) or `x op(a) = alpha b`
/// (right); the solution replaces `b`.
#[allow(clippy::too_many_arguments)]
pub fn trsm(
    ctx: &BlasContext,
    a: TypedArray,
    b: TypedArray,
    alpha: Complex64,
    order: OptionValue<'_>,
    side: OptionValue<'_>,
    uplo: OptionValue<'_>,
    trans: OptionValue<'_>,
    diag: OptionValue<'_>,
) -> Result<TypedArray> {
    let order = Order::normalize(order)?;
    let side = Side::normalize(side)?;
    let uplo = Uplo::normalize(uplo)?;
    let trans = Transpose::normalize(trans)?;
    let diag = Diag::normalize(diag)?;
    let format = with_scalar(promoted_format(&[&a, &b]), alpha);

    dispatch_format!(format, |T| {
        let a = into_blas_layout(a.into_array::<T>()?, order)?;
        let mut b = into_blas_layout(b.into_array::<T>()?, order)?;
        blas::trsm_into(
            ctx,
            order,
            side,
            uplo,
            trans,
            diag,
            scalar::<T>(alpha),
            &a.view(),
            &mut b.view_mut(),
        )?;
        Ok(b.into())
    })
}

// ============================================================================
// LAPACK
// ============================================================================

/// LU factorization. Returns the factors in place of `a` with the pivots.
pub fn getrf(
    ctx: &LapackContext,
    a: TypedArray,
    order: OptionValue<'_>,
) -> Result<(TypedArray, LuFactors)> {
    let order = Order::normalize(order)?;
    dispatch_format!(a.format(), |T| {
        let mut a = into_blas_layout(a.into_array::<T>()?, order)?;
        let lu = lapack::getrf_into(ctx, order, &mut a.view_mut())?;
        Ok((a.into(), lu))
    })
}

/// Solve with LU factors from [`getrf`]. Returns the solution and `info`.
pub fn getrs(
    ctx: &LapackContext,
    a: TypedArray,
    ipiv: &StridedArray<i32>,
    b: TypedArray,
    order: OptionValue<'_>,
    trans: OptionValue<'_>,
) -> Result<(TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    let trans = Transpose::normalize(trans)?;
    let format = promoted_format(&[&a, &b]);
    dispatch_format!(format, |T| {
        let a = into_blas_layout(a.into_array::<T>()?, order)?;
        let mut b = into_rhs_layout(b.into_array::<T>()?, order, a.ndim())?;
        let info = lapack::getrs_into(ctx, order, trans, &a.view(), &ipiv.view(), &mut b.view_mut())?;
        Ok((b.into(), info))
    })
}

/// Solve `a x = b`. Returns the LU factors, the solution and the pivots.
pub fn gesv(
    ctx: &LapackContext,
    a: TypedArray,
    b: TypedArray,
    order: OptionValue<'_>,
) -> Result<(TypedArray, TypedArray, LuFactors)> {
    let order = Order::normalize(order)?;
    let format = promoted_format(&[&a, &b]);
    dispatch_format!(format, |T| {
        let mut a = into_blas_layout(a.into_array::<T>()?, order)?;
        let mut b = into_rhs_layout(b.into_array::<T>()?, order, a.ndim())?;
        let lu = lapack::gesv_into(ctx, order, &mut a.view_mut(), &mut b.view_mut())?;
        Ok((a.into(), b.into(), lu))
    })
}

/// Inverse from LU factors, in place of `a`.
pub fn getri(
    ctx: &LapackContext,
    a: TypedArray,
    ipiv: &StridedArray<i32>,
    order: OptionValue<'_>,
) -> Result<(TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    dispatch_format!(a.format(), |T| {
        let mut a = into_blas_layout(a.into_array::<T>()?, order)?;
        let info = lapack::getri_into(ctx, order, &mut a.view_mut(), &ipiv.view())?;
        Ok((a.into(), info))
    })
}

/// Cholesky factorization of the `uplo` triangle.
pub fn potrf(
    ctx: &LapackContext,
    a: TypedArray,
    order: OptionValue<'_>,
    uplo: OptionValue<'_>,
) -> Result<(TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    let uplo = Uplo::normalize(uplo)?;
    dispatch_format!(a.format(), |T| {
        let mut a = into_blas_layout(a.into_array::<T>()?, order)?;
        let info = lapack::potrf_into(ctx, order, uplo, &mut a.view_mut())?;
        Ok((a.into(), info))
    })
}

/// Solve with a Cholesky factor from [`potrf`].
pub fn potrs(
    ctx: &LapackContext,
    a: TypedArray,
    b: TypedArray,
    order: OptionValue<'_>,
    uplo: OptionValue<'_>,
) -> Result<(TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    let uplo = Uplo::normalize(uplo)?;
    let format = promoted_format(&[&a, &b]);
    dispatch_format!(format, |T| {
        let a = into_blas_layout(a.into_array::<T>()?, order)?;
        let mut b = into_rhs_layout(b.into_array::<T>()?, order, a.ndim())?;
        let info = lapack::potrs_into(ctx, order, uplo, &a.view(), &mut b.view_mut())?;
        Ok((b.into(), info))
    })
}

/// Triangular solve with a square `a`.
#[allow(clippy::too_many_arguments)]
pub fn trtrs(
    ctx: &LapackContext,
    a: TypedArray,
    b: TypedArray,
    order: OptionValue<'_>,
    uplo: OptionValue<'_>,
    trans: OptionValue<'_>,
    diag: OptionValue<'_>,
) -> Result<(TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    let uplo = Uplo::normalize(uplo)?;
    let trans = Transpose::normalize(trans)?;
    let diag = Diag::normalize(diag)?;
    let format = promoted_format(&[&a, &b]);
    dispatch_format!(format, |T| {
        let a = into_blas_layout(a.into_array::<T>()?, order)?;
        let mut b = into_rhs_layout(b.into_array::<T>()?, order, a.ndim())?;
        let info =
            lapack::trtrs_into(ctx, order, uplo, trans, diag, &a.view(), &mut b.view_mut())?;
        Ok((b.into(), info))
    })
}

/// Symmetric (real) or Hermitian (complex) eigenproblem.
///
/// `jobz` defaults to computing eigenvectors, which replace `a`. Returns `a`,
/// the real eigenvalues and `info`.
pub fn syev(
    ctx: &LapackContext,
    a: TypedArray,
    order: OptionValue<'_>,
    jobz: OptionValue<'_>,
    uplo: OptionValue<'_>,
) -> Result<(TypedArray, TypedArray, StridedArray<i32>)> {
    let order = Order::normalize(order)?;
    let jobz = job(jobz)?.unwrap_or(b'V');
    let uplo = Uplo::normalize(uplo)?;
    dispatch_format!(a.format(), |T| {
        let mut a = into_blas_layout(a.into_array::<T>()?, order)?;
        let eig = lapack::syev_into(ctx, order, jobz, uplo, &mut a.view_mut())?;
        Ok((a.into(), eig.values.into(), eig.info))
    })
}
