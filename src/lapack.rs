//! Typed LAPACKE entry points on batched strided matrices.
//!
//! The last two dimensions of every matrix operand form the matrix; leading
//! dimensions are batches and must agree across operands. A right-hand side
//! one rank below the coefficient matrix is a single vector per batch.
//!
//! Each routine returns the per-batch `info` codes as an array of the batch
//! shape. A negative `info` (an argument rejected by the library) stops the
//! batch loop with [`LinalgError::NativeRoutine`]; batches processed before
//! it keep their results.

use std::os::raw::{c_char, c_int};

use strided_view::{Element, StridedArray, StridedView, StridedViewMut};

use crate::dispatch::{check_batches, execute_batches, to_blas_int, MatrixOperand};
use crate::option::{Diag, NativeOption, Order, Transpose, Uplo};
use crate::registry::{Binding, LapackContext};
use crate::routine::LapackRoutine;
use crate::{LinalgError, Result};

type GetrfFn<T> = unsafe extern "C" fn(c_int, c_int, c_int, *mut T, c_int, *mut c_int) -> c_int;
type GetrsFn<T> = unsafe extern "C" fn(
    c_int,
    c_char,
    c_int,
    c_int,
    *const T,
    c_int,
    *const c_int,
    *mut T,
    c_int,
) -> c_int;
type GesvFn<T> =
    unsafe extern "C" fn(c_int, c_int, c_int, *mut T, c_int, *mut c_int, *mut T, c_int) -> c_int;
type GetriFn<T> = unsafe extern "C" fn(c_int, c_int, *mut T, c_int, *const c_int) -> c_int;
type PotrfFn<T> = unsafe extern "C" fn(c_int, c_char, c_int, *mut T, c_int) -> c_int;
type PotrsFn<T> =
    unsafe extern "C" fn(c_int, c_char, c_int, c_int, *const T, c_int, *mut T, c_int) -> c_int;
type TrtrsFn<T> = unsafe extern "C" fn(
    c_int,
    c_char,
    c_char,
    c_char,
    c_int,
    c_int,
    *const T,
    c_int,
    *mut T,
    c_int,
) -> c_int;
type SyevFn<T, R> =
    unsafe extern "C" fn(c_int, c_char, c_char, c_int, *mut T, c_int, *mut R) -> c_int;

/// Pivot indices and status codes of an LU factorization.
#[derive(Debug, Clone)]
pub struct LuFactors {
    /// One-based pivot indices, shape `batch ++ [min(m, n)]`.
    pub ipiv: StridedArray<i32>,
    /// Per-batch `info`; a positive value `i` means `U(i, i)` is exactly zero.
    pub info: StridedArray<i32>,
}

/// Eigenvalues of a symmetric or Hermitian eigenproblem.
#[derive(Debug, Clone)]
pub struct Eigenvalues<R> {
    /// Ascending eigenvalues, shape `batch ++ [n]`.
    pub values: StridedArray<R>,
    /// Per-batch `info`; positive values report non-convergence.
    pub info: StridedArray<i32>,
}

#[inline]
fn code(c: c_int) -> c_char {
    c as c_char
}

/// Store a non-negative `info`, or stop with the routine's symbol.
fn record_info(
    binding: &Binding<'_, LapackRoutine>,
    info: c_int,
    slot: &mut i32,
) -> Result<()> {
    if info < 0 {
        return Err(LinalgError::NativeRoutine {
            symbol: binding.symbol(),
            info,
        });
    }
    *slot = info;
    Ok(())
}

/// Check a pivot operand of shape `batch ++ [len]` with contiguous rows.
fn check_ipiv(ipiv: &StridedView<'_, i32>, batch_dims: &[usize], len: usize) -> Result<()> {
    let dims = ipiv.dims();
    let rank = dims.len();
    let shape_ok = rank == batch_dims.len() + 1
        && dims[..rank - 1] == *batch_dims
        && dims[rank - 1] == len;
    if !shape_ok {
        return Err(LinalgError::Shape {
            operand: "ipiv",
            reason: format!("shape {dims:?} is not {batch_dims:?} ++ [{len}]"),
        });
    }
    if len > 1 && ipiv.strides()[rank - 1] != 1 {
        return Err(LinalgError::Shape {
            operand: "ipiv",
            reason: "pivot rows must be contiguous".to_string(),
        });
    }
    Ok(())
}

fn batch_shape(batch_dims: &[usize], last: usize) -> Vec<usize> {
    let mut dims = batch_dims.to_vec();
    dims.push(last);
    dims
}

/// LU factorization with partial pivoting, in place.
pub fn getrf_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    a: &mut StridedViewMut<'_, T>,
) -> Result<LuFactors> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let (m, n) = (
        to_blas_int("a", "rows", ma.rows())?,
        to_blas_int("a", "columns", ma.cols())?,
    );
    let pivots = ma.rows().min(ma.cols());
    let mut ipiv = StridedArray::<i32>::row_major(&batch_shape(&ma.batch_dims, pivots));
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Getrf, T::FORMAT)?;
    // SAFETY: `LAPACKE_?getrf` has this signature.
    let f: GetrfFn<T> = unsafe { binding.cast() };
    let ap = a.as_mut_ptr();
    let ipiv_strides = ipiv.strides()[..ma.batch_dims.len()].to_vec();
    let info_strides = info.strides().to_vec();
    let (pp, codes) = (ipiv.data_mut().as_mut_ptr(), info.data_mut());
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &ipiv_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    m,
                    n,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    pp.wrapping_offset(off[1]),
                )
            };
            record_info(&binding, status, &mut codes[off[2] as usize])
        },
    )?;
    Ok(LuFactors { ipiv, info })
}

/// Solve `op(a) x = b` using the factors from [`getrf_into`], overwriting `b`.
pub fn getrs_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    trans: Transpose,
    a: &StridedView<'_, T>,
    ipiv: &StridedView<'_, i32>,
    b: &mut StridedViewMut<'_, T>,
) -> Result<StridedArray<i32>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::rhs("b", order, a.ndim(), b.dims(), b.strides())?;
    check_batches(&[&ma, &mb])?;
    let n = ma.require_square()?;
    mb.require_rows(n, "a")?;
    check_ipiv(ipiv, &ma.batch_dims, n)?;
    let (n, nrhs) = (to_blas_int("a", "order", n)?, to_blas_int("b", "columns", mb.cols())?);
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Getrs, T::FORMAT)?;
    // SAFETY: `LAPACKE_?getrs` has this signature.
    let f: GetrsFn<T> = unsafe { binding.cast() };
    let (ap, pp, bp) = (a.ptr(), ipiv.ptr(), b.as_mut_ptr());
    let ipiv_strides = &ipiv.strides()[..ma.batch_dims.len()];
    let info_strides = info.strides().to_vec();
    let codes = info.data_mut();
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, ipiv_strides, &mb.batch_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    code(trans.lapack_code()),
                    n,
                    nrhs,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    pp.wrapping_offset(off[1]),
                    bp.wrapping_offset(off[2]),
                    mb.ld,
                )
            };
            record_info(&binding, status, &mut codes[off[3] as usize])
        },
    )?;
    Ok(info)
}

/// Solve `a x = b`, overwriting `a` with its LU factors and `b` with `x`.
pub fn gesv_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    a: &mut StridedViewMut<'_, T>,
    b: &mut StridedViewMut<'_, T>,
) -> Result<LuFactors> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::rhs("b", order, a.ndim(), b.dims(), b.strides())?;
    check_batches(&[&ma, &mb])?;
    let n = ma.require_square()?;
    mb.require_rows(n, "a")?;
    let mut ipiv = StridedArray::<i32>::row_major(&batch_shape(&ma.batch_dims, n));
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);
    let (n, nrhs) = (to_blas_int("a", "order", n)?, to_blas_int("b", "columns", mb.cols())?);

    let binding = ctx.bind(LapackRoutine::Gesv, T::FORMAT)?;
    // SAFETY: `LAPACKE_?gesv` has this signature.
    let f: GesvFn<T> = unsafe { binding.cast() };
    let (ap, bp) = (a.as_mut_ptr(), b.as_mut_ptr());
    let ipiv_strides = ipiv.strides()[..ma.batch_dims.len()].to_vec();
    let info_strides = info.strides().to_vec();
    let (pp, codes) = (ipiv.data_mut().as_mut_ptr(), info.data_mut());
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &ipiv_strides, &mb.batch_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    n,
                    nrhs,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    pp.wrapping_offset(off[1]),
                    bp.wrapping_offset(off[2]),
                    mb.ld,
                )
            };
            record_info(&binding, status, &mut codes[off[3] as usize])
        },
    )?;
    Ok(LuFactors { ipiv, info })
}

/// Invert `a` in place from the factors produced by [`getrf_into`].
pub fn getri_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    a: &mut StridedViewMut<'_, T>,
    ipiv: &StridedView<'_, i32>,
) -> Result<StridedArray<i32>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let n = ma.require_square()?;
    check_ipiv(ipiv, &ma.batch_dims, n)?;
    let n = to_blas_int("a", "order", n)?;
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Getri, T::FORMAT)?;
    // SAFETY: `LAPACKE_?getri` has this signature.
    let f: GetriFn<T> = unsafe { binding.cast() };
    let (ap, pp) = (a.as_mut_ptr(), ipiv.ptr());
    let ipiv_strides = &ipiv.strides()[..ma.batch_dims.len()];
    let info_strides = info.strides().to_vec();
    let codes = info.data_mut();
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, ipiv_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    n,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    pp.wrapping_offset(off[1]),
                )
            };
            record_info(&binding, status, &mut codes[off[2] as usize])
        },
    )?;
    Ok(info)
}

/// Cholesky factorization of a positive definite matrix, in place.
pub fn potrf_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    uplo: Uplo,
    a: &mut StridedViewMut<'_, T>,
) -> Result<StridedArray<i32>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let n = to_blas_int("a", "order", ma.require_square()?)?;
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Potrf, T::FORMAT)?;
    // SAFETY: `LAPACKE_?potrf` has this signature.
    let f: PotrfFn<T> = unsafe { binding.cast() };
    let ap = a.as_mut_ptr();
    let info_strides = info.strides().to_vec();
    let codes = info.data_mut();
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    code(uplo.lapack_code()),
                    n,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                )
            };
            record_info(&binding, status, &mut codes[off[1] as usize])
        },
    )?;
    Ok(info)
}

/// Solve `a x = b` with the Cholesky factor from [`potrf_into`].
pub fn potrs_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    uplo: Uplo,
    a: &StridedView<'_, T>,
    b: &mut StridedViewMut<'_, T>,
) -> Result<StridedArray<i32>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::rhs("b", order, a.ndim(), b.dims(), b.strides())?;
    check_batches(&[&ma, &mb])?;
    let n = ma.require_square()?;
    mb.require_rows(n, "a")?;
    let (n, nrhs) = (to_blas_int("a", "order", n)?, to_blas_int("b", "columns", mb.cols())?);
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Potrs, T::FORMAT)?;
    // SAFETY: `LAPACKE_?potrs` has this signature.
    let f: PotrsFn<T> = unsafe { binding.cast() };
    let (ap, bp) = (a.ptr(), b.as_mut_ptr());
    let info_strides = info.strides().to_vec();
    let codes = info.data_mut();
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &mb.batch_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    code(uplo.lapack_code()),
                    n,
                    nrhs,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    bp.wrapping_offset(off[1]),
                    mb.ld,
                )
            };
            record_info(&binding, status, &mut codes[off[2] as usize])
        },
    )?;
    Ok(info)
}

/// Solve a triangular system `op(a) x = b`, overwriting `b`.
///
/// A positive `info` marks a zero diagonal element; that batch is left
/// unsolved.
#[allow(clippy::too_many_arguments)]
pub fn trtrs_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    a: &StridedView<'_, T>,
    b: &mut StridedViewMut<'_, T>,
) -> Result<StridedArray<i32>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::rhs("b", order, a.ndim(), b.dims(), b.strides())?;
    check_batches(&[&ma, &mb])?;
    let n = ma.require_square()?;
    mb.require_rows(n, "a")?;
    let (n, nrhs) = (to_blas_int("a", "order", n)?, to_blas_int("b", "columns", mb.cols())?);
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);

    let binding = ctx.bind(LapackRoutine::Trtrs, T::FORMAT)?;
    // SAFETY: `LAPACKE_?trtrs` has this signature.
    let f: TrtrsFn<T> = unsafe { binding.cast() };
    let (ap, bp) = (a.ptr(), b.as_mut_ptr());
    let info_strides = info.strides().to_vec();
    let codes = info.data_mut();
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &mb.batch_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    code(uplo.lapack_code()),
                    code(trans.lapack_code()),
                    code(diag.lapack_code()),
                    n,
                    nrhs,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    bp.wrapping_offset(off[1]),
                    mb.ld,
                )
            };
            record_info(&binding, status, &mut codes[off[2] as usize])
        },
    )?;
    Ok(info)
}

/// Eigenvalues (and, for `jobz = b'V'`, eigenvectors written into `a`) of a
/// symmetric or Hermitian matrix.
///
/// Calls `?syev` for real and `?heev` for complex element types.
pub fn syev_into<T: Element>(
    ctx: &LapackContext,
    order: Order,
    jobz: u8,
    uplo: Uplo,
    a: &mut StridedViewMut<'_, T>,
) -> Result<Eigenvalues<T::Real>> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let n = ma.require_square()?;
    let mut values = StridedArray::<T::Real>::row_major(&batch_shape(&ma.batch_dims, n));
    let mut info = StridedArray::<i32>::row_major(&ma.batch_dims);
    let n = to_blas_int("a", "order", n)?;

    let binding = ctx.bind(LapackRoutine::Syev, T::FORMAT)?;
    // SAFETY: `LAPACKE_?syev`/`LAPACKE_?heev` have this signature.
    let f: SyevFn<T, T::Real> = unsafe { binding.cast() };
    let ap = a.as_mut_ptr();
    let value_strides = values.strides()[..ma.batch_dims.len()].to_vec();
    let info_strides = info.strides().to_vec();
    let (wp, codes) = (values.data_mut().as_mut_ptr(), info.data_mut());
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &value_strides, &info_strides],
        |off| {
            let status = unsafe {
                f(
                    order.lapack_code(),
                    jobz as c_char,
                    code(uplo.lapack_code()),
                    n,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    wp.wrapping_offset(off[1]),
                )
            };
            record_info(&binding, status, &mut codes[off[2] as usize])
        },
    )?;
    Ok(Eigenvalues { values, info })
}
