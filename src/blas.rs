//! Typed CBLAS entry points on strided views.
//!
//! Level-1 routines walk their operands with the strided dispatch loop: the
//! maximal uniform trailing extent becomes one native call, outer dimensions
//! are iterated. Reductions keep the last axis as the run and return an array
//! of the outer shape. Level-3 routines treat the last two dimensions as the
//! matrix and iterate batch dimensions.

use std::os::raw::{c_int, c_void};

use num_complex::{Complex32, Complex64};
use strided_view::{
    ComplexElement, Element, RealElement, StridedArray, StridedView, StridedViewMut,
};

use crate::dispatch::{
    check_batches, check_param_vector, execute_batches, run_offset, to_blas_int, MatrixOperand,
    Operand, Runs,
};
use crate::option::{Diag, NativeOption, Order, Side, Transpose, Uplo};
use crate::registry::BlasContext;
use crate::routine::BlasRoutine;
use crate::{LinalgError, Result};

/// Minimum length of the `rotm` parameter vector `[flag, h11, h21, h12, h22]`.
pub const ROTM_PARAM_LEN: usize = 5;

/// Scalar ABI for CBLAS.
///
/// Real scalars are passed by value, complex scalars through a pointer.
pub trait BlasScalar: Element {
    /// Type of a scalar argument in the CBLAS signature.
    type Arg: Copy;

    /// The argument for `value`. Pointer arguments borrow `value`, which must
    /// outlive the call.
    fn as_arg(value: &Self) -> Self::Arg;

    /// Build a scalar from real and imaginary parts; real types drop `im`.
    fn from_parts(re: f64, im: f64) -> Self;
}

/// Real BLAS element types.
pub trait RealBlas: BlasScalar + RealElement {}

/// Complex BLAS element types.
pub trait ComplexBlas: BlasScalar + ComplexElement {}

macro_rules! impl_real_blas {
    ($($ty:ty),*) => {$(
        impl BlasScalar for $ty {
            type Arg = $ty;

            #[inline]
            fn as_arg(value: &Self) -> $ty {
                *value
            }

            #[inline]
            fn from_parts(re: f64, _im: f64) -> Self {
                re as $ty
            }
        }

        impl RealBlas for $ty {}
    )*};
}

macro_rules! impl_complex_blas {
    ($($ty:ty => $real:ty),*) => {$(
        impl BlasScalar for $ty {
            type Arg = *const c_void;

            #[inline]
            fn as_arg(value: &Self) -> *const c_void {
                value as *const Self as *const c_void
            }

            #[inline]
            fn from_parts(re: f64, im: f64) -> Self {
                <$ty>::new(re as $real, im as $real)
            }
        }

        impl ComplexBlas for $ty {}
    )*};
}

impl_real_blas!(f32, f64);
impl_complex_blas!(Complex32 => f32, Complex64 => f64);

type RotFn<T> = unsafe extern "C" fn(c_int, *mut T, c_int, *mut T, c_int, T, T);
type RotmFn<T> = unsafe extern "C" fn(c_int, *mut T, c_int, *mut T, c_int, *const T);
type SwapFn<T> = unsafe extern "C" fn(c_int, *mut T, c_int, *mut T, c_int);
type ScalFn<A, T> = unsafe extern "C" fn(c_int, A, *mut T, c_int);
type CopyFn<T> = unsafe extern "C" fn(c_int, *const T, c_int, *mut T, c_int);
type AxpyFn<A, T> = unsafe extern "C" fn(c_int, A, *const T, c_int, *mut T, c_int);
type DotFn<T> = unsafe extern "C" fn(c_int, *const T, c_int, *const T, c_int) -> T;
type DotSubFn<T> = unsafe extern "C" fn(c_int, *const T, c_int, *const T, c_int, *mut T);
type NormFn<T, R> = unsafe extern "C" fn(c_int, *const T, c_int) -> R;
type GemmFn<A, T> = unsafe extern "C" fn(
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    A,
    *const T,
    c_int,
    *const T,
    c_int,
    A,
    *mut T,
    c_int,
);
type TrsmFn<A, T> = unsafe extern "C" fn(
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    A,
    *const T,
    c_int,
    *mut T,
    c_int,
);

fn pair_runs<T>(x: &StridedViewMut<'_, T>, y: &StridedViewMut<'_, T>) -> Result<Runs> {
    Runs::elementwise(&[
        Operand::new("x", x.dims(), x.strides()),
        Operand::new("y", y.dims(), y.strides()),
    ])
}

/// Apply a plane rotation: `(x, y) <- (c x + s y, c y - s x)`.
pub fn rot_into<T: RealBlas>(
    ctx: &BlasContext,
    x: &mut StridedViewMut<'_, T>,
    y: &mut StridedViewMut<'_, T>,
    c: T,
    s: T,
) -> Result<()> {
    let runs = pair_runs(x, y)?;
    let binding = ctx.bind(BlasRoutine::Rot, T::FORMAT)?;
    // SAFETY: `cblas_?rot` has this signature.
    let f: RotFn<T> = unsafe { binding.cast() };
    let (xp, yp) = (x.as_mut_ptr(), y.as_mut_ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
            c,
            s,
        )
    })
}

/// Apply a modified Givens rotation described by `param`
/// (`[flag, h11, h21, h12, h22]`, at least [`ROTM_PARAM_LEN`] elements).
///
/// `x` and `y` must have the same non-empty shape of rank ≥ 1.
pub fn rotm_into<T: RealBlas>(
    ctx: &BlasContext,
    x: &mut StridedViewMut<'_, T>,
    y: &mut StridedViewMut<'_, T>,
    param: &StridedView<'_, T>,
) -> Result<()> {
    let runs = pair_runs(x, y)?;
    check_param_vector("param", param.dims(), ROTM_PARAM_LEN)?;
    let param: Vec<T> = (0..param.dims()[0]).map(|i| param.get(&[i])).collect();

    let binding = ctx.bind(BlasRoutine::Rotm, T::FORMAT)?;
    // SAFETY: `cblas_?rotm` has this signature.
    let f: RotmFn<T> = unsafe { binding.cast() };
    let (xp, yp) = (x.as_mut_ptr(), y.as_mut_ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
            param.as_ptr(),
        )
    })
}

/// Exchange the contents of `x` and `y`.
pub fn swap_into<T: BlasScalar>(
    ctx: &BlasContext,
    x: &mut StridedViewMut<'_, T>,
    y: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let runs = pair_runs(x, y)?;
    let binding = ctx.bind(BlasRoutine::Swap, T::FORMAT)?;
    // SAFETY: `cblas_?swap` has this signature.
    let f: SwapFn<T> = unsafe { binding.cast() };
    let (xp, yp) = (x.as_mut_ptr(), y.as_mut_ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
        )
    })
}

/// `x <- alpha x`.
pub fn scal_into<T: BlasScalar>(
    ctx: &BlasContext,
    alpha: T,
    x: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let runs = Runs::elementwise(&[Operand::new("x", x.dims(), x.strides())])?;
    let binding = ctx.bind(BlasRoutine::Scal, T::FORMAT)?;
    // SAFETY: `cblas_?scal` has this signature.
    let f: ScalFn<T::Arg, T> = unsafe { binding.cast() };
    let alpha_arg = T::as_arg(&alpha);
    let xp = x.as_mut_ptr();
    runs.execute(&binding, |off, n, inc| unsafe {
        f(n, alpha_arg, xp.wrapping_offset(run_offset(off[0], n, inc[0])), inc[0])
    })
}

/// `y <- x`.
pub fn copy_into<T: BlasScalar>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
    y: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let runs = Runs::elementwise(&[
        Operand::new("x", x.dims(), x.strides()),
        Operand::new("y", y.dims(), y.strides()),
    ])?;
    let binding = ctx.bind(BlasRoutine::Copy, T::FORMAT)?;
    // SAFETY: `cblas_?copy` has this signature.
    let f: CopyFn<T> = unsafe { binding.cast() };
    let (xp, yp) = (x.ptr(), y.as_mut_ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
        )
    })
}

/// `y <- alpha x + y`.
pub fn axpy_into<T: BlasScalar>(
    ctx: &BlasContext,
    alpha: T,
    x: &StridedView<'_, T>,
    y: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let runs = Runs::elementwise(&[
        Operand::new("x", x.dims(), x.strides()),
        Operand::new("y", y.dims(), y.strides()),
    ])?;
    let binding = ctx.bind(BlasRoutine::Axpy, T::FORMAT)?;
    // SAFETY: `cblas_?axpy` has this signature.
    let f: AxpyFn<T::Arg, T> = unsafe { binding.cast() };
    let alpha_arg = T::as_arg(&alpha);
    let (xp, yp) = (x.ptr(), y.as_mut_ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            alpha_arg,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
        )
    })
}

/// Dot product along the last axis.
///
/// Returns an array of the outer shape (rank 0 for vector inputs).
pub fn dot<T: RealBlas>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
    y: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    let runs = Runs::along_last_axis(&[
        Operand::new("x", x.dims(), x.strides()),
        Operand::new("y", y.dims(), y.strides()),
    ])?;
    let binding = ctx.bind(BlasRoutine::Dot, T::FORMAT)?;
    // SAFETY: `cblas_sdot`/`cblas_ddot` have this signature.
    let f: DotFn<T> = unsafe { binding.cast() };
    let mut out = StridedArray::<T>::row_major(runs.outer_dims());
    let values = out.data_mut();
    let (xp, yp) = (x.ptr(), y.ptr());
    runs.execute(&binding, |off, n, inc| {
        values[off[2] as usize] = unsafe {
            f(
                n,
                xp.wrapping_offset(run_offset(off[0], n, inc[0])),
                inc[0],
                yp.wrapping_offset(run_offset(off[1], n, inc[1])),
                inc[1],
            )
        };
    })?;
    Ok(out)
}

fn complex_dot<T: ComplexBlas>(
    ctx: &BlasContext,
    routine: BlasRoutine,
    x: &StridedView<'_, T>,
    y: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    let runs = Runs::along_last_axis(&[
        Operand::new("x", x.dims(), x.strides()),
        Operand::new("y", y.dims(), y.strides()),
    ])?;
    let binding = ctx.bind(routine, T::FORMAT)?;
    // SAFETY: `cblas_?dotu_sub`/`cblas_?dotc_sub` have this signature.
    let f: DotSubFn<T> = unsafe { binding.cast() };
    let mut out = StridedArray::<T>::row_major(runs.outer_dims());
    let values = out.data_mut();
    let (xp, yp) = (x.ptr(), y.ptr());
    runs.execute(&binding, |off, n, inc| unsafe {
        f(
            n,
            xp.wrapping_offset(run_offset(off[0], n, inc[0])),
            inc[0],
            yp.wrapping_offset(run_offset(off[1], n, inc[1])),
            inc[1],
            &mut values[off[2] as usize],
        )
    })?;
    Ok(out)
}

/// Unconjugated complex dot product along the last axis.
pub fn dotu<T: ComplexBlas>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
    y: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    complex_dot(ctx, BlasRoutine::Dotu, x, y)
}

/// Conjugated complex dot product `conj(x) . y` along the last axis.
pub fn dotc<T: ComplexBlas>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
    y: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    complex_dot(ctx, BlasRoutine::Dotc, x, y)
}

fn norm<T: BlasScalar>(
    ctx: &BlasContext,
    routine: BlasRoutine,
    x: &StridedView<'_, T>,
) -> Result<StridedArray<T::Real>> {
    let runs = Runs::along_last_axis(&[Operand::new("x", x.dims(), x.strides())])?;
    let binding = ctx.bind(routine, T::FORMAT)?;
    // SAFETY: `cblas_?nrm2`/`cblas_?asum` return the real type.
    let f: NormFn<T, T::Real> = unsafe { binding.cast() };
    let mut out = StridedArray::<T::Real>::row_major(runs.outer_dims());
    let values = out.data_mut();
    let xp = x.ptr();
    runs.execute(&binding, |off, n, inc| {
        values[off[1] as usize] =
            unsafe { f(n, xp.wrapping_offset(run_offset(off[0], n, inc[0])), inc[0]) };
    })?;
    Ok(out)
}

/// Euclidean norm along the last axis.
pub fn nrm2<T: BlasScalar>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
) -> Result<StridedArray<T::Real>> {
    norm(ctx, BlasRoutine::Nrm2, x)
}

/// Sum of absolute values (`|re| + |im|` for complex) along the last axis.
pub fn asum<T: BlasScalar>(
    ctx: &BlasContext,
    x: &StridedView<'_, T>,
) -> Result<StridedArray<T::Real>> {
    norm(ctx, BlasRoutine::Asum, x)
}

/// `c <- alpha op(a) op(b) + beta c` for every batch index.
///
/// All three operands must be BLAS-compatible in `order` and share their
/// batch dimensions.
#[allow(clippy::too_many_arguments)]
pub fn gemm_into<T: BlasScalar>(
    ctx: &BlasContext,
    order: Order,
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: T,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
    beta: T,
    c: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::new("b", order, b.dims(), b.strides())?;
    let mc = MatrixOperand::new("c", order, c.dims(), c.strides())?;
    check_batches(&[&ma, &mb, &mc])?;

    let (m, k) = ma.op_dims(trans_a);
    let (kb, n) = mb.op_dims(trans_b);
    if kb != k {
        return Err(LinalgError::Shape {
            operand: "b",
            reason: format!("inner dimension {kb} does not match a ({k})"),
        });
    }
    if (mc.rows(), mc.cols()) != (m, n) {
        return Err(LinalgError::Shape {
            operand: "c",
            reason: format!("matrix {}x{} is not {m}x{n}", mc.rows(), mc.cols()),
        });
    }
    let (m, n, k) = (
        to_blas_int("c", "rows", m)?,
        to_blas_int("c", "columns", n)?,
        to_blas_int("a", "inner dimension", k)?,
    );

    let binding = ctx.bind(BlasRoutine::Gemm, T::FORMAT)?;
    // SAFETY: `cblas_?gemm` has this signature.
    let f: GemmFn<T::Arg, T> = unsafe { binding.cast() };
    let (alpha_arg, beta_arg) = (T::as_arg(&alpha), T::as_arg(&beta));
    let (ap, bp, cp) = (a.ptr(), b.ptr(), c.as_mut_ptr());
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &mb.batch_strides, &mc.batch_strides],
        |off| {
            unsafe {
                f(
                    order.cblas_code(),
                    trans_a.cblas_code(),
                    trans_b.cblas_code(),
                    m,
                    n,
                    k,
                    alpha_arg,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    bp.wrapping_offset(off[1]),
                    mb.ld,
                    beta_arg,
                    cp.wrapping_offset(off[2]),
                    mc.ld,
                )
            };
            Ok(())
        },
    )
}

/// Solve `op(a) x = alpha b` (`side = Left`) or `x op(a) = alpha b`
/// (`side = Right`) with triangular `a`, overwriting `b` with `x`.
#[allow(clippy::too_many_arguments)]
pub fn trsm_into<T: BlasScalar>(
    ctx: &BlasContext,
    order: Order,
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    alpha: T,
    a: &StridedView<'_, T>,
    b: &mut StridedViewMut<'_, T>,
) -> Result<()> {
    let ma = MatrixOperand::new("a", order, a.dims(), a.strides())?;
    let mb = MatrixOperand::new("b", order, b.dims(), b.strides())?;
    check_batches(&[&ma, &mb])?;

    let k = ma.require_square()?;
    let expected = match side {
        Side::Left => mb.rows(),
        Side::Right => mb.cols(),
    };
    if k != expected {
        return Err(LinalgError::Shape {
            operand: "a",
            reason: format!("order {k} does not match b ({expected}) on the {side:?} side"),
        });
    }
    let (m, n) = (
        to_blas_int("b", "rows", mb.rows())?,
        to_blas_int("b", "columns", mb.cols())?,
    );

    let binding = ctx.bind(BlasRoutine::Trsm, T::FORMAT)?;
    // SAFETY: `cblas_?trsm` has this signature.
    let f: TrsmFn<T::Arg, T> = unsafe { binding.cast() };
    let alpha_arg = T::as_arg(&alpha);
    let (ap, bp) = (a.ptr(), b.as_mut_ptr());
    execute_batches(
        &binding,
        &ma.batch_dims,
        &[&ma.batch_strides, &mb.batch_strides],
        |off| {
            unsafe {
                f(
                    order.cblas_code(),
                    side.cblas_code(),
                    uplo.cblas_code(),
                    trans.cblas_code(),
                    diag.cblas_code(),
                    m,
                    n,
                    alpha_arg,
                    ap.wrapping_offset(off[0]),
                    ma.ld,
                    bp.wrapping_offset(off[1]),
                    mb.ld,
                )
            };
            Ok(())
        },
    )
}
