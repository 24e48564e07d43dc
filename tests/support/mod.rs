//! In-process stand-ins for CBLAS and LAPACKE routines.
//!
//! Every stub records its call in a thread-local log and computes the
//! reference result, so tests can check both how often the dispatch loop
//! called out and what the operands look like afterwards.

#![allow(dead_code)]

use std::cell::RefCell;
use std::os::raw::{c_char, c_int, c_void};

use num_complex::Complex64;
use strided_linalg::{BlasContext, LapackContext, SymbolTable};

const ROW_MAJOR: c_int = 101;
const NO_TRANS: c_int = 111;
const RIGHT: c_int = 142;
const LOWER: c_int = 122;
const UNIT: c_int = 132;

/// One native call as seen by a stub.
///
/// `args` holds the increments of level-1 routines and the option codes and
/// leading dimensions of matrix routines, in signature order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub routine: &'static str,
    pub n: i32,
    pub args: Vec<i32>,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = RefCell::new(Vec::new());
}

fn record(routine: &'static str, n: c_int, args: &[c_int]) {
    CALLS.with(|calls| {
        calls.borrow_mut().push(Call {
            routine,
            n,
            args: args.to_vec(),
        })
    });
}

/// A LAPACKE character option as recorded in [`Call::args`].
pub fn flag(c: u8) -> i32 {
    c as i32
}

/// Drain the calls recorded on this thread.
pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

/// Address of element `i` of a BLAS vector; negative increments start at
/// the far end.
fn elem<T>(base: *const T, n: c_int, inc: c_int, i: c_int) -> *const T {
    let k = if inc >= 0 { i * inc } else { (n - 1 - i) * -inc };
    base.wrapping_offset(k as isize)
}

fn elem_mut<T>(base: *mut T, n: c_int, inc: c_int, i: c_int) -> *mut T {
    elem(base as *const T, n, inc, i) as *mut T
}

/// Modified Givens rotation of one pair.
pub fn rotm_reference(x: f64, y: f64, param: &[f64]) -> (f64, f64) {
    let (h11, h21, h12, h22) = match param[0] {
        flag if flag == -2.0 => return (x, y),
        flag if flag == -1.0 => (param[1], param[2], param[3], param[4]),
        flag if flag == 0.0 => (1.0, param[2], param[3], 1.0),
        _ => (param[1], -1.0, 1.0, param[4]),
    };
    (h11 * x + h12 * y, h21 * x + h22 * y)
}

// ============================================================================
// CBLAS
// ============================================================================

extern "C" fn drot(n: c_int, x: *mut f64, incx: c_int, y: *mut f64, incy: c_int, c: f64, s: f64) {
    record("drot", n, &[incx, incy]);
    for i in 0..n {
        unsafe {
            let (xp, yp) = (elem_mut(x, n, incx, i), elem_mut(y, n, incy, i));
            let (xv, yv) = (*xp, *yp);
            *xp = c * xv + s * yv;
            *yp = c * yv - s * xv;
        }
    }
}

extern "C" fn drotm(
    n: c_int,
    x: *mut f64,
    incx: c_int,
    y: *mut f64,
    incy: c_int,
    param: *const f64,
) {
    record("drotm", n, &[incx, incy]);
    let param = unsafe { std::slice::from_raw_parts(param, 5) };
    for i in 0..n {
        unsafe {
            let (xp, yp) = (elem_mut(x, n, incx, i), elem_mut(y, n, incy, i));
            let (xv, yv) = rotm_reference(*xp, *yp, param);
            *xp = xv;
            *yp = yv;
        }
    }
}

extern "C" fn dswap(n: c_int, x: *mut f64, incx: c_int, y: *mut f64, incy: c_int) {
    record("dswap", n, &[incx, incy]);
    for i in 0..n {
        unsafe { std::ptr::swap(elem_mut(x, n, incx, i), elem_mut(y, n, incy, i)) };
    }
}

extern "C" fn dscal(n: c_int, alpha: f64, x: *mut f64, incx: c_int) {
    record("dscal", n, &[incx]);
    for i in 0..n {
        unsafe { *elem_mut(x, n, incx, i) *= alpha };
    }
}

extern "C" fn dcopy(n: c_int, x: *const f64, incx: c_int, y: *mut f64, incy: c_int) {
    record("dcopy", n, &[incx, incy]);
    for i in 0..n {
        unsafe { *elem_mut(y, n, incy, i) = *elem(x, n, incx, i) };
    }
}

extern "C" fn daxpy(n: c_int, alpha: f64, x: *const f64, incx: c_int, y: *mut f64, incy: c_int) {
    record("daxpy", n, &[incx, incy]);
    for i in 0..n {
        unsafe { *elem_mut(y, n, incy, i) += alpha * *elem(x, n, incx, i) };
    }
}

extern "C" fn zaxpy(
    n: c_int,
    alpha: *const c_void,
    x: *const Complex64,
    incx: c_int,
    y: *mut Complex64,
    incy: c_int,
) {
    record("zaxpy", n, &[incx, incy]);
    let alpha = unsafe { *(alpha as *const Complex64) };
    for i in 0..n {
        unsafe { *elem_mut(y, n, incy, i) += alpha * *elem(x, n, incx, i) };
    }
}

extern "C" fn ddot(n: c_int, x: *const f64, incx: c_int, y: *const f64, incy: c_int) -> f64 {
    record("ddot", n, &[incx, incy]);
    (0..n)
        .map(|i| unsafe { *elem(x, n, incx, i) * *elem(y, n, incy, i) })
        .sum()
}

extern "C" fn zdotc_sub(
    n: c_int,
    x: *const Complex64,
    incx: c_int,
    y: *const Complex64,
    incy: c_int,
    out: *mut Complex64,
) {
    record("zdotc_sub", n, &[incx, incy]);
    let sum: Complex64 = (0..n)
        .map(|i| unsafe { (*elem(x, n, incx, i)).conj() * *elem(y, n, incy, i) })
        .sum();
    unsafe { *out = sum };
}

extern "C" fn zdotu_sub(
    n: c_int,
    x: *const Complex64,
    incx: c_int,
    y: *const Complex64,
    incy: c_int,
    out: *mut Complex64,
) {
    record("zdotu_sub", n, &[incx, incy]);
    let sum: Complex64 = (0..n)
        .map(|i| unsafe { *elem(x, n, incx, i) * *elem(y, n, incy, i) })
        .sum();
    unsafe { *out = sum };
}

extern "C" fn dnrm2(n: c_int, x: *const f64, incx: c_int) -> f64 {
    record("dnrm2", n, &[incx]);
    (0..n)
        .map(|i| unsafe { (*elem(x, n, incx, i)).powi(2) })
        .sum::<f64>()
        .sqrt()
}

extern "C" fn dasum(n: c_int, x: *const f64, incx: c_int) -> f64 {
    record("dasum", n, &[incx]);
    (0..n).map(|i| unsafe { (*elem(x, n, incx, i)).abs() }).sum()
}

/// Offset of `(i, j)` in a matrix with leading dimension `ld`.
fn at(layout: c_int, ld: c_int, i: c_int, j: c_int) -> isize {
    if layout == ROW_MAJOR {
        (i * ld + j) as isize
    } else {
        (j * ld + i) as isize
    }
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dgemm(
    layout: c_int,
    trans_a: c_int,
    trans_b: c_int,
    m: c_int,
    n: c_int,
    k: c_int,
    alpha: f64,
    a: *const f64,
    lda: c_int,
    b: *const f64,
    ldb: c_int,
    beta: f64,
    c: *mut f64,
    ldc: c_int,
) {
    record("dgemm", m, &[n, k, lda, ldb, ldc]);
    let op = |p: *const f64, ld: c_int, trans: c_int, i: c_int, j: c_int| unsafe {
        if trans == NO_TRANS {
            *p.offset(at(layout, ld, i, j))
        } else {
            *p.offset(at(layout, ld, j, i))
        }
    };
    for i in 0..m {
        for j in 0..n {
            let sum: f64 = (0..k)
                .map(|l| op(a, lda, trans_a, i, l) * op(b, ldb, trans_b, l, j))
                .sum();
            unsafe {
                let cp = c.offset(at(layout, ldc, i, j));
                *cp = alpha * sum + beta * *cp;
            }
        }
    }
}

/// Dense row-major copy of `op(a)` for a `k x k` triangular `a`; the
/// other triangle reads as zero and a unit diagonal as one.
unsafe fn triangle(
    layout: c_int,
    a: *const f64,
    lda: c_int,
    k: c_int,
    lower: bool,
    trans: bool,
    unit: bool,
) -> Vec<f64> {
    let mut t = vec![0.0; (k * k) as usize];
    for i in 0..k {
        for j in 0..k {
            let stored = if lower { j <= i } else { j >= i };
            let v = if i == j && unit {
                1.0
            } else if stored {
                *a.offset(at(layout, lda, i, j))
            } else {
                0.0
            };
            let (r, c) = if trans { (j, i) } else { (i, j) };
            t[(r * k + c) as usize] = v;
        }
    }
    t
}

fn transposed(t: &[f64], k: usize) -> Vec<f64> {
    let mut out = vec![0.0; k * k];
    for i in 0..k {
        for j in 0..k {
            out[j * k + i] = t[i * k + j];
        }
    }
    out
}

/// Solve `t x = rhs` in place for a dense triangular `t`.
fn solve_triangular(t: &[f64], k: usize, lower: bool, rhs: &mut [f64]) {
    if lower {
        for i in 0..k {
            let s: f64 = (0..i).map(|l| t[i * k + l] * rhs[l]).sum();
            rhs[i] = (rhs[i] - s) / t[i * k + i];
        }
    } else {
        for i in (0..k).rev() {
            let s: f64 = (i + 1..k).map(|l| t[i * k + l] * rhs[l]).sum();
            rhs[i] = (rhs[i] - s) / t[i * k + i];
        }
    }
}

/// Apply `solve` to every column of the `m x n` matrix `b`.
unsafe fn for_each_column(
    layout: c_int,
    m: c_int,
    n: c_int,
    b: *mut f64,
    ldb: c_int,
    mut solve: impl FnMut(&mut [f64]),
) {
    for j in 0..n {
        let mut col: Vec<f64> = (0..m).map(|i| *b.offset(at(layout, ldb, i, j))).collect();
        solve(&mut col);
        for i in 0..m {
            *b.offset(at(layout, ldb, i, j)) = col[i as usize];
        }
    }
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dtrsm(
    layout: c_int,
    side: c_int,
    uplo: c_int,
    trans: c_int,
    diag: c_int,
    m: c_int,
    n: c_int,
    alpha: f64,
    a: *const f64,
    lda: c_int,
    b: *mut f64,
    ldb: c_int,
) {
    record("dtrsm", m, &[layout, side, uplo, trans, diag, n, lda, ldb]);
    let lower = uplo == LOWER;
    let trans = trans != NO_TRANS;
    let k = if side == RIGHT { n } else { m };
    let t = unsafe { triangle(layout, a, lda, k, lower, trans, diag == UNIT) };
    // op(a) is lower triangular when exactly one of lower/trans holds.
    let op_lower = lower != trans;
    let k = k as usize;
    unsafe {
        if side == RIGHT {
            // x op(a) = alpha b  <=>  op(a)^T x^T = alpha b^T, row by row.
            let tt = transposed(&t, k);
            for i in 0..m {
                let mut row: Vec<f64> =
                    (0..n).map(|j| alpha * *b.offset(at(layout, ldb, i, j))).collect();
                solve_triangular(&tt, k, !op_lower, &mut row);
                for j in 0..n {
                    *b.offset(at(layout, ldb, i, j)) = row[j as usize];
                }
            }
        } else {
            for_each_column(layout, m, n, b, ldb, |col| {
                col.iter_mut().for_each(|v| *v *= alpha);
                solve_triangular(&t, k, op_lower, col);
            });
        }
    }
}

pub fn blas_stubs() -> SymbolTable {
    SymbolTable::new("blas stubs")
        .with("cblas_drot", drot as *const c_void)
        .with("cblas_drotm", drotm as *const c_void)
        .with("cblas_dswap", dswap as *const c_void)
        .with("cblas_dscal", dscal as *const c_void)
        .with("cblas_dcopy", dcopy as *const c_void)
        .with("cblas_daxpy", daxpy as *const c_void)
        .with("cblas_zaxpy", zaxpy as *const c_void)
        .with("cblas_ddot", ddot as *const c_void)
        .with("cblas_zdotc_sub", zdotc_sub as *const c_void)
        .with("cblas_zdotu_sub", zdotu_sub as *const c_void)
        .with("cblas_dnrm2", dnrm2 as *const c_void)
        .with("cblas_dasum", dasum as *const c_void)
        .with("cblas_dgemm", dgemm as *const c_void)
        .with("cblas_dtrsm", dtrsm as *const c_void)
}

/// A BLAS context bound to [`blas_stubs`].
pub fn blas_context() -> BlasContext {
    let ctx = BlasContext::new();
    ctx.install(blas_stubs());
    ctx
}

// ============================================================================
// LAPACKE
// ============================================================================

/// Doolittle LU with partial pivoting; returns the first zero pivot.
unsafe fn lu_factor(layout: c_int, m: c_int, n: c_int, a: *mut f64, lda: c_int, ipiv: *mut c_int) -> c_int {
    let el = |i, j| a.offset(at(layout, lda, i, j));
    let mut info = 0;
    for k in 0..m.min(n) {
        let mut p = k;
        for i in k + 1..m {
            if (*el(i, k)).abs() > (*el(p, k)).abs() {
                p = i;
            }
        }
        *ipiv.offset(k as isize) = p + 1;
        if *el(p, k) == 0.0 {
            if info == 0 {
                info = k + 1;
            }
            continue;
        }
        if p != k {
            for j in 0..n {
                std::ptr::swap(el(k, j), el(p, j));
            }
        }
        let pivot = *el(k, k);
        for i in k + 1..m {
            let l = *el(i, k) / pivot;
            *el(i, k) = l;
            for j in k + 1..n {
                *el(i, j) -= l * *el(k, j);
            }
        }
    }
    info
}

#[allow(clippy::too_many_arguments)]
unsafe fn lu_solve(
    layout: c_int,
    n: c_int,
    nrhs: c_int,
    a: *const f64,
    lda: c_int,
    ipiv: *const c_int,
    b: *mut f64,
    ldb: c_int,
) {
    let ael = |i, j| *a.offset(at(layout, lda, i, j));
    let bel = |i, j| b.offset(at(layout, ldb, i, j));
    for k in 0..n {
        let p = *ipiv.offset(k as isize) - 1;
        if p != k {
            for j in 0..nrhs {
                std::ptr::swap(bel(k, j), bel(p, j));
            }
        }
    }
    for j in 0..nrhs {
        for i in 0..n {
            let mut s = *bel(i, j);
            for l in 0..i {
                s -= ael(i, l) * *bel(l, j);
            }
            *bel(i, j) = s;
        }
        for i in (0..n).rev() {
            let mut s = *bel(i, j);
            for l in i + 1..n {
                s -= ael(i, l) * *bel(l, j);
            }
            *bel(i, j) = s / ael(i, i);
        }
    }
}

extern "C" fn dgetrf(layout: c_int, m: c_int, n: c_int, a: *mut f64, lda: c_int, ipiv: *mut c_int) -> c_int {
    record("dgetrf", n, &[lda]);
    unsafe { lu_factor(layout, m, n, a, lda, ipiv) }
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dgetrs(
    layout: c_int,
    trans: c_char,
    n: c_int,
    nrhs: c_int,
    a: *const f64,
    lda: c_int,
    ipiv: *const c_int,
    b: *mut f64,
    ldb: c_int,
) -> c_int {
    record("dgetrs", n, &[lda, ldb]);
    if trans as u8 != b'N' {
        return -2;
    }
    unsafe { lu_solve(layout, n, nrhs, a, lda, ipiv, b, ldb) };
    0
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dgesv(
    layout: c_int,
    n: c_int,
    nrhs: c_int,
    a: *mut f64,
    lda: c_int,
    ipiv: *mut c_int,
    b: *mut f64,
    ldb: c_int,
) -> c_int {
    record("dgesv", n, &[lda, ldb]);
    unsafe {
        let info = lu_factor(layout, n, n, a, lda, ipiv);
        if info == 0 {
            lu_solve(layout, n, nrhs, a, lda, ipiv, b, ldb);
        }
        info
    }
}

extern "C" fn dgetri(layout: c_int, n: c_int, a: *mut f64, lda: c_int, ipiv: *const c_int) -> c_int {
    record("dgetri", n, &[lda]);
    unsafe {
        for i in 0..n {
            if *a.offset(at(layout, lda, i, i)) == 0.0 {
                return i + 1;
            }
        }
        let size = (n * n) as usize;
        let mut lu = vec![0.0; size];
        let mut inv = vec![0.0; size];
        for i in 0..n {
            for j in 0..n {
                lu[at(ROW_MAJOR, n, i, j) as usize] = *a.offset(at(layout, lda, i, j));
            }
            inv[at(ROW_MAJOR, n, i, i) as usize] = 1.0;
        }
        lu_solve(ROW_MAJOR, n, n, lu.as_ptr(), n, ipiv, inv.as_mut_ptr(), n);
        for i in 0..n {
            for j in 0..n {
                *a.offset(at(layout, lda, i, j)) = inv[at(ROW_MAJOR, n, i, j) as usize];
            }
        }
    }
    0
}

/// Rejects its fourth argument, as a library does for a bad leading
/// dimension.
extern "C" fn dpotrf_rejecting(_layout: c_int, _uplo: c_char, n: c_int, _a: *mut f64, lda: c_int) -> c_int {
    record("dpotrf", n, &[lda]);
    -4
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dpotrs(
    layout: c_int,
    uplo: c_char,
    n: c_int,
    nrhs: c_int,
    a: *const f64,
    lda: c_int,
    b: *mut f64,
    ldb: c_int,
) -> c_int {
    record("dpotrs", n, &[layout, uplo as i32, nrhs, lda, ldb]);
    let lower = uplo as u8 == b'L';
    // a = l l^T (lower) or u^T u (upper); solve with the factor and its
    // transpose.
    let factor = unsafe { triangle(layout, a, lda, n, lower, false, false) };
    let factor_t = transposed(&factor, n as usize);
    let (first, second) = if lower { (&factor, &factor_t) } else { (&factor_t, &factor) };
    unsafe {
        for_each_column(layout, n, nrhs, b, ldb, |col| {
            solve_triangular(first, n as usize, true, col);
            solve_triangular(second, n as usize, false, col);
        })
    };
    0
}

#[allow(clippy::too_many_arguments)]
extern "C" fn dtrtrs(
    layout: c_int,
    uplo: c_char,
    trans: c_char,
    diag: c_char,
    n: c_int,
    nrhs: c_int,
    a: *const f64,
    lda: c_int,
    b: *mut f64,
    ldb: c_int,
) -> c_int {
    record(
        "dtrtrs",
        n,
        &[layout, uplo as i32, trans as i32, diag as i32, nrhs, lda, ldb],
    );
    let lower = uplo as u8 == b'L';
    let transpose = trans as u8 != b'N';
    let unit = diag as u8 == b'U';
    if !unit {
        for i in 0..n {
            if unsafe { *a.offset(at(layout, lda, i, i)) } == 0.0 {
                return i + 1;
            }
        }
    }
    let t = unsafe { triangle(layout, a, lda, n, lower, transpose, unit) };
    unsafe {
        for_each_column(layout, n, nrhs, b, ldb, |col| {
            solve_triangular(&t, n as usize, lower != transpose, col)
        })
    };
    0
}

/// Cyclic Jacobi on a dense symmetric row-major matrix: ascending
/// eigenvalues and the matching eigenvectors as columns.
fn jacobi_eigen(n: usize, mut a: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }
    for _ in 0..100 {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i * n + j] * a[i * n + j])
            .sum();
        if off < 1e-30 {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                let apq = a[p * n + q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (akp, akq) = (a[k * n + p], a[k * n + q]);
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p * n + k], a[q * n + k]);
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[k * n + p], v[k * n + q]);
                    v[k * n + p] = c * vkp - s * vkq;
                    v[k * n + q] = s * vkp + c * vkq;
                }
            }
        }
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[i * n + i].total_cmp(&a[j * n + j]));
    let values = order.iter().map(|&i| a[i * n + i]).collect();
    let mut vectors = vec![0.0; n * n];
    for (col, &src) in order.iter().enumerate() {
        for k in 0..n {
            vectors[k * n + col] = v[k * n + src];
        }
    }
    (values, vectors)
}

extern "C" fn dsyev(
    layout: c_int,
    jobz: c_char,
    uplo: c_char,
    n: c_int,
    a: *mut f64,
    lda: c_int,
    w: *mut f64,
) -> c_int {
    record("dsyev", n, &[layout, jobz as i32, uplo as i32, lda]);
    let lower = uplo as u8 == b'L';
    let k = n as usize;
    let mut dense = vec![0.0; k * k];
    for i in 0..n {
        for j in 0..n {
            let (r, c) = if (j <= i) == lower { (i, j) } else { (j, i) };
            dense[(i * n + j) as usize] = unsafe { *a.offset(at(layout, lda, r, c)) };
        }
    }
    let (values, vectors) = jacobi_eigen(k, dense);
    unsafe {
        for i in 0..n {
            *w.offset(i as isize) = values[i as usize];
            if jobz as u8 == b'V' {
                for j in 0..n {
                    *a.offset(at(layout, lda, i, j)) = vectors[(i * n + j) as usize];
                }
            }
        }
    }
    0
}

/// Hermitian eigenproblem through the real symmetric embedding
/// `[[re, -im], [im, re]]`, whose spectrum repeats every eigenvalue twice.
extern "C" fn zheev(
    layout: c_int,
    jobz: c_char,
    uplo: c_char,
    n: c_int,
    a: *mut Complex64,
    lda: c_int,
    w: *mut f64,
) -> c_int {
    record("zheev", n, &[layout, jobz as i32, uplo as i32, lda]);
    let lower = uplo as u8 == b'L';
    let k = n as usize;
    let mut embedded = vec![0.0; 4 * k * k];
    for i in 0..n {
        for j in 0..n {
            let z = if (j <= i) == lower {
                unsafe { *a.offset(at(layout, lda, i, j)) }
            } else {
                unsafe { (*a.offset(at(layout, lda, j, i))).conj() }
            };
            let (i, j) = (i as usize, j as usize);
            embedded[i * 2 * k + j] = z.re;
            embedded[i * 2 * k + k + j] = -z.im;
            embedded[(k + i) * 2 * k + j] = z.im;
            embedded[(k + i) * 2 * k + k + j] = z.re;
        }
    }
    let (values, vectors) = jacobi_eigen(2 * k, embedded);
    unsafe {
        for col in 0..k {
            *w.offset(col as isize) = values[2 * col];
            if jobz as u8 == b'V' {
                for row in 0..k {
                    let re = vectors[row * 2 * k + 2 * col];
                    let im = vectors[(k + row) * 2 * k + 2 * col];
                    *a.offset(at(layout, lda, row as c_int, col as c_int)) = Complex64::new(re, im);
                }
            }
        }
    }
    0
}

pub fn lapack_stubs() -> SymbolTable {
    SymbolTable::new("lapack stubs")
        .with("LAPACKE_dgetrf", dgetrf as *const c_void)
        .with("LAPACKE_dgetrs", dgetrs as *const c_void)
        .with("LAPACKE_dgesv", dgesv as *const c_void)
        .with("LAPACKE_dgetri", dgetri as *const c_void)
        .with("LAPACKE_dpotrf", dpotrf_rejecting as *const c_void)
        .with("LAPACKE_dpotrs", dpotrs as *const c_void)
        .with("LAPACKE_dtrtrs", dtrtrs as *const c_void)
        .with("LAPACKE_dsyev", dsyev as *const c_void)
        .with("LAPACKE_zheev", zheev as *const c_void)
}

/// A LAPACK context bound to [`lapack_stubs`].
pub fn lapack_context() -> LapackContext {
    let ctx = LapackContext::new();
    ctx.install(lapack_stubs());
    ctx
}
