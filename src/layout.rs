//! BLAS matrix layout detection and conversion.
//!
//! The last two dimensions of an operand form the matrix; leading dimensions
//! are batch dimensions and may have any stride.

use strided_kernel::for_each_outer;
use strided_view::{col_major_strides, row_major_strides, StridedArray};

use crate::option::Order;
use crate::{LinalgError, Result};

/// Information about a BLAS-compatible matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlasMatrix {
    pub order: Order,
    pub rows: usize,
    pub cols: usize,
    /// Leading dimension.
    pub ld: usize,
}

/// Check whether the trailing matrix of `dims`/`strides` can be passed to
/// BLAS in `order`.
///
/// - Row-major: `stride[-1] == 1` and `stride[-2] >= cols`
/// - Column-major: `stride[-2] == 1` and `stride[-1] >= rows`
///
/// Strides of size-1 axes are never dereferenced and are not checked; the
/// leading dimension then falls back to the smallest legal value.
pub fn blas_matrix(order: Order, dims: &[usize], strides: &[isize]) -> Option<BlasMatrix> {
    let n = dims.len();
    if n < 2 || strides.len() != n {
        return None;
    }
    let (rows, cols) = (dims[n - 2], dims[n - 1]);
    let (row_stride, col_stride) = (strides[n - 2], strides[n - 1]);

    let (inner_len, inner_stride, outer_len, outer_stride) = match order {
        Order::RowMajor => (cols, col_stride, rows, row_stride),
        Order::ColMajor => (rows, row_stride, cols, col_stride),
    };
    if inner_len > 1 && inner_stride != 1 {
        return None;
    }
    let min_ld = inner_len.max(1);
    let ld = if outer_len > 1 {
        if outer_stride < min_ld as isize {
            return None;
        }
        outer_stride as usize
    } else {
        min_ld
    };
    Some(BlasMatrix {
        order,
        rows,
        cols,
        ld,
    })
}

/// Dense strides for `dims` where every trailing matrix is stored in
/// `order` and batches follow each other row-major.
pub fn matrix_strides(order: Order, dims: &[usize]) -> Vec<isize> {
    let n = dims.len();
    match order {
        Order::RowMajor => row_major_strides(dims),
        Order::ColMajor if n < 2 => col_major_strides(dims),
        Order::ColMajor => {
            let mut strides = row_major_strides(dims);
            let matrix = col_major_strides(&dims[n - 2..]);
            strides[n - 2] = matrix[0];
            strides[n - 1] = matrix[1];
            strides
        }
    }
}

/// Return `a` unchanged if its matrices are BLAS-compatible in `order`,
/// otherwise a dense copy laid out by [`matrix_strides`].
///
/// Arrays of rank below 2 are returned unchanged; rank checks happen at the
/// routine entry points.
pub fn into_blas_layout<T: Copy + Default>(
    a: StridedArray<T>,
    order: Order,
) -> Result<StridedArray<T>> {
    if a.ndim() < 2 || blas_matrix(order, a.dims(), a.strides()).is_some() {
        return Ok(a);
    }
    relayout(&a, &matrix_strides(order, a.dims()))
}

/// Layout conversion for a right-hand side of a solver whose coefficient
/// matrices have rank `a_rank`.
///
/// A right-hand side one rank below `a_rank` is a batch of vectors; it only
/// needs a unit stride along its last axis, which suits both orders.
pub fn into_rhs_layout<T: Copy + Default>(
    b: StridedArray<T>,
    order: Order,
    a_rank: usize,
) -> Result<StridedArray<T>> {
    if b.ndim() >= 1 && b.ndim() + 1 == a_rank {
        let last = b.ndim() - 1;
        if b.dims()[last] <= 1 || b.strides()[last] == 1 {
            return Ok(b);
        }
        return relayout(&b, &row_major_strides(b.dims()));
    }
    into_blas_layout(b, order)
}

/// Copy `a` into a fresh dense buffer with the given strides.
pub(crate) fn relayout<T: Copy + Default>(
    a: &StridedArray<T>,
    strides: &[isize],
) -> Result<StridedArray<T>> {
    let src = a.data();
    let base = a.offset();
    let mut data = vec![T::default(); a.len()];
    for_each_outer::<LinalgError, _>(a.dims(), &[a.strides(), strides], |offsets| {
        data[offsets[1] as usize] = src[(base + offsets[0]) as usize];
        Ok(())
    })?;
    Ok(StridedArray::from_parts(data, a.dims(), strides, 0)?)
}
