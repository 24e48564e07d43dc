//! Dynamic-rank strided view types.
//!
//! - [`StridedView`]: Immutable dynamic-rank strided view
//! - [`StridedViewMut`]: Mutable dynamic-rank strided view
//! - [`StridedArray`]: Owned strided multidimensional array
//!
//! Strides are counted in elements and may be negative. Native routines
//! receive the base pointer plus these element strides.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::{Result, StridedError};

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds(len: usize, dims: &[usize], strides: &[isize], offset: isize) -> Result<()> {
    if dims.len() != strides.len() {
        return Err(StridedError::StrideLengthMismatch);
    }
    // Empty array - no access needed
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(StridedError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(StridedError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(StridedError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 {
        return Err(StridedError::OffsetOverflow);
    }
    if max_offset as usize >= len {
        return Err(StridedError::OffsetOverflow);
    }
    Ok(())
}

/// Linear element offset of `indices` relative to the view base.
#[inline]
fn linear_offset(dims: &[usize], strides: &[isize], indices: &[usize]) -> isize {
    assert_eq!(indices.len(), dims.len(), "index rank mismatch");
    let mut idx = 0isize;
    for (i, &index) in indices.iter().enumerate() {
        assert!(index < dims[i], "index out of bounds");
        idx += index as isize * strides[i];
    }
    idx
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1].max(1) as isize;
    }
    strides
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1].max(1) as isize;
    }
    strides
}

// ============================================================================
// StridedView
// ============================================================================

/// Dynamic-rank immutable strided view.
pub struct StridedView<'a, T> {
    ptr: *const T,
    data: &'a [T],
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

unsafe impl<T: Sync> Send for StridedView<'_, T> {}
unsafe impl<T: Sync> Sync for StridedView<'_, T> {}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            data: self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    /// Create a new immutable strided view from a borrowed slice.
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        let ptr = data.as_ptr().wrapping_offset(offset);
        Ok(Self {
            ptr,
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// The underlying slice (including elements outside the view).
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Raw const pointer to the element at the view's base offset.
    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr
    }
}

impl<'a, T: Copy> StridedView<'a, T> {
    /// Get an element by multi-dimensional index.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, indices: &[usize]) -> T {
        let idx = self.offset + linear_offset(&self.dims, &self.strides, indices);
        self.data[idx as usize]
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// Dynamic-rank mutable strided view.
pub struct StridedViewMut<'a, T> {
    ptr: *mut T,
    data: &'a mut [T],
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

unsafe impl<T: Send> Send for StridedViewMut<'_, T> {}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Create a new mutable strided view.
    pub fn new(
        data: &'a mut [T],
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        let ptr = data.as_mut_ptr().wrapping_offset(offset);
        Ok(Self {
            ptr,
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Raw const pointer to the element at the view's base offset.
    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr as *const T
    }

    /// Raw mutable pointer to the element at the view's base offset.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }
}

impl<'a, T: Copy> StridedViewMut<'a, T> {
    /// Get an element.
    pub fn get(&self, indices: &[usize]) -> T {
        let idx = self.offset + linear_offset(&self.dims, &self.strides, indices);
        self.data[idx as usize]
    }

    /// Set an element.
    pub fn set(&mut self, indices: &[usize], value: T) {
        let idx = self.offset + linear_offset(&self.dims, &self.strides, indices);
        self.data[idx as usize] = value;
    }
}

// ============================================================================
// StridedArray
// ============================================================================

/// Owned strided multidimensional array.
///
/// Supports both row-major (C default) and column-major layouts as well as
/// arbitrary strides supplied through [`StridedArray::from_parts`].
pub struct StridedArray<T> {
    data: Vec<T>,
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl<T> std::fmt::Debug for StridedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedArray")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<T: Clone> Clone for StridedArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T: Clone + Default> StridedArray<T> {
    /// Create a row-major array filled with `Default` values.
    pub fn row_major(dims: &[usize]) -> Self {
        Self::filled(dims, row_major_strides(dims))
    }

    /// Create an array with explicit non-negative strides, filled with
    /// `Default` values. The buffer is sized to cover the largest offset.
    pub fn with_strides(dims: &[usize], strides: &[isize]) -> Result<Self> {
        if dims.len() != strides.len() {
            return Err(StridedError::StrideLengthMismatch);
        }
        if let Some(dim) = strides.iter().position(|&s| s < 0) {
            return Err(StridedError::NegativeStride { dim });
        }
        let extent = if dims.iter().any(|&d| d == 0) {
            0
        } else {
            dims.iter()
                .zip(strides)
                .map(|(&d, &s)| (d - 1) * s as usize)
                .sum::<usize>()
                + 1
        };
        Self::from_parts(vec![T::default(); extent], dims, strides, 0)
    }

    fn filled(dims: &[usize], strides: Vec<isize>) -> Self {
        let total: usize = dims.iter().product();
        Self {
            data: vec![T::default(); total],
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
        }
    }

    /// Create a column-major array with values produced by a function.
    ///
    /// The function is called with indices in column-major iteration order.
    pub fn from_fn_col_major(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let total: usize = dims.iter().product();
        let rank = dims.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in 0..rank {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(col_major_strides(dims)),
            offset: 0,
        }
    }

    /// Create a row-major array with values produced by a function.
    ///
    /// The function is called with indices in row-major iteration order.
    pub fn from_fn_row_major(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let total: usize = dims.iter().product();
        let rank = dims.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        }
    }
}

impl<T> StridedArray<T> {
    /// Create from raw parts.
    pub fn from_parts(
        data: Vec<T>,
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// Wrap a vector as a contiguous one-dimensional array.
    pub fn from_vec(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            data,
            dims: Arc::from([n].as_slice()),
            strides: Arc::from([1isize].as_slice()),
            offset: 0,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// The backing buffer in memory order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Convert every element while keeping dims, strides and offset.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> StridedArray<U> {
        StridedArray {
            data: self.data.iter().map(f).collect(),
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }

    /// Create an immutable view over this array.
    pub fn view(&self) -> StridedView<'_, T> {
        StridedView {
            ptr: self.data.as_ptr().wrapping_offset(self.offset),
            data: &self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }

    /// Create a mutable view over this array.
    pub fn view_mut(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut {
            ptr: self.data.as_mut_ptr().wrapping_offset(self.offset),
            data: &mut self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }

    /// Iterate over all elements in memory order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T: Copy> StridedArray<T> {
    /// Get an element by multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> T {
        self[indices]
    }

    /// Set an element by multi-dimensional index.
    pub fn set(&mut self, indices: &[usize], value: T) {
        self[indices] = value;
    }
}

impl<T> Index<&[usize]> for StridedArray<T> {
    type Output = T;

    fn index(&self, indices: &[usize]) -> &T {
        let idx = self.offset + linear_offset(&self.dims, &self.strides, indices);
        &self.data[idx as usize]
    }
}

impl<T> IndexMut<&[usize]> for StridedArray<T> {
    fn index_mut(&mut self, indices: &[usize]) -> &mut T {
        let idx = self.offset + linear_offset(&self.dims, &self.strides, indices);
        &mut self.data[idx as usize]
    }
}

// ============================================================================
// Tests
// ============================================================================
