//! Outer-loop driver handing inner strided runs to a callback.
//!
//! A [`RunPlan`] splits a shared shape into outer dimensions, walked here in
//! row-major order (last outer dimension fastest), and one inner run, handed
//! to the callback as `(offsets, run_len, inner_strides)`. Offsets and
//! strides are in elements, one entry per operand.

use strided_view::{Result, StridedError};

use crate::fuse::{squeeze_unit_dims, trailing_run_rank};

/// Execution plan for walking several operands of identical shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    outer_dims: Vec<usize>,
    outer_strides: Vec<Vec<isize>>,
    run_len: usize,
    inner_strides: Vec<isize>,
}

fn check_strides(dims: &[usize], strides_list: &[&[isize]]) -> Result<()> {
    for strides in strides_list {
        if strides.len() != dims.len() {
            return Err(StridedError::StrideLengthMismatch);
        }
    }
    Ok(())
}

impl RunPlan {
    /// Plan with the maximal fused trailing run.
    ///
    /// Size-1 dimensions are dropped first. A shape made only of size-1
    /// dimensions becomes a single run of length 1.
    pub fn fused(dims: &[usize], strides_list: &[&[isize]]) -> Result<Self> {
        check_strides(dims, strides_list)?;
        let (dims, strides) = squeeze_unit_dims(dims, strides_list);
        let run_rank = trailing_run_rank(&dims, &strides);
        if run_rank == 0 {
            return Ok(Self {
                outer_dims: vec![],
                outer_strides: vec![vec![]; strides.len()],
                run_len: 1,
                inner_strides: vec![1; strides.len()],
            });
        }

        let split = dims.len() - run_rank;
        let run_len = dims[split..].iter().product();
        let inner_strides = strides.iter().map(|s| s[dims.len() - 1]).collect();
        let outer_strides = strides.iter().map(|s| s[..split].to_vec()).collect();
        Ok(Self {
            outer_dims: dims[..split].to_vec(),
            outer_strides,
            run_len,
            inner_strides,
        })
    }

    /// Plan whose inner run is exactly the last axis.
    ///
    /// Used by reductions, where every outer index owns one output element.
    pub fn along_last_axis(dims: &[usize], strides_list: &[&[isize]]) -> Result<Self> {
        check_strides(dims, strides_list)?;
        let Some((&run_len, outer)) = dims.split_last() else {
            return Err(StridedError::RankMismatch(0, 1));
        };
        let split = outer.len();
        Ok(Self {
            outer_dims: outer.to_vec(),
            outer_strides: strides_list.iter().map(|s| s[..split].to_vec()).collect(),
            run_len,
            inner_strides: strides_list.iter().map(|s| s[split]).collect(),
        })
    }

    /// Elements per inner run.
    #[inline]
    pub fn run_len(&self) -> usize {
        self.run_len
    }

    /// Per-operand stride inside a run.
    #[inline]
    pub fn inner_strides(&self) -> &[isize] {
        &self.inner_strides
    }

    #[inline]
    pub fn outer_dims(&self) -> &[usize] {
        &self.outer_dims
    }

    /// Number of runs the plan will hand out.
    pub fn iterations(&self) -> usize {
        if self.run_len == 0 {
            return 0;
        }
        self.outer_dims.iter().product()
    }

    /// Call `f(offsets, run_len, inner_strides)` once per outer index.
    pub fn for_each<E, F>(&self, mut f: F) -> std::result::Result<(), E>
    where
        E: From<StridedError>,
        F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
    {
        if self.run_len == 0 {
            return Ok(());
        }
        let strides: Vec<&[isize]> = self.outer_strides.iter().map(Vec::as_slice).collect();
        for_each_outer(&self.outer_dims, &strides, |offsets| {
            f(offsets, self.run_len, &self.inner_strides)
        })
    }
}

/// Visit every index of `dims` exactly once, passing the element offset of
/// that index for each operand.
///
/// Row-major order: the last dimension varies fastest. Rank 0 visits once with
/// all offsets zero; any zero-sized dimension visits nothing.
pub fn for_each_outer<E, F>(
    dims: &[usize],
    strides_list: &[&[isize]],
    mut f: F,
) -> std::result::Result<(), E>
where
    E: From<StridedError>,
    F: FnMut(&[isize]) -> std::result::Result<(), E>,
{
    check_strides(dims, strides_list)?;
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }

    let rank = dims.len();
    let mut offsets = vec![0isize; strides_list.len()];
    let mut idx = vec![0usize; rank];
    loop {
        f(&offsets)?;

        // Odometer increment with incremental offset update.
        let mut d = rank;
        loop {
            if d == 0 {
                return Ok(());
            }
            d -= 1;
            idx[d] += 1;
            for (offset, s) in offsets.iter_mut().zip(strides_list.iter()) {
                *offset += s[d];
            }
            if idx[d] < dims[d] {
                break;
            }
            for (offset, s) in offsets.iter_mut().zip(strides_list.iter()) {
                *offset -= dims[d] as isize * s[d];
            }
            idx[d] = 0;
        }
    }
}
