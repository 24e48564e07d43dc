//! Precondition checks and the strided dispatch loop.
//!
//! Everything here runs before the first native call: operand ranks, shapes
//! and the native `int` range of every length, increment and leading
//! dimension. Once a [`Runs`] plan or a [`MatrixOperand`] set exists, the
//! loop only computes pointers and calls the bound routine.

use std::os::raw::c_int;

use strided_kernel::{for_each_outer, RunPlan};
use strided_view::row_major_strides;

use crate::layout::{blas_matrix, BlasMatrix};
use crate::option::{Order, Transpose};
use crate::registry::Binding;
use crate::routine::RoutineId;
use crate::{LinalgError, Result};

/// Borrowed layout of one operand, named for error messages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Operand<'a> {
    pub name: &'static str,
    pub dims: &'a [usize],
    pub strides: &'a [isize],
}

impl<'a> Operand<'a> {
    pub fn new(name: &'static str, dims: &'a [usize], strides: &'a [isize]) -> Self {
        Self {
            name,
            dims,
            strides,
        }
    }
}

/// Convert a length or leading dimension to the native `int`.
pub(crate) fn to_blas_int(operand: &'static str, what: &str, value: usize) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| LinalgError::Shape {
        operand,
        reason: format!("{what} {value} exceeds the native int range"),
    })
}

fn inc_to_int(operand: &'static str, value: isize) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| LinalgError::Shape {
        operand,
        reason: format!("increment {value} exceeds the native int range"),
    })
}

/// Element offset of the lowest address touched by a run.
///
/// BLAS expects that address for negative increments and walks the run from
/// its far end.
#[inline]
pub(crate) fn run_offset(offset: isize, len: c_int, inc: c_int) -> isize {
    if inc < 0 && len > 0 {
        offset + (len as isize - 1) * inc as isize
    } else {
        offset
    }
}

/// Rank ≥ 1 and non-empty.
pub(crate) fn check_vector(operand: &Operand<'_>) -> Result<()> {
    if operand.dims.is_empty() {
        return Err(LinalgError::Dimension {
            operand: operand.name,
            rank: 0,
            expected: "at least 1",
        });
    }
    if operand.dims.iter().any(|&d| d == 0) {
        return Err(LinalgError::Shape {
            operand: operand.name,
            reason: format!("empty array of shape {:?}", operand.dims),
        });
    }
    Ok(())
}

pub(crate) fn check_same_shape(expected: &Operand<'_>, operand: &Operand<'_>) -> Result<()> {
    if expected.dims != operand.dims {
        return Err(LinalgError::Shape {
            operand: operand.name,
            reason: format!(
                "shape {:?} does not match {} shape {:?}",
                operand.dims, expected.name, expected.dims
            ),
        });
    }
    Ok(())
}

/// Auxiliary parameter vectors: rank exactly 1 and at least `min_len`
/// elements. Excess elements are ignored.
pub(crate) fn check_param_vector(name: &'static str, dims: &[usize], min_len: usize) -> Result<()> {
    if dims.len() != 1 {
        return Err(LinalgError::Dimension {
            operand: name,
            rank: dims.len(),
            expected: "exactly 1",
        });
    }
    if dims[0] < min_len {
        return Err(LinalgError::Shape {
            operand: name,
            reason: format!("length {} is shorter than {min_len}", dims[0]),
        });
    }
    Ok(())
}

fn check_primary_operands(operands: &[Operand<'_>]) -> Result<()> {
    for operand in operands {
        check_vector(operand)?;
    }
    if let Some((first, rest)) = operands.split_first() {
        for operand in rest {
            check_same_shape(first, operand)?;
        }
    }
    Ok(())
}

/// Planned inner runs with every length and increment already in native
/// `int` range.
#[derive(Debug)]
pub(crate) struct Runs {
    plan: RunPlan,
    len: c_int,
    incs: Vec<c_int>,
}

impl Runs {
    /// Elementwise routines: fuse the maximal uniform trailing extent.
    pub fn elementwise(operands: &[Operand<'_>]) -> Result<Self> {
        check_primary_operands(operands)?;
        let strides: Vec<&[isize]> = operands.iter().map(|o| o.strides).collect();
        let plan = RunPlan::fused(operands[0].dims, &strides)?;
        Self::checked(plan, operands)
    }

    /// Reductions: the last axis is the run. A trailing row-major output
    /// operand of the outer shape is appended, so `offsets[operands.len()]`
    /// indexes the result buffer.
    pub fn along_last_axis(operands: &[Operand<'_>]) -> Result<Self> {
        check_primary_operands(operands)?;
        let dims = operands[0].dims;
        let mut out_strides = row_major_strides(&dims[..dims.len() - 1]);
        out_strides.push(0);

        let mut strides: Vec<&[isize]> = operands.iter().map(|o| o.strides).collect();
        strides.push(&out_strides);
        let plan = RunPlan::along_last_axis(dims, &strides)?;
        Self::checked(plan, operands)
    }

    fn checked(plan: RunPlan, operands: &[Operand<'_>]) -> Result<Self> {
        let len = to_blas_int(operands[0].name, "run length", plan.run_len())?;
        let mut incs = Vec::with_capacity(plan.inner_strides().len());
        for (i, &inc) in plan.inner_strides().iter().enumerate() {
            let name = operands.get(i).map_or("out", |o| o.name);
            incs.push(inc_to_int(name, inc)?);
        }
        Ok(Self { plan, len, incs })
    }

    pub fn outer_dims(&self) -> &[usize] {
        self.plan.outer_dims()
    }

    /// Invoke `call(offsets, len, incs)` once per run.
    pub fn execute<R: RoutineId>(
        &self,
        binding: &Binding<'_, R>,
        mut call: impl FnMut(&[isize], c_int, &[c_int]),
    ) -> Result<()> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{}: {} run(s) of length {}",
                binding.symbol(),
                self.plan.iterations(),
                self.len
            );
        }
        self.plan.for_each::<LinalgError, _>(|offsets, _, _| {
            call(offsets, self.len, &self.incs);
            Ok(())
        })
    }
}

/// A batched matrix operand that is BLAS-compatible in the call's order.
#[derive(Debug, Clone)]
pub(crate) struct MatrixOperand {
    pub name: &'static str,
    pub matrix: BlasMatrix,
    pub ld: c_int,
    pub batch_dims: Vec<usize>,
    pub batch_strides: Vec<isize>,
}

impl MatrixOperand {
    pub fn new(name: &'static str, order: Order, dims: &[usize], strides: &[isize]) -> Result<Self> {
        let rank = dims.len();
        if rank < 2 {
            return Err(LinalgError::Dimension {
                operand: name,
                rank,
                expected: "at least 2",
            });
        }
        let matrix = blas_matrix(order, dims, strides).ok_or_else(|| LinalgError::Shape {
            operand: name,
            reason: format!("strides {strides:?} are not a {order} BLAS layout"),
        })?;
        Ok(Self {
            name,
            matrix,
            ld: to_blas_int(name, "leading dimension", matrix.ld)?,
            batch_dims: dims[..rank - 2].to_vec(),
            batch_strides: strides[..rank - 2].to_vec(),
        })
    }

    /// Right-hand side of a solve. One rank below `a_rank` means a single
    /// vector per batch (`nrhs = 1`).
    pub fn rhs(
        name: &'static str,
        order: Order,
        a_rank: usize,
        dims: &[usize],
        strides: &[isize],
    ) -> Result<Self> {
        if dims.len() + 1 == a_rank && !dims.is_empty() {
            let mut dims = dims.to_vec();
            let mut strides = strides.to_vec();
            let n = dims[dims.len() - 1];
            dims.push(1);
            strides.push(n as isize);
            return Self::new(name, order, &dims, &strides);
        }
        Self::new(name, order, dims, strides)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.matrix.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.matrix.cols
    }

    /// Dimensions after applying `trans`.
    pub fn op_dims(&self, trans: Transpose) -> (usize, usize) {
        match trans {
            Transpose::NoTrans => (self.rows(), self.cols()),
            Transpose::Trans | Transpose::ConjTrans => (self.cols(), self.rows()),
        }
    }

    pub fn require_square(&self) -> Result<usize> {
        if self.rows() != self.cols() {
            return Err(LinalgError::Shape {
                operand: self.name,
                reason: format!("matrix {}x{} is not square", self.rows(), self.cols()),
            });
        }
        Ok(self.rows())
    }

    pub fn require_rows(&self, rows: usize, against: &str) -> Result<()> {
        if self.rows() != rows {
            return Err(LinalgError::Shape {
                operand: self.name,
                reason: format!("{} rows do not match {against} ({rows})", self.rows()),
            });
        }
        Ok(())
    }
}

/// Batch dimensions must agree exactly; broadcasting is not performed.
pub(crate) fn check_batches(operands: &[&MatrixOperand]) -> Result<()> {
    if let Some((first, rest)) = operands.split_first() {
        for operand in rest {
            if operand.batch_dims != first.batch_dims {
                return Err(LinalgError::Shape {
                    operand: operand.name,
                    reason: format!(
                        "batch dimensions {:?} do not match {} batch dimensions {:?}",
                        operand.batch_dims, first.name, first.batch_dims
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Invoke `call(offsets)` once per batch index.
///
/// `strides_list` holds the batch strides of every operand, in the order the
/// offsets are handed to `call`.
pub(crate) fn execute_batches<R: RoutineId>(
    binding: &Binding<'_, R>,
    batch_dims: &[usize],
    strides_list: &[&[isize]],
    call: impl FnMut(&[isize]) -> Result<()>,
) -> Result<()> {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!(
            "{}: {} batch(es)",
            binding.symbol(),
            batch_dims.iter().product::<usize>()
        );
    }
    for_each_outer(batch_dims, strides_list, call)
}
