//! Dimension fusion for inner-run planning.
//!
//! Two adjacent dimensions `i` and `i + 1` can be walked as one run when every
//! operand satisfies `strides[i] == dims[i + 1] * strides[i + 1]`. Native
//! routines take one `(count, increment)` pair per operand, so the planner
//! folds the longest such trailing extent into a single run.

/// Drop size-1 dimensions.
///
/// A size-1 dimension never moves an offset, so its stride is irrelevant and
/// would only block fusion of its neighbours.
pub fn squeeze_unit_dims(dims: &[usize], strides_list: &[&[isize]]) -> (Vec<usize>, Vec<Vec<isize>>) {
    let keep: Vec<usize> = (0..dims.len()).filter(|&i| dims[i] != 1).collect();
    let squeezed_dims = keep.iter().map(|&i| dims[i]).collect();
    let squeezed_strides = strides_list
        .iter()
        .map(|s| keep.iter().map(|&i| s[i]).collect())
        .collect();
    (squeezed_dims, squeezed_strides)
}

/// Number of trailing dimensions that form one uniformly strided run for all
/// operands.
///
/// Returns 0 only for rank-0 input; otherwise at least the last dimension is
/// part of the run.
pub fn trailing_run_rank(dims: &[usize], strides_list: &[Vec<isize>]) -> usize {
    let n = dims.len();
    if n == 0 {
        return 0;
    }

    let mut run = 1;
    // Walk from the innermost dimension outwards.
    for i in (0..n - 1).rev() {
        let contiguous = strides_list
            .iter()
            .all(|s| s[i] == dims[i + 1] as isize * s[i + 1]);
        if !contiguous {
            break;
        }
        run += 1;
    }
    run
}
