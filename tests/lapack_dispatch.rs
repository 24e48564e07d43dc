mod support;

use approx::assert_abs_diff_eq;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strided_linalg::lapack::{
    gesv_into, getrf_into, getri_into, getrs_into, potrf_into, potrs_into, trtrs_into,
};
use strided_linalg::{
    dynamic, inv, BindingConfig, Diag, ElementFormat, LapackContext, LapackRoutine, LinalgError,
    OptionValue, Order, StridedArray, Transpose, TypedArray, Uplo,
};

use support::{flag, take_calls};

/// Diagonally dominant, hence well conditioned.
fn random_matrices(rng: &mut StdRng, dims: &[usize]) -> StridedArray<f64> {
    let n = dims[dims.len() - 1];
    StridedArray::from_fn_row_major(dims, |idx| {
        let k = idx.len();
        let v: f64 = rng.gen_range(-1.0..1.0);
        if idx[k - 2] == idx[k - 1] {
            v + n as f64
        } else {
            v
        }
    })
}

/// Largest deviation of `x a` from the identity over all batches.
fn identity_error(x: &StridedArray<f64>, a: &StridedArray<f64>) -> f64 {
    let dims = a.dims();
    let n = dims[dims.len() - 1];
    let batches: usize = dims[..dims.len() - 2].iter().product();
    let batch_index = |b: usize| -> Vec<usize> {
        let mut idx = Vec::new();
        let mut rest = b;
        for &d in dims[..dims.len() - 2].iter().rev() {
            idx.push(rest % d);
            rest /= d;
        }
        idx.reverse();
        idx
    };
    let mut worst = 0.0f64;
    for b in 0..batches {
        let base = batch_index(b);
        let at = |m: &StridedArray<f64>, i: usize, j: usize| {
            let mut idx = base.clone();
            idx.extend([i, j]);
            m.get(&idx)
        };
        for i in 0..n {
            for j in 0..n {
                let v: f64 = (0..n).map(|l| at(x, i, l) * at(a, l, j)).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((v - expected).abs());
            }
        }
    }
    worst
}

#[test]
fn test_getrf_then_getrs_over_batches() {
    let ctx = support::lapack_context();
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_matrices(&mut rng, &[2, 3, 3]);
    let mut lu = a.clone();
    let factors = getrf_into(&ctx, Order::RowMajor, &mut lu.view_mut()).unwrap();
    assert_eq!(factors.ipiv.dims(), &[2, 3]);
    assert_eq!(factors.info.data(), &[0, 0]);

    // Right-hand side: one vector per batch.
    let b = StridedArray::<f64>::from_fn_row_major(&[2, 3], |idx| (idx[1] + 1) as f64);
    let mut x = b.clone();
    let info = getrs_into(
        &ctx,
        Order::RowMajor,
        Transpose::NoTrans,
        &lu.view(),
        &factors.ipiv.view(),
        &mut x.view_mut(),
    )
    .unwrap();
    assert_eq!(info.data(), &[0, 0]);
    for p in 0..2 {
        for i in 0..3 {
            let ax: f64 = (0..3).map(|l| a.get(&[p, i, l]) * x.get(&[p, l])).sum();
            assert_abs_diff_eq!(ax, b.get(&[p, i]), epsilon = 1e-12);
        }
    }
    let calls: Vec<_> = take_calls().into_iter().map(|c| c.routine).collect();
    assert_eq!(calls, vec!["dgetrf", "dgetrf", "dgetrs", "dgetrs"]);
}

#[test]
fn test_gesv_column_major_matrix_rhs() {
    let ctx = support::lapack_context();
    let mut rng = StdRng::seed_from_u64(11);
    let a = random_matrices(&mut rng, &[4, 4]);
    let mut a_col = StridedArray::<f64>::from_fn_col_major(&[4, 4], |idx| a.get(idx));
    let mut b = StridedArray::<f64>::from_fn_col_major(&[4, 2], |idx| (idx[0] * 2 + idx[1]) as f64);
    let rhs = b.clone();
    let lu = gesv_into(&ctx, Order::ColMajor, &mut a_col.view_mut(), &mut b.view_mut()).unwrap();
    assert_eq!(lu.info.ndim(), 0);
    assert_eq!(lu.info.get(&[]), 0);
    for i in 0..4 {
        for j in 0..2 {
            let ax: f64 = (0..4).map(|l| a.get(&[i, l]) * b.get(&[l, j])).sum();
            assert_abs_diff_eq!(ax, rhs.get(&[i, j]), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_layout_and_batch_errors_make_no_call() {
    let ctx = support::lapack_context();
    let mut a = StridedArray::<f64>::from_fn_col_major(&[3, 3], |_| 0.0);
    let err = getrf_into(&ctx, Order::RowMajor, &mut a.view_mut()).unwrap_err();
    assert!(matches!(err, LinalgError::Shape { operand: "a", .. }));

    let mut a = StridedArray::<f64>::row_major(&[2, 3, 3]);
    let mut b = StridedArray::<f64>::row_major(&[3, 3, 1]);
    let err = gesv_into(&ctx, Order::RowMajor, &mut a.view_mut(), &mut b.view_mut()).unwrap_err();
    assert!(matches!(err, LinalgError::Shape { operand: "b", .. }));

    let mut a = StridedArray::<f64>::row_major(&[3, 3]);
    let ipiv = StridedArray::<i32>::row_major(&[2]);
    let err = getri_into(&ctx, Order::RowMajor, &mut a.view_mut(), &ipiv.view()).unwrap_err();
    assert!(matches!(err, LinalgError::Shape { operand: "ipiv", .. }));
    assert!(take_calls().is_empty());
}

#[test]
fn test_positive_info_is_reported_per_batch() {
    let ctx = support::lapack_context();
    let mut a = StridedArray::<f64>::from_fn_row_major(&[2, 2, 2], |idx| {
        if idx[0] == 0 {
            (idx[1] == idx[2]) as i32 as f64
        } else {
            1.0
        }
    });
    let mut b = StridedArray::<f64>::row_major(&[2, 2]);
    let lu = gesv_into(&ctx, Order::RowMajor, &mut a.view_mut(), &mut b.view_mut()).unwrap();
    assert_eq!(lu.info.data(), &[0, 2]);
}

#[test]
fn test_negative_info_stops_the_batch_loop() {
    let ctx = support::lapack_context();
    let mut a = StridedArray::<f64>::row_major(&[3, 2, 2]);
    let err = potrf_into(&ctx, Order::RowMajor, Uplo::Upper, &mut a.view_mut()).unwrap_err();
    match err {
        LinalgError::NativeRoutine { symbol, info } => {
            assert_eq!(symbol, "LAPACKE_dpotrf");
            assert_eq!(info, -4);
        }
        other => panic!("expected NativeRoutine, got {other:?}"),
    }
    assert_eq!(take_calls().len(), 1);
}

#[test]
fn test_inv_with_both_drivers() {
    let ctx = support::lapack_context();
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_matrices(&mut rng, &[2, 4, 4]);
    for driver in ["gesv", "getrf"] {
        let x = inv(&ctx, a.clone().into(), OptionValue::Str(driver))
            .unwrap()
            .into_array::<f64>()
            .unwrap();
        assert_eq!(x.dims(), &[2, 4, 4]);
        assert!(identity_error(&x, &a) < 1e-10, "driver {driver}");
    }
    let routines: Vec<_> = take_calls().into_iter().map(|c| c.routine).collect();
    assert_eq!(routines, vec!["dgesv", "dgesv", "dgetrf", "dgetrf", "dgetri", "dgetri"]);
}

#[test]
fn test_inv_of_strided_input() {
    let ctx = support::lapack_context();
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_matrices(&mut rng, &[3, 3]);
    let a_col = StridedArray::<f64>::from_fn_col_major(&[3, 3], |idx| a.get(idx));
    let x = inv(&ctx, TypedArray::from(a_col), OptionValue::Absent)
        .unwrap()
        .into_array::<f64>()
        .unwrap();
    assert!(identity_error(&x, &a) < 1e-10);
}

#[test]
fn test_inv_singular_matrix() {
    let ctx = support::lapack_context();
    let a = StridedArray::<f64>::from_fn_row_major(&[3, 3], |idx| (idx[0] + idx[1]) as f64);
    for (driver, symbol) in [("gesv", "LAPACKE_dgesv"), ("getrf", "LAPACKE_dgetrf")] {
        match inv(&ctx, a.clone().into(), OptionValue::Str(driver)) {
            Err(LinalgError::NativeRoutine { symbol: s, info }) => {
                assert_eq!(s, symbol);
                assert!(info > 0);
            }
            other => panic!("expected NativeRoutine, got {other:?}"),
        }
    }
}

#[test]
fn test_dynamic_gesv_promotes_and_relayouts() {
    let ctx = support::lapack_context();
    let a = TypedArray::from(StridedArray::<f32>::from_fn_col_major(&[2, 2], |idx| {
        if idx[0] == idx[1] {
            2.0
        } else {
            1.0
        }
    }));
    let b = TypedArray::from(vec![3.0f64, 3.0]);
    let (_, x, lu) = dynamic::gesv(&ctx, a, b, OptionValue::Absent).unwrap();
    assert_eq!(lu.info.get(&[]), 0);
    let x = x.into_array::<f64>().unwrap();
    assert_abs_diff_eq!(x.get(&[0]), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x.get(&[1]), 1.0, epsilon = 1e-12);
}

const CHOLESKY: [[f64; 3]; 3] = [[2.0, 0.0, 0.0], [1.0, 3.0, 0.0], [0.5, -1.0, 1.5]];

/// `l l^T` for the factor above.
fn cholesky_product(i: usize, j: usize) -> f64 {
    (0..3).map(|k| CHOLESKY[i][k] * CHOLESKY[j][k]).sum()
}

#[test]
fn test_potrs_reads_only_the_factor_triangle() {
    let ctx = support::lapack_context();
    let a = StridedArray::<f64>::from_fn_row_major(&[3, 3], |idx| {
        if idx[1] <= idx[0] {
            CHOLESKY[idx[0]][idx[1]]
        } else {
            99.0
        }
    });
    let x_true = StridedArray::<f64>::from_fn_row_major(&[3, 2], |idx| idx[0] as f64 - 2.0 * idx[1] as f64 + 0.5);
    let mut b = StridedArray::<f64>::from_fn_row_major(&[3, 2], |idx| {
        (0..3).map(|l| cholesky_product(idx[0], l) * x_true.get(&[l, idx[1]])).sum()
    });
    let info = potrs_into(&ctx, Order::RowMajor, Uplo::Lower, &a.view(), &mut b.view_mut()).unwrap();
    assert_eq!(info.get(&[]), 0);
    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].routine, calls[0].n), ("dpotrs", 3));
    assert_eq!(calls[0].args, vec![101, flag(b'L'), 2, 3, 2]);
    for i in 0..3 {
        for j in 0..2 {
            assert_abs_diff_eq!(b.get(&[i, j]), x_true.get(&[i, j]), epsilon = 1e-12);
        }
    }

    // Upper factor u = l^T given column-major, with a vector right-hand side.
    let u = StridedArray::<f64>::from_fn_col_major(&[3, 3], |idx| {
        if idx[0] <= idx[1] {
            CHOLESKY[idx[1]][idx[0]]
        } else {
            -7.0
        }
    });
    let rhs: Vec<f64> = (0..3)
        .map(|i| (0..3).map(|l| cholesky_product(i, l) * x_true.get(&[l, 0])).sum())
        .collect();
    let (x, info) =
        dynamic::potrs(&ctx, u.into(), rhs.into(), OptionValue::Absent, OptionValue::Absent)
            .unwrap();
    assert_eq!(info.get(&[]), 0);
    let x = x.into_array::<f64>().unwrap();
    assert_eq!(x.dims(), &[3]);
    for i in 0..3 {
        assert_abs_diff_eq!(x.get(&[i]), x_true.get(&[i, 0]), epsilon = 1e-12);
    }
    let calls = take_calls();
    assert_eq!(calls[0].args[..3], [101, flag(b'U'), 1]);
    assert_eq!(calls[0].args[3], 3);
}

#[test]
fn test_trtrs_transposed_with_zero_diagonal_batch() {
    let ctx = support::lapack_context();
    let a = StridedArray::<f64>::from_fn_row_major(&[2, 3, 3], |idx| {
        let (p, i, j) = (idx[0], idx[1], idx[2]);
        if j > i {
            42.0
        } else if i == j {
            if p == 1 && i == 1 {
                0.0
            } else {
                (i + 2) as f64
            }
        } else {
            (i + j) as f64 - 1.5
        }
    });
    let b = StridedArray::<f64>::from_fn_row_major(&[2, 3], |idx| (idx[1] + 1) as f64);
    let mut x = b.clone();
    let info = trtrs_into(
        &ctx,
        Order::RowMajor,
        Uplo::Lower,
        Transpose::Trans,
        Diag::NonUnit,
        &a.view(),
        &mut x.view_mut(),
    )
    .unwrap();
    assert_eq!(info.data(), &[0, 2]);
    let calls = take_calls();
    assert_eq!(calls.len(), 2);
    for c in &calls {
        assert_eq!(c.routine, "dtrtrs");
        assert_eq!(c.args[..5], [101, flag(b'L'), flag(b'T'), flag(b'N'), 1]);
        assert_eq!(c.args[5], 3);
    }
    // l^T x = b for the regular batch; the singular batch is untouched.
    for i in 0..3 {
        let v: f64 = (0..3)
            .filter(|&l| l >= i)
            .map(|l| a.get(&[0, l, i]) * x.get(&[0, l]))
            .sum();
        assert_abs_diff_eq!(v, b.get(&[0, i]), epsilon = 1e-12);
        assert_eq!(x.get(&[1, i]), b.get(&[1, i]));
    }
}

#[test]
fn test_dynamic_trtrs_unit_diagonal() {
    let ctx = support::lapack_context();
    // Column-major upper triangle; the stored diagonal is ignored.
    let a = StridedArray::<f64>::from_fn_col_major(&[2, 2], |idx| match (idx[0], idx[1]) {
        (0, 1) => 3.0,
        (1, 0) => 8.0,
        _ => 0.0,
    });
    let b = TypedArray::from(vec![7.0f32, 2.0]);
    let (x, info) = dynamic::trtrs(
        &ctx,
        a.into(),
        b,
        OptionValue::Absent,
        OptionValue::Absent,
        OptionValue::Absent,
        "unit".into(),
    )
    .unwrap();
    assert_eq!(info.get(&[]), 0);
    let x = x.into_array::<f64>().unwrap();
    assert_abs_diff_eq!(x.get(&[0]), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x.get(&[1]), 2.0, epsilon = 1e-12);
    let calls = take_calls();
    assert_eq!(calls[0].args[..4], [101, flag(b'U'), flag(b'N'), flag(b'U')]);
}

/// Largest `|a v - lambda v|` over the eigenpairs of one batch.
fn eigen_residual(
    n: usize,
    a: impl Fn(usize, usize) -> Complex64,
    v: impl Fn(usize, usize) -> Complex64,
    w: impl Fn(usize) -> f64,
) -> f64 {
    let mut worst = 0.0f64;
    for k in 0..n {
        for i in 0..n {
            let av: Complex64 = (0..n).map(|l| a(i, l) * v(l, k)).sum();
            worst = worst.max((av - v(i, k) * w(k)).norm());
        }
    }
    worst
}

#[test]
fn test_syev_defaults_to_vectors_and_upper() {
    let ctx = support::lapack_context();
    let a = StridedArray::<f64>::from_fn_row_major(&[2, 3, 3], |idx| {
        let (p, i, j) = (idx[0], idx[1], idx[2]);
        if i == j {
            (3 * i + p + 1) as f64
        } else {
            0.5 * (i + j + p) as f64
        }
    });
    let (vectors, values, info) = dynamic::syev(
        &ctx,
        a.clone().into(),
        OptionValue::Absent,
        OptionValue::Absent,
        OptionValue::Absent,
    )
    .unwrap();
    assert_eq!(info.data(), &[0, 0]);
    assert_eq!(values.format(), ElementFormat::F64);
    assert_eq!(values.dims(), &[2, 3]);
    let calls = take_calls();
    assert_eq!(calls.len(), 2);
    for c in &calls {
        assert_eq!((c.routine, c.n), ("dsyev", 3));
        assert_eq!(c.args, vec![101, flag(b'V'), flag(b'U'), 3]);
    }

    let values = values.into_array::<f64>().unwrap();
    let vectors = vectors.into_array::<f64>().unwrap();
    for p in 0..2 {
        assert!(values.get(&[p, 0]) <= values.get(&[p, 1]));
        assert!(values.get(&[p, 1]) <= values.get(&[p, 2]));
        let residual = eigen_residual(
            3,
            |i, j| Complex64::new(a.get(&[p, i, j]), 0.0),
            |i, k| Complex64::new(vectors.get(&[p, i, k]), 0.0),
            |k| values.get(&[p, k]),
        );
        assert!(residual < 1e-9, "batch {p}: {residual}");
    }

    // Values only: the matrix comes back unchanged.
    let (same, _, _) =
        dynamic::syev(&ctx, a.clone().into(), OptionValue::Absent, "N".into(), OptionValue::Absent)
            .unwrap();
    assert_eq!(take_calls()[0].args[1], flag(b'N'));
    assert_eq!(same.into_array::<f64>().unwrap().data(), a.data());
}

#[test]
fn test_complex_syev_calls_heev() {
    let ctx = support::lapack_context();
    let h = StridedArray::<Complex64>::from_fn_row_major(&[2, 3, 3], |idx| {
        let (p, i, j) = (idx[0], idx[1], idx[2]);
        let upper = |i: usize, j: usize| Complex64::new((i + j + p) as f64 * 0.3, 0.5 + j as f64 - i as f64);
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => Complex64::new((4 * i + p + 1) as f64, 0.0),
            std::cmp::Ordering::Less => upper(i, j),
            std::cmp::Ordering::Greater => upper(j, i).conj(),
        }
    });
    let (vectors, values, info) =
        dynamic::syev(&ctx, h.clone().into(), OptionValue::Absent, OptionValue::Absent, true.into())
            .unwrap();
    assert_eq!(info.data(), &[0, 0]);
    assert_eq!(values.format(), ElementFormat::F64);
    assert_eq!(values.dims(), &[2, 3]);
    let calls = take_calls();
    assert_eq!(calls.len(), 2);
    for c in &calls {
        assert_eq!((c.routine, c.n), ("zheev", 3));
        assert_eq!(c.args, vec![101, flag(b'V'), flag(b'L'), 3]);
    }

    let values = values.into_array::<f64>().unwrap();
    let vectors = vectors.into_array::<Complex64>().unwrap();
    for p in 0..2 {
        let trace: f64 = (0..3).map(|i| h.get(&[p, i, i]).re).sum();
        let total: f64 = (0..3).map(|k| values.get(&[p, k])).sum();
        assert_abs_diff_eq!(total, trace, epsilon = 1e-9);
        let residual = eigen_residual(
            3,
            |i, j| h.get(&[p, i, j]),
            |i, k| vectors.get(&[p, i, k]),
            |k| values.get(&[p, k]),
        );
        assert!(residual < 1e-9, "batch {p}: {residual}");
    }
}

/// Runs against a system LAPACKE when one can be loaded.
#[test]
fn test_inv_with_system_lapacke() {
    let config = BindingConfig::from_env();
    let ctx = LapackContext::new();
    ctx.set_prefix(&config.lapack_prefix);
    if ctx.load_first(&config.lapack_search(), None).is_err() {
        return;
    }
    let routines = [LapackRoutine::Gesv, LapackRoutine::Getrf, LapackRoutine::Getri];
    let formats = [ElementFormat::F64, ElementFormat::C64];
    let complete = routines
        .iter()
        .all(|&r| formats.iter().all(|&f| ctx.resolve(r, f).is_ok()));
    if !complete {
        return;
    }
    let mut rng = StdRng::seed_from_u64(42);
    let a = random_matrices(&mut rng, &[5, 5]);
    for driver in ["gesv", "getrf"] {
        let x = inv(&ctx, a.clone().into(), OptionValue::Str(driver))
            .unwrap()
            .into_array::<f64>()
            .unwrap();
        assert!(identity_error(&x, &a) < 1e-10);
    }

    let z = StridedArray::<Complex64>::from_fn_row_major(&[4, 4], |idx| {
        let re: f64 = rng.gen_range(-1.0..1.0);
        let im: f64 = rng.gen_range(-1.0..1.0);
        Complex64::new(re + if idx[0] == idx[1] { 4.0 } else { 0.0 }, im)
    });
    let zi = inv(&ctx, z.clone().into(), OptionValue::Str("getrf"))
        .unwrap()
        .into_array::<Complex64>()
        .unwrap();
    for i in 0..4 {
        for j in 0..4 {
            let v: Complex64 = (0..4).map(|l| zi.get(&[i, l]) * z.get(&[l, j])).sum();
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(v.re, expected, epsilon = 1e-10);
            assert_abs_diff_eq!(v.im, 0.0, epsilon = 1e-10);
        }
    }
}
