//! Higher-level operations built on the bound routines.

use strided_view::{Element, ElementFormat, StridedArray, TypedArray};

use crate::config::BindingConfig;
use crate::dynamic::dispatch_format;
use crate::lapack::{gesv_into, getrf_into, getri_into};
use crate::layout::into_blas_layout;
use crate::option::{InvDriver, OptionValue, Order};
use crate::registry::{BlasContext, LapackContext};
use crate::routine::LapackRoutine;
use crate::{LinalgError, Result};

/// Inverse of each square matrix in the last two dimensions of `a`.
///
/// `driver` selects the algorithm: `"gesv"` (default) solves `A X = I`,
/// `"getrf"` factors and inverts with `getri`. A singular matrix is reported
/// as [`LinalgError::NativeRoutine`] with the positive `info` of the failing
/// routine.
pub fn inv(lapack: &LapackContext, a: TypedArray, driver: OptionValue<'_>) -> Result<TypedArray> {
    let driver = InvDriver::normalize(driver)?;
    let dims = a.dims();
    let rank = dims.len();
    if rank < 2 {
        return Err(LinalgError::Dimension {
            operand: "a",
            rank,
            expected: "at least 2",
        });
    }
    if dims[rank - 2] != dims[rank - 1] {
        return Err(LinalgError::Shape {
            operand: "a",
            reason: format!("matrix {}x{} is not square", dims[rank - 2], dims[rank - 1]),
        });
    }
    dispatch_format!(a.format(), |T| {
        Ok(inv_typed::<T>(lapack, a.into_array()?, driver)?.into())
    })
}

fn inv_typed<T: Element>(
    lapack: &LapackContext,
    a: StridedArray<T>,
    driver: InvDriver,
) -> Result<StridedArray<T>> {
    let order = Order::RowMajor;
    let mut a = into_blas_layout(a, order)?;
    match driver {
        InvDriver::Gesv => {
            let mut x = identity::<T>(a.dims());
            let lu = gesv_into(lapack, order, &mut a.view_mut(), &mut x.view_mut())?;
            check_singular(lapack, LapackRoutine::Gesv, T::FORMAT, &lu.info)?;
            Ok(x)
        }
        InvDriver::Getrf => {
            let lu = getrf_into(lapack, order, &mut a.view_mut())?;
            check_singular(lapack, LapackRoutine::Getrf, T::FORMAT, &lu.info)?;
            let info = getri_into(lapack, order, &mut a.view_mut(), &lu.ipiv.view())?;
            check_singular(lapack, LapackRoutine::Getri, T::FORMAT, &info)?;
            Ok(a)
        }
    }
}

/// Row-major stack of identity matrices with the shape `dims`.
fn identity<T: Element>(dims: &[usize]) -> StridedArray<T> {
    let n = dims.len();
    StridedArray::from_fn_row_major(dims, |idx| {
        if idx[n - 2] == idx[n - 1] {
            T::one()
        } else {
            T::zero()
        }
    })
}

fn check_singular(
    lapack: &LapackContext,
    routine: LapackRoutine,
    format: ElementFormat,
    info: &StridedArray<i32>,
) -> Result<()> {
    match info.iter().copied().find(|&code| code > 0) {
        Some(code) => Err(LinalgError::NativeRoutine {
            symbol: lapack.symbol_name(routine, format)?,
            info: code,
        }),
        None => Ok(()),
    }
}

/// A BLAS and a LAPACK context configured together.
#[derive(Debug, Default)]
pub struct Linalg {
    pub blas: BlasContext,
    pub lapack: LapackContext,
}

impl Linalg {
    /// Unloaded contexts with the default prefixes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the prefixes of `config` and load the first library that opens
    /// from each search list.
    pub fn from_config(config: &BindingConfig) -> Result<Self> {
        let linalg = Self::new();
        linalg.blas.set_prefix(&config.blas_prefix);
        linalg.lapack.set_prefix(&config.lapack_prefix);
        let blas = linalg.blas.load_first(&config.blas_search(), None)?;
        let lapack = linalg.lapack.load_first(&config.lapack_search(), None)?;
        log::debug!("linalg: BLAS from {blas}, LAPACK from {lapack}");
        Ok(linalg)
    }

    /// [`Linalg::from_config`] with [`BindingConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::from_config(&BindingConfig::from_env())
    }

    /// See [`inv`].
    pub fn inv(&self, a: TypedArray, driver: OptionValue<'_>) -> Result<TypedArray> {
        inv(&self.lapack, a, driver)
    }
}
