use num_complex::{Complex32, Complex64};

use crate::format::{Element, ElementFormat};
use crate::{Result, StridedArray, StridedError};

/// A strided array tagged with its element format at runtime.
#[derive(Debug, Clone)]
pub enum TypedArray {
    F32(StridedArray<f32>),
    F64(StridedArray<f64>),
    C32(StridedArray<Complex32>),
    C64(StridedArray<Complex64>),
}

impl TypedArray {
    /// The element format of the held array.
    pub fn format(&self) -> ElementFormat {
        match self {
            TypedArray::F32(_) => ElementFormat::F32,
            TypedArray::F64(_) => ElementFormat::F64,
            TypedArray::C32(_) => ElementFormat::C32,
            TypedArray::C64(_) => ElementFormat::C64,
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            TypedArray::F32(a) => a.dims(),
            TypedArray::F64(a) => a.dims(),
            TypedArray::C32(a) => a.dims(),
            TypedArray::C64(a) => a.dims(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.dims().len()
    }

    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.dims().iter().any(|&d| d == 0)
    }

    /// Convert to `format`.
    ///
    /// Returns `self` untouched when the format already matches; otherwise
    /// returns a converted copy with the same dims, strides and offset.
    /// Complex values are never narrowed to a real format.
    pub fn cast(self, format: ElementFormat) -> Result<TypedArray> {
        let from = self.format();
        if from == format {
            return Ok(self);
        }
        let lossy = || StridedError::LossyCast {
            from: from.name(),
            to: format.name(),
        };
        Ok(match (self, format) {
            (TypedArray::F32(a), ElementFormat::F64) => TypedArray::F64(a.map(|&x| x as f64)),
            (TypedArray::F32(a), ElementFormat::C32) => {
                TypedArray::C32(a.map(|&x| Complex32::new(x, 0.0)))
            }
            (TypedArray::F32(a), ElementFormat::C64) => {
                TypedArray::C64(a.map(|&x| Complex64::new(x as f64, 0.0)))
            }
            (TypedArray::F64(a), ElementFormat::F32) => TypedArray::F32(a.map(|&x| x as f32)),
            (TypedArray::F64(a), ElementFormat::C32) => {
                TypedArray::C32(a.map(|&x| Complex32::new(x as f32, 0.0)))
            }
            (TypedArray::F64(a), ElementFormat::C64) => {
                TypedArray::C64(a.map(|&x| Complex64::new(x, 0.0)))
            }
            (TypedArray::C32(a), ElementFormat::C64) => {
                TypedArray::C64(a.map(|z| Complex64::new(z.re as f64, z.im as f64)))
            }
            (TypedArray::C64(a), ElementFormat::C32) => {
                TypedArray::C32(a.map(|z| Complex32::new(z.re as f32, z.im as f32)))
            }
            _ => return Err(lossy()),
        })
    }

    /// Cast to `T`'s format and unwrap the typed array.
    pub fn into_array<T: Element>(self) -> Result<StridedArray<T>> {
        let from = self.format();
        T::unwrap(self.cast(T::FORMAT)?).ok_or(StridedError::LossyCast {
            from: from.name(),
            to: T::FORMAT.name(),
        })
    }
}

impl<T: Element> From<StridedArray<T>> for TypedArray {
    fn from(array: StridedArray<T>) -> Self {
        T::wrap(array)
    }
}

impl<T: Element> From<Vec<T>> for TypedArray {
    fn from(data: Vec<T>) -> Self {
        T::wrap(StridedArray::from_vec(data))
    }
}
