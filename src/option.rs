//! Option normalization.
//!
//! Callers describe flags loosely: a missing value, a boolean, a native code,
//! or a short text token whose first letter names the choice. Each family
//! normalizes that [`OptionValue`] onto a closed enum. Inputs outside the
//! documented shapes fail with [`LinalgError::InvalidOption`]; nothing is
//! guessed.
//!
//! | family    | absent / false | true      | codes (LAPACKE, CBLAS)   | letters |
//! |-----------|----------------|-----------|--------------------------|---------|
//! | order     | row-major      | col-major | 101/102                  | R C     |
//! | transpose | none           | transpose | `'N' 'T' 'C'`, 111-113   | N T C   |
//! | uplo      | upper          | lower     | `'U' 'L'`, 121/122       | U L     |
//! | diag      | non-unit       | unit      | `'N' 'U'`, 131/132       | N U     |
//! | side      | left           | right     | `'L' 'R'`, 141/142       | L R     |

use std::fmt;
use std::os::raw::c_int;

use crate::{LinalgError, Result};

/// A loosely-typed caller value for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionValue<'a> {
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Str(&'a str),
    /// Identifier-like token; normalized exactly like `Str`.
    Symbol(&'a str),
}

impl<'a> OptionValue<'a> {
    /// The text payload of `Str` and `Symbol`.
    pub fn text(&self) -> Option<&'a str> {
        match *self {
            OptionValue::Str(s) | OptionValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    fn invalid(&self, family: &'static str) -> LinalgError {
        LinalgError::InvalidOption {
            family,
            value: self.to_string(),
        }
    }
}

impl fmt::Display for OptionValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Absent => f.write_str("<absent>"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::Symbol(s) => write!(f, ":{s}"),
        }
    }
}

impl From<bool> for OptionValue<'_> {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue<'_> {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue<'_> {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

/// A character literal is taken as its native code, e.g. `'T'` is 84.
impl From<char> for OptionValue<'_> {
    fn from(value: char) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl<'a> From<&'a str> for OptionValue<'a> {
    fn from(value: &'a str) -> Self {
        OptionValue::Str(value)
    }
}

impl<'a, T: Into<OptionValue<'a>>> From<Option<T>> for OptionValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(OptionValue::Absent, Into::into)
    }
}

/// A closed option family with native codes.
pub trait NativeOption: Copy + Eq + fmt::Debug + 'static {
    /// Family name used in error messages.
    const FAMILY: &'static str;
    /// Every variant.
    const ALL: &'static [Self];
    /// Value for an absent or `false` input.
    const DEFAULT: Self;
    /// Value for a `true` input.
    const FLAGGED: Self;

    /// Code understood by LAPACKE.
    fn lapack_code(self) -> c_int;

    /// Code understood by CBLAS.
    fn cblas_code(self) -> c_int;

    /// Variant named by an uppercase ASCII letter.
    fn from_letter(letter: u8) -> Option<Self>;

    /// Map a loose caller value onto this family.
    fn normalize(value: OptionValue<'_>) -> Result<Self> {
        let found = match value {
            OptionValue::Absent | OptionValue::Bool(false) => Some(Self::DEFAULT),
            OptionValue::Bool(true) => Some(Self::FLAGGED),
            OptionValue::Int(code) => Self::ALL.iter().copied().find(|opt| {
                code == opt.lapack_code() as i64 || code == opt.cblas_code() as i64
            }),
            OptionValue::Str(s) | OptionValue::Symbol(s) => s
                .bytes()
                .next()
                .and_then(|c| Self::from_letter(c.to_ascii_uppercase())),
        };
        found.ok_or_else(|| value.invalid(Self::FAMILY))
    }
}

macro_rules! native_option {
    (
        $(#[$meta:meta])*
        $name:ident, $family:literal, default = $default:ident, flagged = $flagged:ident,
        { $($variant:ident => ($letter:literal, $cblas:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl NativeOption for $name {
            const FAMILY: &'static str = $family;
            const ALL: &'static [Self] = &[$($name::$variant),+];
            const DEFAULT: Self = $name::$default;
            const FLAGGED: Self = $name::$flagged;

            fn lapack_code(self) -> c_int {
                match self {
                    $($name::$variant => $letter as c_int),+
                }
            }

            fn cblas_code(self) -> c_int {
                match self {
                    $($name::$variant => $cblas),+
                }
            }

            fn from_letter(letter: u8) -> Option<Self> {
                match letter {
                    $(l if l == $letter as u8 => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

native_option! {
    /// Transpose operation applied to a matrix operand.
    Transpose, "transpose", default = NoTrans, flagged = Trans,
    { NoTrans => ('N', 111), Trans => ('T', 112), ConjTrans => ('C', 113) }
}

native_option! {
    /// Which triangle of a matrix is referenced.
    Uplo, "uplo", default = Upper, flagged = Lower,
    { Upper => ('U', 121), Lower => ('L', 122) }
}

native_option! {
    /// Whether a triangular matrix has an implicit unit diagonal.
    Diag, "diag", default = NonUnit, flagged = Unit,
    { NonUnit => ('N', 131), Unit => ('U', 132) }
}

native_option! {
    /// Side on which a triangular operand multiplies.
    Side, "side", default = Left, flagged = Right,
    { Left => ('L', 141), Right => ('R', 142) }
}

/// Matrix storage order.
///
/// LAPACKE and CBLAS agree on the codes (`101` row-major, `102` column-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    RowMajor,
    ColMajor,
}

impl NativeOption for Order {
    const FAMILY: &'static str = "order";
    const ALL: &'static [Self] = &[Order::RowMajor, Order::ColMajor];
    const DEFAULT: Self = Order::RowMajor;
    const FLAGGED: Self = Order::ColMajor;

    fn lapack_code(self) -> c_int {
        match self {
            Order::RowMajor => 101,
            Order::ColMajor => 102,
        }
    }

    fn cblas_code(self) -> c_int {
        self.lapack_code()
    }

    fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'R' => Some(Order::RowMajor),
            b'C' => Some(Order::ColMajor),
            _ => None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::RowMajor => f.write_str("row-major"),
            Order::ColMajor => f.write_str("column-major"),
        }
    }
}

/// Normalize a job-type option.
///
/// Absent or `false` yields `None`, the no-op sentinel. Text yields its first
/// character uppercased, which must be ASCII. Anything else is rejected.
pub fn job(value: OptionValue<'_>) -> Result<Option<u8>> {
    match value {
        OptionValue::Absent | OptionValue::Bool(false) => Ok(None),
        OptionValue::Str(s) | OptionValue::Symbol(s) => match s.chars().next() {
            Some(c) if c.is_ascii() => Ok(Some(c.to_ascii_uppercase() as u8)),
            _ => Err(value.invalid("job")),
        },
        _ => Err(value.invalid("job")),
    }
}

/// Algorithm used by [`inv`](crate::inv).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvDriver {
    /// Solve `A X = I` with `gesv`.
    #[default]
    Gesv,
    /// Factor with `getrf`, then invert with `getri`.
    Getrf,
}

impl InvDriver {
    pub fn normalize(value: OptionValue<'_>) -> Result<Self> {
        match value {
            OptionValue::Absent => Ok(InvDriver::Gesv),
            OptionValue::Str(s) | OptionValue::Symbol(s) if s.eq_ignore_ascii_case("gesv") => {
                Ok(InvDriver::Gesv)
            }
            OptionValue::Str(s) | OptionValue::Symbol(s) if s.eq_ignore_ascii_case("getrf") => {
                Ok(InvDriver::Getrf)
            }
            _ => Err(value.invalid("driver")),
        }
    }
}
