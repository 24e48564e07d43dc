//! Where to find the native libraries.
//!
//! A [`BindingConfig`] names the BLAS and LAPACK libraries to load and the
//! symbol prefixes to use. Explicit paths win over candidate lists; the
//! `STRIDED_LINALG_*` environment variables override the defaults.

/// Environment variable naming the BLAS library path.
pub const ENV_BLAS_LIBRARY: &str = "STRIDED_LINALG_BLAS_LIBRARY";
/// Environment variable naming the LAPACK library path.
pub const ENV_LAPACK_LIBRARY: &str = "STRIDED_LINALG_LAPACK_LIBRARY";
/// Environment variable overriding the BLAS symbol prefix.
pub const ENV_BLAS_PREFIX: &str = "STRIDED_LINALG_BLAS_PREFIX";
/// Environment variable overriding the LAPACK symbol prefix.
pub const ENV_LAPACK_PREFIX: &str = "STRIDED_LINALG_LAPACK_PREFIX";

#[cfg(target_os = "macos")]
const BLAS_CANDIDATES: &[&str] = &[
    "libopenblas.dylib",
    "/opt/homebrew/opt/openblas/lib/libopenblas.dylib",
    "/usr/local/opt/openblas/lib/libopenblas.dylib",
    "/System/Library/Frameworks/Accelerate.framework/Accelerate",
];
#[cfg(target_os = "macos")]
const LAPACK_CANDIDATES: &[&str] = &[
    "liblapacke.dylib",
    "libopenblas.dylib",
    "/opt/homebrew/opt/openblas/lib/libopenblas.dylib",
    "/usr/local/opt/openblas/lib/libopenblas.dylib",
];

#[cfg(windows)]
const BLAS_CANDIDATES: &[&str] = &["libopenblas.dll", "openblas.dll"];
#[cfg(windows)]
const LAPACK_CANDIDATES: &[&str] = &["liblapacke.dll", "libopenblas.dll", "openblas.dll"];

#[cfg(not(any(target_os = "macos", windows)))]
const BLAS_CANDIDATES: &[&str] = &[
    "libopenblas.so.0",
    "libopenblas.so",
    "libcblas.so.3",
    "libblas.so.3",
];
#[cfg(not(any(target_os = "macos", windows)))]
const LAPACK_CANDIDATES: &[&str] = &[
    "liblapacke.so.3",
    "liblapacke.so",
    "libopenblas.so.0",
    "libopenblas.so",
];

/// Library locations and symbol prefixes for a [`Linalg`](crate::Linalg).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Explicit BLAS library; tried alone when set.
    pub blas_library: Option<String>,
    /// Explicit LAPACK library; tried alone when set.
    pub lapack_library: Option<String>,
    pub blas_prefix: String,
    pub lapack_prefix: String,
    /// Libraries tried in order when no explicit BLAS path is set.
    pub blas_candidates: Vec<String>,
    /// Libraries tried in order when no explicit LAPACK path is set.
    pub lapack_candidates: Vec<String>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            blas_library: None,
            lapack_library: None,
            blas_prefix: "cblas_".to_string(),
            lapack_prefix: "LAPACKE_".to_string(),
            blas_candidates: BLAS_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            lapack_candidates: LAPACK_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BindingConfig {
    /// Defaults overridden by the `STRIDED_LINALG_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// value. Empty library paths are ignored; an empty prefix is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty());
        config.blas_library = path(ENV_BLAS_LIBRARY);
        config.lapack_library = path(ENV_LAPACK_LIBRARY);
        if let Some(prefix) = lookup(ENV_BLAS_PREFIX) {
            config.blas_prefix = prefix;
        }
        if let Some(prefix) = lookup(ENV_LAPACK_PREFIX) {
            config.lapack_prefix = prefix;
        }
        config
    }

    /// Libraries to try for BLAS, in order.
    pub fn blas_search(&self) -> Vec<&str> {
        search(&self.blas_library, &self.blas_candidates)
    }

    /// Libraries to try for LAPACK, in order.
    pub fn lapack_search(&self) -> Vec<&str> {
        search(&self.lapack_library, &self.lapack_candidates)
    }
}

fn search<'a>(explicit: &'a Option<String>, candidates: &'a [String]) -> Vec<&'a str> {
    match explicit {
        Some(path) => vec![path.as_str()],
        None => candidates.iter().map(String::as_str).collect(),
    }
}
