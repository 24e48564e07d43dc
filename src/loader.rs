//! Symbol sources: run-time loaded shared libraries and in-process tables.

use std::collections::HashMap;
use std::fmt;
use std::os::raw::{c_int, c_void};

use crate::{LinalgError, Result};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
const RTLD_DEEPBIND: c_int = libc::RTLD_DEEPBIND;
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
const RTLD_DEEPBIND: c_int = 0;

#[cfg(unix)]
const RTLD_NOW: c_int = libc::RTLD_NOW;
#[cfg(not(unix))]
const RTLD_NOW: c_int = 0;

#[cfg(unix)]
const RTLD_LOCAL: c_int = libc::RTLD_LOCAL;
#[cfg(not(unix))]
const RTLD_LOCAL: c_int = 0;

#[cfg(unix)]
const RTLD_GLOBAL: c_int = libc::RTLD_GLOBAL;
#[cfg(not(unix))]
const RTLD_GLOBAL: c_int = 0;

/// Platform `dlopen` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadFlags(c_int);

impl LoadFlags {
    /// Raw platform flags, passed to the loader unchanged.
    pub const fn from_raw(bits: c_int) -> Self {
        LoadFlags(bits)
    }

    /// `RTLD_NOW | RTLD_LOCAL | RTLD_DEEPBIND`: the library's symbols stay
    /// private to the handle.
    pub const fn local() -> Self {
        LoadFlags(RTLD_NOW | RTLD_LOCAL | RTLD_DEEPBIND)
    }

    /// `RTLD_NOW | RTLD_GLOBAL | RTLD_DEEPBIND`: the library's symbols become
    /// visible to libraries opened later.
    pub const fn global() -> Self {
        LoadFlags(RTLD_NOW | RTLD_GLOBAL | RTLD_DEEPBIND)
    }

    #[inline]
    pub const fn bits(self) -> c_int {
        self.0
    }
}

/// Something that maps exported symbol names to addresses.
pub trait SymbolSource: Send + Sync {
    /// Address of `symbol`, or the diagnostic text explaining why it is
    /// missing. A successful lookup may still yield null.
    fn lookup(&self, symbol: &str) -> std::result::Result<*mut c_void, String>;

    /// Human-readable origin, used in log messages.
    fn describe(&self) -> String;
}

/// A shared library opened with explicit loader flags.
pub struct NativeLibrary {
    library: libloading::Library,
    path: String,
}

impl NativeLibrary {
    /// Open `path`. On failure the loader's diagnostic text is returned
    /// verbatim in [`LinalgError::LibraryLoad`].
    pub fn open(path: &str, flags: LoadFlags) -> Result<Self> {
        // SAFETY: loading a library runs its initializers; BLAS/LAPACK
        // libraries have no initializers with preconditions on the caller.
        #[cfg(unix)]
        let library = unsafe { libloading::os::unix::Library::open(Some(path), flags.bits()) }
            .map(libloading::Library::from);
        #[cfg(not(unix))]
        let library = {
            let _ = flags;
            unsafe { libloading::Library::new(path) }
        };

        let library = library.map_err(|e| LinalgError::LibraryLoad(e.to_string()))?;
        Ok(Self {
            library,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary").field("path", &self.path).finish()
    }
}

impl SymbolSource for NativeLibrary {
    fn lookup(&self, symbol: &str) -> std::result::Result<*mut c_void, String> {
        // SAFETY: the symbol is read as an opaque address; it is only called
        // after being cast to the routine's declared signature.
        unsafe { self.library.get::<*mut c_void>(symbol.as_bytes()) }
            .map(|sym| *sym)
            .map_err(|e| e.to_string())
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

/// In-process symbol table.
///
/// Lets an application inject its own routines (or test doubles) without a
/// shared library. Entries hold plain addresses of `extern "C"` functions.
///
/// ```rust
/// use std::os::raw::c_void;
/// use strided_linalg::SymbolTable;
///
/// extern "C" fn noop() {}
///
/// let mut table = SymbolTable::new("injected");
/// table.insert("cblas_drotm", noop as *const c_void);
/// assert!(table.contains("cblas_drotm"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    entries: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Register `address` under `symbol`, replacing any previous entry.
    pub fn insert(&mut self, symbol: impl Into<String>, address: *const c_void) -> &mut Self {
        self.entries.insert(symbol.into(), address as usize);
        self
    }

    /// Builder form of [`SymbolTable::insert`].
    pub fn with(mut self, symbol: impl Into<String>, address: *const c_void) -> Self {
        self.insert(symbol, address);
        self
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn lookup(&self, symbol: &str) -> std::result::Result<*mut c_void, String> {
        self.entries
            .get(symbol)
            .map(|&address| address as *mut c_void)
            .ok_or_else(|| format!("{}: undefined symbol: {symbol}", self.name))
    }

    fn describe(&self) -> String {
        format!("symbol table '{}'", self.name)
    }
}
