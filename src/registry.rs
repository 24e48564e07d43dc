//! Library context and typed binding table.
//!
//! A [`Context`] owns the active symbol source, the symbol prefix and one
//! atomic slot per `(routine, format)`. Resolution fills a slot at most once;
//! replacing the source or changing the prefix clears every slot, so a
//! binding never outlives the library it came from.
//!
//! Calls hold the context's read lock through [`Binding`] while the native
//! routine runs. Reloading takes the write lock and therefore waits for
//! in-flight calls.

use std::fmt;
use std::marker::PhantomData;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use strided_view::ElementFormat;

use crate::loader::{LoadFlags, NativeLibrary, SymbolSource};
use crate::option::OptionValue;
use crate::routine::{BlasRoutine, LapackRoutine, RoutineId};
use crate::{LinalgError, Result};

struct LibraryState {
    source: Option<Box<dyn SymbolSource>>,
    prefix: Option<String>,
    /// Libraries opened for their global symbols; kept open for the context
    /// lifetime.
    required: Vec<NativeLibrary>,
}

/// Binding context for one routine family.
pub struct Context<R: RoutineId> {
    state: RwLock<LibraryState>,
    slots: Box<[AtomicPtr<c_void>]>,
    _routine: PhantomData<fn() -> R>,
}

/// Context for CBLAS routines.
pub type BlasContext = Context<BlasRoutine>;
/// Context for LAPACKE routines.
pub type LapackContext = Context<LapackRoutine>;

impl<R: RoutineId> Default for Context<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RoutineId> fmt::Debug for Context<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Context")
            .field("family", &R::FAMILY)
            .field("source", &state.source.as_ref().map(|s| s.describe()))
            .field("prefix", &state.prefix)
            .field("required", &state.required)
            .finish()
    }
}

impl<R: RoutineId> Context<R> {
    /// A context with no library and the family's default prefix.
    pub fn new() -> Self {
        let slots = (0..R::ALL.len() * ElementFormat::COUNT)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();
        Self {
            state: RwLock::new(LibraryState {
                source: None,
                prefix: Some(R::DEFAULT_PREFIX.to_string()),
                required: Vec::new(),
            }),
            slots,
            _routine: PhantomData,
        }
    }

    /// Open `path` and make it the active library.
    ///
    /// Defaults to [`LoadFlags::local`]. On failure the previous library stays
    /// active.
    pub fn load(&self, path: &str, flags: Option<LoadFlags>) -> Result<()> {
        let library = NativeLibrary::open(path, flags.unwrap_or_else(LoadFlags::local))?;
        log::debug!("{}: loaded {path}", R::FAMILY);
        self.replace_source(Some(Box::new(library)));
        Ok(())
    }

    /// Open `path` so its symbols become visible process-wide.
    ///
    /// Defaults to [`LoadFlags::global`]. The active library is unchanged, and
    /// a path that is already held is not opened again.
    pub fn require(&self, path: &str, flags: Option<LoadFlags>) -> Result<()> {
        if self.holds_required(path) {
            return Ok(());
        }
        let library = NativeLibrary::open(path, flags.unwrap_or_else(LoadFlags::global))?;
        let mut state = self.state.write();
        if state.required.iter().any(|l| l.path() == path) {
            return Ok(());
        }
        log::debug!("{}: required {path}", R::FAMILY);
        state.required.push(library);
        Ok(())
    }

    fn holds_required(&self, path: &str) -> bool {
        self.state.read().required.iter().any(|l| l.path() == path)
    }

    /// Load the first candidate that opens and return its name.
    ///
    /// Fails with [`LinalgError::LibraryLoad`] listing every diagnostic when
    /// no candidate opens.
    pub fn load_first<S: AsRef<str>>(
        &self,
        candidates: &[S],
        flags: Option<LoadFlags>,
    ) -> Result<String> {
        let mut diagnostics = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let candidate = candidate.as_ref();
            match self.load(candidate, flags) {
                Ok(()) => return Ok(candidate.to_string()),
                Err(err) => {
                    log::warn!("{}: cannot load {candidate}: {err}", R::FAMILY);
                    diagnostics.push(err.to_string());
                }
            }
        }
        if diagnostics.is_empty() {
            diagnostics.push(format!("no {} library candidates given", R::FAMILY));
        }
        Err(LinalgError::LibraryLoad(diagnostics.join("; ")))
    }

    /// Make an in-process symbol source active.
    pub fn install<S: SymbolSource + 'static>(&self, source: S) {
        log::debug!("{}: installed {}", R::FAMILY, source.describe());
        self.replace_source(Some(Box::new(source)));
    }

    /// Drop the active source. Later resolutions fail with
    /// [`LinalgError::LibraryNotLoaded`].
    pub fn unload(&self) {
        log::debug!("{}: unloaded", R::FAMILY);
        self.replace_source(None);
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().source.is_some()
    }

    /// Replace the symbol prefix and return it.
    pub fn set_prefix(&self, prefix: &str) -> String {
        let mut state = self.state.write();
        state.prefix = Some(prefix.to_string());
        self.clear_slots();
        log::debug!("{}: prefix set to {prefix:?}", R::FAMILY);
        prefix.to_string()
    }

    /// [`Context::set_prefix`] for a loosely-typed value; only text is
    /// accepted.
    pub fn set_prefix_value(&self, value: OptionValue<'_>) -> Result<String> {
        match value.text() {
            Some(prefix) => Ok(self.set_prefix(prefix)),
            None => Err(LinalgError::Type(format!(
                "prefix must be a string, got {value}"
            ))),
        }
    }

    /// Leave the prefix unset. Later resolutions fail with
    /// [`LinalgError::PrefixNotSet`].
    pub fn clear_prefix(&self) {
        let mut state = self.state.write();
        state.prefix = None;
        self.clear_slots();
        log::debug!("{}: prefix cleared", R::FAMILY);
    }

    pub fn prefix(&self) -> Option<String> {
        self.state.read().prefix.clone()
    }

    /// Full symbol name for `(routine, format)` under the current prefix.
    pub fn symbol_name(&self, routine: R, format: ElementFormat) -> Result<String> {
        let state = self.state.read();
        symbol_for(&state, routine, format)
    }

    /// Resolve `(routine, format)`, filling its slot on first success.
    ///
    /// Repeated calls without an intervening reload or prefix change return
    /// the same address.
    pub fn resolve(&self, routine: R, format: ElementFormat) -> Result<NonNull<c_void>> {
        let state = self.state.read();
        self.resolve_locked(&state, routine, format)
    }

    /// Resolve and keep the context read-locked for the duration of a call.
    pub fn bind(&self, routine: R, format: ElementFormat) -> Result<Binding<'_, R>> {
        let state = self.state.read();
        let address = self.resolve_locked(&state, routine, format)?;
        Ok(Binding {
            state,
            address,
            routine,
            format,
        })
    }

    fn resolve_locked(
        &self,
        state: &LibraryState,
        routine: R,
        format: ElementFormat,
    ) -> Result<NonNull<c_void>> {
        let slot = &self.slots[routine.slot(format)];
        if let Some(address) = NonNull::new(slot.load(Ordering::Acquire)) {
            return Ok(address);
        }

        let symbol = symbol_for(state, routine, format)?;
        let source = state.source.as_ref().ok_or(LinalgError::LibraryNotLoaded {
            family: R::FAMILY,
        })?;
        let address = source
            .lookup(&symbol)
            .map_err(|message| LinalgError::SymbolResolution {
                symbol: symbol.clone(),
                message,
            })?;
        let address = NonNull::new(address).ok_or(LinalgError::RoutineUnavailable {
            symbol: symbol.clone(),
        })?;

        // Writers clear slots under the write lock, so a store made under
        // the read lock always belongs to the current source.
        slot.store(address.as_ptr(), Ordering::Release);
        log::debug!("{}: resolved {symbol} at {:p}", R::FAMILY, address);
        Ok(address)
    }

    fn replace_source(&self, source: Option<Box<dyn SymbolSource>>) {
        let mut state = self.state.write();
        state.source = source;
        self.clear_slots();
    }

    fn clear_slots(&self) {
        for slot in self.slots.iter() {
            slot.store(ptr::null_mut(), Ordering::Release);
        }
    }
}

/// Symbol name checks in resolution order: format, library, prefix.
fn symbol_for<R: RoutineId>(
    state: &LibraryState,
    routine: R,
    format: ElementFormat,
) -> Result<String> {
    let stem = routine
        .stem(format)
        .ok_or(LinalgError::UnsupportedFormat {
            routine: routine.name(),
            format,
        })?;
    if state.source.is_none() {
        return Err(LinalgError::LibraryNotLoaded { family: R::FAMILY });
    }
    let prefix = state
        .prefix
        .as_deref()
        .ok_or(LinalgError::PrefixNotSet { family: R::FAMILY })?;
    Ok(format!("{prefix}{stem}"))
}

/// A resolved routine address, valid while the binding is alive.
pub struct Binding<'a, R: RoutineId> {
    state: RwLockReadGuard<'a, LibraryState>,
    address: NonNull<c_void>,
    routine: R,
    format: ElementFormat,
}

impl<R: RoutineId> Binding<'_, R> {
    pub fn address(&self) -> NonNull<c_void> {
        self.address
    }

    pub fn routine(&self) -> R {
        self.routine
    }

    /// Full symbol name, for diagnostics.
    pub fn symbol(&self) -> String {
        let prefix = self.state.prefix.as_deref().unwrap_or_default();
        let stem = self.routine.stem(self.format).unwrap_or_default();
        format!("{prefix}{stem}")
    }

    /// Reinterpret the address as a function pointer of type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "C"` function pointer type matching the
    /// exported routine's signature.
    pub unsafe fn cast<F: Copy>(&self) -> F {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
        unsafe { std::mem::transmute_copy::<*mut c_void, F>(&self.address.as_ptr()) }
    }
}

impl<R: RoutineId> fmt::Debug for Binding<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("symbol", &self.symbol())
            .field("address", &self.address)
            .finish()
    }
}
