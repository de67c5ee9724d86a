//! Stack growth for recursive descent over nested host data and literals.
//!
//! Host values can nest arbitrarily deep; each recursive step goes through
//! [`ensure_sufficient_stack`] so a deep tree grows the stack instead of
//! overflowing it.

/// Run `f` with at least a red zone of stack available.
///
/// On WASM targets the closure is called directly.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
