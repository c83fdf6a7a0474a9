//! C ABI facade.
//!
//! Hosts (system text services, the GUI harness, test drivers) consume the
//! engine through this surface. Engines and metadata keyboards live in
//! process-global registries keyed by opaque integer handles; per-engine
//! operations serialize through a per-handle lock so hosts may call from
//! any thread.
//!
//! # FFI Usage
//!
//! ```c
//! uint64_t e = engine_new();
//! engine_load_keyboard(e, "/path/to/layout.km2");
//!
//! ProcessKeyOutput out;
//! engine_process_key_win(e, vk, ch, shift, ctrl, alt, caps, &out);
//! if (out.is_processed) {
//!     // delete out.delete_count units, insert out.text
//! }
//! free_string(out.text);
//! free_string(out.composing_text);
//!
//! engine_free(e);
//! ```
//!
//! Every `char*` this module returns is heap-allocated and must be
//! released with `free_string`, exactly once.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use tracing::debug;

use crate::engine::{EditAction, Engine, EngineOutput, KeyInput, Modifiers};
use crate::error::Error;
use crate::hotkey;
use crate::keys;
use crate::km2::{self, Km2File};

// ============================================================
// Registries
// ============================================================

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

static ENGINES: LazyLock<Mutex<HashMap<u64, Arc<Mutex<Engine>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static KEYBOARDS: LazyLock<Mutex<HashMap<u64, Km2File>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Lock a registry, recovering from poisoned state (a panicking host
/// thread must not wedge every other input context).
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn with_engine<T>(handle: u64, f: impl FnOnce(&mut Engine) -> T) -> Option<T> {
    let engine = lock(&ENGINES).get(&handle).cloned()?;
    let mut guard = engine.lock().unwrap_or_else(|e| e.into_inner());
    Some(f(&mut guard))
}

// ============================================================
// ABI types
// ============================================================

/// Status codes returned by every fallible entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success = 0,
    ErrorInvalidParameter = 1,
    ErrorInvalidHandle = 2,
    ErrorNoKeyboard = 3,
    ErrorEngineFailure = 4,
}

/// Edit action kinds in [`ProcessKeyOutput::action_type`].
pub const ACTION_NONE: u8 = 0;
pub const ACTION_INSERT: u8 = 1;
pub const ACTION_BACKSPACE_DELETE: u8 = 2;
pub const ACTION_BACKSPACE_DELETE_AND_INSERT: u8 = 3;

/// Result of one key event.
///
/// `text` may be null (no insertion). `delete_count` is in UTF-16 code
/// units. Both string fields are owned by the caller afterwards and must
/// be released with `free_string`.
#[repr(C)]
#[derive(Debug)]
pub struct ProcessKeyOutput {
    pub action_type: u8,
    pub text: *mut c_char,
    pub delete_count: c_int,
    pub composing_text: *mut c_char,
    pub is_processed: u8,
}

/// Parsed hotkey for hosts.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct HotkeyInfo {
    /// Internal key code (see `vk_to_string`).
    pub key_code: c_int,
    pub ctrl: u8,
    pub alt: u8,
    pub shift: u8,
    pub meta: u8,
}

fn alloc_c_string(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// # Safety
/// `out` must point to writable memory for one `ProcessKeyOutput`.
unsafe fn fill_output(out: *mut ProcessKeyOutput, result: &EngineOutput) {
    let (action_type, text, delete_count) = match &result.action {
        EditAction::None => (ACTION_NONE, std::ptr::null_mut(), 0),
        EditAction::Insert(s) => (ACTION_INSERT, alloc_c_string(s), 0),
        EditAction::Delete(n) => (ACTION_BACKSPACE_DELETE, std::ptr::null_mut(), *n as c_int),
        EditAction::DeleteAndInsert(n, s) => (
            ACTION_BACKSPACE_DELETE_AND_INSERT,
            alloc_c_string(s),
            *n as c_int,
        ),
    };
    (*out).action_type = action_type;
    (*out).text = text;
    (*out).delete_count = delete_count;
    (*out).composing_text = alloc_c_string(&result.composing);
    (*out).is_processed = u8::from(result.is_processed);
}

fn status_of(err: &Error) -> StatusCode {
    match err {
        Error::NoKeyboard => StatusCode::ErrorNoKeyboard,
        _ => StatusCode::ErrorEngineFailure,
    }
}

// ============================================================
// Engine lifecycle
// ============================================================

/// Create an engine and return its handle. Never returns 0.
#[no_mangle]
pub extern "C" fn engine_new() -> u64 {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    lock(&ENGINES).insert(handle, Arc::new(Mutex::new(Engine::new())));
    debug!(handle, "engine created");
    handle
}

/// Destroy an engine.
#[no_mangle]
pub extern "C" fn engine_free(handle: u64) -> StatusCode {
    match lock(&ENGINES).remove(&handle) {
        Some(_) => StatusCode::Success,
        None => StatusCode::ErrorInvalidHandle,
    }
}

/// Load a keyboard file into an engine. Replaces the current keyboard and
/// resets all composing state.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn engine_load_keyboard(handle: u64, path: *const c_char) -> StatusCode {
    if path.is_null() {
        return StatusCode::ErrorInvalidParameter;
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(s) => s,
        Err(_) => return StatusCode::ErrorInvalidParameter,
    };
    match with_engine(handle, |e| e.load_keyboard_file(path)) {
        Some(Ok(())) => StatusCode::Success,
        Some(Err(err)) => {
            debug!(%err, "keyboard load failed");
            status_of(&err)
        }
        None => StatusCode::ErrorInvalidHandle,
    }
}

/// Load a keyboard from a byte buffer.
///
/// # Safety
/// `data` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn engine_load_keyboard_from_memory(
    handle: u64,
    data: *const u8,
    len: usize,
) -> StatusCode {
    if data.is_null() {
        return StatusCode::ErrorInvalidParameter;
    }
    let bytes = std::slice::from_raw_parts(data, len);
    match with_engine(handle, |e| e.load_keyboard_memory(bytes)) {
        Some(Ok(())) => StatusCode::Success,
        Some(Err(err)) => status_of(&err),
        None => StatusCode::ErrorInvalidHandle,
    }
}

/// Clear composing text, active states and history.
#[no_mangle]
pub extern "C" fn engine_reset(handle: u64) -> StatusCode {
    match with_engine(handle, Engine::reset) {
        Some(()) => StatusCode::Success,
        None => StatusCode::ErrorInvalidHandle,
    }
}

// ============================================================
// Key processing
// ============================================================

fn build_input(vk: u16, character: u32, shift: c_int, ctrl: c_int, alt: c_int, caps: c_int) -> KeyInput {
    let character = if character == 0 {
        None
    } else {
        char::from_u32(character)
    };
    KeyInput {
        vk,
        character,
        modifiers: Modifiers {
            shift: shift != 0,
            ctrl: ctrl != 0,
            alt: alt != 0,
            caps_lock: caps != 0,
        },
    }
}

unsafe fn process_common(
    handle: u64,
    input: KeyInput,
    test_mode: bool,
    out: *mut ProcessKeyOutput,
) -> StatusCode {
    if out.is_null() {
        return StatusCode::ErrorInvalidParameter;
    }
    let result = with_engine(handle, |e| {
        if test_mode {
            e.process_key_test(input)
        } else {
            e.process_key(input)
        }
    });
    match result {
        Some(Ok(output)) => {
            fill_output(out, &output);
            StatusCode::Success
        }
        Some(Err(err)) => status_of(&err),
        None => StatusCode::ErrorInvalidHandle,
    }
}

/// Process a key event given an internal virtual-key code.
///
/// `character` is the translated Unicode scalar for the event, 0 if none.
///
/// # Safety
/// `out` must point to writable memory for one `ProcessKeyOutput`.
#[no_mangle]
pub unsafe extern "C" fn engine_process_key(
    handle: u64,
    vk: c_int,
    character: u32,
    shift: c_int,
    ctrl: c_int,
    alt: c_int,
    caps: c_int,
    out: *mut ProcessKeyOutput,
) -> StatusCode {
    let vk = u16::try_from(vk).unwrap_or(keys::NULL);
    process_common(
        handle,
        build_input(vk, character, shift, ctrl, alt, caps),
        false,
        out,
    )
}

/// Process a key event given a Windows virtual-key code.
///
/// # Safety
/// Same contract as [`engine_process_key`].
#[no_mangle]
pub unsafe extern "C" fn engine_process_key_win(
    handle: u64,
    windows_vk: c_int,
    character: u32,
    shift: c_int,
    ctrl: c_int,
    alt: c_int,
    caps: c_int,
    out: *mut ProcessKeyOutput,
) -> StatusCode {
    let vk = keys::from_windows(windows_vk as u32);
    process_common(
        handle,
        build_input(vk, character, shift, ctrl, alt, caps),
        false,
        out,
    )
}

/// Non-mutating variant of [`engine_process_key_win`]: previews what the
/// key would do without changing engine state.
///
/// # Safety
/// Same contract as [`engine_process_key`].
#[no_mangle]
pub unsafe extern "C" fn engine_process_key_test_win(
    handle: u64,
    windows_vk: c_int,
    character: u32,
    shift: c_int,
    ctrl: c_int,
    alt: c_int,
    caps: c_int,
    out: *mut ProcessKeyOutput,
) -> StatusCode {
    let vk = keys::from_windows(windows_vk as u32);
    process_common(
        handle,
        build_input(vk, character, shift, ctrl, alt, caps),
        true,
        out,
    )
}

// ============================================================
// Composition access
// ============================================================

/// Current composing text as UTF-8. Null on an invalid handle; release
/// with `free_string`.
#[no_mangle]
pub extern "C" fn engine_get_composition(handle: u64) -> *mut c_char {
    match with_engine(handle, |e| e.composing_text()) {
        Some(s) => alloc_c_string(&s),
        None => std::ptr::null_mut(),
    }
}

/// Replace the composing text (host caret moved or document edited).
/// Clears history and active states.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn engine_set_composition(handle: u64, text: *const c_char) -> StatusCode {
    if text.is_null() {
        return StatusCode::ErrorInvalidParameter;
    }
    let text = match CStr::from_ptr(text).to_str() {
        Ok(s) => s.to_owned(),
        Err(_) => return StatusCode::ErrorInvalidParameter,
    };
    match with_engine(handle, |e| e.set_composing_text(&text)) {
        Some(()) => StatusCode::Success,
        None => StatusCode::ErrorInvalidHandle,
    }
}

// ============================================================
// Keyboard metadata handles
// ============================================================

/// Load a keyboard file for metadata inspection only. Returns 0 on
/// failure.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn km_load(path: *const c_char) -> u64 {
    if path.is_null() {
        return 0;
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(s) => s,
        Err(_) => return 0,
    };
    match km2::load_from_file(path) {
        Ok(file) => {
            let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
            lock(&KEYBOARDS).insert(handle, file);
            handle
        }
        Err(err) => {
            debug!(%err, "metadata keyboard load failed");
            0
        }
    }
}

/// Release a metadata keyboard handle.
#[no_mangle]
pub extern "C" fn km_free(handle: u64) -> StatusCode {
    match lock(&KEYBOARDS).remove(&handle) {
        Some(_) => StatusCode::Success,
        None => StatusCode::ErrorInvalidHandle,
    }
}

fn km_text(handle: u64, get: impl Fn(&Km2File) -> Option<String>) -> *mut c_char {
    let map = lock(&KEYBOARDS);
    match map.get(&handle).and_then(|f| get(f)) {
        Some(s) => alloc_c_string(&s),
        None => std::ptr::null_mut(),
    }
}

/// Keyboard display name, or null. Release with `free_string`.
#[no_mangle]
pub extern "C" fn km_get_name(handle: u64) -> *mut c_char {
    km_text(handle, Km2File::name)
}

/// Keyboard description, or null. Release with `free_string`.
#[no_mangle]
pub extern "C" fn km_get_description(handle: u64) -> *mut c_char {
    km_text(handle, Km2File::description)
}

/// Textual hotkey as authored, or null. Release with `free_string`.
#[no_mangle]
pub extern "C" fn km_get_hotkey(handle: u64) -> *mut c_char {
    km_text(handle, Km2File::hotkey_text)
}

/// Copy icon bytes into `buf` (up to `buf_len`) and return the icon's
/// full size, 0 when the keyboard has no icon, -1 on an invalid handle.
/// Pass a null `buf` to query the size first.
///
/// # Safety
/// `buf`, when non-null, must point to `buf_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn km_get_icon_data(handle: u64, buf: *mut u8, buf_len: usize) -> i64 {
    let map = lock(&KEYBOARDS);
    let Some(file) = map.get(&handle) else {
        return -1;
    };
    let Some(icon) = file.icon() else {
        return 0;
    };
    if !buf.is_null() {
        let n = icon.len().min(buf_len);
        std::ptr::copy_nonoverlapping(icon.as_ptr(), buf, n);
    }
    icon.len() as i64
}

// ============================================================
// Utilities
// ============================================================

/// Parse hotkey text into `info`. Returns 1 on success, 0 on failure.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 string; `info` must point
/// to writable memory for one `HotkeyInfo`.
#[no_mangle]
pub unsafe extern "C" fn parse_hotkey(text: *const c_char, info: *mut HotkeyInfo) -> c_int {
    if text.is_null() || info.is_null() {
        return 0;
    }
    let text = match CStr::from_ptr(text).to_str() {
        Ok(s) => s,
        Err(_) => return 0,
    };
    match hotkey::parse(text) {
        Some(h) => {
            *info = HotkeyInfo {
                key_code: h.key as c_int,
                ctrl: u8::from(h.ctrl),
                alt: u8::from(h.alt),
                shift: u8::from(h.shift),
                meta: u8::from(h.meta),
            };
            1
        }
        None => 0,
    }
}

/// Display name of an internal key code, or null for unknown codes.
/// Release with `free_string`.
#[no_mangle]
pub extern "C" fn vk_to_string(vk: c_int) -> *mut c_char {
    u16::try_from(vk)
        .ok()
        .and_then(keys::name)
        .map_or(std::ptr::null_mut(), alloc_c_string)
}

/// Library version string. Release with `free_string`.
#[no_mangle]
pub extern "C" fn get_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

/// Release a string returned by this library.
///
/// # Safety
/// `s` must be a pointer returned by this library, or null. Call exactly
/// once per non-null string.
#[no_mangle]
pub unsafe extern "C" fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
