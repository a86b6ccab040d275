// common.rs — console output shared by the loader, tracer and tools

use parking_lot::Mutex;

use crate::cvar::{cvar_get, cvar_variable_value, CVAR_ARCHIVE};

// ============================================================
// Redirect buffer for com_printf
// ============================================================

static RD_BUFFER: Mutex<Option<String>> = Mutex::new(None);

/// Begin redirecting printf output into a buffer.
pub fn com_begin_redirect() {
    *RD_BUFFER.lock() = Some(String::new());
}

/// End redirect and return the captured output.
pub fn com_end_redirect() -> Option<String> {
    RD_BUFFER.lock().take()
}

// ============================================================
// com_printf / com_dprintf
// ============================================================

/// General-purpose print function. Prints to stdout, or appends to the
/// redirect buffer if one is active.
pub fn com_printf(msg: &str) {
    {
        let mut buf = RD_BUFFER.lock();
        if let Some(ref mut s) = *buf {
            s.push_str(msg);
            return;
        }
    }
    print!("{}", msg);
}

/// Developer-only print, controlled by the "developer" cvar.
pub fn com_dprintf(msg: &str) {
    if cvar_variable_value("developer") == 0.0 {
        return;
    }
    com_printf(msg);
}

// ============================================================
// Startup
// ============================================================

/// Registers every tunable the core reads, with its default value.
/// Safe to call more than once; existing values are kept.
pub fn com_register_cvars() {
    cvar_get("developer", "0", 0);
    cvar_get("r_novis", "0", 0);
    cvar_get("r_nocull", "0", 0);
    cvar_get("pm_stepheight", "18", CVAR_ARCHIVE);
    cvar_get("pm_gravity", "800", CVAR_ARCHIVE);
    cvar_get("pm_overbounce", "1.001", 0);
}
