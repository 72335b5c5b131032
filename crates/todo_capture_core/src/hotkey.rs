//! Capture hotkey accelerators and OS registration.
//!
//! # Responsibility
//! - Parse `Command+Control+K` style accelerators through `global-hotkey`.
//! - Claim and release the capture chord through a registrar seam.
//! - Map registrar failures onto `RegistrationFailed` so shells can show a
//!   notice and keep manual entry available.
//!
//! # Invariants
//! - A parsed hotkey always carries at least one modifier.
//! - Registration failure never aborts the caller; it is reported as an error
//!   value only.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::GlobalHotKeyManager;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Documented default capture chord.
pub const DEFAULT_CAPTURE_HOTKEY: &str = "Command+Control+K";

/// Parsed global key combination.
///
/// Equality follows the platform chord, so `ctrl+cmd+k` and
/// `Command+Control+K` are the same hotkey.
#[derive(Debug, Clone)]
pub struct Hotkey {
    accelerator: String,
    inner: HotKey,
}

impl Hotkey {
    /// Id that `GlobalHotKeyEvent`s carry for this chord.
    pub fn id(&self) -> u32 {
        self.inner.id()
    }

    /// Whether a hotkey event with `event_id` belongs to this chord.
    pub fn matches(&self, event_id: u32) -> bool {
        self.id() == event_id
    }

    pub fn as_global(&self) -> HotKey {
        self.inner
    }
}

impl PartialEq for Hotkey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Hotkey {}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            accelerator: DEFAULT_CAPTURE_HOTKEY.to_string(),
            inner: HotKey::new(Some(Modifiers::SUPER | Modifiers::CONTROL), Code::KeyK),
        }
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let accelerator = value.trim();
        let invalid = |reason: String| HotkeyError::InvalidAccelerator {
            accelerator: value.to_string(),
            reason,
        };
        if accelerator.is_empty() {
            return Err(invalid("empty accelerator".to_string()));
        }

        let inner = HotKey::from_str(accelerator).map_err(|err| invalid(err.to_string()))?;
        if inner.mods.is_empty() {
            return Err(invalid(
                "global hotkeys need at least one modifier".to_string(),
            ));
        }
        Ok(Self {
            accelerator: accelerator.to_string(),
            inner,
        })
    }
}

impl Display for Hotkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.accelerator)
    }
}

/// Hotkey parsing and registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    InvalidAccelerator { accelerator: String, reason: String },
    /// The OS refused the chord, usually because another application holds it.
    RegistrationFailed { hotkey: String, reason: String },
}

impl Display for HotkeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAccelerator {
                accelerator,
                reason,
            } => write!(f, "invalid hotkey `{accelerator}`: {reason}"),
            Self::RegistrationFailed { hotkey, reason } => {
                write!(f, "could not register {hotkey}: {reason}")
            }
        }
    }
}

impl Error for HotkeyError {}

/// Seam over the OS hotkey service.
pub trait HotkeyRegistrar {
    fn claim(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;
    fn release(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;
}

impl HotkeyRegistrar for GlobalHotKeyManager {
    fn claim(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        GlobalHotKeyManager::register(self, hotkey)
    }

    fn release(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        GlobalHotKeyManager::unregister(self, hotkey)
    }
}

/// Claims `hotkey` with the OS.
///
/// # Errors
/// - `RegistrationFailed` when the chord is taken or the OS call fails.
pub fn register_capture_hotkey(
    registrar: &dyn HotkeyRegistrar,
    hotkey: &Hotkey,
) -> Result<(), HotkeyError> {
    match registrar.claim(hotkey.as_global()) {
        Ok(()) => {
            info!(
                "event=hotkey_register module=hotkey status=ok hotkey={}",
                hotkey
            );
            Ok(())
        }
        Err(err) => {
            let error = registration_error(hotkey, &err);
            warn!(
                "event=hotkey_register module=hotkey status=error hotkey={} error={}",
                hotkey, err
            );
            Err(error)
        }
    }
}

/// Releases `hotkey`. A failed release is logged and reported as `false`.
pub fn unregister_capture_hotkey(registrar: &dyn HotkeyRegistrar, hotkey: &Hotkey) -> bool {
    match registrar.release(hotkey.as_global()) {
        Ok(()) => {
            info!(
                "event=hotkey_unregister module=hotkey status=ok hotkey={}",
                hotkey
            );
            true
        }
        Err(err) => {
            warn!(
                "event=hotkey_unregister module=hotkey status=error hotkey={} error={}",
                hotkey, err
            );
            false
        }
    }
}

fn registration_error(hotkey: &Hotkey, err: &global_hotkey::Error) -> HotkeyError {
    let reason = match err {
        global_hotkey::Error::AlreadyRegistered(_) => {
            "already in use by another application".to_string()
        }
        other => other.to_string(),
    };
    HotkeyError::RegistrationFailed {
        hotkey: hotkey.to_string(),
        reason,
    }
}
