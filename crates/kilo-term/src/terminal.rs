// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode with verified application and guaranteed restore.
//
// Safety: the process driver (`Tty`) necessarily uses `unsafe` for termios
// (tcgetattr, tcsetattr), isatty, and one raw fd write in the panic hook.
// These are the standard POSIX interfaces for terminal control. Each unsafe
// block is minimal.
#![allow(unsafe_code)]
//
// `TerminalMode` is a two-state machine, Canonical ⇄ Raw, over a snapshot of
// the driver attributes captured once at construction. Entering raw mode is
// all-or-nothing: `tcsetattr` may report success after applying only part of
// the request, so after applying we read the attributes back and check every
// targeted change. If anything failed to stick, the original attributes go
// back and the caller gets `Error::PartialRawMode`.
//
// Leaving raw mode must never be skipped. `with_raw_mode` scopes a raw
// session to a closure and restores on every exit path; `Drop` covers
// unwinding; and while raw, the process driver keeps a restore point that a
// panic hook applies before the panic message prints, so the message lands
// on a working terminal. The restore point is consumed exactly once, by
// whichever of those paths gets there first.
//
// The OS calls sit behind `TermDriver` so the state machine runs against an
// in-memory driver in tests.

use std::cell::Cell;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

use bitflags::bitflags;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::io::STDIN;

/// `VMIN` in raw mode: reads may return with zero bytes.
pub const RAW_MIN_BYTES: libc::cc_t = 0;

/// `VTIME` in raw mode, in deciseconds: the longest a read waits.
pub const RAW_READ_TIMEOUT: libc::cc_t = 1;

// ─── Attributes ──────────────────────────────────────────────────────────────

/// A snapshot of the terminal driver configuration.
///
/// Equality is bit-for-bit over the four flag words and the control
/// character array; line discipline and baud rate fields are ignored.
#[derive(Clone, Copy)]
pub struct Attributes(libc::termios);

impl Attributes {
    /// All flags cleared, all control characters zero.
    #[must_use]
    pub fn zeroed() -> Self {
        // termios is plain old data; all-zero is a valid value.
        Self(unsafe { std::mem::zeroed() })
    }

    /// The underlying `termios`.
    #[must_use]
    pub const fn as_termios(&self) -> &libc::termios {
        &self.0
    }

    /// Mutable access to the underlying `termios`.
    pub const fn as_termios_mut(&mut self) -> &mut libc::termios {
        &mut self.0
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.0.c_iflag == other.0.c_iflag
            && self.0.c_oflag == other.0.c_oflag
            && self.0.c_cflag == other.0.c_cflag
            && self.0.c_lflag == other.0.c_lflag
            && self.0.c_cc == other.0.c_cc
    }
}

impl Eq for Attributes {}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("iflag", &format_args!("{:#x}", self.0.c_iflag))
            .field("oflag", &format_args!("{:#x}", self.0.c_oflag))
            .field("cflag", &format_args!("{:#x}", self.0.c_cflag))
            .field("lflag", &format_args!("{:#x}", self.0.c_lflag))
            .field("vmin", &self.0.c_cc[libc::VMIN])
            .field("vtime", &self.0.c_cc[libc::VTIME])
            .finish()
    }
}

// ─── Raw mode derivation ─────────────────────────────────────────────────────

bitflags! {
    /// Each change raw mode makes to the driver attributes.
    ///
    /// Used to report which changes a driver silently ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct RawFlags: u16 {
        /// No SIGINT on break.
        const BRKINT = 1 << 0;
        /// No CR → NL translation.
        const ICRNL  = 1 << 1;
        /// No input parity checking.
        const INPCK  = 1 << 2;
        /// Don't strip the 8th bit.
        const ISTRIP = 1 << 3;
        /// No software flow control.
        const IXON   = 1 << 4;
        /// No output post-processing.
        const OPOST  = 1 << 5;
        /// 8-bit characters.
        const CS8    = 1 << 6;
        /// No echo.
        const ECHO   = 1 << 7;
        /// No line buffering.
        const ICANON = 1 << 8;
        /// No extended input processing (Ctrl-V).
        const IEXTEN = 1 << 9;
        /// No signal characters (Ctrl-C, Ctrl-Z).
        const ISIG   = 1 << 10;
        /// Reads may return zero bytes.
        const VMIN   = 1 << 11;
        /// Short inter-byte timeout.
        const VTIME  = 1 << 12;
    }
}

const RAW_IFLAGS: libc::tcflag_t =
    libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON;
const RAW_LFLAGS: libc::tcflag_t = libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG;

/// Derive raw-mode attributes from `original`. `original` is not modified.
#[must_use]
pub fn make_raw(original: &Attributes) -> Attributes {
    let mut raw = *original;
    let t = raw.as_termios_mut();

    t.c_iflag &= !RAW_IFLAGS;
    t.c_oflag &= !libc::OPOST;
    t.c_cflag = (t.c_cflag & !libc::CSIZE) | libc::CS8;
    t.c_lflag &= !RAW_LFLAGS;
    t.c_cc[libc::VMIN] = RAW_MIN_BYTES;
    t.c_cc[libc::VTIME] = RAW_READ_TIMEOUT;

    raw
}

/// The raw-mode changes that are *not* present in `attrs`.
///
/// Empty means `attrs` is fully raw.
#[must_use]
pub fn unapplied(attrs: &Attributes) -> RawFlags {
    let t = attrs.as_termios();
    let mut missing = RawFlags::empty();

    missing.set(RawFlags::BRKINT, t.c_iflag & libc::BRKINT != 0);
    missing.set(RawFlags::ICRNL, t.c_iflag & libc::ICRNL != 0);
    missing.set(RawFlags::INPCK, t.c_iflag & libc::INPCK != 0);
    missing.set(RawFlags::ISTRIP, t.c_iflag & libc::ISTRIP != 0);
    missing.set(RawFlags::IXON, t.c_iflag & libc::IXON != 0);
    missing.set(RawFlags::OPOST, t.c_oflag & libc::OPOST != 0);
    missing.set(RawFlags::CS8, t.c_cflag & libc::CSIZE != libc::CS8);
    missing.set(RawFlags::ECHO, t.c_lflag & libc::ECHO != 0);
    missing.set(RawFlags::ICANON, t.c_lflag & libc::ICANON != 0);
    missing.set(RawFlags::IEXTEN, t.c_lflag & libc::IEXTEN != 0);
    missing.set(RawFlags::ISIG, t.c_lflag & libc::ISIG != 0);
    missing.set(RawFlags::VMIN, t.c_cc[libc::VMIN] != RAW_MIN_BYTES);
    missing.set(RawFlags::VTIME, t.c_cc[libc::VTIME] != RAW_READ_TIMEOUT);

    missing
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// Access to the terminal driver's attributes.
pub trait TermDriver {
    /// Read the current attributes.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be read.
    fn get(&mut self) -> io::Result<Attributes>;

    /// Apply `attrs`, discarding pending input.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be applied.
    fn set(&mut self, attrs: &Attributes) -> io::Result<()>;

    /// Raw mode is now active; `original` is what must come back.
    fn arm(&mut self, _original: &Attributes) {}

    /// Leave raw mode by restoring `original`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be applied.
    fn release(&mut self, original: &Attributes) -> io::Result<()> {
        self.set(original)
    }
}

/// Set while a `Tty` exists. The driver is process-global state.
static TTY_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Original attributes while raw, for the panic hook. Taken exactly once.
static RESTORE_POINT: Mutex<Option<libc::termios>> = Mutex::new(None);

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Written by the panic hook: a frame may have hidden the cursor.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h\r\n";

fn restore_point() -> MutexGuard<'static, Option<libc::termios>> {
    RESTORE_POINT.lock().unwrap_or_else(PoisonError::into_inner)
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Some(termios) = restore_point().take() {
                unsafe {
                    let _ = libc::tcsetattr(STDIN, libc::TCSAFLUSH, &raw const termios);
                    let _ = libc::write(
                        libc::STDOUT_FILENO,
                        EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                        EMERGENCY_RESTORE.len(),
                    );
                }
            }
            original(info);
        }));
    });
}

/// The process's controlling terminal, via stdin.
///
/// At most one exists per process. Not `Sync`: the driver state it
/// mutates is not safe to share.
#[derive(Debug)]
pub struct Tty {
    fd: RawFd,
    _not_sync: PhantomData<Cell<()>>,
}

impl Tty {
    /// Claim the process terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyClaimed`] if another `Tty` is alive.
    pub fn claim() -> Result<Self> {
        if TTY_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyClaimed);
        }
        Ok(Self {
            fd: STDIN,
            _not_sync: PhantomData,
        })
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        TTY_CLAIMED.store(false, Ordering::Release);
    }
}

impl TermDriver for Tty {
    fn get(&mut self) -> io::Result<Attributes> {
        let mut attrs = Attributes::zeroed();
        if unsafe { libc::tcgetattr(self.fd, &raw mut attrs.0) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(attrs)
    }

    fn set(&mut self, attrs: &Attributes) -> io::Result<()> {
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &raw const attrs.0) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn arm(&mut self, original: &Attributes) {
        install_panic_hook();
        *restore_point() = Some(original.0);
    }

    fn release(&mut self, original: &Attributes) -> io::Result<()> {
        let mut point = restore_point();
        if point.is_none() {
            debug!("restore point already consumed by the panic hook");
            return Ok(());
        }
        self.set(original)?;
        *point = None;
        Ok(())
    }
}

/// Check whether stdin is connected to a terminal.
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(STDIN) != 0 }
}

// ─── TerminalMode ────────────────────────────────────────────────────────────

/// The two driver states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Line-buffered, echoing: the shell's configuration.
    #[default]
    Canonical,
    /// Byte-at-a-time, no echo, no signals, 100ms read timeout.
    Raw,
}

/// Raw/canonical state machine over a captured original.
///
/// Restores canonical mode when dropped.
///
/// # Example
///
/// ```no_run
/// use kilo_term::terminal::TerminalMode;
///
/// let mut mode = TerminalMode::new()?;
/// mode.with_raw_mode(|_| {
///     // ... read keys, paint frames ...
///     Ok::<(), kilo_term::Error>(())
/// })?;
/// # Ok::<(), kilo_term::Error>(())
/// ```
pub struct TerminalMode<D: TermDriver = Tty> {
    driver: D,
    original: Attributes,
    mode: Mode,
}

impl TerminalMode<Tty> {
    /// Claim the process terminal and capture its attributes.
    ///
    /// # Errors
    ///
    /// Fails if the terminal is already claimed or its attributes cannot
    /// be read (e.g. stdin is not a terminal).
    pub fn new() -> Result<Self> {
        Self::with_driver(Tty::claim()?)
    }
}

impl<D: TermDriver> TerminalMode<D> {
    /// Capture the original attributes from `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attributes`] if the attributes cannot be read:
    /// without a restore point it is not safe to go raw.
    pub fn with_driver(mut driver: D) -> Result<Self> {
        let original = driver
            .get()
            .map_err(|source| Error::Attributes { op: "read", source })?;
        Ok(Self {
            driver,
            original,
            mode: Mode::Canonical,
        })
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether raw mode is active.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self.mode, Mode::Raw)
    }

    /// The attributes captured at construction.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> &Attributes {
        &self.original
    }

    /// The underlying driver.
    #[inline]
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Enter raw mode. No-op if already raw.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attributes`] if the driver rejects the change or
    /// can't be read back, and [`Error::PartialRawMode`] if some changes
    /// didn't stick. In every error case the original attributes have
    /// been restored and the state is still canonical.
    pub fn set_raw_mode(&mut self) -> Result<()> {
        if self.is_raw() {
            return Ok(());
        }

        let raw = make_raw(&self.original);
        if let Err(source) = self.driver.set(&raw) {
            self.restore_after_failure();
            return Err(Error::Attributes { op: "apply", source });
        }

        let applied = match self.driver.get() {
            Ok(attrs) => attrs,
            Err(source) => {
                self.restore_after_failure();
                return Err(Error::Attributes { op: "verify", source });
            }
        };

        let missing = unapplied(&applied);
        if !missing.is_empty() {
            self.restore_after_failure();
            return Err(Error::PartialRawMode { unapplied: missing });
        }

        self.driver.arm(&self.original);
        self.mode = Mode::Raw;
        debug!("terminal entered raw mode");
        Ok(())
    }

    /// Restore the original attributes. No-op if already canonical.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attributes`] if the driver rejects the restore; the
    /// state stays raw so a later attempt can retry.
    pub fn set_canonical_mode(&mut self) -> Result<()> {
        if !self.is_raw() {
            return Ok(());
        }

        self.driver
            .release(&self.original)
            .map_err(|source| Error::Attributes { op: "restore", source })?;
        self.mode = Mode::Canonical;
        debug!("terminal restored to canonical mode");
        Ok(())
    }

    /// Teardown-path restore: like [`set_canonical_mode`](Self::set_canonical_mode),
    /// but failures are logged rather than returned.
    pub fn reset(&mut self) {
        if let Err(err) = self.set_canonical_mode() {
            error!(%err, "failed to restore canonical mode");
        }
    }

    /// Run `body` with the terminal in raw mode.
    ///
    /// Canonical mode is restored before this returns, whether `body`
    /// succeeds, fails, or panics. If `body` fails, its error wins over
    /// any restore error (which is logged).
    ///
    /// # Errors
    ///
    /// Propagates failures from entering raw mode, from `body`, and from
    /// restoring canonical mode after a successful `body`.
    pub fn with_raw_mode<T, E>(
        &mut self,
        body: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<Error>,
    {
        self.set_raw_mode()?;
        match body(self) {
            Ok(value) => {
                self.set_canonical_mode()?;
                Ok(value)
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    fn restore_after_failure(&mut self) {
        if let Err(err) = self.driver.set(&self.original) {
            error!(%err, "failed to restore original attributes after raw mode failure");
        }
    }
}

impl<D: TermDriver> Drop for TerminalMode<D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<D: TermDriver> fmt::Debug for TerminalMode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalMode")
            .field("mode", &self.mode)
            .field("original", &self.original)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
