//! Key bindings for interactive servo control.
//!
//! Terminal handling and escape-sequence decoding happen elsewhere; this module starts from an
//! already-decoded [`Key`].

/// A decoded key press.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Any other key, as its byte.
    Char(u8),
}

/// What a key asks the servo to do.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Start driving.
    Enable,
    /// Stop driving.
    Disable,
    /// Move to an angle in degrees.
    SetPosition(i32),
    /// Leave the interactive loop.
    Quit,
    /// No servo operation.
    Ignore,
}

impl Key {
    /// The action bound to this key. Each key maps to exactly one action.
    ///
    /// | Key | Action |
    /// |-----|--------|
    /// | Up | [`Action::Enable`] |
    /// | Down | [`Action::Disable`] |
    /// | Right | [`Action::SetPosition`]`(0)` |
    /// | Left | [`Action::SetPosition`]`(180)` |
    /// | `q`, `Q` | [`Action::Quit`] |
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Up => Action::Enable,
            Self::Down => Action::Disable,
            Self::Right => Action::SetPosition(0),
            Self::Left => Action::SetPosition(180),
            Self::Char(b'q' | b'Q') => Action::Quit,
            Self::Char(_) => Action::Ignore,
        }
    }
}
