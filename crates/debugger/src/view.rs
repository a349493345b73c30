//! Declarative view model handed to renderers.

use crate::breakpoints::ConfigRow;

/// The breakpoint marker drawn in a line's gutter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    /// Disabled breakpoints are drawn in a different colour.
    pub enabled: bool,
}

/// Everything a renderer needs to draw one listing line.
///
/// When `config_row` is set the row is drawn immediately below the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDescriptor {
    pub number: usize,
    pub text: String,
    pub selected: bool,
    pub arrow: bool,
    pub marker: Option<Marker>,
    pub config_row: Option<ConfigRow>,
    /// Message of the last failed breakpoint request on this line.
    pub error: Option<String>,
}

/// How the operator clicked a line's gutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Create the breakpoint, or flip its enabled flag.
    Toggle,
    /// Delete the breakpoint.
    Delete,
}

impl Gesture {
    /// The middle mouse button.
    pub const DELETE_BUTTON: u16 = 1;

    pub fn from_mouse_button(button: u16) -> Self {
        if button == Self::DELETE_BUTTON {
            Gesture::Delete
        } else {
            Gesture::Toggle
        }
    }
}
