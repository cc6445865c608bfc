//! Theme constants for the TUI.

use ratatui::style::Color;
use ratatui::widgets::BorderType;

use funnel_core::model::Stage;

/// Border type for all panels
pub const BORDER_TYPE: BorderType = BorderType::Rounded;

/// Focused panel border color
pub const FOCUSED: Color = Color::Green;

/// Selected row background
pub const SELECTED_BG: Color = Color::DarkGray;

/// Owner currently receiving progress keys
pub const FOCUS_OWNER: Color = Color::Cyan;

/// Active filters in the header
pub const FILTER: Color = Color::Yellow;

/// Failure text in the status bar
pub const ERROR: Color = Color::Red;

/// Secondary/dim text
pub const DIM: Color = Color::DarkGray;

/// Status bar color
pub const STATUS_BAR: Color = Color::Blue;

/// Badge color for a funnel stage: early stages cool, late stages warm.
#[must_use]
pub const fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::InviteSent | Stage::InviteAccepted => Color::Blue,
        Stage::InviteResponse | Stage::MessageSent => Color::Cyan,
        Stage::MessageResponse | Stage::Interested => Color::Yellow,
        Stage::CallScheduled => Color::Magenta,
        Stage::NextSteps => Color::Green,
    }
}
