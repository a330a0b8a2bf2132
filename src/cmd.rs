use crate::{config::CommandVerb, math::Vec2i, session::Tool};

/// A user action, translated from window input by the app and applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    Clear,

    /// Toggles a shape tool on or off.
    ToggleTool {
        tool: Tool,
    },

    /// Primary button pressed, at the pointer position in surface pixels.
    PointerDown {
        position: Vec2i,
    },
    PointerMove {
        position: Vec2i,
    },
    PointerUp {
        position: Vec2i,
    },
}

impl From<CommandVerb> for Cmd {
    fn from(verb: CommandVerb) -> Self {
        match verb {
            CommandVerb::ToolLine => Cmd::ToggleTool { tool: Tool::Line },
            CommandVerb::ToolCircle => Cmd::ToggleTool { tool: Tool::Circle },
            CommandVerb::ToolSquare => Cmd::ToggleTool { tool: Tool::Square },
            CommandVerb::Clear => Cmd::Clear,
        }
    }
}
