//! Pointer gesture handling and the drawing session that owns the surface and command log.

use crate::{
    cmd::Cmd,
    command::{CommandLog, DrawCommand, DrawKind},
    math::Vec2i,
    surface::{DrawingSurface, Rgba, FOREGROUND},
    sync::Remote,
};

/// The active drawing tool. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Freehand drawing, committed segment by segment while the pointer moves.
    #[default]
    Free,
    Line,
    Circle,
    Square,
}

impl Tool {
    /// Command kind recorded when a gesture with this tool is committed.
    fn kind(self) -> DrawKind {
        match self {
            Tool::Free => DrawKind::Free,
            Tool::Line => DrawKind::Line,
            Tool::Circle => DrawKind::Circle,
            Tool::Square => DrawKind::Rect,
        }
    }

    /// Whether the tool reverts to [`Tool::Free`] after one completed gesture.
    ///
    /// Square stays active, unlike Line and Circle.
    fn is_one_shot(self) -> bool {
        matches!(self, Tool::Line | Tool::Circle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    /// Primary button held. For freehand the anchor follows the pointer, for shapes it stays at
    /// the press position.
    Dragging { anchor: Vec2i },
}

/// What the presentation step should put on screen this frame.
pub enum Frame<'a> {
    Committed(&'a DrawingSurface),
    /// A shape gesture is mid-drag: the committed surface with the shape drawn on top of it.
    Preview {
        surface: &'a DrawingSurface,
        overlay: &'a [Vec2i],
    },
}

impl Frame<'_> {
    pub fn surface(&self) -> &DrawingSurface {
        match self {
            Frame::Committed(surface) | Frame::Preview { surface, .. } => surface,
        }
    }

    /// Writes the composed frame into `out` as row-major RGBA.
    pub fn compose(&self, out: &mut Vec<Rgba>) {
        let surface = self.surface();
        out.clear();
        out.extend_from_slice(surface.pixels());

        if let Frame::Preview { overlay, .. } = self {
            let (w, h) = (surface.width() as i32, surface.height() as i32);
            for p in overlay.iter() {
                if (0..w).contains(&p.x()) && (0..h).contains(&p.y()) {
                    out[(p.y() * w + p.x()) as usize] = FOREGROUND;
                }
            }
        }
    }
}

/// Everything a drawing session mutates: the committed surface, the command log, and the state of
/// the current pointer gesture.
pub struct Session {
    surface: DrawingSurface,
    log: CommandLog,
    tool: Tool,
    gesture: Gesture,
    last_pointer: Option<Vec2i>,
    /// Pixels of the in-progress shape, empty when there is no preview.
    preview: Vec<Vec2i>,
}

impl Session {
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        Ok(Self {
            surface: DrawingSurface::new(width, height)?,
            log: CommandLog::new(),
            tool: Tool::default(),
            gesture: Gesture::Idle,
            last_pointer: None,
            preview: Vec::new(),
        })
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    /// Mutable access for the sync client, which reads pending commands and marks them sent.
    pub fn log_mut(&mut self) -> &mut CommandLog {
        &mut self.log
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn last_pointer(&self) -> Option<Vec2i> {
        self.last_pointer
    }

    /// Activates `tool`, or returns to [`Tool::Free`] if it is already active.
    ///
    /// Returns whether `tool` is active afterwards.
    pub fn toggle_tool(&mut self, tool: Tool) -> bool {
        self.tool = if self.tool == tool { Tool::Free } else { tool };
        self.preview.clear();
        log::debug!("tool: {:?}", self.tool);
        self.tool == tool
    }

    pub fn apply(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::Clear => self.clear(),
            Cmd::ToggleTool { tool } => {
                self.toggle_tool(tool);
            }
            Cmd::PointerDown { position } => self.pointer_down(position),
            Cmd::PointerMove { position } => self.pointer_move(position),
            Cmd::PointerUp { position } => self.pointer_up(position),
        }
    }

    pub fn pointer_down(&mut self, pos: Vec2i) {
        self.last_pointer = Some(pos);
        if self.gesture == Gesture::Idle {
            self.gesture = Gesture::Dragging { anchor: pos };
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2i) {
        self.last_pointer = Some(pos);
        let Gesture::Dragging { anchor } = self.gesture else {
            return;
        };

        match self.tool {
            Tool::Free => {
                self.commit(DrawCommand::new(DrawKind::Free, anchor, pos));
                self.gesture = Gesture::Dragging { anchor: pos };
            }
            tool => {
                let cmd = DrawCommand::new(tool.kind(), anchor, pos);
                self.preview = cmd.pixels_within(self.surface.clip());
            }
        }
    }

    pub fn pointer_up(&mut self, pos: Vec2i) {
        self.last_pointer = Some(pos);
        let Gesture::Dragging { anchor } = self.gesture else {
            return;
        };
        self.gesture = Gesture::Idle;
        self.preview.clear();

        let tool = self.tool;
        if tool == Tool::Free {
            // Already committed while moving.
            return;
        }

        let cmd = DrawCommand::new(tool.kind(), anchor, pos);
        log::debug!("committing {cmd:?}");
        self.commit(cmd);
        if tool.is_one_shot() {
            self.tool = Tool::Free;
        }
    }

    fn commit(&mut self, cmd: DrawCommand) {
        self.paint(&cmd);
        self.log.append(cmd);
    }

    fn paint(&mut self, cmd: &DrawCommand) {
        let pixels = cmd.pixels_within(self.surface.clip());
        self.surface.commit(&pixels, FOREGROUND);
    }

    /// Applies a change received from a peer.
    ///
    /// Remote draws are painted but not recorded in the local log, so they won't be sent back out.
    /// A remote clear wipes the surface and the log like a local one.
    pub fn apply_remote(&mut self, remote: Remote) {
        match remote {
            Remote::Draw(cmd) => self.paint(&cmd),
            Remote::Clear => self.clear(),
        }
    }

    /// Clears the surface and drops every recorded command.
    pub fn clear(&mut self) {
        log::info!("clearing canvas ({} commands)", self.log.total_count());
        self.surface.clear_to_background();
        self.log.clear();
    }

    pub fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        self.surface.resize(width, height)
    }

    pub fn frame(&self) -> Frame<'_> {
        if self.is_dragging() && self.tool != Tool::Free {
            Frame::Preview {
                surface: &self.surface,
                overlay: &self.preview,
            }
        } else {
            Frame::Committed(&self.surface)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{math::vec2, raster, surface::BACKGROUND};

    use super::*;

    fn session() -> Session {
        Session::new(200, 200).unwrap()
    }

    fn drag(s: &mut Session, path: &[Vec2i]) {
        s.pointer_down(path[0]);
        for &p in &path[1..path.len() - 1] {
            s.pointer_move(p);
        }
        s.pointer_up(path[path.len() - 1]);
    }

    #[test]
    fn freehand_commits_every_move() {
        let mut s = session();
        s.pointer_down(vec2(10, 10));
        s.pointer_move(vec2(15, 10));
        s.pointer_move(vec2(15, 20));
        s.pointer_up(vec2(15, 20));

        assert_eq!(
            s.log().commands(),
            [
                DrawCommand::new(DrawKind::Free, vec2(10, 10), vec2(15, 10)),
                DrawCommand::new(DrawKind::Free, vec2(15, 10), vec2(15, 20)),
            ]
        );
        assert_eq!(s.surface().pixel(vec2(12, 10)), Some(FOREGROUND));
        assert_eq!(s.surface().pixel(vec2(15, 17)), Some(FOREGROUND));
        assert_eq!(s.tool(), Tool::Free);
    }

    #[test]
    fn moves_without_press_do_nothing() {
        let mut s = session();
        s.pointer_move(vec2(1, 1));
        s.pointer_move(vec2(50, 50));
        s.pointer_up(vec2(50, 50));
        assert_eq!(s.log().total_count(), 0);
        assert_eq!(s.last_pointer(), Some(vec2(50, 50)));
    }

    #[test]
    fn circle_gesture() {
        let mut s = session();
        assert!(s.toggle_tool(Tool::Circle));
        s.pointer_down(vec2(100, 100));
        s.pointer_up(vec2(103, 104));

        assert_eq!(
            s.log().commands(),
            [DrawCommand::new(DrawKind::Circle, vec2(100, 100), vec2(103, 104))]
        );
        assert_eq!(s.surface().pixel(vec2(105, 100)), Some(FOREGROUND));
        assert_eq!(s.surface().pixel(vec2(100, 95)), Some(FOREGROUND));
        assert_eq!(s.surface().pixel(vec2(100, 100)), Some(BACKGROUND));
        assert_eq!(s.tool(), Tool::Free);
    }

    #[test]
    fn square_gesture_keeps_tool() {
        let mut s = session();
        s.toggle_tool(Tool::Square);
        s.pointer_down(vec2(10, 10));
        s.pointer_up(vec2(30, 5));

        let cmd = DrawCommand::new(DrawKind::Rect, vec2(10, 10), vec2(30, 5));
        assert_eq!(s.log().commands(), [cmd]);
        assert_eq!(raster::square_corner(cmd.start, cmd.end), vec2(30, -10));
        // Top edge is on screen, the rest is above it.
        assert_eq!(s.surface().pixel(vec2(20, 10)), Some(FOREGROUND));
        assert_eq!(s.surface().pixel(vec2(30, 0)), Some(FOREGROUND));
        assert_eq!(s.tool(), Tool::Square);

        // Still active for the next gesture.
        drag(&mut s, &[vec2(50, 50), vec2(60, 60)]);
        assert_eq!(s.log().total_count(), 2);
        assert_eq!(s.tool(), Tool::Square);
    }

    #[test]
    fn line_gesture_previews_then_commits() {
        let mut s = session();
        s.toggle_tool(Tool::Line);
        s.pointer_down(vec2(0, 0));
        s.pointer_move(vec2(50, 10));
        s.pointer_move(vec2(40, 40));

        assert_eq!(s.log().total_count(), 0);
        assert_eq!(s.surface().pixel(vec2(20, 20)), Some(BACKGROUND));
        match s.frame() {
            Frame::Preview { overlay, .. } => {
                assert_eq!(overlay, raster::line(vec2(0, 0), vec2(40, 40)));
            }
            Frame::Committed(_) => panic!("expected preview frame"),
        }

        s.pointer_up(vec2(40, 40));
        assert_eq!(
            s.log().commands(),
            [DrawCommand::new(DrawKind::Line, vec2(0, 0), vec2(40, 40))]
        );
        assert_eq!(s.surface().pixel(vec2(20, 20)), Some(FOREGROUND));
        assert_eq!(s.tool(), Tool::Free);
        assert!(matches!(s.frame(), Frame::Committed(_)));
    }

    #[test]
    fn preview_matches_commit() {
        for tool in [Tool::Line, Tool::Circle, Tool::Square] {
            let mut s = session();
            s.toggle_tool(tool);
            s.pointer_down(vec2(60, 70));
            s.pointer_move(vec2(90, 55));

            let mut previewed = Vec::new();
            s.frame().compose(&mut previewed);

            s.pointer_up(vec2(90, 55));
            assert_eq!(previewed, s.surface().pixels(), "{tool:?}");
        }
    }

    #[test]
    fn tools_are_exclusive() {
        let mut s = session();
        assert!(s.toggle_tool(Tool::Line));
        assert!(s.toggle_tool(Tool::Circle));
        assert_eq!(s.tool(), Tool::Circle);
        assert!(s.toggle_tool(Tool::Square));
        assert_eq!(s.tool(), Tool::Square);
        assert!(!s.toggle_tool(Tool::Square));
        assert_eq!(s.tool(), Tool::Free);
    }

    #[test]
    fn surface_matches_log_replay() {
        let mut s = session();
        drag(&mut s, &[vec2(5, 5), vec2(40, 9), vec2(70, 80), vec2(70, 80)]);
        s.toggle_tool(Tool::Circle);
        drag(&mut s, &[vec2(100, 100), vec2(120, 100)]);
        s.toggle_tool(Tool::Square);
        drag(&mut s, &[vec2(150, 150), vec2(130, 190)]);
        s.toggle_tool(Tool::Line);
        drag(&mut s, &[vec2(-20, 199), vec2(250, 0)]);

        let mut replay = Session::new(200, 200).unwrap();
        for cmd in s.log().commands() {
            replay.apply_remote(Remote::Draw(*cmd));
        }
        assert_eq!(replay.log().total_count(), 0);
        assert_eq!(replay.surface().pixels(), s.surface().pixels());
    }

    #[test]
    fn applies_cmds() {
        let mut s = session();
        for cmd in [
            Cmd::ToggleTool { tool: Tool::Line },
            Cmd::PointerDown { position: vec2(1, 1) },
            Cmd::PointerMove { position: vec2(5, 5) },
            Cmd::PointerUp { position: vec2(9, 9) },
        ] {
            s.apply(cmd);
        }
        assert_eq!(
            s.log().commands(),
            [DrawCommand::new(DrawKind::Line, vec2(1, 1), vec2(9, 9))]
        );

        s.apply(Cmd::Clear);
        assert_eq!(s.log().total_count(), 0);
    }

    #[test]
    fn clear_resets_surface_and_log() {
        let mut s = session();
        drag(&mut s, &[vec2(0, 0), vec2(10, 10), vec2(10, 10)]);
        s.log_mut().mark_sent();
        drag(&mut s, &[vec2(0, 5), vec2(10, 5), vec2(10, 5)]);
        assert_eq!(s.log().pending_count(), 1);

        s.clear();
        assert_eq!(s.log().total_count(), 0);
        assert_eq!(s.log().pending_count(), 0);
        assert!(s.surface().pixels().iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn remote_draw_is_painted_not_logged() {
        let mut s = session();
        drag(&mut s, &[vec2(0, 0), vec2(5, 0), vec2(5, 0)]);
        s.apply_remote(Remote::Draw(DrawCommand::new(
            DrawKind::Line,
            vec2(10, 50),
            vec2(90, 50),
        )));

        assert_eq!(s.surface().pixel(vec2(50, 50)), Some(FOREGROUND));
        assert_eq!(
            s.log().commands(),
            [DrawCommand::new(DrawKind::Free, vec2(0, 0), vec2(5, 0))]
        );
    }

    #[test]
    fn remote_clear_resets_surface_and_log() {
        let mut s = session();
        drag(&mut s, &[vec2(0, 0), vec2(10, 10), vec2(10, 10)]);
        s.apply_remote(Remote::Draw(DrawCommand::new(
            DrawKind::Free,
            vec2(20, 20),
            vec2(30, 20),
        )));

        s.apply_remote(Remote::Clear);
        assert_eq!(s.log().total_count(), 0);
        assert!(s.surface().pixels().iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn extreme_coordinates_are_clipped() {
        let mut s = session();
        let (min, max) = (vec2(i32::MIN, i32::MIN), vec2(i32::MAX, i32::MAX));
        for cmd in [
            DrawCommand::new(DrawKind::Circle, vec2(i32::MAX, 0), vec2(i32::MAX, 1)),
            DrawCommand::new(DrawKind::Circle, min, max),
            DrawCommand::new(DrawKind::Rect, vec2(0, 0), vec2(i32::MIN, 0)),
            DrawCommand::new(DrawKind::Line, vec2(-2_000_000_000, 3), vec2(2_000_000_000, 3)),
        ] {
            s.apply_remote(Remote::Draw(cmd));
        }
        assert_eq!(s.log().total_count(), 0);
        assert_eq!(s.surface().pixel(vec2(199, 3)), Some(FOREGROUND));
        assert_eq!(s.surface().pixel(vec2(0, 150)), Some(FOREGROUND));

        // Same through a local gesture, which is logged unclipped.
        s.toggle_tool(Tool::Square);
        s.pointer_down(vec2(0, 0));
        s.pointer_move(vec2(i32::MIN, 0));
        assert!(matches!(s.frame(), Frame::Preview { overlay, .. } if overlay.len() == 201));
        s.pointer_up(vec2(i32::MIN, 0));
        assert_eq!(
            s.log().commands(),
            [DrawCommand::new(DrawKind::Rect, vec2(0, 0), vec2(i32::MIN, 0))]
        );
    }
}
