//! The append-only log of committed draw commands, and the "sent" cursor a sync client uses to
//! find out what it hasn't shipped yet.

use anyhow::bail;

use crate::{
    math::Vec2i,
    raster::{self, segment_pixels_within, Clip},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Free,
    Line,
    Circle,
    Rect,
}

impl DrawKind {
    /// Integer tag used in the column export.
    pub fn code(self) -> i32 {
        match self {
            DrawKind::Free => 0,
            DrawKind::Line => 1,
            DrawKind::Circle => 2,
            DrawKind::Rect => 3,
        }
    }

    pub fn from_code(code: i32) -> anyhow::Result<Self> {
        Ok(match code {
            0 => DrawKind::Free,
            1 => DrawKind::Line,
            2 => DrawKind::Circle,
            3 => DrawKind::Rect,
            _ => bail!("invalid draw command kind {code}"),
        })
    }
}

/// One committed stroke or shape.
///
/// `start` is the gesture anchor and `end` the pointer position that completed it. For circles
/// that means center and a point on the rim, for rects the fixed corner and the drag position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub start: Vec2i,
    pub end: Vec2i,
    pub kind: DrawKind,
}

impl DrawCommand {
    pub fn new(kind: DrawKind, start: Vec2i, end: Vec2i) -> Self {
        Self { start, end, kind }
    }

    /// Rasterizes the part of this command inside `clip`. Painting the result reproduces the
    /// committed stroke exactly.
    pub fn pixels_within(&self, clip: Clip) -> Vec<Vec2i> {
        match self.kind {
            DrawKind::Free | DrawKind::Line => match raster::clip_line(self.start, self.end, clip) {
                Some((start, end)) => raster::line(start, end),
                None => Vec::new(),
            },
            DrawKind::Circle => {
                raster::circle_within(self.start, self.start.round_dist(self.end), clip)
            }
            DrawKind::Rect => segment_pixels_within(&raster::square(self.start, self.end), clip),
        }
    }
}

/// Ordered record of every command drawn in this session.
///
/// Invariant: `sent <= commands.len()`, and `sent` only grows until [`CommandLog::clear`].
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<DrawCommand>,
    sent: usize,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }

    pub fn total_count(&self) -> usize {
        self.commands.len()
    }

    pub fn pending_count(&self) -> usize {
        self.commands.len() - self.sent
    }

    /// Commands appended since the last [`CommandLog::mark_sent`].
    pub fn pending(&self) -> &[DrawCommand] {
        &self.commands[self.sent..]
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn mark_sent(&mut self) {
        self.sent = self.commands.len();
    }

    /// Hands the pending commands to `ship`, and marks them as sent if it succeeds.
    ///
    /// The read and the mark happen under the same `&mut` borrow, so nothing appended in between
    /// can be skipped. On error the commands stay pending and will be offered again.
    pub fn flush<F>(&mut self, ship: F) -> anyhow::Result<usize>
    where
        F: FnOnce(&[DrawCommand]) -> anyhow::Result<()>,
    {
        let pending = self.pending();
        if pending.is_empty() {
            return Ok(0);
        }
        let n = pending.len();
        ship(pending)?;
        self.mark_sent();
        Ok(n)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.sent = 0;
    }

    /// Exports the log as index-aligned integer columns.
    pub fn columns(&self) -> CommandColumns {
        CommandColumns::from_commands(&self.commands)
    }
}

/// Parallel-array form of a command sequence, for hosts that can't take structured records.
///
/// `kind` holds [`DrawKind::code`] values.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandColumns {
    pub start_x: Vec<i32>,
    pub start_y: Vec<i32>,
    pub end_x: Vec<i32>,
    pub end_y: Vec<i32>,
    pub kind: Vec<i32>,
}

impl CommandColumns {
    pub fn from_commands(commands: &[DrawCommand]) -> Self {
        let mut cols = Self::default();
        for cmd in commands {
            cols.start_x.push(cmd.start.x());
            cols.start_y.push(cmd.start.y());
            cols.end_x.push(cmd.end.x());
            cols.end_y.push(cmd.end.y());
            cols.kind.push(cmd.kind.code());
        }
        cols
    }

    pub fn len(&self) -> usize {
        self.kind.len()
    }

    /// Converts the columns back into commands.
    pub fn to_commands(&self) -> anyhow::Result<Vec<DrawCommand>> {
        let n = self.len();
        if [&self.start_x, &self.start_y, &self.end_x, &self.end_y]
            .iter()
            .any(|col| col.len() != n)
        {
            bail!("command columns are not index-aligned");
        }
        (0..n)
            .map(|i| {
                Ok(DrawCommand::new(
                    DrawKind::from_code(self.kind[i])?,
                    [self.start_x[i], self.start_y[i]].into(),
                    [self.end_x[i], self.end_y[i]].into(),
                ))
            })
            .collect()
    }
}
