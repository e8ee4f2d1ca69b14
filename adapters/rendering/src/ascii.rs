//! Terminal backend that drives scenes without a window.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use meat_harvest_core::TileKind;

use crate::{FrameInput, Presentation, RenderingBackend, Scene};

/// Draws `scene` as one character per tile.
///
/// Plants show their stage digit, or `*` while infested. The barn is `B`,
/// impassable tiles are `#` and spores are `o`. The harvester is drawn as an
/// arrow pointing where it faces.
#[must_use]
pub fn render_ascii(scene: &Scene) -> String {
    let grid = scene.tile_grid;
    let columns = usize::try_from(grid.columns).unwrap_or(0);
    let rows = usize::try_from(grid.rows).unwrap_or(0);
    let mut canvas = vec![vec!['.'; columns]; rows];

    let mut put = |column: u32, row: u32, glyph: char| {
        let cell = usize::try_from(row)
            .ok()
            .and_then(|row| canvas.get_mut(row))
            .and_then(|line| {
                usize::try_from(column)
                    .ok()
                    .and_then(|column| line.get_mut(column))
            });
        if let Some(cell) = cell {
            *cell = glyph;
        }
    };

    for tile in &scene.tiles {
        put(tile.cell.column(), tile.cell.row(), tile_glyph(tile.kind));
    }
    for spore in &scene.spores {
        if let Some(cell) = grid.cell_at(spore.position) {
            put(cell.column(), cell.row(), 'o');
        }
    }
    if let Some(cell) = grid.cell_at(scene.harvester.position) {
        put(
            cell.column(),
            cell.row(),
            harvester_glyph(scene.harvester.angle_degrees),
        );
    }

    let mut out = String::with_capacity(rows * (columns + 1));
    for line in canvas {
        out.extend(line);
        out.push('\n');
    }
    out
}

fn harvester_glyph(angle_degrees: f32) -> char {
    const HEADINGS: [char; 4] = ['>', 'v', '<', '^'];
    let quarter = ((angle_degrees.rem_euclid(360.0) + 45.0) / 90.0).floor() as usize;
    HEADINGS[quarter % HEADINGS.len()]
}

fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Plant { infested: true, .. } => '*',
        TileKind::Plant { stage, .. } => u32::try_from(stage)
            .ok()
            .and_then(|stage| char::from_digit(stage.min(9), 10))
            .unwrap_or('9'),
        TileKind::Barn => 'B',
        TileKind::Impassable => '#',
    }
}

/// Backend that advances a fixed number of frames and reports to a writer.
#[derive(Debug)]
pub struct HeadlessBackend<W> {
    frames: u32,
    frame_time: Duration,
    show_final: bool,
    sink: W,
}

impl<W> HeadlessBackend<W>
where
    W: Write,
{
    /// Creates a backend that runs `frames` frames of `frame_time` each.
    #[must_use]
    pub const fn new(frames: u32, frame_time: Duration, sink: W) -> Self {
        Self {
            frames,
            frame_time,
            show_final: false,
            sink,
        }
    }

    /// Prints the final scene after the HUD when enabled.
    #[must_use]
    pub const fn with_final_scene(mut self, show_final: bool) -> Self {
        self.show_final = show_final;
        self
    }
}

impl<W> RenderingBackend for HeadlessBackend<W>
where
    W: Write,
{
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Presentation {
            window_title,
            mut scene,
        } = presentation;
        writeln!(self.sink, "{window_title}").context("failed to write title")?;

        let mut simulated = 0_u32;
        while simulated < self.frames && !scene.game_over {
            update_scene(self.frame_time, FrameInput::default(), &mut scene);
            simulated += 1;
        }

        writeln!(self.sink, "{simulated} frames simulated").context("failed to write summary")?;
        for line in &scene.hud_lines {
            writeln!(self.sink, "{line}").context("failed to write HUD")?;
        }
        if scene.game_over {
            writeln!(self.sink, "Game over").context("failed to write HUD")?;
        }
        if self.show_final {
            write!(self.sink, "{}", render_ascii(&scene)).context("failed to write scene")?;
        }
        self.sink.flush().context("failed to flush output")
    }
}
