//! GameView: maps a [`GameSnapshot`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{template, GameSnapshot};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Blink period for rows waiting to be cleared
pub const FLASH_PERIOD_MS: u64 = 100;

const PLAYFIELD_BG: Rgb = Rgb::new(30, 30, 40);

/// Color key for a piece id.
pub fn piece_color(kind: PieceKind) -> Rgb {
    match kind {
        PieceKind::I => Rgb::new(80, 220, 220),
        PieceKind::J => Rgb::new(80, 120, 220),
        PieceKind::L => Rgb::new(255, 165, 0),
        PieceKind::O => Rgb::new(240, 220, 80),
        PieceKind::S => Rgb::new(100, 220, 120),
        PieceKind::T => Rgb::new(200, 120, 220),
        PieceKind::Z => Rgb::new(220, 80, 80),
    }
}

/// A lightweight terminal renderer for the game.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

/// Screen position of the bordered playfield.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

impl GameView {
    /// Render into an existing framebuffer, resizing it to the viewport.
    ///
    /// `now_ms` only drives the flashing of rows that are mid-clear.
    pub fn render_into(
        &self,
        snap: &GameSnapshot,
        viewport: Viewport,
        now_ms: u64,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let board_w = BOARD_WIDTH as u16 * self.cell_w;
        let board_h = BOARD_HEIGHT as u16 * self.cell_h;
        let frame = Frame {
            x: viewport.width.saturating_sub(board_w + 2) / 2,
            y: viewport.height.saturating_sub(board_h + 2) / 2,
            w: board_w + 2,
            h: board_h + 2,
        };

        fb.fill_rect(
            frame.x + 1,
            frame.y + 1,
            board_w,
            board_h,
            ' ',
            CellStyle::new(Rgb::new(80, 80, 90), PLAYFIELD_BG),
        );
        draw_border(fb, frame, CellStyle::new(Rgb::new(200, 200, 200), Rgb::BLACK));

        let flash_on = (now_ms / FLASH_PERIOD_MS) % 2 == 0;
        for (y, row) in snap.board.iter().enumerate() {
            let clearing = snap.is_row_clearing(y);
            for (x, &value) in row.iter().enumerate() {
                let (x, y) = (x as u16, y as u16);
                match PieceKind::from_id(value) {
                    Some(_) if clearing && flash_on => {
                        let style = CellStyle::new(Rgb::WHITE, PLAYFIELD_BG).bold();
                        self.fill_cell(fb, frame, x, y, '█', style);
                    }
                    Some(kind) => {
                        let style = CellStyle::new(piece_color(kind), PLAYFIELD_BG).bold();
                        self.fill_cell(fb, frame, x, y, '█', style);
                    }
                    None => {
                        let style = CellStyle::new(Rgb::new(90, 90, 100), PLAYFIELD_BG).dim();
                        self.fill_cell(fb, frame, x, y, '·', style);
                    }
                }
            }
        }

        self.draw_side_panel(fb, snap, viewport, frame);

        if snap.game_over() {
            draw_overlay(fb, frame, &["GAME OVER", "ENTER TO RESTART"]);
        } else if snap.paused {
            draw_overlay(fb, frame, &["PAUSED"]);
        } else if !snap.running() {
            draw_overlay(fb, frame, &["PRESS ENTER"]);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport, now_ms: u64) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, now_ms, &mut fb);
        fb
    }

    fn fill_cell(&self, fb: &mut FrameBuffer, frame: Frame, x: u16, y: u16, ch: char, style: CellStyle) {
        let px = frame.x + 1 + x * self.cell_w;
        let py = frame.y + 1 + y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, viewport: Viewport, frame: Frame) {
        let panel_x = frame.x.saturating_add(frame.w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 10 {
            return;
        }

        let label = CellStyle::default().bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), Rgb::BLACK);

        let mut y = frame.y;
        for (name, n) in [("SCORE", snap.score), ("LEVEL", snap.level), ("LINES", snap.lines)] {
            fb.put_str(panel_x, y, name, label);
            fb.put_u32(panel_x, y + 1, n, value);
            y += 3;
        }

        fb.put_str(panel_x, y, "NEXT", label);
        y += 1;
        let Some(kind) = snap.next else {
            fb.put_str(panel_x, y, "-", value);
            return;
        };
        let style = CellStyle::new(piece_color(kind), Rgb::BLACK).bold();
        for (mx, my, _) in template(kind).minos() {
            let px = panel_x + mx as u16 * self.cell_w;
            let py = y + my as u16 * self.cell_h;
            fb.fill_rect(px, py, self.cell_w, self.cell_h, '█', style);
        }
    }
}

fn draw_border(fb: &mut FrameBuffer, frame: Frame, style: CellStyle) {
    let Frame { x, y, w, h } = frame;
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

/// Centered lines of text over the playfield.
fn draw_overlay(fb: &mut FrameBuffer, frame: Frame, lines: &[&str]) {
    let style = CellStyle::new(Rgb::WHITE, Rgb::BLACK).bold();
    let top = frame.y + frame.h / 2 - (lines.len() as u16) / 2;
    for (i, text) in lines.iter().enumerate() {
        let text_w = text.chars().count() as u16;
        let x = frame.x + frame.w.saturating_sub(text_w) / 2;
        fb.put_str(x, top + i as u16, text, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_text(fb: &FrameBuffer) -> String {
        (0..fb.height())
            .map(|y| fb.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn running() -> GameSnapshot {
        GameSnapshot {
            phase: crate::types::Phase::Running,
            level: 1,
            ..GameSnapshot::default()
        }
    }

    #[test]
    fn test_idle_shows_press_enter() {
        let fb = GameView::default().render(&GameSnapshot::default(), Viewport::new(60, 24), 0);
        assert!(screen_text(&fb).contains("PRESS ENTER"));
    }

    #[test]
    fn test_board_cells_use_piece_colors() {
        let mut snap = running();
        snap.board[19][0] = PieceKind::Z.id();
        let fb = GameView::default().render(&snap, Viewport::new(60, 24), 0);

        // 22x22 frame centered: x = (60 - 22) / 2 = 19, y = (24 - 22) / 2 = 1
        let cell = fb.get(20, 21).unwrap();
        assert_eq!(cell.ch, '█');
        assert_eq!(cell.style.fg, piece_color(PieceKind::Z));
        assert_eq!(fb.get(21, 21).unwrap().ch, '█');
        assert_eq!(fb.get(22, 21).unwrap().ch, '·');
    }

    #[test]
    fn test_clearing_rows_flash() {
        let mut snap = running();
        snap.board[19] = [PieceKind::T.id(); 10];
        snap.clearing_rows = 1 << 19;
        let view = GameView::default();

        let on = view.render(&snap, Viewport::new(60, 24), 0);
        let off = view.render(&snap, Viewport::new(60, 24), FLASH_PERIOD_MS);
        assert_eq!(on.get(20, 21).unwrap().style.fg, Rgb::WHITE);
        assert_eq!(off.get(20, 21).unwrap().style.fg, piece_color(PieceKind::T));
    }

    #[test]
    fn test_side_panel_and_next_preview() {
        let mut snap = running();
        snap.score = 1200;
        snap.next = Some(PieceKind::O);
        let fb = GameView::default().render(&snap, Viewport::new(60, 24), 0);
        let text = screen_text(&fb);

        assert!(text.contains("SCORE"));
        assert!(text.contains("1200"));
        assert!(text.contains("NEXT"));
        // Panel starts two columns right of the frame; preview sits below NEXT (y = 10)
        let panel_x = 19 + 22 + 2;
        assert_eq!(fb.get(panel_x, 11).unwrap().style.fg, piece_color(PieceKind::O));
    }

    #[test]
    fn test_overlays() {
        let view = GameView::default();
        let mut snap = running();
        snap.paused = true;
        assert!(screen_text(&view.render(&snap, Viewport::new(60, 24), 0)).contains("PAUSED"));

        snap.paused = false;
        snap.phase = crate::types::Phase::GameOver;
        assert!(screen_text(&view.render(&snap, Viewport::new(60, 24), 0)).contains("GAME OVER"));
    }

    #[test]
    fn test_tiny_viewport_does_not_panic() {
        let view = GameView::default();
        let fb = view.render(&running(), Viewport::new(5, 3), 0);
        assert_eq!((fb.width(), fb.height()), (5, 3));
    }
}
