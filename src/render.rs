use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
};

use crate::audio;
use crate::game::Game;
use crate::leaderboard::Session;

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    fn blend(self, over: Rgb, alpha: f64) -> Rgb {
        let t = (alpha.clamp(0.0, 1.0) * 256.0) as u16;
        Rgb::lerp(self, over, t)
    }
}

const SKY_TOP: Rgb = Rgb(0, 206, 209);
const SKY_MID: Rgb = Rgb(64, 224, 208);
const SKY_LOW: Rgb = Rgb(152, 251, 152);
const CLOUD: Rgb = Rgb(255, 255, 255);
const PIPE_LIGHT: Rgb = Rgb(50, 205, 50);
const PIPE_DARK: Rgb = Rgb(34, 139, 34);
const PIPE_EDGE: Rgb = Rgb(0, 100, 0);
const PIPE_CAP: Rgb = Rgb(144, 238, 144);
const GROUND_TOP: Rgb = Rgb(244, 208, 63);
const GROUND_BOT: Rgb = Rgb(243, 156, 18);
const GROUND_PATTERN: Rgb = Rgb(230, 126, 34);
const PARTICLE: Rgb = Rgb(255, 215, 0);
const SCORE_COLOR: Rgb = Rgb(255, 69, 0);
const BEST_COLOR: Rgb = Rgb(255, 140, 0);
const ADO_BODY: Rgb = Rgb(235, 84, 98);
const ADO_LIGHT: Rgb = Rgb(250, 130, 140);
const ADO_WING: Rgb = Rgb(190, 50, 65);
const ADO_EYE: Rgb = Rgb(255, 255, 255);
const ADO_PUPIL: Rgb = Rgb(20, 20, 20);
const ADO_BEAK: Rgb = Rgb(255, 200, 60);
const WHITE: Rgb = Rgb(255, 255, 255);
const INK: Rgb = Rgb(40, 40, 40);
const SHADOW: Rgb = Rgb(30, 30, 30);
const PANEL: Rgb = Rgb(250, 250, 245);
const PANEL_EDGE: Rgb = Rgb(120, 120, 120);
const ACCENT_BLUE: Rgb = Rgb(60, 120, 220);
const ACCENT_GREEN: Rgb = Rgb(60, 170, 90);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

/// One pixel per half terminal cell; a frame is flushed as U+2580 cells with
/// the top half in the foreground color and the bottom half in the
/// background color, skipping redundant SGR changes.
pub struct PixelBuf {
    pub w: usize,
    pub h: usize,
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.clear();
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            Some(self.px[y as usize * self.w + x as usize])
        } else {
            None
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, c: Rgb) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, c);
                }
            }
        }
    }

    /// Darken everything, used behind modal panels.
    pub fn dim(&mut self) {
        for p in &mut self.px {
            *p = Rgb(p.0 / 2, p.1 / 2, p.2 / 2);
        }
    }

    pub fn flush(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.px[row * 2 * self.w + col];
                let bot = self.px[(row * 2 + 1) * self.w + col];

                if top == bot {
                    if bg != Some(top) {
                        queue!(
                            out,
                            style::SetBackgroundColor(CColor::Rgb {
                                r: top.0,
                                g: top.1,
                                b: top.2
                            })
                        )?;
                        bg = Some(top);
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if fg != Some(top) {
                        queue!(
                            out,
                            style::SetForegroundColor(CColor::Rgb {
                                r: top.0,
                                g: top.1,
                                b: top.2
                            })
                        )?;
                        fg = Some(top);
                    }
                    if bg != Some(bot) {
                        queue!(
                            out,
                            style::SetBackgroundColor(CColor::Rgb {
                                r: bot.0,
                                g: bot.1,
                                b: bot.2
                            })
                        )?;
                        bg = Some(bot);
                    }
                    queue!(out, style::Print('\u{2580}'))?;
                }
            }
            if row < rows - 1 {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor, EndSynchronizedUpdate)?;
        out.flush()
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
const LETTERS: [[u8; 15]; 26] = [
    [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // A
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,1,0], // B
    [0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1], // C
    [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0], // D
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1], // E
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0], // F
    [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1], // G
    [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // H
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1], // I
    [0,0,1, 0,0,1, 0,0,1, 1,0,1, 0,1,0], // J
    [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // K
    [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1], // L
    [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1], // M
    [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1], // N
    [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0], // O
    [1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0], // P
    [0,1,0, 1,0,1, 1,0,1, 1,1,0, 0,1,1], // Q
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // R
    [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0], // S
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0], // T
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // U
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0], // V
    [1,0,1, 1,0,1, 1,1,1, 1,1,1, 1,0,1], // W
    [1,0,1, 1,0,1, 0,1,0, 1,0,1, 1,0,1], // X
    [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0], // Y
    [1,1,1, 0,0,1, 0,1,0, 1,0,0, 1,1,1], // Z
];

fn glyph_for(ch: char) -> Option<&'static [u8; 15]> {
    match ch {
        '0'..='9' => Some(&DIGITS[(ch as u8 - b'0') as usize]),
        'A'..='Z' => Some(&LETTERS[(ch as u8 - b'A') as usize]),
        _ => None,
    }
}

fn draw_glyph(buf: &mut PixelBuf, x: i32, y: i32, glyph: &[u8; 15], c: Rgb, scale: i32, shadow: bool) {
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32 * scale;
                let py = y + row as i32 * scale;
                if shadow {
                    buf.fill_rect(px + scale.max(1) / 2 + 1, py + scale.max(1) / 2 + 1, scale, scale, SHADOW);
                }
                buf.fill_rect(px, py, scale, scale, c);
            }
        }
    }
}

/// Pixel width of `text` at `scale` (3px glyphs + 1px gaps, scaled).
pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * 4 * scale - scale
}

/// Uppercase bitmap text. Unknown characters render as a mid-line dash so
/// punctuation stays legible without a full font.
pub fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, c: Rgb, scale: i32, shadow: bool) {
    for (i, ch) in text.chars().enumerate() {
        let gx = x + i as i32 * 4 * scale;
        let up = ch.to_ascii_uppercase();
        if up == ' ' {
            continue;
        }
        match glyph_for(up) {
            Some(glyph) => draw_glyph(buf, gx, y, glyph, c, scale, shadow),
            None => match up {
                '.' | ',' => buf.fill_rect(gx + scale, y + 4 * scale, scale, scale, c),
                ':' => {
                    buf.fill_rect(gx + scale, y + scale, scale, scale, c);
                    buf.fill_rect(gx + scale, y + 3 * scale, scale, scale, c);
                }
                _ => buf.fill_rect(gx, y + 2 * scale, 3 * scale, scale, c),
            },
        }
    }
}

pub fn draw_text_centered(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, c: Rgb, scale: i32, shadow: bool) {
    draw_text(buf, cx - text_width(text, scale) / 2, y, text, c, scale, shadow);
}

// ── Frame composition ───────────────────────────────────────────────────────

/// What the modal layer should show this frame.
pub enum Overlay<'a> {
    Start,
    Playing,
    GameOver { submitting: bool },
    NameEntry { input: &'a str },
}

/// Everything the renderer needs beyond the engine itself. Render never
/// mutates any of it.
pub struct FrameInput<'a> {
    pub game: &'a Game,
    pub session: &'a Session,
    pub overlay: Overlay<'a>,
    pub show_dashboard: bool,
    pub click_speed: f64,
    pub music_playing: bool,
}

struct Proj {
    sx: f64,
    sy: f64,
}

impl Proj {
    fn x(&self, vx: f64) -> i32 {
        (vx * self.sx) as i32
    }

    fn y(&self, vy: f64) -> i32 {
        (vy * self.sy) as i32
    }

    fn w(&self, vw: f64) -> i32 {
        ((vw * self.sx) as i32).max(1)
    }

    fn h(&self, vh: f64) -> i32 {
        ((vh * self.sy) as i32).max(1)
    }
}

/// Pure scene projection: simulation coordinates in, pixels out.
pub fn draw(frame: &FrameInput, buf: &mut PixelBuf) {
    let game = frame.game;
    let p = Proj {
        sx: buf.w as f64 / game.config.playfield_w,
        sy: buf.h as f64 / game.config.playfield_h,
    };

    draw_sky(game, &p, buf);
    draw_clouds(game, &p, buf);
    draw_pipes(game, &p, buf);
    draw_ground(game, &p, buf);
    draw_particles(game, &p, buf);
    draw_player(game, &p, buf);
    draw_scores(frame, buf);

    if frame.show_dashboard {
        draw_dashboard(frame, buf);
    }

    match frame.overlay {
        Overlay::Playing => {}
        Overlay::Start => draw_start(frame, buf),
        Overlay::GameOver { submitting } => draw_game_over(frame, submitting, buf),
        Overlay::NameEntry { input } => draw_name_entry(frame, input, buf),
    }
}

fn draw_sky(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    let horizon = p.y(game.config.ground_y());
    for y in 0..buf.h as i32 {
        let t = y as f64 / buf.h.max(1) as f64;
        // Gradient stops at 0.0 / 0.7 / 1.0 as in the original backdrop.
        let c = if t < 0.7 {
            Rgb::lerp(SKY_TOP, SKY_MID, (t / 0.7 * 256.0) as u16)
        } else {
            Rgb::lerp(SKY_MID, SKY_LOW, ((t - 0.7) / 0.3 * 256.0) as u16)
        };
        if y > horizon {
            break;
        }
        for x in 0..buf.w as i32 {
            buf.set(x, y, c);
        }
    }
}

fn draw_clouds(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    for i in 0..5 {
        let span = game.config.playfield_w + 100.0;
        let vx = (i as f64 * 200.0 + game.ground_offset * 0.3) % span;
        let vy = 50.0 + (i as f64 * 0.7).sin() * 20.0;
        let cx = p.x(vx);
        let cy = p.y(vy);
        buf.fill_circle(cx, cy, p.h(30.0), CLOUD);
        buf.fill_circle(cx + p.w(25.0), cy, p.h(25.0), CLOUD);
        buf.fill_circle(cx + p.w(50.0), cy, p.h(20.0), CLOUD);
    }
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_LIGHT;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    Rgb::lerp(PIPE_LIGHT, PIPE_DARK, t.min(256))
}

fn draw_pipes(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    let cap_v = 25.0;
    let lip_v = 8.0;
    for pipe in &game.pipes {
        let x = p.x(pipe.x);
        let y = p.y(pipe.y);
        let w = p.w(pipe.width);
        let h = p.h(pipe.height);

        for dx in 0..w {
            let c = pipe_shade(dx, w);
            for dy in 0..h {
                buf.set(x + dx, y + dy, c);
            }
        }
        // Outline
        for dy in 0..h {
            buf.set(x, y + dy, PIPE_EDGE);
            buf.set(x + w - 1, y + dy, PIPE_EDGE);
        }

        // Cap sits at the gap-facing end: bottom of a top pipe, top of a
        // bottom pipe.
        let cap_h = p.h(cap_v);
        let lip = p.w(lip_v);
        let cap_y = if pipe.y == 0.0 { y + h - cap_h } else { y };
        buf.fill_rect(x - lip, cap_y, w + lip * 2, cap_h, PIPE_CAP);
        for dx in -lip..(w + lip) {
            buf.set(x + dx, cap_y, PIPE_EDGE);
            buf.set(x + dx, cap_y + cap_h - 1, PIPE_EDGE);
        }
        // Highlight line inside the cap
        buf.fill_rect(x - lip + 1, cap_y + 1, w + lip * 2 - 2, 1, WHITE);
    }
}

fn draw_ground(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    let gy = p.y(game.config.ground_y());
    let gh = buf.h as i32 - gy;
    for dy in 0..gh {
        let t = (dy as f64 / gh.max(1) as f64 * 256.0) as u16;
        let c = Rgb::lerp(GROUND_TOP, GROUND_BOT, t);
        for x in 0..buf.w as i32 {
            buf.set(x, gy + dy, c);
        }
    }
    // Scrolling hill pattern along the ground line
    let mut vx = 0.0;
    while vx < game.config.playfield_w {
        let height = 15.0 + (vx * 0.06 + game.ground_offset * 0.03).sin() * 8.0;
        let ph = p.h(height);
        buf.fill_rect(p.x(vx), gy - ph, p.w(35.0), ph, GROUND_PATTERN);
        vx += 40.0;
    }
}

fn draw_particles(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    for part in &game.particles {
        let cx = p.x(part.x);
        let cy = p.y(part.y);
        let r = p.h(3.0).max(1);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    if let Some(under) = buf.get(cx + dx, cy + dy) {
                        buf.set(cx + dx, cy + dy, under.blend(PARTICLE, part.life));
                    }
                }
            }
        }
    }
}

fn draw_player(game: &Game, p: &Proj, buf: &mut PixelBuf) {
    let size = game.config.player_size;
    let cx = p.x(game.player.x + size / 2.0);
    let cy = p.y(game.player.y + size / 2.0);
    let bw = (p.w(size) / 2 - 1).max(2);
    let bh = (p.h(size) / 2 - 1).max(2);

    // Tilt rendered as a pixel shear of nose and tail.
    let tilt = ((game.player.rotation / 90.0) * bh as f64).round() as i32;

    // Body
    buf.fill_rect(cx - bw, cy - bh, bw * 2 + 1, bh * 2, ADO_BODY);
    buf.fill_rect(cx - bw + 1, cy - bh, bw * 2 - 2, (bh / 3).max(1), ADO_LIGHT);

    // Wing, two-frame flutter keyed off the scroll phase
    let flutter = if ((game.ground_offset / game.config.pipe_speed) as i32) % 8 < 4 {
        -1
    } else {
        1
    };
    buf.fill_rect(
        cx - bw + 1,
        cy + flutter,
        bw.max(1),
        (bh * 2 / 3).max(1),
        ADO_WING,
    );

    // Tail
    buf.fill_rect(cx - bw - (bw / 2).max(1), cy - 1 - tilt / 2, (bw / 2).max(1), 2, ADO_WING);

    // Eye
    let ex = cx + bw - (bw / 2).max(1);
    let ey = cy - bh + (bh / 2).max(1) + tilt / 3;
    buf.fill_rect(ex, ey, 2, 2, ADO_EYE);
    buf.set(ex + 1, ey + 1, ADO_PUPIL);

    // Beak follows the tilt
    buf.fill_rect(cx + bw, cy - 1 + tilt / 2, (bw / 2).max(2), 2, ADO_BEAK);
}

fn draw_scores(frame: &FrameInput, buf: &mut PixelBuf) {
    let state = &frame.game.state;
    let cx = buf.w as i32 / 2;
    draw_text_centered(
        buf,
        cx,
        3,
        &state.display_score().to_string(),
        SCORE_COLOR,
        2,
        true,
    );
    let best = if frame.session.scores_loaded {
        format!("BEST {}", state.display_high_score())
    } else {
        "BEST ...".to_string()
    };
    draw_text_centered(buf, cx, 15, &best, BEST_COLOR, 1, true);
}

fn draw_dashboard(frame: &FrameInput, buf: &mut PixelBuf) {
    let session = frame.session;
    let x = 2;
    let mut y = 2;
    let mut line = |buf: &mut PixelBuf, text: String, c: Rgb, y: &mut i32| {
        draw_text(buf, x, *y, &text, c, 1, true);
        *y += 7;
    };

    let global = if session.scores_loaded {
        crate::game::GameState::display(session.global_best()).to_string()
    } else {
        "...".to_string()
    };
    line(buf, format!("GLOBAL {global}"), ACCENT_GREEN, &mut y);
    if session.has_played_before && session.personal_best > 0 {
        line(
            buf,
            format!(
                "YOURS {}",
                crate::game::GameState::display(session.personal_best)
            ),
            ACCENT_BLUE,
            &mut y,
        );
        let rank = session.player_rank();
        if rank > 0 {
            line(buf, format!("RANK {rank}"), ACCENT_BLUE, &mut y);
        }
    }
    line(
        buf,
        format!("CPS {:.1}", frame.click_speed),
        BEST_COLOR,
        &mut y,
    );
    if frame.music_playing {
        line(
            buf,
            format!("MUSIC {}", audio::band_label(frame.click_speed)),
            WHITE,
            &mut y,
        );
    }
}

fn panel(buf: &mut PixelBuf, w: i32, h: i32) -> (i32, i32) {
    let x = (buf.w as i32 - w) / 2;
    let y = (buf.h as i32 - h) / 2;
    buf.fill_rect(x - 1, y - 1, w + 2, h + 2, PANEL_EDGE);
    buf.fill_rect(x, y, w, h, PANEL);
    (x, y)
}

fn draw_start(frame: &FrameInput, buf: &mut PixelBuf) {
    let cx = buf.w as i32 / 2;
    let cy = buf.h as i32 / 4;
    draw_text_centered(buf, cx, cy, "FLAPPY ADO", SCORE_COLOR, 3, true);
    draw_text_centered(buf, cx, cy + 22, "SPACE OR CLICK TO FLAP", WHITE, 1, true);
    draw_text_centered(
        buf,
        cx,
        cy + 31,
        "MUSIC PITCH FOLLOWS YOUR CLICK SPEED",
        WHITE,
        1,
        true,
    );
    if !frame.session.top_scores.is_empty() {
        draw_top_list(frame, cx, cy + 44, 5, buf);
    }
}

fn draw_top_list(frame: &FrameInput, cx: i32, y0: i32, max_rows: usize, buf: &mut PixelBuf) {
    let session = frame.session;
    let mut y = y0;
    draw_text_centered(buf, cx, y, "TOP SCORES", INK, 1, true);
    y += 8;
    for (i, rec) in session.top_scores.iter().take(max_rows).enumerate() {
        let mut name: String = rec.name.chars().take(8).collect();
        if session.has_played_before && !rec.user_ip.is_empty() && rec.user_ip == session.user_ip {
            name.push('*');
        }
        let row = format!(
            "{} {} {}",
            i + 1,
            name,
            crate::game::GameState::display(rec.score)
        );
        draw_text_centered(buf, cx, y, &row, ACCENT_BLUE, 1, false);
        y += 7;
    }
}

fn draw_game_over(frame: &FrameInput, submitting: bool, buf: &mut PixelBuf) {
    buf.dim();
    let rows = 5.min(frame.session.top_scores.len()) as i32;
    let h = 46 + 8 + rows * 7 + 10;
    let (x, y) = panel(buf, (buf.w as i32 * 3 / 4).min(180), h);
    let cx = x + (buf.w as i32 * 3 / 4).min(180) / 2;

    draw_text_centered(buf, cx, y + 4, "GAME OVER", SCORE_COLOR, 2, false);
    let state = &frame.game.state;
    draw_text_centered(
        buf,
        cx,
        y + 18,
        &format!("SCORE {}", state.display_score()),
        INK,
        1,
        false,
    );
    draw_text_centered(
        buf,
        cx,
        y + 26,
        &format!("GLOBAL BEST {}", state.display_high_score()),
        INK,
        1,
        false,
    );
    let session = frame.session;
    if session.has_played_before && session.personal_best > 0 {
        draw_text_centered(
            buf,
            cx,
            y + 34,
            &format!(
                "YOUR BEST {}",
                crate::game::GameState::display(session.personal_best)
            ),
            ACCENT_BLUE,
            1,
            false,
        );
    }
    if !session.top_scores.is_empty() {
        draw_top_list(frame, cx, y + 44, 5, buf);
    }
    let footer = if submitting {
        "SAVING SCORE...".to_string()
    } else {
        "SPACE PLAY AGAIN  Q QUIT".to_string()
    };
    draw_text_centered(buf, cx, y + h - 9, &footer, PANEL_EDGE, 1, false);
}

fn draw_name_entry(frame: &FrameInput, input: &str, buf: &mut PixelBuf) {
    buf.dim();
    let w = (buf.w as i32 * 3 / 4).min(170);
    let (x, y) = panel(buf, w, 52);
    let cx = x + w / 2;

    draw_text_centered(buf, cx, y + 4, "NEW PLAYER", ACCENT_BLUE, 2, false);
    draw_text_centered(
        buf,
        cx,
        y + 18,
        &format!("SCORE {}", frame.game.state.display_score()),
        INK,
        1,
        false,
    );
    draw_text_centered(buf, cx, y + 26, "TYPE A NAME TO SAVE IT", INK, 1, false);

    let shown = format!("{input}_");
    draw_text_centered(buf, cx, y + 34, &shown, SCORE_COLOR, 1, false);
    draw_text_centered(buf, cx, y + 43, "ENTER SAVE  ESC SKIP", PANEL_EDGE, 1, false);
}

// ── Tests ───────────────────────────────────────────────────────────────────
