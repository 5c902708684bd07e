//! # 文字绘制模块
//!
//! 文字以左上角为原点绘制在 `(x, y)`，超出画布的部分直接裁掉，不视为错误。
//! 多行文字按 `\n` 拆分，行距 = 字母 `A` 的下边界 + `ImageConfig::line_spacing`。

use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use rusttype::point;

use super::font::{BUILTIN_GLYPH_SIZE, FontHandle};

/// 在画布上绘制文字。
pub(crate) fn draw_text(
    canvas: &mut RgbImage,
    font: &FontHandle,
    text: &str,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    line_spacing: u32,
) {
    let advance = font.line_advance() as i64 + line_spacing as i64;

    for (index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let top = y as i64 + index as i64 * advance;

        match font {
            FontHandle::Scalable { font, scale, .. } => {
                draw_scalable_line(canvas, font, *scale, line, x as f32, top as f32, color)
            }
            FontHandle::BuiltIn => draw_builtin_line(canvas, line, x as i64, top, color),
        }
    }
}

fn draw_scalable_line(
    canvas: &mut RgbImage,
    font: &rusttype::Font<'static>,
    scale: rusttype::Scale,
    line: &str,
    x: f32,
    top: f32,
    color: Rgb<u8>,
) {
    let ascent = font.v_metrics(scale).ascent;

    for glyph in font.layout(line, scale, point(x, top + ascent)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = gx as i64 + bb.min.x as i64;
            let py = gy as i64 + bb.min.y as i64;
            blend_pixel(canvas, px, py, color, coverage);
        });
    }
}

fn draw_builtin_line(canvas: &mut RgbImage, line: &str, x: i64, top: i64, color: Rgb<u8>) {
    for (column, ch) in line.chars().enumerate() {
        let left = x + column as i64 * BUILTIN_GLYPH_SIZE as i64;
        let Some(rows) = builtin_glyph(ch) else {
            continue;
        };

        for (row, bits) in rows.iter().enumerate() {
            for bit in 0..BUILTIN_GLYPH_SIZE {
                if bits & (1 << bit) != 0 {
                    blend_pixel(canvas, left + bit as i64, top + row as i64, color, 1.0);
                }
            }
        }
    }
}

/// 内置字体的字形；未收录的可见字符画成 `?`，空白字符不画。
fn builtin_glyph(ch: char) -> Option<[u8; 8]> {
    if ch.is_whitespace() {
        return None;
    }

    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }

    let alpha = coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for (d, s) in dst.0.iter_mut().zip(color.0) {
        *d = (s as f32 * alpha + *d as f32 * (1.0 - alpha)).round() as u8;
    }
}
