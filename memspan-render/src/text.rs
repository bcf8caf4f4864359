use ab_glyph::{Font, FontVec, Glyph, GlyphId, PxScale, ScaleFont, point};
use memspan_core::Rgba;
use tiny_skia::{Pixmap, PremultipliedColorU8};

fn line_width(font: &FontVec, scale: PxScale, line: &str) -> f32 {
    let sf = font.as_scaled(scale);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = sf.glyph_id(ch);
        if let Some(prev) = prev {
            width += sf.kern(prev, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Greedy word wrap at `max_width` pixels. Explicit line breaks are kept;
/// a single word wider than the limit gets a line of its own.
pub fn wrap_lines(font: &FontVec, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let scale = PxScale::from(size);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if line_width(font, scale, &candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// Rasterizes `text` into a transparent premultiplied pixmap, every line
/// centred horizontally. `None` when there is nothing to draw.
pub fn render_text_pixmap(
    font: &FontVec,
    text: &str,
    size: f32,
    color: Rgba,
    max_width: f32,
) -> Option<Pixmap> {
    let scale = PxScale::from(size);
    let sf = font.as_scaled(scale);
    let lines = wrap_lines(font, size, text, max_width);
    if lines.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    let line_height = sf.height() + sf.line_gap();
    let widths: Vec<f32> = lines.iter().map(|l| line_width(font, scale, l)).collect();
    let block_width = widths.iter().copied().fold(0.0f32, f32::max);

    // baseline of line i at ascent + i * line_height
    let mut glyphs = Vec::<Glyph>::new();
    for (i, (line, width)) in lines.iter().zip(&widths).enumerate() {
        let baseline = sf.ascent() + i as f32 * line_height;
        let mut pen_x = (block_width - width) / 2.0;
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = sf.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += sf.kern(prev, id);
            }
            glyphs.push(Glyph {
                id,
                scale,
                position: point(pen_x, baseline),
            });
            pen_x += sf.h_advance(id);
            prev = Some(id);
        }
    }

    let w = block_width.ceil().max(1.0) as u32;
    let h = (line_height * lines.len() as f32).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let stride = w as usize;
    let dst = pm.pixels_mut();
    let [cr, cg, cb, ca] = color.0;

    for g in glyphs {
        let Some(outline) = font.outline_glyph(g) else {
            continue;
        };
        let bounds = outline.px_bounds();
        outline.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + bounds.min.x).floor() as i32;
            let iy = (y as f32 + bounds.min.y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // source premultiplied by coverage * alpha, then src-over
            let a = (cov * ca as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let sr = (cr as f32 * a) as u8;
            let sg = (cg as f32 * a) as u8;
            let sb = (cb as f32 * a) as u8;

            let bg = dst[i];
            let inv = 1.0 - sa as f32 / 255.0;
            let blended = PremultipliedColorU8::from_rgba(
                sr.saturating_add((bg.red() as f32 * inv) as u8),
                sg.saturating_add((bg.green() as f32 * inv) as u8),
                sb.saturating_add((bg.blue() as f32 * inv) as u8),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}
