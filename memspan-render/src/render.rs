use crate::screen::ScreenSpace;
use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use image::RgbaImage;
use image::imageops::FilterType;
use memspan_core::Rgba;
use memspan_experiment::{DrawCommand, Scene};
use memspan_timing::{FrameStats, HighPrecisionTimer, Timer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{
    Color, ColorU8, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};
use tracing::warn;

/// Fraction of the screen width text may use before wrapping
const WRAP_FRACTION: f32 = 0.8;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("frame buffer has {got} bytes, canvas needs {expected}")]
    FrameSize { expected: usize, got: usize },
    #[error("failed to read font {}: {source}", .path.display())]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a usable font", .path.display())]
    Font { path: PathBuf },
    #[error("failed to load image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Per-frame timings
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub commands: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    color: Rgba,
}

type ImageKey = (PathBuf, u32, u32);

fn to_color(c: Rgba) -> Color {
    let [r, g, b, a] = c.0;
    Color::from_rgba8(r, g, b, a)
}

fn paint(c: Rgba) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(to_color(c));
    p.anti_alias = true;
    p
}

fn pixmap_from_image(img: &RgbaImage) -> Option<Pixmap> {
    let mut pm = Pixmap::new(img.width(), img.height())?;
    for (dst, px) in pm.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = px.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pm)
}

/// Software renderer for [`Scene`] draw lists.
///
/// The canvas is kept opaque, so its premultiplied bytes can be copied
/// straight into an RGBA frame buffer.
pub struct SkiaRenderer {
    screen: ScreenSpace,
    canvas: Pixmap,
    font: Option<FontVec>,
    text_cache: HashMap<TextKey, Arc<Pixmap>>,
    sources: HashMap<PathBuf, Arc<RgbaImage>>,
    scaled: HashMap<ImageKey, Arc<Pixmap>>,
    missing: HashSet<PathBuf>,
    warned_no_font: bool,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self, RenderError> {
        let canvas = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
        Ok(Self {
            screen: ScreenSpace::new(width, height),
            canvas,
            font,
            text_cache: HashMap::new(),
            sources: HashMap::new(),
            scaled: HashMap::new(),
            missing: HashSet::new(),
            warned_no_font: false,
            timer: HighPrecisionTimer::new(),
        })
    }

    pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec, RenderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RenderError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        FontVec::try_from_vec(bytes).map_err(|_| RenderError::Font {
            path: path.to_path_buf(),
        })
    }

    pub fn screen(&self) -> ScreenSpace {
        self.screen
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.canvas = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
        self.screen = ScreenSpace::new(width, height);
        // wrap width depends on the screen
        self.text_cache.clear();
        Ok(())
    }

    /// Decodes an image up front so a bad path fails before the first trial.
    pub fn preload_image(&mut self, path: &Path) -> Result<(), RenderError> {
        if self.sources.contains_key(path) {
            return Ok(());
        }
        let img = image::open(path)
            .map_err(|source| RenderError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        self.sources.insert(path.to_path_buf(), Arc::new(img));
        Ok(())
    }

    /// Draws `scene` and copies the result into `frame` (RGBA8, canvas sized).
    pub fn render(&mut self, scene: &Scene, frame: &mut [u8]) -> Result<RenderStats, RenderError> {
        let expected = self.canvas.data().len();
        if frame.len() != expected {
            return Err(RenderError::FrameSize {
                expected,
                got: frame.len(),
            });
        }

        let t_draw = self.timer.now();
        let [r, g, b, _] = scene.background.0;
        self.canvas.fill(Color::from_rgba8(r, g, b, 255));
        for command in &scene.commands {
            self.draw(command);
        }
        let draw = self.timer.elapsed(t_draw);

        let t_copy = self.timer.now();
        frame.copy_from_slice(self.canvas.data());
        let copy = self.timer.elapsed(t_copy);

        let total = draw + copy;
        self.timer.record_frame(total);
        Ok(RenderStats {
            draw,
            copy,
            total,
            commands: scene.commands.len(),
        })
    }

    /// Distribution of per-frame render times so far
    pub fn frame_stats(&self) -> FrameStats {
        self.timer.frame_stats()
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Text {
                text,
                pos,
                size,
                color,
            } => self.draw_text(text, *pos, *size, *color),
            DrawCommand::Image { path, pos, size } => self.draw_image(path, *pos, *size),
            DrawCommand::Rect { pos, size, color } => {
                let (x, y) = self.screen.box_origin(*pos, *size);
                if let Some(rect) = Rect::from_xywh(x, y, size.0, size.1) {
                    self.canvas
                        .fill_rect(rect, &paint(*color), Transform::identity(), None);
                }
            }
            DrawCommand::Border {
                pos,
                size,
                width,
                color,
            } => {
                let (x, y) = self.screen.box_origin(*pos, *size);
                let Some(path) = Rect::from_xywh(x, y, size.0, size.1).map(PathBuilder::from_rect)
                else {
                    return;
                };
                let stroke = Stroke {
                    width: *width,
                    ..Stroke::default()
                };
                self.canvas.stroke_path(
                    &path,
                    &paint(*color),
                    &stroke,
                    Transform::identity(),
                    None,
                );
            }
        }
    }

    fn draw_text(&mut self, text: &str, pos: (f32, f32), size: f32, color: Rgba) {
        let Some(font) = &self.font else {
            if !self.warned_no_font {
                warn!("no font loaded, text is not drawn");
                self.warned_no_font = true;
            }
            return;
        };

        let key = TextKey {
            text: Atom::from(text),
            size_bits: size.to_bits(),
            color,
        };
        let pm = match self.text_cache.get(&key) {
            Some(pm) => Arc::clone(pm),
            None => {
                let max_width = self.screen.width as f32 * WRAP_FRACTION;
                let Some(pm) = render_text_pixmap(font, text, size, color, max_width) else {
                    return;
                };
                let pm = Arc::new(pm);
                self.text_cache.insert(key, Arc::clone(&pm));
                pm
            }
        };
        self.blit(&pm, pos);
    }

    fn draw_image(&mut self, path: &Path, pos: (f32, f32), size: (f32, f32)) {
        let w = size.0.round().max(1.0) as u32;
        let h = size.1.round().max(1.0) as u32;
        let key = (path.to_path_buf(), w, h);

        if !self.scaled.contains_key(&key) {
            if self.missing.contains(path) {
                return;
            }
            if let Err(e) = self.preload_image(path) {
                warn!("{e}");
                self.missing.insert(path.to_path_buf());
                return;
            }
            let Some(source) = self.sources.get(path) else {
                return;
            };
            let resized = image::imageops::resize(&**source, w, h, FilterType::Triangle);
            let Some(pm) = pixmap_from_image(&resized) else {
                return;
            };
            self.scaled.insert(key.clone(), Arc::new(pm));
        }

        if let Some(pm) = self.scaled.get(&key).cloned() {
            self.blit(&pm, pos);
        }
    }

    /// Composites `pm` centred on scene point `pos`
    fn blit(&mut self, pm: &Pixmap, pos: (f32, f32)) {
        let (x, y) = self
            .screen
            .box_origin(pos, (pm.width() as f32, pm.height() as f32));
        self.canvas.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
