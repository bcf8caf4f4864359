pub mod render;
pub mod screen;
pub mod text;

pub use render::{RenderError, RenderStats, SkiaRenderer};
pub use screen::ScreenSpace;
pub use text::{render_text_pixmap, wrap_lines};
