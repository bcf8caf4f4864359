/// Maps scene coordinates (origin at the screen centre, y up) to canvas
/// pixels (origin top-left, y down) and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSpace {
    pub width: u32,
    pub height: u32,
}

impl ScreenSpace {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn to_pixels(&self, pos: (f32, f32)) -> (f32, f32) {
        let (cx, cy) = self.center();
        (cx + pos.0, cy - pos.1)
    }

    pub fn to_scene(&self, px: (f32, f32)) -> (f32, f32) {
        let (cx, cy) = self.center();
        (px.0 - cx, cy - px.1)
    }

    /// Top-left pixel corner of a `size` box centred on scene point `pos`
    pub fn box_origin(&self, pos: (f32, f32), size: (f32, f32)) -> (f32, f32) {
        let (x, y) = self.to_pixels(pos);
        (x - size.0 / 2.0, y - size.1 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_maps_to_middle_of_canvas() {
        let s = ScreenSpace::new(800, 600);
        assert_eq!(s.to_pixels((0.0, 0.0)), (400.0, 300.0));
        assert_eq!(s.to_pixels((100.0, 50.0)), (500.0, 250.0));
        assert_eq!(s.to_scene((500.0, 250.0)), (100.0, 50.0));
    }

    #[test]
    fn box_origin_is_top_left() {
        let s = ScreenSpace::new(200, 200);
        assert_eq!(s.box_origin((0.0, 20.0), (40.0, 10.0)), (80.0, 75.0));
    }
}
