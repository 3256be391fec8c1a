use crate::color::StrokeColor;
use crate::error::{SketchError, SketchResult};
use crate::observer::{Container, ObserverHandle};
use crate::surface::{Point, RasterSurface};
use std::cell::RefCell;
use std::rc::Rc;

pub const MIN_STROKE_WIDTH: u32 = 1;
pub const MAX_STROKE_WIDTH: u32 = 12;
pub const DEFAULT_STROKE_WIDTH: u32 = 3;
pub const PNG_MIME: &str = "image/png";

/// Pointer input in overlay-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Leave,
}

/// Touch input; only the first active touch draws.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    Start(Vec<Point>),
    Move(Vec<Point>),
    End,
}

/// Whether the overlay took an input event or left it for the content below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    Consumed,
    PassThrough,
}

/// Encoded raster handed to the reprompt request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Freehand annotation layer over a rendered result.
///
/// The surface is shared only with the resize observer, which replaces it
/// with a blank one of the container's size on every bounds change.
pub struct SketchOverlay {
    surface: Rc<RefCell<RasterSurface>>,
    observer: Option<ObserverHandle>,
    enabled: bool,
    color: StrokeColor,
    width: u32,
    last: Option<Point>,
}

impl Default for SketchOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl SketchOverlay {
    /// A detached, disabled overlay with a zero-sized surface.
    pub fn new() -> Self {
        Self {
            surface: Rc::new(RefCell::new(RasterSurface::new(0, 0))),
            observer: None,
            enabled: false,
            color: StrokeColor::DEFAULT,
            width: DEFAULT_STROKE_WIDTH,
            last: None,
        }
    }

    /// Sizes the surface to `container` and keeps it in sync. Replaces any
    /// previous attachment.
    pub fn attach(&mut self, container: &Container) {
        self.detach();
        let surface = Rc::downgrade(&self.surface);
        self.observer = Some(container.observe(move |bounds| {
            if let Some(surface) = surface.upgrade() {
                let (w, h) = bounds.raster_size();
                surface.borrow_mut().resize(w, h);
            }
        }));
        self.last = None;
    }

    pub fn detach(&mut self) {
        if let Some(handle) = self.observer.take() {
            handle.disconnect();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.last = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// CSS `pointer-events` value for the drawing surface.
    pub fn pointer_events(&self) -> &'static str {
        if self.enabled {
            "auto"
        } else {
            "none"
        }
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Sets the stroke width, clamped to 1..=12.
    pub fn set_width(&mut self, width: u32) {
        self.width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }

    pub fn size(&self) -> (u32, u32) {
        let surface = self.surface.borrow();
        (surface.width(), surface.height())
    }

    pub fn is_drawing(&self) -> bool {
        self.last.is_some()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputDisposition {
        if !self.enabled {
            return InputDisposition::PassThrough;
        }
        match event {
            PointerEvent::Down(p) => self.begin(p),
            PointerEvent::Move(p) => self.extend(p),
            PointerEvent::Up | PointerEvent::Leave => self.last = None,
        }
        InputDisposition::Consumed
    }

    pub fn handle_touch(&mut self, event: TouchEvent) -> InputDisposition {
        if !self.enabled {
            return InputDisposition::PassThrough;
        }
        match event {
            TouchEvent::Start(touches) => {
                if let Some(&p) = touches.first() {
                    self.begin(p);
                }
            }
            TouchEvent::Move(touches) => {
                if let Some(&p) = touches.first() {
                    self.extend(p);
                }
            }
            TouchEvent::End => self.last = None,
        }
        InputDisposition::Consumed
    }

    fn begin(&mut self, p: Point) {
        self.last = Some(p);
    }

    fn extend(&mut self, p: Point) {
        let Some(from) = self.last else {
            return;
        };
        self.surface
            .borrow_mut()
            .stroke_segment(from, p, self.color.rgba(), f64::from(self.width));
        self.last = Some(p);
    }

    /// Erases all strokes. Available only while enabled.
    pub fn clear(&mut self) -> SketchResult<()> {
        if !self.enabled {
            return Err(SketchError::Disabled);
        }
        self.surface.borrow_mut().clear();
        Ok(())
    }

    /// Encodes the current surface as a PNG blob. Available only while
    /// enabled.
    pub fn export(&self) -> SketchResult<ImageBlob> {
        if !self.enabled {
            return Err(SketchError::Disabled);
        }
        let bytes = self.surface.borrow().encode_png()?;
        Ok(ImageBlob {
            mime: PNG_MIME,
            bytes,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.surface.borrow().is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Bounds;

    fn drawing_overlay(container: &Container) -> SketchOverlay {
        let mut overlay = SketchOverlay::new();
        overlay.attach(container);
        overlay.set_enabled(true);
        overlay
    }

    #[test]
    fn defaults() {
        let overlay = SketchOverlay::new();
        assert!(!overlay.is_enabled());
        assert_eq!(overlay.width(), 3);
        assert_eq!(overlay.color().to_string(), "#ff3b30");
        assert_eq!(overlay.pointer_events(), "none");
    }

    #[test]
    fn width_is_clamped() {
        let mut overlay = SketchOverlay::new();
        overlay.set_width(0);
        assert_eq!(overlay.width(), 1);
        overlay.set_width(40);
        assert_eq!(overlay.width(), 12);
        overlay.set_width(7);
        assert_eq!(overlay.width(), 7);
    }

    #[test]
    fn disabled_overlay_passes_input_through() {
        let container = Container::new(Bounds::new(20.0, 20.0));
        let mut overlay = SketchOverlay::new();
        overlay.attach(&container);

        assert_eq!(
            overlay.handle_pointer(PointerEvent::Down(Point::new(1.0, 1.0))),
            InputDisposition::PassThrough
        );
        overlay.handle_pointer(PointerEvent::Move(Point::new(15.0, 15.0)));
        assert!(overlay.is_blank());
        assert!(matches!(overlay.export(), Err(SketchError::Disabled)));
    }

    #[test]
    fn move_without_down_draws_nothing() {
        let container = Container::new(Bounds::new(20.0, 20.0));
        let mut overlay = drawing_overlay(&container);
        overlay.handle_pointer(PointerEvent::Move(Point::new(5.0, 5.0)));
        overlay.handle_pointer(PointerEvent::Move(Point::new(15.0, 15.0)));
        assert!(overlay.is_blank());
    }

    #[test]
    fn leave_ends_the_path() {
        let container = Container::new(Bounds::new(30.0, 30.0));
        let mut overlay = drawing_overlay(&container);
        overlay.handle_pointer(PointerEvent::Down(Point::new(2.0, 2.0)));
        assert!(overlay.is_drawing());
        overlay.handle_pointer(PointerEvent::Leave);
        assert!(!overlay.is_drawing());
        overlay.handle_pointer(PointerEvent::Move(Point::new(28.0, 28.0)));
        assert!(overlay.is_blank());
    }

    #[test]
    fn touch_uses_first_touch() {
        let container = Container::new(Bounds::new(30.0, 30.0));
        let mut overlay = drawing_overlay(&container);
        overlay.handle_touch(TouchEvent::Start(vec![Point::new(5.0, 5.0), Point::new(25.0, 25.0)]));
        overlay.handle_touch(TouchEvent::Move(vec![Point::new(10.0, 5.0)]));
        overlay.handle_touch(TouchEvent::Move(vec![]));
        overlay.handle_touch(TouchEvent::End);
        assert!(!overlay.is_blank());
        assert!(!overlay.is_drawing());
    }

    #[test]
    fn detach_stops_resizing() {
        let mut container = Container::new(Bounds::new(10.0, 10.0));
        let mut overlay = SketchOverlay::new();
        overlay.attach(&container);
        assert_eq!(container.observer_count(), 1);

        overlay.detach();
        assert_eq!(container.observer_count(), 0);
        container.set_bounds(Bounds::new(50.0, 50.0));
        assert_eq!(overlay.size(), (10, 10));
    }

    #[test]
    fn dropping_overlay_unregisters_observer() {
        let container = Container::new(Bounds::new(10.0, 10.0));
        {
            let mut overlay = SketchOverlay::new();
            overlay.attach(&container);
            assert_eq!(container.observer_count(), 1);
        }
        assert_eq!(container.observer_count(), 0);
    }
}
