//! Container bounds and resize observation.
//!
//! A [`Container`] notifies its observers synchronously each time its bounds
//! are set. Observation ends when the returned [`ObserverHandle`] is
//! disconnected or dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Layout box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whole-pixel raster size for these bounds; fractions are dropped and
    /// each edge is capped at [`MAX_RASTER_EDGE`].
    pub fn raster_size(&self) -> (u32, u32) {
        (to_pixels(self.width), to_pixels(self.height))
    }
}

/// Largest raster edge a sketch surface is allocated with.
pub const MAX_RASTER_EDGE: u32 = 8192;

fn to_pixels(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.floor().min(f64::from(MAX_RASTER_EDGE)) as u32
    } else {
        0
    }
}

type Callback = Box<dyn FnMut(Bounds)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Callback)>,
}

#[derive(Default)]
pub struct Container {
    bounds: Bounds,
    registry: Rc<RefCell<Registry>>,
}

impl Container {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            registry: Rc::default(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Updates the bounds and notifies every observer before returning.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        let mut registry = self.registry.borrow_mut();
        for (_, callback) in registry.observers.iter_mut() {
            callback(bounds);
        }
    }

    /// Registers `callback` and invokes it once with the current bounds.
    /// Callbacks must not observe or disconnect on the same container.
    pub fn observe(&self, mut callback: impl FnMut(Bounds) + 'static) -> ObserverHandle {
        callback(self.bounds);
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Box::new(callback)));
        ObserverHandle {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.registry.borrow().observers.len()
    }
}

/// Keeps one observer registered. Dropping it unregisters the observer.
pub struct ObserverHandle {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl ObserverHandle {
    pub fn disconnect(self) {}
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().observers.retain(|(id, _)| *id != self.id);
        }
    }
}
