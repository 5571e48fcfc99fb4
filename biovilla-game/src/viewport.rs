//! Pan/zoom controller for the world map.
//!
//! The world is a fixed-size plane drawn at `offset + world * zoom` inside a
//! container. The offset is always clamped so the world edge never leaves the
//! container edge: `min(0, container - world * zoom) <= offset <= 0` on each
//! axis. Pointer coordinates are container-relative pixels.
//!
//! Inertia runs one step per [`Viewport::inertia_frame`]; the host calls it
//! once per display frame. Only one inertia loop exists and it stops whenever
//! the viewport is deactivated.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::{Add, Sub};

use crate::config::ViewportConfig;
use crate::data::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Something on the map that reacts to taps and clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MapTarget {
    Zone(ZoneId),
    Villager(String),
}

pub type TouchPoints = SmallVec<[Point; 2]>;

/// Raw pointer input. `target` is the interactive element under the pointer,
/// as hit-tested by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Gesture {
    PointerDown {
        at: Point,
        #[serde(default)]
        target: Option<MapTarget>,
    },
    PointerMove {
        at: Point,
    },
    PointerUp,
    Wheel {
        at: Point,
        delta_y: f64,
    },
    TouchStart {
        touches: TouchPoints,
        #[serde(default)]
        target: Option<MapTarget>,
    },
    TouchMove {
        touches: TouchPoints,
    },
    TouchEnd {
        remaining: usize,
    },
    Resize {
        size: Size,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored,
    Handled,
    /// A quick, still touch on an interactive target.
    Tap(MapTarget),
}

/// Offset and scale to apply to the world layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_pointer: Point,
    start_offset: Point,
    last: Point,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    start_distance: f64,
    start_zoom: f64,
    mid: Point,
}

#[derive(Debug, Clone)]
struct TouchTrack {
    started_ms: u64,
    origin: Point,
    target: Option<MapTarget>,
    moved: bool,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    world: Size,
    container: Size,
    offset: Point,
    zoom: f64,
    velocity: Point,
    inertia: bool,
    drag: Option<Drag>,
    pinch: Option<Pinch>,
    touch: Option<TouchTrack>,
    active: bool,
}

impl Viewport {
    #[must_use]
    pub fn new(config: &ViewportConfig) -> Self {
        let world = Size::new(config.world_width, config.world_height);
        Self {
            config: config.clone(),
            world,
            container: world,
            offset: Point::default(),
            zoom: 1.0_f64.clamp(config.zoom_min, config.zoom_max),
            velocity: Point::default(),
            inertia: false,
            drag: None,
            pinch: None,
            touch: None,
            active: false,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> Point {
        self.offset
    }

    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub const fn container(&self) -> Size {
        self.container
    }

    #[must_use]
    pub const fn velocity(&self) -> Point {
        self.velocity
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn inertia_running(&self) -> bool {
        self.inertia
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub const fn transform(&self) -> Transform {
        Transform {
            x: self.offset.x,
            y: self.offset.y,
            zoom: self.zoom,
        }
    }

    /// Lowest allowed offset on each axis. The highest is always zero.
    #[must_use]
    pub fn min_offset(&self) -> Point {
        Point::new(
            (self.container.width - self.world.width * self.zoom).min(0.0),
            (self.container.height - self.world.height * self.zoom).min(0.0),
        )
    }

    /// Container point to world coordinates.
    #[must_use]
    pub fn to_world(&self, at: Point) -> Point {
        (at - self.offset).scale(1.0 / self.zoom)
    }

    /// Enable or disable input. Disabling stops inertia and drops any gesture in progress.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.cancel_inertia();
            self.drag = None;
            self.pinch = None;
            self.touch = None;
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.container = size;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        let min = self.min_offset();
        self.offset.x = self.offset.x.min(0.0).max(min.x);
        self.offset.y = self.offset.y.min(0.0).max(min.y);
    }

    pub fn center(&mut self) {
        self.offset = Point::new(
            (self.container.width - self.world.width * self.zoom) / 2.0,
            (self.container.height - self.world.height * self.zoom) / 2.0,
        );
        self.clamp();
    }

    /// Fit the world to cover the container (never zooming past 1) and center it.
    pub fn reset_view(&mut self) {
        self.cancel_inertia();
        let fit = (self.container.width / self.world.width)
            .max(self.container.height / self.world.height);
        self.zoom = fit.min(1.0).clamp(self.config.zoom_min, self.config.zoom_max);
        self.center();
    }

    /// Zoom by `delta` keeping the container point `at` fixed on screen.
    pub fn zoom_at(&mut self, at: Point, delta: f64) {
        let target = self.zoom + delta;
        self.set_zoom_about(at, target);
    }

    fn set_zoom_about(&mut self, at: Point, zoom: f64) {
        let next = zoom.clamp(self.config.zoom_min, self.config.zoom_max);
        let ratio = next / self.zoom;
        self.offset = Point::new(
            at.x - ratio * (at.x - self.offset.x),
            at.y - ratio * (at.y - self.offset.y),
        );
        self.zoom = next;
        self.clamp();
    }

    /// Zoom around the container center, as the on-screen buttons do.
    pub fn zoom_step(&mut self, delta: f64) {
        self.cancel_inertia();
        let at = Point::new(self.container.width / 2.0, self.container.height / 2.0);
        self.zoom_at(at, delta);
    }

    pub fn cancel_inertia(&mut self) {
        self.inertia = false;
        self.velocity = Point::default();
    }

    fn release(&mut self) {
        let launch = self.config.inertia_launch_speed;
        if self.velocity.x.abs() > launch || self.velocity.y.abs() > launch {
            self.inertia = true;
        }
    }

    /// Advance inertia by one frame. Returns whether the loop is still running.
    pub fn inertia_frame(&mut self) -> bool {
        if !self.inertia {
            return false;
        }
        self.velocity = self.velocity.scale(self.config.inertia_decay);
        let stop = self.config.inertia_stop_speed;
        if self.velocity.x.abs() < stop && self.velocity.y.abs() < stop {
            self.cancel_inertia();
            return false;
        }
        self.offset = self.offset + self.velocity;
        self.clamp();
        true
    }

    fn drag_to(&mut self, at: Point) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        self.velocity = at - drag.last;
        drag.last = at;
        self.offset = drag.start_offset + (at - drag.start_pointer);
        self.clamp();
    }

    fn start_drag(&mut self, at: Point) {
        self.drag = Some(Drag {
            start_pointer: at,
            start_offset: self.offset,
            last: at,
        });
        self.velocity = Point::default();
    }

    /// Interpret a raw gesture. Everything except resizing is ignored while inactive.
    pub fn handle(&mut self, gesture: Gesture, now_ms: u64) -> GestureOutcome {
        if let Gesture::Resize { size } = gesture {
            self.resize(size);
            return GestureOutcome::Handled;
        }
        if !self.active {
            return GestureOutcome::Ignored;
        }
        match gesture {
            Gesture::PointerDown { at, target } => {
                if target.is_some() {
                    return GestureOutcome::Ignored;
                }
                self.cancel_inertia();
                self.start_drag(at);
                GestureOutcome::Handled
            }
            Gesture::PointerMove { at } => {
                if self.drag.is_none() {
                    return GestureOutcome::Ignored;
                }
                self.drag_to(at);
                GestureOutcome::Handled
            }
            Gesture::PointerUp => {
                if self.drag.take().is_none() {
                    return GestureOutcome::Ignored;
                }
                self.release();
                GestureOutcome::Handled
            }
            Gesture::Wheel { at, delta_y } => {
                self.cancel_inertia();
                let step = self.config.wheel_step;
                self.zoom_at(at, if delta_y < 0.0 { step } else { -step });
                GestureOutcome::Handled
            }
            Gesture::TouchStart { touches, target } => self.touch_start(&touches, target, now_ms),
            Gesture::TouchMove { touches } => self.touch_move(&touches),
            Gesture::TouchEnd { remaining } => self.touch_end(remaining, now_ms),
            Gesture::Resize { .. } => GestureOutcome::Handled,
        }
    }

    fn touch_start(
        &mut self,
        touches: &[Point],
        target: Option<MapTarget>,
        now_ms: u64,
    ) -> GestureOutcome {
        let Some(&first) = touches.first() else {
            return GestureOutcome::Ignored;
        };
        self.cancel_inertia();
        match touches {
            [_] => {
                if target.is_none() {
                    self.start_drag(first);
                }
                self.touch = Some(TouchTrack {
                    started_ms: now_ms,
                    origin: first,
                    target,
                    moved: false,
                });
            }
            [a, b, ..] => {
                self.drag = None;
                self.pinch = Some(Pinch {
                    start_distance: a.distance(*b),
                    start_zoom: self.zoom,
                    mid: a.midpoint(*b),
                });
                self.touch = Some(TouchTrack {
                    started_ms: now_ms,
                    origin: first,
                    target: None,
                    moved: true,
                });
            }
            [] => {}
        }
        GestureOutcome::Handled
    }

    fn touch_move(&mut self, touches: &[Point]) -> GestureOutcome {
        match touches {
            [at] => {
                let travel = self.config.tap_max_travel_px;
                if let Some(track) = self.touch.as_mut() {
                    let delta = *at - track.origin;
                    if delta.x.abs() > travel || delta.y.abs() > travel {
                        track.moved = true;
                    }
                }
                self.drag_to(*at);
                GestureOutcome::Handled
            }
            [a, b, ..] => {
                let Some(pinch) = self.pinch else {
                    return GestureOutcome::Ignored;
                };
                if pinch.start_distance <= f64::EPSILON {
                    return GestureOutcome::Ignored;
                }
                let zoom = pinch.start_zoom * (a.distance(*b) / pinch.start_distance);
                self.set_zoom_about(pinch.mid, zoom);
                GestureOutcome::Handled
            }
            [] => GestureOutcome::Ignored,
        }
    }

    fn touch_end(&mut self, remaining: usize, now_ms: u64) -> GestureOutcome {
        if remaining > 0 {
            return GestureOutcome::Handled;
        }
        let track = self.touch.take();
        self.drag = None;
        self.pinch = None;
        self.release();
        let Some(track) = track else {
            return GestureOutcome::Handled;
        };
        let quick = now_ms.saturating_sub(track.started_ms) < self.config.tap_max_duration_ms;
        match track.target {
            Some(target) if quick && !track.moved => GestureOutcome::Tap(target),
            _ => GestureOutcome::Handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    const EPS: f64 = 1e-9;

    fn viewport(width: f64, height: f64) -> Viewport {
        let mut view = Viewport::new(&ViewportConfig::default());
        view.resize(Size::new(width, height));
        view.set_active(true);
        view
    }

    fn assert_in_bounds(view: &Viewport) {
        let min = view.min_offset();
        let offset = view.offset();
        assert!(offset.x <= 0.0 && offset.x >= min.x - EPS, "x {offset:?} min {min:?}");
        assert!(offset.y <= 0.0 && offset.y >= min.y - EPS, "y {offset:?} min {min:?}");
    }

    #[test]
    fn reset_fits_and_centers() {
        let mut view = viewport(700.0, 933.0);
        view.reset_view();
        assert!((view.zoom() - 1.0).abs() < EPS);
        assert!((view.offset().x - (-350.0)).abs() < EPS);
        assert!(view.offset().y.abs() < EPS);

        let mut small = viewport(350.0, 200.0);
        small.reset_view();
        assert!((small.zoom() - 0.25_f64.max(200.0 / 933.0).max(0.5)).abs() < EPS);
    }

    #[test]
    fn reset_never_zooms_past_one() {
        let mut view = viewport(2800.0, 1866.0);
        view.reset_view();
        assert!((view.zoom() - 1.0).abs() < EPS);
        assert_eq!(view.offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn zoom_keeps_the_cursor_point_fixed() {
        let mut view = viewport(800.0, 600.0);
        view.offset = Point::new(-300.0, -200.0);
        let at = Point::new(400.0, 300.0);
        let before = view.to_world(at);
        view.zoom_at(at, 0.5);
        let after = view.to_world(at);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
        assert!((view.zoom() - 1.5).abs() < EPS);
    }

    #[test]
    fn zoom_is_bounded() {
        let mut view = viewport(800.0, 600.0);
        for _ in 0..50 {
            view.zoom_step(0.12);
        }
        assert!((view.zoom() - 2.5).abs() < EPS);
        for _ in 0..50 {
            view.zoom_step(-0.12);
        }
        assert!((view.zoom() - 0.5).abs() < EPS);
        assert_in_bounds(&view);
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut view = viewport(800.0, 600.0);
        view.handle(
            Gesture::Wheel {
                at: Point::new(10.0, 10.0),
                delta_y: -100.0,
            },
            0,
        );
        assert!((view.zoom() - 1.12).abs() < EPS);
        view.handle(
            Gesture::Wheel {
                at: Point::new(10.0, 10.0),
                delta_y: 100.0,
            },
            0,
        );
        assert!((view.zoom() - 1.0).abs() < EPS);
    }

    #[test]
    fn drag_pans_and_stays_clamped() {
        let mut view = viewport(800.0, 600.0);
        view.handle(
            Gesture::PointerDown {
                at: Point::new(400.0, 300.0),
                target: None,
            },
            0,
        );
        view.handle(
            Gesture::PointerMove {
                at: Point::new(300.0, 250.0),
            },
            16,
        );
        assert_eq!(view.offset(), Point::new(-100.0, -50.0));
        view.handle(
            Gesture::PointerMove {
                at: Point::new(5000.0, 5000.0),
            },
            32,
        );
        assert_eq!(view.offset(), Point::new(0.0, 0.0));
        view.handle(
            Gesture::PointerMove {
                at: Point::new(-5000.0, -5000.0),
            },
            48,
        );
        assert_eq!(view.offset(), view.min_offset());
        assert_in_bounds(&view);
    }

    #[test]
    fn pointer_down_on_target_does_not_drag() {
        let mut view = viewport(800.0, 600.0);
        let outcome = view.handle(
            Gesture::PointerDown {
                at: Point::new(1.0, 1.0),
                target: Some(MapTarget::Zone(ZoneId::new("a"))),
            },
            0,
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(!view.is_dragging());
    }

    #[test]
    fn fast_release_launches_inertia_that_decays_to_rest() {
        let mut view = viewport(800.0, 600.0);
        view.offset = Point::new(-300.0, -150.0);
        view.handle(
            Gesture::PointerDown {
                at: Point::new(400.0, 300.0),
                target: None,
            },
            0,
        );
        view.handle(
            Gesture::PointerMove {
                at: Point::new(390.0, 300.0),
            },
            16,
        );
        view.handle(Gesture::PointerUp, 32);
        assert!(view.inertia_running());
        let mut frames = 0;
        while view.inertia_frame() {
            frames += 1;
            assert_in_bounds(&view);
            assert!(frames < 1_000);
        }
        assert!(frames > 10);
        assert!(!view.inertia_running());
        assert_eq!(view.velocity(), Point::default());
    }

    #[test]
    fn slow_release_does_not_launch_inertia() {
        let mut view = viewport(800.0, 600.0);
        view.handle(
            Gesture::PointerDown {
                at: Point::new(400.0, 300.0),
                target: None,
            },
            0,
        );
        view.handle(
            Gesture::PointerMove {
                at: Point::new(399.5, 300.0),
            },
            16,
        );
        view.handle(Gesture::PointerUp, 32);
        assert!(!view.inertia_running());
    }

    #[test]
    fn deactivating_stops_inertia_and_ignores_input() {
        let mut view = viewport(800.0, 600.0);
        view.velocity = Point::new(20.0, 0.0);
        view.inertia = true;
        view.set_active(false);
        assert!(!view.inertia_frame());
        assert_eq!(
            view.handle(
                Gesture::Wheel {
                    at: Point::default(),
                    delta_y: -1.0
                },
                0
            ),
            GestureOutcome::Ignored
        );
        assert_eq!(
            view.handle(
                Gesture::Resize {
                    size: Size::new(400.0, 300.0)
                },
                0
            ),
            GestureOutcome::Handled
        );
    }

    #[test]
    fn quick_still_touch_on_target_is_a_tap() {
        let mut view = viewport(800.0, 600.0);
        let target = MapTarget::Villager("fisher".into());
        view.handle(
            Gesture::TouchStart {
                touches: smallvec![Point::new(100.0, 100.0)],
                target: Some(target.clone()),
            },
            1_000,
        );
        view.handle(
            Gesture::TouchMove {
                touches: smallvec![Point::new(104.0, 103.0)],
            },
            1_050,
        );
        assert!(!view.is_dragging());
        assert_eq!(
            view.handle(Gesture::TouchEnd { remaining: 0 }, 1_200),
            GestureOutcome::Tap(target)
        );
    }

    #[test]
    fn slow_or_moving_touch_is_not_a_tap() {
        let mut view = viewport(800.0, 600.0);
        let target = MapTarget::Zone(ZoneId::new("a"));
        view.handle(
            Gesture::TouchStart {
                touches: smallvec![Point::new(100.0, 100.0)],
                target: Some(target.clone()),
            },
            0,
        );
        assert_eq!(
            view.handle(Gesture::TouchEnd { remaining: 0 }, 300),
            GestureOutcome::Handled
        );

        view.handle(
            Gesture::TouchStart {
                touches: smallvec![Point::new(100.0, 100.0)],
                target: Some(target),
            },
            0,
        );
        view.handle(
            Gesture::TouchMove {
                touches: smallvec![Point::new(120.0, 100.0)],
            },
            50,
        );
        assert_eq!(
            view.handle(Gesture::TouchEnd { remaining: 0 }, 100),
            GestureOutcome::Handled
        );
    }

    #[test]
    fn pinch_scales_about_the_midpoint() {
        let mut view = viewport(800.0, 600.0);
        view.offset = Point::new(-200.0, -100.0);
        let mid = Point::new(400.0, 300.0);
        let anchor = view.to_world(mid);
        view.handle(
            Gesture::TouchStart {
                touches: smallvec![Point::new(350.0, 300.0), Point::new(450.0, 300.0)],
                target: None,
            },
            0,
        );
        view.handle(
            Gesture::TouchMove {
                touches: smallvec![Point::new(325.0, 300.0), Point::new(475.0, 300.0)],
            },
            16,
        );
        assert!((view.zoom() - 1.5).abs() < EPS);
        let moved = view.to_world(mid);
        assert!((anchor.x - moved.x).abs() < 1e-6);
        assert!((anchor.y - moved.y).abs() < 1e-6);
        assert_eq!(
            view.handle(Gesture::TouchEnd { remaining: 0 }, 32),
            GestureOutcome::Handled
        );
    }

    #[test]
    fn resize_reclamps_the_offset() {
        let mut view = viewport(400.0, 300.0);
        view.offset = Point::new(-1000.0, -633.0);
        view.resize(Size::new(1400.0, 933.0));
        assert_eq!(view.offset(), Point::new(0.0, 0.0));
    }
}
