#![forbid(unsafe_code)]

//! Scripted pointer sequences against a deterministic clock.
//!
//! [`GestureDriver`] owns a [`VirtualDom`] and a [`Slip`] attached to it.
//! Every input is stamped with the driver's clock; [`GestureDriver::wait`]
//! moves the clock and fires whatever timers became due. Nothing sleeps.
//!
//! Higher-level helpers (`tap`, `fling`, `hold_and_drag`) produce the input
//! shapes the recognizer classifies, so tests read as gestures rather than
//! event lists.

use std::time::Duration;

use slip_core::{
    ContainerRef, GestureStateKind, InstanceRegistry, MouseButton, NodeId, PointerDispatch,
    PointerInput, SelectionTarget, Slip, SlipConfig, SlipError,
};

use crate::dom::VirtualDom;

/// Interval between synthesized moves.
pub const MOVE_INTERVAL: Duration = Duration::from_millis(30);

/// A [`VirtualDom`] with one attached [`Slip`] and a clock.
#[derive(Debug)]
pub struct GestureDriver {
    pub dom: VirtualDom,
    pub slip: Slip,
    registry: InstanceRegistry,
    now: Duration,
    pointer: (f64, f64),
}

impl GestureDriver {
    /// Attach to `container` with a fresh registry.
    ///
    /// # Errors
    ///
    /// Whatever [`Slip::attach`] reports.
    pub fn new<'a>(
        dom: VirtualDom,
        container: impl Into<ContainerRef<'a>>,
        config: SlipConfig,
    ) -> Result<Self, SlipError> {
        Self::with_registry(dom, container, config, &InstanceRegistry::new())
    }

    /// Attach to `container` through a shared registry.
    ///
    /// # Errors
    ///
    /// Whatever [`Slip::attach`] reports.
    pub fn with_registry<'a>(
        mut dom: VirtualDom,
        container: impl Into<ContainerRef<'a>>,
        config: SlipConfig,
        registry: &InstanceRegistry,
    ) -> Result<Self, SlipError> {
        let slip = Slip::attach(&mut dom, container, config, registry)?;
        Ok(Self {
            dom,
            slip,
            registry: registry.clone(),
            now: Duration::ZERO,
            pointer: (0.0, 0.0),
        })
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub const fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn state(&self) -> GestureStateKind {
        self.slip.state()
    }

    /// Last position the driver put the pointer at.
    #[must_use]
    pub const fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    /// Advance the clock by `ms` milliseconds, firing due timers.
    pub fn wait(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
        self.slip.advance(&mut self.dom, self.now);
    }

    /// Let every pending animation finish.
    pub fn settle(&mut self) {
        self.wait(1_000);
    }

    /// Send one raw input at the current time.
    pub fn send(&mut self, input: PointerInput) -> PointerDispatch {
        self.slip.handle(&mut self.dom, self.now, input)
    }

    /// Detach the instance.
    pub fn detach(&mut self) {
        self.slip.detach(&mut self.dom);
    }

    // -----------------------------------------------------------------------
    // Touch
    // -----------------------------------------------------------------------

    /// Put one finger down on the center of `node`.
    pub fn touch_start(&mut self, node: NodeId) -> PointerDispatch {
        let (x, y) = self.dom.center(node);
        self.touch_start_at(node, x, y, 1)
    }

    pub fn touch_start_at(
        &mut self,
        target: NodeId,
        x: f64,
        y: f64,
        touch_count: usize,
    ) -> PointerDispatch {
        self.pointer = (x, y);
        self.send(PointerInput::TouchStart {
            target,
            touch_count,
            client_x: x,
            client_y: y,
        })
    }

    /// Move the finger by `(dx, dy)` from its last position.
    pub fn touch_move_by(&mut self, dx: f64, dy: f64) -> PointerDispatch {
        let (x, y) = (self.pointer.0 + dx, self.pointer.1 + dy);
        self.pointer = (x, y);
        self.send(PointerInput::TouchMove {
            client_x: x,
            client_y: y,
        })
    }

    pub fn touch_end(&mut self) -> PointerDispatch {
        self.send(PointerInput::TouchEnd {
            remaining_touches: 0,
        })
    }

    pub fn touch_cancel(&mut self) -> PointerDispatch {
        self.send(PointerInput::TouchCancel)
    }

    // -----------------------------------------------------------------------
    // Mouse
    // -----------------------------------------------------------------------

    /// Press the primary button on the center of `node`.
    pub fn mouse_down(&mut self, node: NodeId) -> PointerDispatch {
        let (x, y) = self.dom.center(node);
        self.mouse_down_with(node, MouseButton::Primary, x, y)
    }

    pub fn mouse_down_with(
        &mut self,
        target: NodeId,
        button: MouseButton,
        x: f64,
        y: f64,
    ) -> PointerDispatch {
        self.pointer = (x, y);
        self.send(PointerInput::MouseDown {
            target,
            button,
            client_x: x,
            client_y: y,
        })
    }

    pub fn mouse_move_by(&mut self, dx: f64, dy: f64) -> PointerDispatch {
        let (x, y) = (self.pointer.0 + dx, self.pointer.1 + dy);
        self.pointer = (x, y);
        self.send(PointerInput::MouseMove {
            client_x: x,
            client_y: y,
        })
    }

    pub fn mouse_up(&mut self) -> PointerDispatch {
        self.send(PointerInput::MouseUp {
            button: MouseButton::Primary,
        })
    }

    /// The mouse leaves the document element.
    pub fn mouse_leave_window(&mut self) -> PointerDispatch {
        self.send(PointerInput::MouseLeave {
            leaves_document: true,
        })
    }

    pub fn blur(&mut self) -> PointerDispatch {
        self.send(PointerInput::Blur)
    }

    pub fn selection_change(&mut self, preventable: bool) -> PointerDispatch {
        self.send(PointerInput::SelectionChange {
            target: SelectionTarget::Document,
            preventable,
        })
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    /// Touch `node` and lift after `hold_ms` without moving.
    pub fn tap(&mut self, node: NodeId, hold_ms: u64) -> PointerDispatch {
        self.touch_start(node);
        self.wait(hold_ms);
        self.touch_end()
    }

    /// A fast horizontal touch drag of `dx` pixels per step, released while
    /// still moving, which commits as a swipe.
    ///
    /// Four moves 30ms apart, then a fifth 20ms later; the release velocity
    /// is measured over that last interval.
    pub fn fling(&mut self, node: NodeId, dx: f64) -> PointerDispatch {
        self.touch_start(node);
        for _ in 0..4 {
            self.wait(MOVE_INTERVAL.as_millis() as u64);
            self.touch_move_by(dx, 0.0);
        }
        self.wait(20);
        self.touch_move_by(dx, 0.0);
        self.touch_end()
    }

    /// Drag horizontally far enough to start swiping, then stall before
    /// releasing, which does not commit.
    pub fn slow_swipe(&mut self, node: NodeId, dx: f64) -> PointerDispatch {
        self.touch_start(node);
        self.wait(30);
        self.touch_move_by(dx, 0.0);
        self.wait(150);
        self.touch_move_by(1.0, 0.0);
        self.wait(200);
        self.touch_move_by(1.0, 0.0);
        self.touch_end()
    }

    /// Press `node` with the mouse, hold until reordering starts, drag by
    /// `dy` and release.
    pub fn hold_and_drag(&mut self, node: NodeId, dy: f64) -> PointerDispatch {
        self.mouse_down(node);
        self.wait(300);
        self.mouse_move_by(0.0, dy);
        self.mouse_up()
    }
}
