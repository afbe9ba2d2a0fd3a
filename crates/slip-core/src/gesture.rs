#![forbid(unsafe_code)]

//! Gesture state machine: classifies one pointer interaction as a tap, a
//! horizontal swipe or a hold-to-reorder drag.
//!
//! # State Machine
//!
//! ```text
//!            pointer down                 |dx| > 20, beforeswipe allowed
//!   Idle ─────────────────▶ Undecided ─────────────────────────────────▶ Swiping
//!    ▲                        │   │                                        │
//!    │    release → tap       │   │ 300ms hold inside (15, 25),            │ release → swipe | cancelswipe
//!    ├────────────────────────┘   │ beforereorder allowed                  │ |dy| too large → abort
//!    │                            ▼                                        │
//!    ├──────────────────────── Reordering ◀────────────────────────────────┘
//!    │  release → reorder        (pointer outside window for 700ms → cancel)
//! ```
//!
//! # Invariants
//!
//! 1. Exactly one state is active. The leaving state's hook always runs
//!    before the next state is constructed.
//! 2. Requesting the active state is a no-op, so redundant transitions never
//!    restart the hold timer.
//! 3. A state constructor may itself transition; the outer transition then
//!    does not overwrite the newer state.
//! 4. Every timer a state starts is cancelled when the state is left, so a
//!    stale hold or grace timer can never fire into a later gesture.
//! 5. At most one of `tap`, `swipe`, `reorder`, `cancelswipe` is dispatched
//!    per gesture, except that a vetoed `swipe` is followed by `cancelswipe`.
//!
//! # Failure Modes
//!
//! - A vetoed `beforeswipe` or vertical drift while undecided returns to
//!   Idle silently (no commit event).
//! - Vertical drift while swiping returns to Idle through `cancelswipe`.
//! - A new press while a gesture is live cancels it first, as if its
//!   release had been lost.
//! - The engine never reorders nodes. `reorder` only reports the drop
//!   location; collaborators move the node after the event.

use std::time::Duration;

use crate::animator::{AnimatedNode, AnimationStep, SettleFollowUp, TransitionAnimator};
use crate::config::SlipConfig;
use crate::event::{SlipEvent, SlipEventKind, SwipeDirection, dispatch};
use crate::geometry::PositionSample;
use crate::host::{ListHost, ListenerGroups, NodeId, ScrollTarget, StyleProperty};
use crate::layout::{BaseTransform, ReorderLayout, element_index, following_siblings};
use crate::timer::{TimerId, TimerQueue};
use crate::tracker::MovementTracker;

/// Class carried by the element being reordered.
pub const REORDERING_CLASS: &str = "slip-reordering";
/// Class carried by the container while one of its elements is swiped.
pub const SWIPING_CONTAINER_CLASS: &str = "slip-swiping-container";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which state the machine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureStateKind {
    Idle,
    Undecided,
    Swiping,
    Reordering,
}

/// The element engaged by the active gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Direct child of the container.
    pub node: NodeId,
    /// Where the pointer actually went down; may be a descendant of `node`.
    pub original_target: NodeId,
    /// `offsetHeight`, refreshed whenever a state that needs it is entered.
    pub height: f64,
    /// Nearest scrollable ancestor, or the document.
    pub scroll_target: ScrollTarget,
    pub base_transform: BaseTransform,
}

impl Target {
    fn animated(&self) -> AnimatedNode {
        AnimatedNode::new(self.node, self.base_transform.clone())
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum GestureState {
    Idle,
    Undecided {
        hold_timer: Option<TimerId>,
    },
    Swiping {
        original_index: usize,
        committed: bool,
    },
    Reordering {
        layout: ReorderLayout,
        original_index: usize,
        leave_timer: Option<TimerId>,
    },
}

impl GestureState {
    const fn kind(&self) -> GestureStateKind {
        match self {
            Self::Idle => GestureStateKind::Idle,
            Self::Undecided { .. } => GestureStateKind::Undecided,
            Self::Swiping { .. } => GestureStateKind::Swiping,
            Self::Reordering { .. } => GestureStateKind::Reordering,
        }
    }
}

#[derive(Debug)]
enum TimerTask {
    Hold,
    LeaveGrace,
    Animation(AnimationStep),
}

// ---------------------------------------------------------------------------
// GestureMachine
// ---------------------------------------------------------------------------

/// Per-container gesture state.
///
/// Driven by the pointer layer in [`Slip`](crate::Slip); every method takes
/// the host so the machine itself holds no references into the document.
#[derive(Debug)]
pub struct GestureMachine {
    config: SlipConfig,
    animator: TransitionAnimator,
    container: NodeId,
    state: GestureState,
    generation: u64,
    target: Option<Target>,
    tracker: MovementTracker,
    timers: TimerQueue<TimerTask>,
    listeners: ListenerGroups,
    using_touch: bool,
    can_prevent_scrolling: bool,
}

impl GestureMachine {
    #[must_use]
    pub fn new(config: SlipConfig, container: NodeId) -> Self {
        Self {
            animator: TransitionAnimator::new(&config),
            tracker: MovementTracker::new(config.velocity_window),
            config,
            container,
            state: GestureState::Idle,
            generation: 0,
            target: None,
            timers: TimerQueue::new(),
            listeners: ListenerGroups::empty(),
            using_touch: false,
            can_prevent_scrolling: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GestureStateKind {
        self.state.kind()
    }

    #[must_use]
    pub const fn config(&self) -> &SlipConfig {
        &self.config
    }

    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    #[must_use]
    pub const fn tracker(&self) -> &MovementTracker {
        &self.tracker
    }

    /// Only Idle lets the browser select text.
    #[must_use]
    pub const fn allows_text_selection(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    #[must_use]
    pub const fn listeners(&self) -> ListenerGroups {
        self.listeners
    }

    #[must_use]
    pub const fn using_touch(&self) -> bool {
        self.using_touch
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.timers.now()
    }

    pub(crate) fn set_using_touch(&mut self, using_touch: bool) {
        self.using_touch = using_touch;
    }

    pub(crate) fn set_can_prevent_scrolling(&mut self, allowed: bool) {
        self.can_prevent_scrolling = allowed;
    }

    pub(crate) fn set_container(&mut self, container: NodeId) {
        self.container = container;
    }

    /// Attach or detach native listener groups, skipping no-op changes.
    pub(crate) fn set_listeners<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        groups: ListenerGroups,
        attached: bool,
    ) {
        let change = if attached {
            groups - self.listeners
        } else {
            groups & self.listeners
        };
        if change.is_empty() {
            return;
        }
        self.listeners.set(change, attached);
        host.set_listeners(self.container, change, attached);
        tracing::debug!(groups = ?change, attached, "listeners changed");
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Transition to `next`, running the current state's leave hook first.
    pub fn set_state<H: ListHost + ?Sized>(&mut self, host: &mut H, next: GestureStateKind) {
        let from = self.state.kind();
        if from == next {
            return;
        }
        let leaving = std::mem::replace(&mut self.state, GestureState::Idle);
        self.leave_state(host, leaving);

        let generation = self.generation;
        let entered = self.enter_state(host, next);
        if self.generation == generation {
            tracing::debug!(?from, to = ?entered.kind(), "gesture state transition");
            self.state = entered;
            self.generation = self.generation.wrapping_add(1);
        }
    }

    /// Force Idle.
    pub fn cancel<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        self.set_state(host, GestureStateKind::Idle);
    }

    fn leave_state<H: ListHost + ?Sized>(&mut self, host: &mut H, leaving: GestureState) {
        match leaving {
            GestureState::Idle => {}
            GestureState::Undecided { hold_timer } => {
                if let Some(id) = hold_timer {
                    self.timers.cancel(id);
                }
            }
            GestureState::Swiping { committed, .. } => self.leave_swiping(host, committed),
            GestureState::Reordering {
                layout,
                leave_timer,
                ..
            } => self.leave_reordering(host, &layout, leave_timer),
        }
    }

    fn enter_state<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        next: GestureStateKind,
    ) -> GestureState {
        match next {
            GestureStateKind::Idle => {
                self.target = None;
                self.using_touch = false;
                self.set_listeners(host, ListenerGroups::WINDOW_MOUSE, false);
                GestureState::Idle
            }
            GestureStateKind::Undecided => self.enter_undecided(host),
            GestureStateKind::Swiping => self.enter_swiping(host),
            GestureStateKind::Reordering => self.enter_reordering(host),
        }
    }

    fn enter_undecided<H: ListHost + ?Sized>(&mut self, host: &mut H) -> GestureState {
        let Some(target) = self.target.as_mut() else {
            return GestureState::Idle;
        };
        target.height = host.offset_height(target.node);
        host.set_inline_style(target.node, StyleProperty::Transition, "");
        let original_target = target.original_target;

        if dispatch(host, original_target, SlipEvent::new(SlipEventKind::BeforeWait)) {
            let hold_timer = self.timers.schedule(self.config.hold_delay, TimerTask::Hold);
            GestureState::Undecided {
                hold_timer: Some(hold_timer),
            }
        } else {
            if dispatch(host, original_target, SlipEvent::new(SlipEventKind::BeforeReorder)) {
                self.set_state(host, GestureStateKind::Reordering);
            }
            GestureState::Undecided { hold_timer: None }
        }
    }

    fn enter_swiping<H: ListHost + ?Sized>(&mut self, host: &mut H) -> GestureState {
        let Some(target) = self.target.as_mut() else {
            return GestureState::Idle;
        };
        let original_index = element_index(host, self.container, target.node);
        host.add_class(self.container, SWIPING_CONTAINER_CLASS);
        target.height = host.offset_height(target.node);
        GestureState::Swiping {
            original_index,
            committed: false,
        }
    }

    fn enter_reordering<H: ListHost + ?Sized>(&mut self, host: &mut H) -> GestureState {
        let Some(target) = self.target.as_mut() else {
            return GestureState::Idle;
        };
        target.height = host.offset_height(target.node);
        let original_index = element_index(host, self.container, target.node);
        let layout = ReorderLayout::snapshot(host, self.container, target.node, target.height);

        let transition = self.animator.sibling_transition();
        for sibling in layout.siblings() {
            host.set_inline_style(sibling.node, StyleProperty::Transition, &transition);
        }

        host.add_class(target.node, REORDERING_CLASS);
        host.set_inline_style(
            target.node,
            StyleProperty::ZIndex,
            &self.config.reordering_z_index.to_string(),
        );
        host.set_inline_style(target.node, StyleProperty::UserSelect, "none");
        if self.config.preserve_3d_while_reordering {
            host.set_inline_style(self.container, StyleProperty::TransformStyle, "preserve-3d");
        }

        apply_drag(host, &self.animator, target, &self.tracker, &layout);

        GestureState::Reordering {
            layout,
            original_index,
            leave_timer: None,
        }
    }

    fn leave_swiping<H: ListHost + ?Sized>(&mut self, host: &mut H, committed: bool) {
        let Some(target) = self.target.clone() else {
            return;
        };
        if committed {
            let siblings = following_siblings(host, target.node)
                .into_iter()
                .map(|(node, base)| AnimatedNode::new(node, base))
                .collect();
            let rightwards = self.tracker.total_movement().x > 0.0;
            let (delay, step) = self.animator.animate_swipe(
                host,
                target.animated(),
                siblings,
                target.height,
                rightwards,
                self.container,
            );
            self.schedule_animation(delay, step);
        } else {
            let (delay, step) = self.animator.animate_to_zero(
                host,
                target.animated(),
                SettleFollowUp::RemoveClass {
                    node: self.container,
                    class: SWIPING_CONTAINER_CLASS,
                },
            );
            self.schedule_animation(delay, step);
            dispatch(host, target.node, SlipEvent::new(SlipEventKind::CancelSwipe));
        }
    }

    fn leave_reordering<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        layout: &ReorderLayout,
        leave_timer: Option<TimerId>,
    ) {
        if let Some(id) = leave_timer {
            self.timers.cancel(id);
        }
        if self.config.preserve_3d_while_reordering {
            host.set_inline_style(self.container, StyleProperty::TransformStyle, "");
        }
        if let Some(target) = self.target.clone() {
            host.remove_class(target.node, REORDERING_CLASS);
            host.set_inline_style(target.node, StyleProperty::UserSelect, "");
            let (delay, step) =
                self.animator
                    .animate_to_zero(host, target.animated(), SettleFollowUp::ClearZIndex);
            self.schedule_animation(delay, step);
        }
        for sibling in layout.siblings() {
            host.set_inline_style(
                sibling.node,
                StyleProperty::Transform,
                &sibling.base_transform.original,
            );
            host.set_inline_style(sibling.node, StyleProperty::Transition, "");
        }
    }

    // -----------------------------------------------------------------------
    // Pointer lifecycle
    // -----------------------------------------------------------------------

    /// Engage `target` at `origin` and enter Undecided.
    pub(crate) fn begin<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Target,
        origin: PositionSample,
    ) {
        self.target = Some(target);
        self.tracker.begin(origin);
        self.set_state(host, GestureStateKind::Undecided);
    }

    /// Feed a move. Returns `None` without an engaged target, otherwise
    /// whether the native default (scrolling) must be suppressed.
    pub(crate) fn update_position<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        sample: PositionSample,
    ) -> Option<bool> {
        self.target.as_ref()?;
        self.tracker.record(sample);
        if self.config.auto_scroll {
            self.auto_scroll(host);
        }
        let prevent_default = self.on_move(host);
        self.tracker.refresh_trailing();
        Some(prevent_default)
    }

    /// Scroll the target's container when the target nears one of its edges.
    fn auto_scroll<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let scroller = target.scroll_target;
        let trigger = self.config.auto_scroll_trigger;
        let container_rect = host.scroll_rect(scroller);
        let target_rect = host.bounding_rect(target.node);
        let bottom_offset = container_rect.bottom.min(host.viewport_height()) - target_rect.bottom;
        let top_offset = target_rect.top - container_rect.top.max(0.0);

        let offset = if bottom_offset < trigger {
            trigger - bottom_offset
        } else if top_offset < trigger {
            top_offset - trigger
        } else {
            return;
        };

        let before = host.scroll_top(scroller);
        host.set_scroll_top(scroller, before + offset);
        let after = host.scroll_top(scroller);
        if before != after {
            tracing::trace!(before, after, "auto-scrolled");
            self.tracker.shift_start_y(before - after);
        }
    }

    /// Returns `true` when the native default must be suppressed.
    fn on_move<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        match self.state.kind() {
            GestureStateKind::Idle => false,
            GestureStateKind::Undecided => self.undecided_move(host),
            GestureStateKind::Swiping => self.swiping_move(host),
            GestureStateKind::Reordering => self.reordering_move(host),
        }
    }

    /// Pointer released. Returns `true` when the native default must be suppressed.
    pub(crate) fn on_end<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        match self.state.kind() {
            GestureStateKind::Idle => false,
            GestureStateKind::Undecided => {
                let allowed = match self.target.as_ref() {
                    Some(target) => dispatch(
                        host,
                        target.original_target,
                        SlipEvent::new(SlipEventKind::Tap),
                    ),
                    None => true,
                };
                self.set_state(host, GestureStateKind::Idle);
                !allowed
            }
            GestureStateKind::Swiping => self.swiping_end(host),
            GestureStateKind::Reordering => self.reordering_end(host),
        }
    }

    /// Pointer left the window.
    pub(crate) fn on_leave<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        match self.state.kind() {
            GestureStateKind::Idle => {}
            GestureStateKind::Undecided => self.set_state(host, GestureStateKind::Idle),
            GestureStateKind::Swiping => {
                self.swiping_end(host);
            }
            GestureStateKind::Reordering => {
                if let GestureState::Reordering { leave_timer, .. } = &mut self.state {
                    if let Some(id) = leave_timer.take() {
                        self.timers.cancel(id);
                    }
                    *leave_timer = Some(
                        self.timers
                            .schedule(self.config.leave_grace, TimerTask::LeaveGrace),
                    );
                }
            }
        }
    }

    fn undecided_move<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let Some((height, original_target)) = self
            .target
            .as_ref()
            .map(|target| (target.height, target.original_target))
        else {
            return false;
        };
        let movement = self.tracker.absolute_movement();

        if movement.x > self.config.swipe_trigger
            && movement.y < self.config.swipe_min_vertical_room.max(height)
        {
            if dispatch(host, original_target, SlipEvent::new(SlipEventKind::BeforeSwipe)) {
                self.set_state(host, GestureStateKind::Swiping);
                return true;
            }
            self.set_state(host, GestureStateKind::Idle);
        }
        if movement.y > self.config.scroll_abort {
            self.set_state(host, GestureStateKind::Idle);
        }

        // Horizontal-dominant moves would otherwise scroll sideways.
        movement.x > movement.y * self.config.horizontal_dominance
    }

    fn swiping_move<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let Some(target) = self.target.as_ref() else {
            return false;
        };
        let total = self.tracker.total_movement();
        if total.y.abs() < target.height + self.config.swipe_vertical_slack {
            let transform = self.animator.swipe_transform(total.x, &target.base_transform);
            host.set_inline_style(target.node, StyleProperty::Transform, &transform);
            true
        } else {
            self.set_state(host, GestureStateKind::Idle);
            false
        }
    }

    fn swiping_end<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let velocity = self.tracker.release_velocity();
        let elapsed = self.tracker.absolute_movement().elapsed;
        let swiped =
            velocity > self.config.swipe_min_velocity && elapsed > self.config.swipe_min_duration;
        let direction = SwipeDirection::from_dx(self.tracker.last_interval().x);
        tracing::debug!(velocity, elapsed_ms = elapsed.as_millis() as u64, swiped, "swipe released");

        let pending = match (self.target.as_ref(), &self.state) {
            (Some(target), GestureState::Swiping { original_index, .. }) if swiped => {
                Some((target.node, *original_index))
            }
            _ => None,
        };
        if let Some((node, original_index)) = pending
            && dispatch(host, node, SlipEvent::swipe(direction, original_index))
            && let GestureState::Swiping { committed, .. } = &mut self.state
        {
            *committed = true;
        }
        self.set_state(host, GestureStateKind::Idle);
        swiped
    }

    fn reordering_move<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if let GestureState::Reordering {
            layout,
            leave_timer,
            ..
        } = &mut self.state
        {
            // Any movement means the pointer is back.
            if let Some(id) = leave_timer.take() {
                self.timers.cancel(id);
            }
            if let Some(target) = self.target.as_ref() {
                apply_drag(host, &self.animator, target, &self.tracker, layout);
            }
        }
        true
    }

    fn reordering_end<H: ListHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let dy = self.tracker.total_movement().y;
        let pending = match (self.target.as_ref(), &self.state) {
            (
                Some(target),
                GestureState::Reordering {
                    layout,
                    original_index,
                    ..
                },
            ) => layout.drop_location(dy).map(|location| {
                let event = SlipEvent::reorder(
                    location.splice_index,
                    location.insert_before,
                    *original_index,
                );
                (target.node, event)
            }),
            _ => None,
        };
        // No qualifying sibling means nothing to report.
        if let Some((node, event)) = pending {
            dispatch(host, node, event);
        }
        self.set_state(host, GestureStateKind::Idle);
        true
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Fire every timer due at or before `now`, then move the clock to `now`.
    pub fn advance<H: ListHost + ?Sized>(&mut self, host: &mut H, now: Duration) {
        while let Some((id, task)) = self.timers.pop_due(now) {
            match task {
                TimerTask::Hold => self.hold_elapsed(host, id),
                TimerTask::LeaveGrace => self.leave_grace_elapsed(host, id),
                TimerTask::Animation(step) => {
                    if let Some((delay, next)) = self.animator.run_step(host, step) {
                        self.schedule_animation(delay, next);
                    }
                }
            }
        }
        self.timers.set_now(now);
    }

    /// Finish every pending animation immediately and drop all timers.
    pub(crate) fn settle_all<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        for task in self.timers.drain() {
            if let TimerTask::Animation(step) = task {
                self.animator.settle_now(host, step);
            }
        }
    }

    fn schedule_animation(&mut self, delay: Duration, step: AnimationStep) {
        self.timers.schedule(delay, TimerTask::Animation(step));
    }

    fn hold_elapsed<H: ListHost + ?Sized>(&mut self, host: &mut H, id: TimerId) {
        let GestureState::Undecided { hold_timer } = &mut self.state else {
            return;
        };
        if *hold_timer != Some(id) {
            return;
        }
        *hold_timer = None;
        tracing::trace!("hold elapsed");

        let movement = self.tracker.absolute_movement();
        let still = movement.x < self.config.hold_tolerance_x
            && movement.y < self.config.hold_tolerance_y;
        if !self.can_prevent_scrolling || !still {
            return;
        }
        let Some(original_target) = self.target.as_ref().map(|target| target.original_target)
        else {
            return;
        };
        if dispatch(host, original_target, SlipEvent::new(SlipEventKind::BeforeReorder)) {
            self.set_state(host, GestureStateKind::Reordering);
        }
    }

    fn leave_grace_elapsed<H: ListHost + ?Sized>(&mut self, host: &mut H, id: TimerId) {
        let GestureState::Reordering { leave_timer, .. } = &mut self.state else {
            return;
        };
        if *leave_timer != Some(id) {
            return;
        }
        *leave_timer = None;
        tracing::debug!("pointer stayed outside the window, cancelling reorder");
        self.cancel(host);
    }
}

/// Translate the dragged element and shift the siblings it has passed.
fn apply_drag<H: ListHost + ?Sized>(
    host: &mut H,
    animator: &TransitionAnimator,
    target: &Target,
    tracker: &MovementTracker,
    layout: &ReorderLayout,
) {
    let dy = tracker.total_movement().y;
    host.set_inline_style(
        target.node,
        StyleProperty::Transform,
        &animator.drag_transform(dy, &target.base_transform),
    );
    for (sibling, shift) in layout.shifts(dy, target.height) {
        host.set_inline_style(
            sibling.node,
            StyleProperty::Transform,
            &animator.sibling_transform(shift, &sibling.base_transform),
        );
    }
}
