#![forbid(unsafe_code)]

//! Transform/transition choreography for snap-back, swipe-off and sibling
//! collapse.
//!
//! Animations are CSS transitions: the animator writes `transition` and
//! `transform`, then schedules an [`AnimationStep`] for when the transition
//! has finished. Steps capture the node they animate, because by the time a
//! step fires the engine may already be busy with another target.
//!
//! A swipe-off runs in up to four stages:
//!
//! ```text
//! slide out (0.1s linear) ─101ms─▶ SwipedOut ── afterswipe allowed ──▶ siblings jump into the gap
//!                                      │                                   ─1ms─▶ SiblingsReturn (0.1s ease-in-out)
//!                                      │                                   ─101ms─▶ SiblingsRest
//!                                      └── afterswipe vetoed ──▶ Settle (slide back in)
//! ```

use std::time::Duration;

use crate::config::SlipConfig;
use crate::event::{SlipEvent, SlipEventKind, dispatch};
use crate::gesture::SWIPING_CONTAINER_CLASS;
use crate::host::{ListHost, NodeId, StyleProperty};
use crate::layout::BaseTransform;

const ONE_MS: Duration = Duration::from_millis(1);

/// A node captured for the duration of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedNode {
    pub node: NodeId,
    pub base_transform: BaseTransform,
}

impl AnimatedNode {
    #[must_use]
    pub fn new(node: NodeId, base_transform: BaseTransform) -> Self {
        Self {
            node,
            base_transform,
        }
    }
}

/// Cleanup run once a snap-back has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleFollowUp {
    ClearZIndex,
    RemoveClass { node: NodeId, class: &'static str },
}

/// A pending animation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationStep {
    /// Snap-back finished: drop the transition and restore the original transform.
    Settle {
        target: AnimatedNode,
        follow_up: SettleFollowUp,
    },
    /// The swiped element is off-screen; ask collaborators to confirm removal.
    SwipedOut {
        target: AnimatedNode,
        siblings: Vec<AnimatedNode>,
        height: f64,
        container: NodeId,
    },
    /// Siblings sit in the vacated gap; animate them back to rest.
    SiblingsReturn { siblings: Vec<AnimatedNode> },
    /// Siblings finished moving; restore their exact prior transforms.
    SiblingsRest { siblings: Vec<AnimatedNode> },
}

/// Writes transition and transform styles and sequences animation stages.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionAnimator {
    layer_hint: &'static str,
    top_layer_hint: &'static str,
    settle: Duration,
    swipe_out: Duration,
    sibling_shift: Duration,
}

impl TransitionAnimator {
    #[must_use]
    pub fn new(config: &SlipConfig) -> Self {
        let (layer_hint, top_layer_hint) = if config.hardware_layer_hint {
            ("translateZ(0) ", "translateZ(1px) ")
        } else {
            ("", "")
        };
        Self {
            layer_hint,
            top_layer_hint,
            settle: config.settle_duration,
            swipe_out: config.swipe_out_duration,
            sibling_shift: config.sibling_shift_duration,
        }
    }

    /// Horizontal offset applied while swiping.
    #[must_use]
    pub fn swipe_transform(&self, dx: f64, base: &BaseTransform) -> String {
        format!("translate({dx}px,0) {}{}", self.layer_hint, base.value)
    }

    /// Vertical offset for the element being reordered, lifted above its siblings.
    #[must_use]
    pub fn drag_transform(&self, dy: f64, base: &BaseTransform) -> String {
        format!("translate(0,{dy}px) {}{}", self.top_layer_hint, base.value)
    }

    /// Transform for a sibling making room; the original style when at rest.
    #[must_use]
    pub fn sibling_transform(&self, shift: f64, base: &BaseTransform) -> String {
        if shift == 0.0 {
            base.original.clone()
        } else {
            format!("translate(0,{shift}px) {}{}", self.layer_hint, base.value)
        }
    }

    /// Transition given to siblings while a reorder is in progress.
    #[must_use]
    pub fn sibling_transition(&self) -> String {
        format!("transform {} ease-in-out", seconds(self.sibling_shift))
    }

    /// Ease `target` back to its resting transform.
    ///
    /// Returns the settle step and its delay; the caller schedules it.
    pub fn animate_to_zero<H: ListHost + ?Sized>(
        &self,
        host: &mut H,
        target: AnimatedNode,
        follow_up: SettleFollowUp,
    ) -> (Duration, AnimationStep) {
        host.set_inline_style(
            target.node,
            StyleProperty::Transition,
            &format!("transform {} ease-out", seconds(self.settle)),
        );
        host.set_inline_style(
            target.node,
            StyleProperty::Transform,
            &format!("translate(0,0) {}{}", self.layer_hint, target.base_transform.value),
        );
        (
            self.settle + ONE_MS,
            AnimationStep::Settle { target, follow_up },
        )
    }

    /// Slide `target` fully off-screen in the direction of travel.
    ///
    /// `siblings` are the elements after the target, captured now so their
    /// transforms can be restored exactly once the gap closes.
    pub fn animate_swipe<H: ListHost + ?Sized>(
        &self,
        host: &mut H,
        target: AnimatedNode,
        siblings: Vec<AnimatedNode>,
        height: f64,
        rightwards: bool,
        container: NodeId,
    ) -> (Duration, AnimationStep) {
        let sign = if rightwards { "" } else { "-" };
        host.set_inline_style(
            target.node,
            StyleProperty::Transition,
            &format!("all {} linear", seconds(self.swipe_out)),
        );
        host.set_inline_style(
            target.node,
            StyleProperty::Transform,
            &format!(
                "translate({sign}100%,0) {}{}",
                self.layer_hint, target.base_transform.value
            ),
        );
        (
            self.swipe_out + ONE_MS,
            AnimationStep::SwipedOut {
                target,
                siblings,
                height,
                container,
            },
        )
    }

    /// Run a due step, returning the next stage to schedule, if any.
    pub fn run_step<H: ListHost + ?Sized>(
        &self,
        host: &mut H,
        step: AnimationStep,
    ) -> Option<(Duration, AnimationStep)> {
        tracing::trace!(step = step_name(&step), "animation step");
        match step {
            AnimationStep::Settle { target, follow_up } => {
                settle(host, &target, &follow_up);
                None
            }
            AnimationStep::SwipedOut {
                target,
                siblings,
                height,
                container,
            } => {
                rest(host, &target);
                if dispatch(host, target.node, SlipEvent::new(SlipEventKind::AfterSwipe)) {
                    host.remove_class(container, SWIPING_CONTAINER_CLASS);
                    for sibling in &siblings {
                        host.set_inline_style(sibling.node, StyleProperty::Transition, "");
                        host.set_inline_style(
                            sibling.node,
                            StyleProperty::Transform,
                            &format!(
                                "translate(0,{height}px) {}{}",
                                self.layer_hint, sibling.base_transform.value
                            ),
                        );
                    }
                    Some((ONE_MS, AnimationStep::SiblingsReturn { siblings }))
                } else {
                    Some(self.animate_to_zero(
                        host,
                        target,
                        SettleFollowUp::RemoveClass {
                            node: container,
                            class: SWIPING_CONTAINER_CLASS,
                        },
                    ))
                }
            }
            AnimationStep::SiblingsReturn { siblings } => {
                let transition = format!("transform {} ease-in-out", seconds(self.settle));
                for sibling in &siblings {
                    host.set_inline_style(sibling.node, StyleProperty::Transition, &transition);
                    host.set_inline_style(
                        sibling.node,
                        StyleProperty::Transform,
                        &format!(
                            "translate(0,0) {}{}",
                            self.layer_hint, sibling.base_transform.value
                        ),
                    );
                }
                Some((self.settle + ONE_MS, AnimationStep::SiblingsRest { siblings }))
            }
            AnimationStep::SiblingsRest { siblings } => {
                for sibling in &siblings {
                    rest(host, sibling);
                }
                None
            }
        }
    }

    /// Jump a pending step straight to its resting styles without dispatching
    /// anything. Used when an instance detaches mid-animation.
    pub fn settle_now<H: ListHost + ?Sized>(&self, host: &mut H, step: AnimationStep) {
        match step {
            AnimationStep::Settle { target, follow_up } => settle(host, &target, &follow_up),
            AnimationStep::SwipedOut {
                target, container, ..
            } => {
                rest(host, &target);
                host.remove_class(container, SWIPING_CONTAINER_CLASS);
            }
            AnimationStep::SiblingsReturn { siblings } | AnimationStep::SiblingsRest { siblings } => {
                for sibling in &siblings {
                    rest(host, sibling);
                }
            }
        }
    }
}

fn rest<H: ListHost + ?Sized>(host: &mut H, animated: &AnimatedNode) {
    host.set_inline_style(animated.node, StyleProperty::Transition, "");
    host.set_inline_style(
        animated.node,
        StyleProperty::Transform,
        &animated.base_transform.original,
    );
}

fn settle<H: ListHost + ?Sized>(host: &mut H, target: &AnimatedNode, follow_up: &SettleFollowUp) {
    rest(host, target);
    match *follow_up {
        SettleFollowUp::ClearZIndex => host.set_inline_style(target.node, StyleProperty::ZIndex, ""),
        SettleFollowUp::RemoveClass { node, class } => host.remove_class(node, class),
    }
}

fn seconds(duration: Duration) -> String {
    format!("{}s", duration.as_secs_f64())
}

fn step_name(step: &AnimationStep) -> &'static str {
    match step {
        AnimationStep::Settle { .. } => "settle",
        AnimationStep::SwipedOut { .. } => "swiped_out",
        AnimationStep::SiblingsReturn { .. } => "siblings_return",
        AnimationStep::SiblingsRest { .. } => "siblings_rest",
    }
}
