#![forbid(unsafe_code)]

//! Attaching the engine to a list container.
//!
//! [`Slip`] binds one [`GestureMachine`] to one container and owns its
//! native listener groups. [`InstanceRegistry`] is the state shared between
//! instances: how many are attached, and whether the body `touchstart`
//! workaround listener is installed.
//!
//! # Invariants
//!
//! 1. A detached instance holds no listeners and no pending timers.
//! 2. Detaching settles in-flight animations synchronously. Apart from the
//!    `cancelswipe` of an interrupted swipe, it dispatches nothing.
//! 3. The body workaround listener is installed at most once, by the first
//!    attach that asks for it, and removed when the last instance detaches.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::SlipConfig;
use crate::error::SlipError;
use crate::gesture::{GestureMachine, GestureStateKind, Target};
use crate::host::{ListHost, ListenerGroups, NodeId};
use crate::pointer::{self, PointerDispatch, PointerIgnoredReason, PointerInput};

/// How to find the container at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRef<'a> {
    Node(NodeId),
    Selector(&'a str),
}

impl From<NodeId> for ContainerRef<'_> {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl<'a> From<&'a str> for ContainerRef<'a> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

fn resolve_container<H: ListHost + ?Sized>(
    host: &H,
    container: ContainerRef<'_>,
) -> Result<NodeId, SlipError> {
    let node = match container {
        ContainerRef::Node(node) => node,
        ContainerRef::Selector(selector) => {
            host.query_selector(selector)
                .ok_or_else(|| SlipError::ContainerNotFound {
                    selector: selector.to_owned(),
                })?
        }
    };
    if !host.is_element(node) {
        return Err(SlipError::ContainerNotElement { node });
    }
    Ok(node)
}

// ---------------------------------------------------------------------------
// InstanceRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RegistryInner {
    live: usize,
    body_touch_installed: bool,
}

/// Shared bookkeeping for every instance attached through it.
///
/// Cloning yields another handle to the same counters.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Clone for InstanceRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl InstanceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached instances.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        self.inner.borrow().live
    }

    #[must_use]
    pub fn body_touch_installed(&self) -> bool {
        self.inner.borrow().body_touch_installed
    }

    fn acquire<H: ListHost + ?Sized>(&self, host: &mut H, container: NodeId, workaround: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.live += 1;
        if workaround && !inner.body_touch_installed {
            inner.body_touch_installed = true;
            host.set_listeners(container, ListenerGroups::BODY_TOUCH, true);
            tracing::debug!("body touch workaround installed");
        }
    }

    fn release<H: ListHost + ?Sized>(&self, host: &mut H, container: NodeId) {
        let mut inner = self.inner.borrow_mut();
        inner.live = inner.live.saturating_sub(1);
        if inner.live == 0 && inner.body_touch_installed {
            inner.body_touch_installed = false;
            host.set_listeners(container, ListenerGroups::BODY_TOUCH, false);
            tracing::debug!("body touch workaround removed");
        }
    }
}

// ---------------------------------------------------------------------------
// Slip
// ---------------------------------------------------------------------------

/// Gesture recognition for one list container.
#[derive(Debug)]
pub struct Slip {
    machine: GestureMachine,
    registry: InstanceRegistry,
    attached: bool,
}

impl Slip {
    /// Attach to a container, installing its listeners.
    ///
    /// # Errors
    ///
    /// [`SlipError::InvalidConfig`] when `config` fails validation,
    /// [`SlipError::ContainerNotFound`] when a selector matches nothing and
    /// [`SlipError::ContainerNotElement`] when the node is not an element.
    pub fn attach<'a, H: ListHost + ?Sized>(
        host: &mut H,
        container: impl Into<ContainerRef<'a>>,
        config: SlipConfig,
        registry: &InstanceRegistry,
    ) -> Result<Self, SlipError> {
        config.validate()?;
        let container = resolve_container(host, container.into())?;

        registry.acquire(host, container, config.body_touch_workaround);
        let mut machine = GestureMachine::new(config, container);
        machine.set_listeners(host, ListenerGroups::CONTAINER | ListenerGroups::SELECTION, true);
        tracing::debug!(container = container.get(), "slip attached");

        Ok(Self {
            machine,
            registry: registry.clone(),
            attached: true,
        })
    }

    /// Move this instance to another container, detaching from the current
    /// one first. The body workaround listener stays installed throughout.
    ///
    /// # Errors
    ///
    /// Same as [`Slip::attach`]; on error the instance is left as it was.
    pub fn reattach<'a, H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        container: impl Into<ContainerRef<'a>>,
    ) -> Result<(), SlipError> {
        let container = resolve_container(host, container.into())?;

        let workaround = self.machine.config().body_touch_workaround;
        self.registry.acquire(host, container, workaround);
        self.detach(host);

        self.machine.set_container(container);
        self.machine
            .set_listeners(host, ListenerGroups::CONTAINER | ListenerGroups::SELECTION, true);
        self.attached = true;
        tracing::debug!(container = container.get(), "slip reattached");
        Ok(())
    }

    /// Cancel any gesture, settle animations and remove every listener.
    /// Detaching twice is a no-op.
    pub fn detach<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        if !self.attached {
            return;
        }
        self.machine.cancel(host);
        self.machine.settle_all(host);
        self.machine.set_listeners(host, ListenerGroups::all(), false);
        self.registry.release(host, self.machine.container());
        self.attached = false;
        tracing::debug!(container = self.machine.container().get(), "slip detached");
    }

    /// Handle one raw input at host time `now`.
    ///
    /// Timers due at or before `now` fire first.
    pub fn handle<H: ListHost + ?Sized>(
        &mut self,
        host: &mut H,
        now: Duration,
        input: PointerInput,
    ) -> PointerDispatch {
        let phase = input.phase();
        let _span = tracing::debug_span!("slip.input", ?phase).entered();
        if !self.attached {
            return PointerDispatch::ignored(
                phase,
                PointerIgnoredReason::NotAttached,
                self.machine.state(),
            );
        }
        self.machine.advance(host, now);
        let dispatch = pointer::route(&mut self.machine, host, now, input);
        tracing::trace!(outcome = ?dispatch.outcome, state = ?dispatch.state, "input handled");
        dispatch
    }

    /// Fire every timer due at or before `now`.
    pub fn advance<H: ListHost + ?Sized>(&mut self, host: &mut H, now: Duration) {
        if self.attached {
            self.machine.advance(host, now);
        }
    }

    /// Abort the current gesture without a commit event.
    pub fn cancel<H: ListHost + ?Sized>(&mut self, host: &mut H) {
        self.machine.cancel(host);
    }

    #[must_use]
    pub const fn state(&self) -> GestureStateKind {
        self.machine.state()
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.machine.container()
    }

    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        self.machine.target()
    }

    #[must_use]
    pub const fn allows_text_selection(&self) -> bool {
        self.machine.allows_text_selection()
    }

    /// Timers still waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.machine.pending_timers()
    }

    /// Earliest pending timer deadline, for hosts that schedule wake-ups.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.machine.next_deadline()
    }

    #[must_use]
    pub const fn listeners(&self) -> ListenerGroups {
        self.machine.listeners()
    }

    #[must_use]
    pub const fn config(&self) -> &SlipConfig {
        self.machine.config()
    }

    #[must_use]
    pub const fn machine(&self) -> &GestureMachine {
        &self.machine
    }
}
