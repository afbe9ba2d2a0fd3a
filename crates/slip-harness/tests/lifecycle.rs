#![forbid(unsafe_code)]

//! Attach, detach and reattach against the in-memory document.

use std::time::Duration;

use pretty_assertions::assert_eq;
use slip_core::{
    GestureStateKind, InstanceRegistry, ListHost, ListenerGroups, PointerIgnoredReason,
    PointerInput, PointerOutcome, SWIPING_CONTAINER_CLASS, SelectionTarget, Slip, SlipConfig,
    SlipError, SlipEventKind, StyleProperty,
};
use slip_harness::{GestureDriver, ROW_HEIGHT, VirtualDom, list_fixture};

fn workaround() -> SlipConfig {
    SlipConfig {
        body_touch_workaround: true,
        ..SlipConfig::default()
    }
}

// ============================================================================
// Attach
// ============================================================================

#[test]
fn attach_by_selector_installs_container_listeners() {
    let (mut dom, list) = list_fixture(3);
    let registry = InstanceRegistry::new();
    let slip = Slip::attach(&mut dom, "#list", SlipConfig::default(), &registry).unwrap();

    assert_eq!(slip.container(), list.container);
    assert!(slip.is_attached());
    assert_eq!(slip.state(), GestureStateKind::Idle);
    assert_eq!(
        dom.listeners(list.container),
        ListenerGroups::CONTAINER | ListenerGroups::SELECTION
    );
    assert_eq!(registry.live_instances(), 1);
    assert!(!dom.body_touch_listener());
}

#[test]
fn unknown_selector_is_reported() {
    let (mut dom, _list) = list_fixture(3);
    let err = Slip::attach(
        &mut dom,
        "#missing",
        SlipConfig::default(),
        &InstanceRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SlipError::ContainerNotFound {
            selector: "#missing".to_owned(),
        }
    );
}

#[test]
fn text_node_is_not_a_container() {
    let mut dom = VirtualDom::new();
    let body = dom.body();
    let text = dom.create_text(body);
    let registry = InstanceRegistry::new();
    let err = Slip::attach(&mut dom, text, SlipConfig::default(), &registry).unwrap_err();

    assert_eq!(err, SlipError::ContainerNotElement { node: text });
    assert_eq!(registry.live_instances(), 0);
}

#[test]
fn invalid_config_is_rejected_before_touching_the_document() {
    let (mut dom, list) = list_fixture(3);
    let config = SlipConfig {
        hold_delay: Duration::ZERO,
        ..SlipConfig::default()
    };
    let err = Slip::attach(&mut dom, list.container, config, &InstanceRegistry::new()).unwrap_err();

    assert!(matches!(
        err,
        SlipError::InvalidConfig {
            field: "hold_delay",
            ..
        }
    ));
    assert!(dom.listeners(list.container).is_empty());
}

#[test]
fn config_loads_from_json_with_defaults() {
    let config: SlipConfig = serde_json::from_str(r#"{ "hold_delay": 450 }"#).unwrap();
    assert_eq!(config.hold_delay, Duration::from_millis(450));
    assert_eq!(config.leave_grace, Duration::from_millis(700));
    assert_eq!(config.swipe_min_velocity, 0.6);
    assert!(config.auto_scroll);
    assert!(config.validate().is_ok());
}

#[test]
fn longer_hold_delay_is_honored() {
    let (dom, list) = list_fixture(3);
    let config: SlipConfig = serde_json::from_str(r#"{ "hold_delay": 450 }"#).unwrap();
    let mut drv = GestureDriver::new(dom, list.container, config).unwrap();

    drv.mouse_down(list.rows[1]);
    drv.wait(300);
    assert_eq!(drv.state(), GestureStateKind::Undecided);
    drv.wait(150);
    assert_eq!(drv.state(), GestureStateKind::Reordering);
}

// ============================================================================
// Detach
// ============================================================================

#[test]
fn detach_mid_mouse_gesture_drops_every_listener() {
    let (dom, list) = list_fixture(3);
    let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
    drv.mouse_down(list.rows[1]);
    assert!(
        drv.dom
            .listeners(list.container)
            .contains(ListenerGroups::WINDOW_MOUSE)
    );

    drv.detach();
    assert!(drv.dom.listeners(list.container).is_empty());
    assert_eq!(drv.slip.pending_timers(), 0);
    assert_eq!(drv.state(), GestureStateKind::Idle);
    assert!(!drv.slip.is_attached());
    assert_eq!(drv.registry().live_instances(), 0);
}

#[test]
fn detach_mid_reorder_settles_without_reporting() {
    let (dom, list) = list_fixture(4);
    let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
    drv.mouse_down(list.rows[1]);
    drv.wait(300);
    drv.mouse_move_by(0.0, 50.0);

    drv.detach();
    assert_eq!(drv.dom.events_of(SlipEventKind::Reorder).len(), 0);
    for &row in &list.rows {
        assert_eq!(drv.dom.style(row, StyleProperty::Transform), "");
        assert_eq!(drv.dom.style(row, StyleProperty::Transition), "");
    }
    assert_eq!(drv.dom.style(list.rows[1], StyleProperty::ZIndex), "");
}

#[test]
fn detach_during_swipe_animation_skips_afterswipe() {
    let (dom, list) = list_fixture(3);
    let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
    drv.fling(list.rows[1], 30.0);
    assert!(drv.slip.pending_timers() > 0);

    drv.detach();
    assert_eq!(drv.slip.pending_timers(), 0);
    assert_eq!(drv.dom.events_of(SlipEventKind::AfterSwipe).len(), 0);
    assert_eq!(drv.dom.style(list.rows[1], StyleProperty::Transform), "");
    assert!(!drv.dom.has_class(list.container, SWIPING_CONTAINER_CLASS));

    drv.settle();
    assert_eq!(drv.dom.events_of(SlipEventKind::AfterSwipe).len(), 0);
}

#[test]
fn detach_twice_is_harmless() {
    let (dom, list) = list_fixture(3);
    let mut drv = GestureDriver::new(dom, list.container, workaround()).unwrap();
    drv.detach();
    drv.detach();
    assert_eq!(drv.registry().live_instances(), 0);
    assert!(!drv.dom.body_touch_listener());
}

#[test]
fn detached_instance_ignores_input() {
    let (dom, list) = list_fixture(3);
    let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
    drv.detach();

    let dispatch = drv.touch_start(list.rows[0]);
    assert_eq!(
        dispatch.outcome,
        PointerOutcome::Ignored(PointerIgnoredReason::NotAttached)
    );
    assert!(!dispatch.prevent_default);
    let dispatch = drv.send(PointerInput::SelectionChange {
        target: SelectionTarget::Document,
        preventable: true,
    });
    assert!(dispatch.is_ignored());
    assert!(drv.dom.dispatched().is_empty());
}

// ============================================================================
// Shared registry
// ============================================================================

#[test]
fn body_workaround_is_shared_between_instances() {
    let mut dom = VirtualDom::new();
    let body = dom.body();
    let first = dom.create_list(body, 2, ROW_HEIGHT);
    let second = dom.create_list(body, 2, ROW_HEIGHT);
    let registry = InstanceRegistry::new();

    let mut a = Slip::attach(&mut dom, first.container, workaround(), &registry).unwrap();
    let mut b = Slip::attach(&mut dom, second.container, workaround(), &registry).unwrap();
    assert_eq!(registry.live_instances(), 2);
    assert!(registry.body_touch_installed());
    assert!(dom.body_touch_listener());

    a.detach(&mut dom);
    assert_eq!(registry.live_instances(), 1);
    assert!(dom.body_touch_listener());

    b.detach(&mut dom);
    assert_eq!(registry.live_instances(), 0);
    assert!(!registry.body_touch_installed());
    assert!(!dom.body_touch_listener());
}

#[test]
fn instances_on_separate_lists_do_not_interfere() {
    let mut dom = VirtualDom::new();
    let body = dom.body();
    let first = dom.create_list(body, 2, ROW_HEIGHT);
    let second = dom.create_list(body, 2, ROW_HEIGHT);
    let registry = InstanceRegistry::new();
    let mut a = Slip::attach(&mut dom, first.container, SlipConfig::default(), &registry).unwrap();
    let b = Slip::attach(&mut dom, second.container, SlipConfig::default(), &registry).unwrap();

    let (x, y) = dom.center(first.rows[0]);
    let dispatch = a.handle(
        &mut dom,
        Duration::ZERO,
        PointerInput::TouchStart {
            target: first.rows[0],
            touch_count: 1,
            client_x: x,
            client_y: y,
        },
    );
    assert_eq!(dispatch.outcome, PointerOutcome::Forwarded);
    assert_eq!(a.state(), GestureStateKind::Undecided);
    assert_eq!(b.state(), GestureStateKind::Idle);

    // A press on the other list's row does not belong to `a`.
    let (x, y) = dom.center(second.rows[0]);
    let dispatch = a.handle(
        &mut dom,
        Duration::from_millis(10),
        PointerInput::TouchStart {
            target: second.rows[0],
            touch_count: 1,
            client_x: x,
            client_y: y,
        },
    );
    assert_eq!(
        dispatch.outcome,
        PointerOutcome::Ignored(PointerIgnoredReason::NoTarget)
    );
    assert_eq!(a.state(), GestureStateKind::Idle);
}

#[test]
fn reattach_moves_listeners_and_keeps_workaround() {
    let mut dom = VirtualDom::new();
    let body = dom.body();
    let first = dom.create_list(body, 2, ROW_HEIGHT);
    let second = dom.create_list(body, 3, ROW_HEIGHT);
    let registry = InstanceRegistry::new();
    let mut slip = Slip::attach(&mut dom, first.container, workaround(), &registry).unwrap();

    slip.reattach(&mut dom, second.container).unwrap();
    assert_eq!(slip.container(), second.container);
    assert!(slip.is_attached());
    assert!(dom.listeners(first.container).is_empty());
    assert_eq!(
        dom.listeners(second.container),
        ListenerGroups::CONTAINER | ListenerGroups::SELECTION
    );
    assert_eq!(registry.live_instances(), 1);
    assert!(dom.body_touch_listener());

    let (x, y) = dom.center(second.rows[2]);
    slip.handle(
        &mut dom,
        Duration::ZERO,
        PointerInput::TouchStart {
            target: second.rows[2],
            touch_count: 1,
            client_x: x,
            client_y: y,
        },
    );
    assert_eq!(slip.target().map(|t| t.node), Some(second.rows[2]));
}

#[test]
fn failed_reattach_keeps_current_container() {
    let (mut dom, list) = list_fixture(2);
    let registry = InstanceRegistry::new();
    let mut slip = Slip::attach(&mut dom, list.container, SlipConfig::default(), &registry).unwrap();

    let err = slip.reattach(&mut dom, "#nowhere").unwrap_err();
    assert!(matches!(err, SlipError::ContainerNotFound { .. }));
    assert_eq!(slip.container(), list.container);
    assert!(slip.is_attached());
    assert_eq!(registry.live_instances(), 1);
}

#[test]
fn next_deadline_tracks_hold_timer() {
    let (dom, list) = list_fixture(2);
    let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
    assert_eq!(drv.slip.next_deadline(), None);

    drv.wait(40);
    drv.mouse_down(list.rows[0]);
    assert_eq!(drv.slip.next_deadline(), Some(Duration::from_millis(340)));
    drv.mouse_up();
    assert_eq!(drv.slip.next_deadline(), None);
}
