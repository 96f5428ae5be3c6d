//! Property-based tests for events, links, and the runner.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use gameflow::core::{EventListener, FlowState, GameClock, GameEvent, Link, StateGraph};
use gameflow::runner::{Runner, TickOutcome};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum LinkShape {
    Always,
    Event { raised: bool },
}

prop_compose! {
    fn arbitrary_link()(variant in 0..3u8) -> LinkShape {
        match variant {
            0 => LinkShape::Always,
            1 => LinkShape::Event { raised: true },
            _ => LinkShape::Event { raised: false },
        }
    }
}

proptest! {
    #[test]
    fn listener_notified_once_per_raise(subscriptions in 1..5usize, raises in 0..6usize) {
        let event = GameEvent::new("e");
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let listener: Arc<dyn EventListener> = Arc::new(move |_: &GameEvent| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..subscriptions {
            event.add_listener(Arc::clone(&listener));
        }
        for _ in 0..raises {
            event.raise();
        }

        prop_assert_eq!(event.listener_count(), 1);
        prop_assert_eq!(count.load(Ordering::SeqCst), raises);
    }

    #[test]
    fn payload_resets_after_every_raise(payload in any::<i64>()) {
        let event = GameEvent::new("item-picked");
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        event.add_listener(Arc::new(move |e: &GameEvent| *sink.lock() = e.payload()));

        event.raise_with(payload);

        prop_assert_eq!(*seen.lock(), Some(payload));
        prop_assert_eq!(event.payload(), None);
    }

    #[test]
    fn listeners_run_in_reverse_registration_order(count in 1..8usize) {
        let event = GameEvent::new("e");
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..count {
            let sink = Arc::clone(&order);
            event.add_listener(Arc::new(move |_: &GameEvent| sink.lock().push(tag)));
        }

        event.raise();

        let expected: Vec<usize> = (0..count).rev().collect();
        prop_assert_eq!(order.lock().clone(), expected);
    }

    #[test]
    fn first_open_link_wins(shapes in prop::collection::vec(arbitrary_link(), 1..8)) {
        let mut graph = StateGraph::new();
        let source = graph.add_state(FlowState::plain("source"));
        let targets: Vec<_> = (0..shapes.len())
            .map(|i| graph.add_state(FlowState::plain(format!("t{i}"))))
            .collect();

        let events: Vec<GameEvent> = (0..shapes.len()).map(|i| GameEvent::new(format!("e{i}"))).collect();
        for (i, shape) in shapes.iter().enumerate() {
            let link = match shape {
                LinkShape::Always => Link::always(targets[i]),
                LinkShape::Event { .. } => Link::on_event(&events[i], targets[i]),
            };
            graph.add_link(source, link).unwrap();
        }
        graph.enable_links(source).unwrap();
        for (i, shape) in shapes.iter().enumerate() {
            if let LinkShape::Event { raised: true } = shape {
                events[i].raise();
            }
        }

        let expected = shapes
            .iter()
            .position(|shape| !matches!(shape, LinkShape::Event { raised: false }))
            .map(|i| targets[i]);
        prop_assert_eq!(graph.validate_links(source).unwrap(), expected);
    }

    #[test]
    fn repeated_raises_cause_one_transition(raises in 1..10usize) {
        let event = GameEvent::new("e");
        let mut graph = StateGraph::new();
        let s1 = graph.add_state(FlowState::plain("s1"));
        let s2 = graph.add_state(FlowState::plain("s2"));
        graph.add_link(s1, Link::on_event(&event, s2)).unwrap();
        graph.add_link(s2, Link::always(s1)).unwrap();

        let mut runner = Runner::new(graph, GameClock::new());
        runner.start(s1).unwrap();
        for _ in 0..raises {
            event.raise();
        }

        prop_assert_eq!(runner.tick().unwrap(), TickOutcome::Transitioned { from: s1, to: s2 });
        prop_assert_eq!(runner.tick().unwrap(), TickOutcome::Transitioned { from: s2, to: s1 });
        prop_assert_eq!(runner.tick().unwrap(), TickOutcome::AwaitingLink(s1));
    }

    #[test]
    fn delay_completes_on_exact_tick(half_units in 1..20u32) {
        let clock = GameClock::new();
        let mut graph = StateGraph::new();
        let wait = graph.add_state(FlowState::delay("wait", f64::from(half_units) * 0.5));
        let done = graph.add_state(FlowState::plain("done"));
        graph.add_link(wait, Link::always(done)).unwrap();

        let mut runner = Runner::new(graph, clock.clone());
        runner.start(wait).unwrap();

        for _ in 1..half_units {
            clock.advance(0.5);
            prop_assert_eq!(runner.tick().unwrap(), TickOutcome::Running(wait));
        }
        clock.advance(0.5);
        prop_assert_eq!(runner.tick().unwrap(), TickOutcome::Transitioned { from: wait, to: done });
    }
}
