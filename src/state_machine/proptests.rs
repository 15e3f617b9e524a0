//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary interleavings of
//! user actions and stream deliveries.

use super::*;
use crate::protocol::StreamEvent;
use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// A step in a generated run. Stream deliveries are expressed relative to
/// the current generation so that runs hit both live and stale streams.
#[derive(Debug, Clone)]
enum Step {
    Submit(String),
    Cancel,
    Clear,
    Current(StreamEvent),
    Stale { behind: u64, event: StreamEvent },
}

fn arb_stream_event() -> impl Strategy<Value = StreamEvent> {
    prop_oneof![
        6 => "[a-zA-Z !]{0,6}".prop_map(StreamEvent::fragment),
        1 => Just(StreamEvent::Done),
        1 => "[a-z ]{1,10}".prop_map(StreamEvent::failed),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => "[a-z ]{0,8}".prop_map(Step::Submit),
        1 => Just(Step::Cancel),
        1 => Just(Step::Clear),
        8 => arb_stream_event().prop_map(Step::Current),
        2 => (1u64..4, arb_stream_event()).prop_map(|(behind, event)| Step::Stale { behind, event }),
    ]
}

fn input_for(state: &ChatState, step: Step) -> Input {
    match step {
        Step::Submit(text) => Input::submit(text),
        Step::Cancel => Input::Cancel,
        Step::Clear => Input::Clear,
        Step::Current(event) => Input::stream(state.generation(), event),
        Step::Stale { behind, event } => Input::stream(
            Generation::new(state.generation().get().saturating_sub(behind)),
            event,
        ),
    }
}

fn in_flight_count(state: &ChatState) -> usize {
    state
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.status().is_in_flight())
        .count()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: at most one message is pending or streaming
    #[test]
    fn prop_at_most_one_in_flight(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ChatState::new();
        for step in steps {
            let input = input_for(&state, step);
            let _ = state.transition(input);
            let count = in_flight_count(&state);
            prop_assert!(count <= 1, "{} messages in flight", count);
            prop_assert_eq!(state.is_in_flight(), count == 1);
        }
    }

    // Invariant 2: final messages never change; in-flight content only grows
    #[test]
    fn prop_content_is_append_only(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ChatState::new();
        let mut seen: HashMap<String, (String, bool)> = HashMap::new();

        for step in steps {
            let input = input_for(&state, step);
            let _ = state.transition(input);

            for message in state.conversation().messages() {
                let content = message.content().to_string();
                let is_final = message.status().is_final();
                if let Some((before, was_final)) = seen.get(message.id()) {
                    if *was_final {
                        prop_assert_eq!(before, &content, "final message changed");
                        prop_assert!(is_final, "final message became in flight");
                    } else {
                        prop_assert!(content.starts_with(before.as_str()), "content was rewritten");
                    }
                }
                seen.insert(message.id().to_string(), (content, is_final));
            }
        }
    }

    // Invariant 3: stale deliveries never mutate the conversation
    #[test]
    fn prop_stale_events_are_ignored(
        steps in proptest::collection::vec(arb_step(), 0..30),
        behind in 1u64..4,
        event in arb_stream_event(),
    ) {
        let mut state = ChatState::new();
        for step in steps {
            let input = input_for(&state, step);
            let _ = state.transition(input);
        }

        let before = state.conversation().clone();
        let generation = state.generation();
        let stale = Generation::new(generation.get().saturating_sub(behind));
        prop_assume!(stale != generation);

        let effects = state.apply_event(stale, event);
        prop_assert!(effects.is_empty());
        prop_assert_eq!(state.conversation(), &before);
        prop_assert_eq!(state.generation(), generation);
    }

    // Invariant 4: rejected inputs leave the state untouched
    #[test]
    fn prop_rejections_do_not_mutate(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ChatState::new();
        for step in steps {
            let before = state.conversation().clone();
            let generation = state.generation();
            let input = input_for(&state, step);
            if state.transition(input).is_err() {
                prop_assert_eq!(state.conversation(), &before);
                prop_assert_eq!(state.generation(), generation);
            }
        }
    }

    // Invariant 5: generations never go backwards
    #[test]
    fn prop_generation_is_monotonic(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ChatState::new();
        let mut last = state.generation();
        for step in steps {
            let input = input_for(&state, step);
            if let Ok(effects) = state.transition(input) {
                for effect in &effects {
                    if let Effect::OpenStream { generation, .. } = effect {
                        prop_assert!(*generation > last);
                        prop_assert_eq!(*generation, state.generation());
                    }
                }
            }
            prop_assert!(state.generation() >= last);
            last = state.generation();
        }
    }

    // Invariant 6: a reply's content is the concatenation of its fragments
    #[test]
    fn prop_reply_is_concatenation(
        text in "[a-z]{1,8}",
        fragments in proptest::collection::vec("[a-zA-Z0-9 ]{0,6}", 0..20),
        fail in any::<bool>(),
    ) {
        let mut state = ChatState::new();
        let effects = state.submit(&text).unwrap();
        prop_assert_eq!(effects.iter().filter(|e| e.opens_stream()).count(), 1);
        let generation = state.generation();

        for fragment in &fragments {
            state.apply_event(generation, StreamEvent::fragment(fragment.clone()));
        }
        let terminal = if fail { StreamEvent::failed("boom") } else { StreamEvent::Done };
        state.apply_event(generation, terminal);

        let reply = state.conversation().last().unwrap();
        prop_assert_eq!(reply.content(), fragments.concat());
        prop_assert_eq!(reply.status().is_final(), true);
        prop_assert_eq!(reply.error_reason().is_some(), fail);
    }

    // Invariant 7: submissions keep insertion order, user before assistant
    #[test]
    fn prop_messages_keep_insertion_order(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ChatState::new();
        let mut previous: Vec<String> = Vec::new();
        for step in steps {
            let cleared = matches!(step, Step::Clear);
            let input = input_for(&state, step);
            let _ = state.transition(input);

            let ids: Vec<String> = state
                .conversation()
                .messages()
                .iter()
                .map(|m| m.id().to_string())
                .collect();
            if !(cleared && ids.is_empty()) {
                prop_assert!(ids.starts_with(&previous), "existing messages were reordered");
            }
            previous = ids;

            for pair in state.conversation().messages().chunks(2) {
                prop_assert_eq!(pair[0].role(), crate::protocol::Role::User);
                if let Some(reply) = pair.get(1) {
                    prop_assert_eq!(reply.role(), crate::protocol::Role::Assistant);
                }
            }
        }
    }
}
