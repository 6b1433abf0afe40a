//! Property-based tests for the state store
//!
//! These tests verify the list and search invariants across arbitrary inputs.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_proverbs() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-zA-Z ,.']{0,30}", 0..8)
}

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<String>),
    Replace(Vec<String>),
    AddSearch(String),
    CompleteOne(usize),
    CompleteAll,
    Adopt(ClientState),
}

fn arb_client_state() -> impl Strategy<Value = ClientState> {
    (
        proptest::option::of(arb_proverbs()),
        proptest::option::of(prop_oneof![Just("english"), Just("spanish"), Just("")]),
    )
        .prop_map(|(proverbs, language)| ClientState {
            proverbs,
            language: language.map(str::to_string),
        })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_proverbs().prop_map(Op::Append),
        arb_proverbs().prop_map(Op::Replace),
        "[a-z ]{1,20}".prop_map(Op::AddSearch),
        (0usize..10).prop_map(Op::CompleteOne),
        Just(Op::CompleteAll),
        arb_client_state().prop_map(Op::Adopt),
    ]
}

fn apply(state: &mut AgentState, op: Op) {
    match op {
        Op::Append(items) => state.append_proverbs(items),
        Op::Replace(items) => state.replace_proverbs(items),
        Op::AddSearch(query) => {
            state.append_search(query);
        }
        Op::CompleteOne(index) => {
            state.complete_search(index);
        }
        Op::CompleteAll => {
            state.complete_all_searches();
        }
        Op::Adopt(client) => state.adopt_client_state(client),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Two appends concatenate in order with nothing lost
    #[test]
    fn prop_appends_concatenate(prior in arb_proverbs(), a in arb_proverbs(), b in arb_proverbs()) {
        let mut state = AgentState::default();
        state.replace_proverbs(prior.clone());
        state.append_proverbs(a.clone());
        state.append_proverbs(b.clone());

        let expected: Vec<String> = prior.into_iter().chain(a).chain(b).collect();
        prop_assert_eq!(state.proverbs, expected);
    }

    // Replace always yields exactly the new list
    #[test]
    fn prop_replace_is_exact(ops in proptest::collection::vec(arb_op(), 0..12), x in arb_proverbs()) {
        let mut state = AgentState::default();
        for op in ops {
            apply(&mut state, op);
        }
        state.replace_proverbs(x.clone());
        prop_assert_eq!(state.proverbs, x);
    }

    // n searches added grows the list by exactly n pending entries
    #[test]
    fn prop_add_search_appends_one_each(
        ops in proptest::collection::vec(arb_op(), 0..12),
        queries in proptest::collection::vec("[a-z]{1,10}", 0..6)
    ) {
        let mut state = AgentState::default();
        for op in ops {
            apply(&mut state, op);
        }
        let prior = state.searches.len();
        for q in &queries {
            state.append_search(q.clone());
        }
        prop_assert_eq!(state.searches.len(), prior + queries.len());
        for (search, q) in state.searches[prior..].iter().zip(&queries) {
            prop_assert_eq!(&search.query, q);
            prop_assert!(!search.done);
        }
    }

    // Searches are never dropped and done never reverts, under any sequence
    #[test]
    fn prop_searches_monotonic(ops in proptest::collection::vec(arb_op(), 0..25)) {
        let mut state = AgentState::default();
        for op in ops {
            let before = state.searches.clone();
            apply(&mut state, op);

            prop_assert!(state.searches.len() >= before.len());
            for (old, new) in before.iter().zip(&state.searches) {
                prop_assert_eq!(&old.query, &new.query);
                prop_assert!(!old.done || new.done, "search reverted to pending");
            }
        }
    }

    // Fields missing from a client write-back are left alone
    #[test]
    fn prop_adopt_keeps_missing_fields(
        ops in proptest::collection::vec(arb_op(), 0..12),
        client in arb_client_state()
    ) {
        let mut state = AgentState::with_language("spanish");
        for op in ops {
            apply(&mut state, op);
        }
        let before = state.clone();
        state.adopt_client_state(client.clone());

        match client.proverbs {
            Some(proverbs) => prop_assert_eq!(&state.proverbs, &proverbs),
            None => prop_assert_eq!(&state.proverbs, &before.proverbs),
        }
        match client.language.as_deref() {
            Some(language) if !language.is_empty() => prop_assert_eq!(state.language.as_str(), language),
            _ => prop_assert_eq!(&state.language, &before.language),
        }
    }

    // Completing everything twice is the same as once
    #[test]
    fn prop_complete_all_idempotent(ops in proptest::collection::vec(arb_op(), 0..15)) {
        let mut state = AgentState::default();
        for op in ops {
            apply(&mut state, op);
        }
        state.complete_all_searches();
        let once = state.clone();
        prop_assert_eq!(state.complete_all_searches(), 0);
        prop_assert_eq!(state, once);
    }
}
