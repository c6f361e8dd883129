use std::collections::BTreeMap;

use chatgraph_graph::builder::{BuildStats, apply};
use chatgraph_graph::{BuildOptions, InteractionGraph, degrees, remove_isolates};
use chatgraph_types::report::DegreeKind;
use chatgraph_types::{InteractionEvent, MessageId, UserId};
use proptest::prelude::*;

const USERS: i64 = 6;

fn event_strategy() -> impl Strategy<Value = InteractionEvent> {
    (0..USERS, 0..USERS, 0i64..50, any::<bool>()).prop_map(|(from, to, msg, reply)| {
        let (from, to, message) = (UserId(from), UserId(to), MessageId(msg));
        if reply {
            InteractionEvent::Reply { from, to, message }
        } else {
            InteractionEvent::Reaction { from, to, message }
        }
    })
}

fn fold(events: &[InteractionEvent]) -> BTreeMap<(UserId, UserId), u32> {
    let mut graph = InteractionGraph::new();
    for id in 0..USERS {
        graph.add_user(UserId(id));
    }
    let mut stats = BuildStats::default();
    for event in events {
        apply(&mut graph, event, &BuildOptions::default(), &mut stats).unwrap();
    }
    graph.edge_weights()
}

proptest! {
    #[test]
    fn order_does_not_change_weights(
        (events, shuffled) in prop::collection::vec(event_strategy(), 0..60)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        prop_assert_eq!(fold(&events), fold(&shuffled));
    }

    #[test]
    fn weight_equals_event_count(events in prop::collection::vec(event_strategy(), 0..60)) {
        let weights = fold(&events);
        for (&(a, b), &w) in &weights {
            let expected = events
                .iter()
                .filter(|e| {
                    let (f, t) = e.endpoints();
                    f != t && (f.min(t), f.max(t)) == (a, b)
                })
                .count();
            prop_assert_eq!(w as usize, expected);
        }
        prop_assert!(weights.keys().all(|(a, b)| a != b));
    }

    #[test]
    fn isolate_removal_keeps_other_degrees(events in prop::collection::vec(event_strategy(), 0..30)) {
        let mut graph = InteractionGraph::new();
        for id in 0..USERS {
            graph.add_user(UserId(id));
        }
        let mut stats = BuildStats::default();
        for event in &events {
            apply(&mut graph, event, &BuildOptions::default(), &mut stats).unwrap();
        }

        let all = degrees(&graph, DegreeKind::Weighted);
        let kept = remove_isolates(&all);
        prop_assert_eq!(kept.len(), all.values().filter(|&&d| d > 0).count());
        for (user, d) in &kept {
            prop_assert!(*d > 0);
            prop_assert_eq!(all[user], *d);
        }
    }
}
