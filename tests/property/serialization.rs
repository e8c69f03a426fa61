//! Property-based tests for the envelope codec and identifier generation.
//!
//! Uses proptest to verify:
//! 1. Arbitrary payload fields survive an encode → decode round-trip
//!    unaltered alongside the relay-managed `target` and `sender` fields.
//! 2. Stamping `sender` never disturbs any other field.
//! 3. Arbitrary text never causes a panic in `decode` (returns `Err` or a
//!    valid envelope).
//! 4. Generated identifiers always stay in the base36 alphabet.

use proptest::prelude::*;
use serde_json::{Map, Value};

use peerlink_proto::{ClientId, Envelope, envelope};

/// Strategy for generating identifier-like strings.
fn arb_id() -> impl Strategy<Value = ClientId> {
    "[0-9a-z]{1,12}".prop_map(|s| ClientId::from(s.as_str()))
}

/// Strategy for generating arbitrary JSON leaf values.
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[^\x00]{0,64}".prop_map(Value::from),
    ]
}

/// Strategy for generating free-form payload maps, excluding the keys the
/// relay manages.
fn arb_payload() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-zA-Z][a-zA-Z0-9_]{0,15}", arb_leaf(), 0..8).prop_map(
        |entries| {
            entries
                .into_iter()
                .filter(|(k, _)| k != "target" && k != "sender")
                .collect()
        },
    )
}

/// Strategy for generating arbitrary envelopes.
fn arb_envelope() -> impl Strategy<Value = Envelope> {
    (arb_id(), prop::option::of(arb_id()), arb_payload()).prop_map(
        |(target, sender, rest)| Envelope {
            target,
            sender,
            rest,
        },
    )
}

proptest! {
    #[test]
    fn envelope_round_trip(original in arb_envelope()) {
        let text = envelope::encode(&original).unwrap();
        let decoded = envelope::decode(&text).unwrap();
        prop_assert_eq!(original, decoded);
    }

    #[test]
    fn stamping_sender_preserves_payload(mut env in arb_envelope(), sender in arb_id()) {
        let before = env.rest.clone();
        let target = env.target.clone();
        env.sender = Some(sender.clone());
        let decoded = envelope::decode(&envelope::encode(&env).unwrap()).unwrap();
        prop_assert_eq!(decoded.sender, Some(sender));
        prop_assert_eq!(decoded.target, target);
        prop_assert_eq!(decoded.rest, before);
    }

    #[test]
    fn decode_never_panics(text in ".{0,256}") {
        let _ = envelope::decode(&text);
    }

    #[test]
    fn generated_ids_stay_in_alphabet(_seed in any::<u8>()) {
        let id = ClientId::generate();
        prop_assert_eq!(id.as_str().len(), 7);
        prop_assert!(id.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
