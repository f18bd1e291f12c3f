use proptest::prelude::*;
use snomed_usage_loader::data::{
    BooleanFallback, ColumnType, Value, coerce_boolean, coerce_integer, coerce_value,
};
use snomed_usage_loader::period::{DEFAULT_DATA_PERIOD, extract_period};

#[test]
fn usage_examples() {
    assert_eq!(coerce_integer(Some("")), 0);
    assert_eq!(coerce_integer(Some("abc")), 0);
    assert_eq!(coerce_integer(Some("42")), 42);
    assert_eq!(coerce_integer(Some("-5")), -5);
    assert_eq!(coerce_integer(Some("99999999999999999999")), 0);
}

#[test]
fn flag_examples() {
    assert_eq!(coerce_boolean(Some("TRUE"), BooleanFallback::Null), Some(true));
    assert_eq!(coerce_boolean(Some("0"), BooleanFallback::Null), Some(false));
    assert_eq!(coerce_boolean(Some("maybe"), BooleanFallback::Null), None);
    assert_eq!(
        coerce_boolean(Some("maybe"), BooleanFallback::False),
        Some(false)
    );
}

#[test]
fn period_examples() {
    assert_eq!(extract_period("SNOMED_code_usage_2023-24_v1.txt"), "2023-24");
    assert_eq!(extract_period("usage_data.txt"), DEFAULT_DATA_PERIOD);
}

fn mixed_case(word: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
        word.chars()
            .zip(upper)
            .map(|(ch, up)| if up { ch.to_ascii_uppercase() } else { ch })
            .collect()
    })
}

proptest! {
    #[test]
    fn usage_is_never_null(raw in proptest::option::of(".{0,12}")) {
        let value = coerce_value(raw.as_deref(), ColumnType::Integer, BooleanFallback::Null);
        prop_assert!(matches!(value, Some(Value::Integer(_))));
    }

    #[test]
    fn integers_round_trip(number in any::<i64>()) {
        prop_assert_eq!(coerce_integer(Some(&number.to_string())), number);
    }

    #[test]
    fn true_tokens_ignore_case(token in prop_oneof![
        mixed_case("true"),
        mixed_case("yes"),
        Just("1".to_string()),
    ]) {
        prop_assert_eq!(coerce_boolean(Some(&token), BooleanFallback::Null), Some(true));
        prop_assert_eq!(coerce_boolean(Some(&token), BooleanFallback::False), Some(true));
    }

    #[test]
    fn false_tokens_ignore_case(token in prop_oneof![
        mixed_case("false"),
        mixed_case("no"),
        Just("0".to_string()),
    ]) {
        prop_assert_eq!(coerce_boolean(Some(&token), BooleanFallback::Null), Some(false));
    }

    #[test]
    fn other_flags_follow_the_fallback(token in "[a-z]{2,8}") {
        prop_assume!(!["true", "yes", "false", "no"].contains(&token.as_str()));
        prop_assert_eq!(coerce_boolean(Some(&token), BooleanFallback::Null), None);
        prop_assert_eq!(coerce_boolean(Some(&token), BooleanFallback::False), Some(false));
    }
}
