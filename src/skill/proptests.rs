//! Property-based tests for request dispatch
//!
//! These tests verify routing invariants hold across handler orders and
//! arbitrary slot values.

use super::handlers::{FALLBACK_INTENT, HELP_INTENT, STOP_INTENT};
use super::test_support::*;
use super::tuner::{GuitarString, SELECTED_STRING_KEY, USAGE_COUNT_KEY};
use super::*;
use crate::envelope::RequestEnvelope;
use crate::session::AttributeValue;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn case(
    handler: impl RequestHandler + 'static,
    envelope: RequestEnvelope,
) -> (Arc<dyn RequestHandler>, RequestEnvelope) {
    (Arc::new(handler), envelope)
}

/// Every handler except the reflector, with a request only it accepts
fn specific_cases() -> Vec<(Arc<dyn RequestHandler>, RequestEnvelope)> {
    vec![
        case(LaunchHandler, launch()),
        case(HelpHandler, intent(HELP_INTENT)),
        case(CancelAndStopHandler, intent(STOP_INTENT)),
        case(ChooseStringHandler, intent_with_string("ChooseString", "A")),
        case(
            PlayReferenceHandler::new(audio_base()),
            intent_with_string("PlayReference", "B"),
        ),
        case(CheckTuneHandler, intent("CheckTune")),
        case(TrackUsageHandler, intent("TrackUsage")),
        case(FallbackHandler, intent(FALLBACK_INTENT)),
        case(SessionEndedHandler, session_ended()),
    ]
}

const CASE_COUNT: usize = 9;

fn arb_order() -> impl Strategy<Value = Vec<usize>> {
    Just((0..CASE_COUNT).collect::<Vec<_>>()).prop_shuffle()
}

fn arb_invalid_string() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,12}".prop_filter("must not name a supported string", |s| {
        s.parse::<GuitarString>().is_err()
    })
}

fn arb_unknown_intent() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{2,15}".prop_filter("must not be a registered intent", |s| {
        !matches!(
            s.as_str(),
            "ChooseString" | "PlayReference" | "CheckTune" | "TrackUsage"
        )
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn specific_handler_wins_in_any_order(order in arb_order(), target in 0..CASE_COUNT) {
        let cases = specific_cases();
        prop_assert_eq!(cases.len(), CASE_COUNT);

        let skill = Skill::builder()
            .add_request_handlers(order.iter().map(|&i| Arc::clone(&cases[i].0)))
            .add_request_handler(IntentReflectorHandler)
            .build();

        let (handler, envelope) = &cases[target];
        let expected = handler
            .handle(envelope, &mut SessionAttributes::new())
            .expect("specific handler succeeds");
        let response = skill.dispatch(envelope, &mut SessionAttributes::new());

        prop_assert_eq!(response, expected);
    }

    #[test]
    fn invalid_choice_never_changes_selection(value in arb_invalid_string()) {
        let skill = Skill::tuner(audio_base());
        let mut attrs = SessionAttributes::new();
        attrs.set(SELECTED_STRING_KEY, "G");

        let response = skill.dispatch(&intent_with_string("ChooseString", &value), &mut attrs);

        prop_assert_eq!(attrs.get_str(SELECTED_STRING_KEY), Some("G"));
        prop_assert!(response.reprompt.is_some());
        prop_assert_eq!(response.should_end_session, Some(false));
    }

    #[test]
    fn usage_count_matches_call_count(calls in 1usize..20) {
        let skill = Skill::tuner(audio_base());
        let mut attrs = SessionAttributes::new();

        for _ in 0..calls {
            skill.dispatch(&intent("TrackUsage"), &mut attrs);
        }

        let expected = i64::try_from(calls).expect("small count");
        prop_assert_eq!(attrs.get(USAGE_COUNT_KEY), Some(&AttributeValue::Integer(expected)));
    }

    #[test]
    fn unmatched_intent_goes_to_error_handler(name in arb_unknown_intent()) {
        let skill = Skill::builder()
            .add_request_handlers(specific_cases().into_iter().map(|(h, _)| h))
            .build();
        let mut attrs = SessionAttributes::new();
        attrs.set(SELECTED_STRING_KEY, "D");

        let response = skill.dispatch(&intent(&name), &mut attrs);

        prop_assert_eq!(
            response.speech.as_deref(),
            Some("Sorry, I had trouble doing what you asked. Please try again.")
        );
        prop_assert_eq!(response.should_end_session, Some(false));
        prop_assert_eq!(attrs.get_str(SELECTED_STRING_KEY), Some("D"));
    }
}
