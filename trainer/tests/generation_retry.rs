//! Retry properties of the structured generation client.
//!
//! Drives `StructuredClient::generate` against a scripted completion and
//! counts upstream calls exactly.

use serde_json::Value;
use trainer::generate::{AttemptFailure, GenerationError, GenerationRequest, StructuredClient};
use trainer::io::completion::TransportError;
use trainer::io::prompt::Prompt;
use trainer::schema::{ArgumentWire, Schemas, ScoreWire};
use trainer::test_support::{ScriptedCompletion, argument_json, opponents_json, score_json};

fn request() -> GenerationRequest {
    GenerationRequest {
        prompt: Prompt {
            system: "You are a debate coach.".to_string(),
            user: "Motion: \"This House Would ban TikTok\".".to_string(),
        },
        max_tokens: 300,
        temperature: 0.7,
    }
}

#[test]
fn all_invalid_responses_make_exactly_max_attempts_calls() {
    let schemas = Schemas::builtin().expect("schemas");
    for max_attempts in 1..=4 {
        let completion = ScriptedCompletion::new((0..10).map(|i| format!("not json {i}")));
        let client = StructuredClient::new(&completion).expect("client");

        let err = client
            .generate::<ArgumentWire>(&request(), &schemas.argument, max_attempts)
            .unwrap_err();

        assert_eq!(completion.calls(), max_attempts as usize);
        let expected_raw = format!("not json {}", max_attempts - 1);
        assert_eq!(err.raw_response(), Some(expected_raw.as_str()));
        match err {
            GenerationError::Exhausted {
                schema,
                attempts,
                failure,
                ..
            } => {
                assert_eq!(schema, "argument");
                assert_eq!(attempts, max_attempts);
                assert!(matches!(failure, AttemptFailure::Parse(_)));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }
}

#[test]
fn third_attempt_succeeds_after_garbage_and_missing_fields() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::new([
        "not json".to_string(),
        r#"{"argument": "Only half an answer"}"#.to_string(),
        argument_json("valid"),
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let wire: ArgumentWire = client
        .generate(&request(), &schemas.argument, 3)
        .expect("third attempt succeeds");

    assert_eq!(wire.argument, "valid argument.");
    assert_eq!(completion.calls(), 3);
}

#[test]
fn prose_wrapped_json_is_extracted() {
    let schemas = Schemas::builtin().expect("schemas");
    let raw = format!(
        "Sure! Here is my assessment:\n{}\nLet me know if you want more detail.",
        score_json(7, 6, 8, 5)
    );
    let completion = ScriptedCompletion::new([raw]);
    let client = StructuredClient::new(&completion).expect("client");

    let score: ScoreWire = client
        .generate(&request(), &schemas.score, 3)
        .expect("score");

    assert_eq!(
        (score.logic, score.evidence, score.relevance, score.style),
        (7, 6, 8, 5)
    );
    assert_eq!(completion.calls(), 1);
}

#[test]
fn extraction_is_lossless_and_keeps_order() {
    let schemas = Schemas::builtin().expect("schemas");
    let body = opponents_json(&["first", "second", "third"]);
    let completion = ScriptedCompletion::new([format!("```json\n{body}\n```")]);
    let client = StructuredClient::new(&completion).expect("client");

    let value: Value = client
        .generate(&request(), &schemas.opponents, 1)
        .expect("opponents");

    let direct: Value = serde_json::from_str(&body).expect("direct parse");
    assert_eq!(value, direct);
    let titles: Vec<&str> = value
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|item| item["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["first title", "second title", "third title"]);
}

#[test]
fn wrong_opponent_count_is_retried() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::new([
        opponents_json(&["a", "b"]),
        opponents_json(&["a", "b", "c", "d"]),
        opponents_json(&["a", "b", "c"]),
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let wires: Vec<ArgumentWire> = client
        .generate(&request(), &schemas.opponents, 3)
        .expect("third attempt has three");

    assert_eq!(wires.len(), 3);
    assert_eq!(completion.calls(), 3);
}

#[test]
fn out_of_range_score_is_never_returned() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::new([
        score_json(11, 6, 8, 5),
        score_json(0, 6, 8, 5),
        r#"{"Logic":7,"Evidence":6,"Relevance":8,"Suggestion":"s"}"#.to_string(),
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let err = client
        .generate::<ScoreWire>(&request(), &schemas.score, 3)
        .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::Exhausted {
            failure: AttemptFailure::Validation(_),
            ..
        }
    ));
    assert_eq!(completion.calls(), 3);
}

#[test]
fn transport_errors_are_not_retried() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::with_results([
        Err(TransportError::Network("connection refused".to_string())),
        Ok(argument_json("unused")),
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let err = client
        .generate::<ArgumentWire>(&request(), &schemas.argument, 3)
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.raw_response().is_none());
    assert_eq!(completion.calls(), 1);
    assert_eq!(completion.remaining(), 1);
}

#[test]
fn blank_suggestion_is_retried_until_exhausted() {
    let schemas = Schemas::builtin().expect("schemas");
    let blank = r#"{"Logic":7,"Evidence":6,"Relevance":8,"Style":5,"Suggestion":"   "}"#;
    let completion = ScriptedCompletion::new([blank, blank, blank]);
    let client = StructuredClient::new(&completion).expect("client");

    let err = client
        .generate::<ScoreWire>(&request(), &schemas.score, 3)
        .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::Exhausted {
            failure: AttemptFailure::Validation(_),
            attempts: 3,
            ..
        }
    ));
    assert_eq!(err.raw_response(), Some(blank));
    assert_eq!(completion.calls(), 3);
}

#[test]
fn blank_argument_text_is_retried() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::new([
        r#"{"argument":"  ","evidence_hint":" ","famous_quote":"q"}"#.to_string(),
        argument_json("second"),
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let wire: ArgumentWire = client
        .generate(&request(), &schemas.argument, 3)
        .expect("second attempt succeeds");

    assert_eq!(wire.argument, "second argument.");
    assert_eq!(completion.calls(), 2);
}

#[test]
fn integral_float_rating_succeeds_first_time() {
    let schemas = Schemas::builtin().expect("schemas");
    let completion = ScriptedCompletion::new([
        r#"{"Logic":7.0,"Evidence":6,"Relevance":8,"Style":5.0,"Suggestion":"Use data."}"#,
    ]);
    let client = StructuredClient::new(&completion).expect("client");

    let score: ScoreWire = client
        .generate(&request(), &schemas.score, 3)
        .expect("score");

    assert_eq!((score.logic, score.style), (7, 5));
    assert_eq!(completion.calls(), 1);
}
