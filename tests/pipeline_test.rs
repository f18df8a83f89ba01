use std::sync::Arc;

use rodcheck::classifier::features;
use rodcheck::{
    classify_email, ClassifierError, EmailClassifier, Prediction, PredictionLabel,
    PredictionService, Store,
};

/// Errors unless the input carries a URL flag marker, so any inference path
/// that skips the preprocessor fails loudly here.
struct StrictFlagClassifier;

impl EmailClassifier for StrictFlagClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.starts_with(features::URL_FLAG_PRESENT) {
            Ok(Prediction::from_logits([-1.0, 1.0]))
        } else if text.starts_with(features::URL_FLAG_ABSENT) {
            Ok(Prediction::from_logits([1.0, -1.0]))
        } else {
            Err(ClassifierError::ValidationError(
                "input reached the model without a URL flag marker".into(),
            ))
        }
    }
}

#[test]
fn url_flag_property_holds_across_inputs() {
    let with_url = [
        "click http://example.com now",
        "HTTPS://caps.example/path",
        "nested text ... see https://a.b/c?d=e ... more",
        "http://",
        "prefix text http://example.com suffix",
    ];
    let without_url = [
        "",
        "Did you finish work last week?",
        "meet at example.com tomorrow",
        "the http protocol is old",
        "ftp://not-a-web-link.example",
        "URL_FLAG_1 spoofed marker without a link",
    ];

    for text in with_url {
        assert!(features::has_url(text), "expected URL in: {:?}", text);
        assert!(features::with_url_flag(text).starts_with("URL_FLAG_1 "));
    }
    for text in without_url {
        assert!(!features::has_url(text), "unexpected URL in: {:?}", text);
        assert!(features::with_url_flag(text).starts_with("URL_FLAG_0 "));
    }
}

#[test]
fn classify_email_always_preprocesses() {
    let prediction = classify_email(&StrictFlagClassifier, "plain email body").unwrap();
    assert_eq!(prediction.label, PredictionLabel::Legit);

    let prediction =
        classify_email(&StrictFlagClassifier, "reset at https://evil.example").unwrap();
    assert_eq!(prediction.label, PredictionLabel::Phishing);
}

#[tokio::test]
async fn service_pipeline_end_to_end() {
    let store = Store::new();
    let service = PredictionService::new(Arc::new(StrictFlagClassifier), store.clone(), true);

    let emails = [
        ("Did you finish work last week?", PredictionLabel::Legit),
        ("verify: http://evil.example", PredictionLabel::Phishing),
        ("lunch tomorrow?", PredictionLabel::Legit),
        ("account locked https://evil.example", PredictionLabel::Phishing),
    ];

    for (email, expected) in emails {
        let label = service.predict("alice", email).await.unwrap();
        assert_eq!(label, expected, "for email {:?}", email);
    }

    let counts = store.counts_for_user("alice").await;
    assert_eq!(counts.total, 4);
    assert_eq!(counts.legit, 2);
    assert_eq!(counts.phishing, 2);
    assert_eq!(counts.legit + counts.phishing, counts.total);
}

#[tokio::test]
async fn repeated_input_is_deterministic() {
    let service = PredictionService::new(Arc::new(StrictFlagClassifier), Store::new(), false);
    let email = "your invoice is at https://billing.example/inv/42";

    let first = service.predict("alice", email).await.unwrap();
    for _ in 0..10 {
        assert_eq!(service.predict("alice", email).await.unwrap(), first);
    }
}
