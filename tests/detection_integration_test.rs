//! Integration tests for the detection pipeline with conversational text

use cloak::detection::PiiDetector;
use cloak::domain::PiiType;
use test_case::test_case;

fn detector() -> PiiDetector {
    PiiDetector::new().expect("default detector")
}

#[test_case("email me at john.doe@example.com", PiiType::Email ; "email")]
#[test_case("call me at (555) 123-4567", PiiType::Phone ; "parenthesized phone")]
#[test_case("call 555-123-4567 anytime", PiiType::Phone ; "hyphenated phone")]
#[test_case("charged to card 4111-1111-1111-1111", PiiType::CreditCard ; "grouped card")]
#[test_case("my ssn is 123-45-6789", PiiType::Ssn ; "ssn")]
#[test_case("ship to 123 Main Street please", PiiType::Address ; "street address")]
#[test_case("about order ORD-ABC123456", PiiType::OrderId ; "order reference")]
#[test_case("tracking says 1Z999AA10123456784", PiiType::TrackingNumber ; "ups tracking")]
#[test_case("support ticket TKT-12345 is open", PiiType::TicketId ; "ticket reference")]
#[test_case("customer CUST-AB12 called in", PiiType::CustomerId ; "customer reference")]
#[test_case("login from 192.168.10.42", PiiType::IpAddress ; "ipv4")]
#[test_case("this is Dr. Jane Smith", PiiType::Name ; "titled name")]
#[test_case("zip code 94110 here", PiiType::ZipCode ; "zip with context")]
#[test_case("account number 123456789012", PiiType::AccountNumber ; "account with context")]
fn detects_category(text: &str, expected: PiiType) {
    let candidates = detector().detect(text);
    assert!(
        candidates.iter().any(|c| c.pii_type == expected),
        "expected {expected:?} in {candidates:?}"
    );
}

#[test_case("" ; "empty text")]
#[test_case("the weather is lovely today" ; "small talk")]
#[test_case("my package is late" ; "no identifiers")]
fn detects_nothing(text: &str) {
    assert!(detector().detect(text).is_empty());
}

#[test]
fn context_keyword_rescues_low_confidence_phone() {
    let d = detector();

    // Base phone confidence sits below the 0.7 default threshold; the word
    // "Call" inside the +/-50 char window lifts it above
    let with_context = d.detect("Call me at 555-123-4567");
    assert_eq!(with_context.len(), 1);
    assert_eq!(with_context[0].pii_type, PiiType::Phone);

    let without_context = d.detect("555-123-4567");
    assert!(without_context.is_empty());
}

#[test]
fn boosted_confidence_never_exceeds_one() {
    let candidates =
        detector().detect("email e-mail mail contact reach me: john@example.com please");
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].confidence <= 1.0);
}

#[test]
fn threshold_filter_drops_below_and_keeps_equal() {
    // Lowered to exactly the phone base confidence: the bare number is kept
    let lenient = PiiDetector::new().unwrap().with_confidence_threshold(0.65);
    assert_eq!(lenient.detect("555-123-4567").len(), 1);

    // Raised above everything the text can reach: nothing survives
    let strict = PiiDetector::new().unwrap().with_confidence_threshold(0.99);
    assert!(strict.detect("call 555-123-4567").is_empty());
}

#[test]
fn output_is_sorted_and_non_overlapping() {
    let text = "Email john@example.com, card 4111-1111-1111-1111, order ORD-ABC123456, \
                ip 10.0.0.1, call (555) 123-4567";
    let candidates = detector().detect(text);

    assert!(candidates.len() >= 4);
    for pair in candidates.windows(2) {
        assert!(pair[0].start < pair[1].start, "sorted by start offset");
        assert!(pair[0].end <= pair[1].start, "non-overlapping");
    }
}

#[test]
fn overlapping_digit_formats_resolve_to_highest_confidence() {
    // A 16-digit run is a credit card, not a bare account number or ZIP
    let candidates = detector().detect("payment card 4111111111111111 declined");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].pii_type, PiiType::CreditCard);
}

#[test]
fn detect_by_type_ignores_other_categories() {
    let d = detector();
    let text = "Email john@example.com about order ORD-ABC123456";

    let orders = d.detect_by_type(text, PiiType::OrderId);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].value, "ORD-ABC123456");

    let phones = d.detect_by_type(text, PiiType::Phone);
    assert!(phones.is_empty());
}

#[test]
fn contains_pii_fast_path_agrees_with_detect() {
    let d = detector();

    for text in [
        "email john@example.com",
        "call (555) 123-4567",
        "no identifiers at all",
        "",
    ] {
        assert_eq!(d.contains_pii(text), !d.detect(text).is_empty(), "{text:?}");
    }
}

#[test]
fn mask_pii_preserves_non_pii_text() {
    let d = detector();
    let masked = d.mask_pii("Email john@example.com about order ORD-ABC123456", '*');

    assert!(masked.starts_with("Email "));
    assert!(masked.contains(" about order "));
    assert!(!masked.contains("john@example.com"));
    assert!(!masked.contains("ORD-ABC123456"));
}
