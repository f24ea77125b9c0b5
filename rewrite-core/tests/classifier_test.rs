use proptest::prelude::*;
use rewrite_core::presets::{self, EMPTY_LIST_ENVELOPE, EMPTY_OBJECT_ENVELOPE};
use rewrite_core::{ClassificationResult, Classifier, Completion, RequestDescriptor};

const DISPATCH_URL: &str = "https://amdc.m.taobao.com/amdc/mobileDispatch";

fn not_found() -> ClassificationResult {
    ClassificationResult::block("HTTP/1.1 404 Not Found", "Not Found")
}

#[test]
fn test_brand_token_blocks_regardless_of_url() {
    let classifier = presets::builtin_classifier().unwrap();

    for url in [
        DISPATCH_URL,
        "https://amdc.m.taobao.com/amdc/mobileDispatch?appkey=12345",
        "https://example.com/anything",
        "",
    ] {
        let req = RequestDescriptor::new(url)
            .with_header("User-Agent", "Mozilla/5.0 (iPhone) AliApp(TB/10.1) alibaba");
        assert_eq!(classifier.classify(&req), not_found(), "url {}", url);
    }
}

#[test]
fn test_blocked_appkey_with_benign_user_agent() {
    let classifier = presets::builtin_classifier().unwrap();
    let req = RequestDescriptor::new(format!("{}?appkey=23782110&deviceId=1", DISPATCH_URL))
        .with_header("User-Agent", "Mozilla/5.0");
    assert_eq!(classifier.classify(&req), not_found());
}

#[test]
fn test_benign_request_passes_without_replacement() {
    let classifier = presets::builtin_classifier().unwrap();
    let req = RequestDescriptor::new(format!("{}?appkey=12345", DISPATCH_URL))
        .with_header("User-Agent", "Mozilla/5.0");
    assert_eq!(classifier.classify(&req), ClassificationResult::pass());
}

#[test]
fn test_benefits_card_gets_list_envelope() {
    let classifier = presets::builtin_classifier().unwrap();
    let req = RequestDescriptor::new(
        "https://oneapp-api.faw-vw.com/benefits/benefitsCard/getInfo/v1?x=1",
    );
    assert_eq!(
        classifier.classify(&req),
        ClassificationResult::replace_body(r#"{"returnStatus":"SUCCEED","hasMore":false,"data":[]}"#)
    );
    assert_eq!(EMPTY_LIST_ENVELOPE, r#"{"returnStatus":"SUCCEED","hasMore":false,"data":[]}"#);
}

#[test]
fn test_evaluate_cards_gets_object_envelope() {
    let classifier = presets::builtin_classifier().unwrap();
    let req = RequestDescriptor::new(
        "https://oneapp-api.faw-vw.com/content/evaluate/getEvaluateCards/v1?x=1",
    );
    assert_eq!(
        classifier.classify(&req),
        ClassificationResult::replace_body(r#"{"returnStatus":"SUCCEED","hasMore":false,"data":{}}"#)
    );
    assert_eq!(EMPTY_OBJECT_ENVELOPE, r#"{"returnStatus":"SUCCEED","hasMore":false,"data":{}}"#);
}

#[test]
fn test_mocked_endpoint_requires_query() {
    let classifier = presets::builtin_classifier().unwrap();
    let req = RequestDescriptor::new("https://oneapp-api.faw-vw.com/benefits/benefitsCard/getInfo/v1");
    assert!(classifier.classify(&req).is_passthrough());
}

#[test]
fn test_user_agent_case_insensitive() {
    for preset in [presets::amdc().unwrap(), presets::ali_amdc().unwrap()] {
        for ua in ["ALIBABA/1.0", "alibaba/1.0", "AliBaba/1.0"] {
            let req = RequestDescriptor::new(DISPATCH_URL).with_header("User-Agent", ua);
            assert!(preset.classify(&req).is_block(), "ua {}", ua);
        }
    }
}

#[test]
fn test_header_name_case_insensitive() {
    let classifier = presets::amdc().unwrap();
    for name in ["User-Agent", "user-agent", "USER-AGENT"] {
        let req = RequestDescriptor::new(DISPATCH_URL).with_header(name, "Cainiao4iPhone/6.0");
        assert!(classifier.classify(&req).is_block(), "header {}", name);
    }
}

#[test]
fn test_missing_headers_and_malformed_url_pass() {
    let classifier = presets::builtin_classifier().unwrap();
    for url in ["", "not a url", "appkey=", "https://", "%%%"] {
        assert!(classifier.classify(&RequestDescriptor::new(url)).is_passthrough());
    }
}

#[test]
fn test_completion_for_host() {
    let classifier = presets::builtin_classifier().unwrap();
    let blocked = RequestDescriptor::new(DISPATCH_URL).with_header("User-Agent", "Hema/5");
    assert_eq!(
        Completion::from(classifier.classify(&blocked)).to_json(),
        r#"{"status":"HTTP/1.1 404 Not Found","body":"Not Found"}"#
    );

    let benign = RequestDescriptor::new(DISPATCH_URL).with_header("User-Agent", "curl/8");
    assert_eq!(Completion::from(classifier.classify(&benign)).to_json(), "{}");
}

#[test]
fn test_classifier_shared_across_threads() {
    let classifier = std::sync::Arc::new(presets::builtin_classifier().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let classifier = classifier.clone();
            std::thread::spawn(move || {
                let req = RequestDescriptor::new(format!("{}?appkey={}", DISPATCH_URL, 23782110 + i));
                classifier.classify(&req)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results[0].is_block());
    assert!(results[1..].iter().all(ClassificationResult::is_passthrough));
}

proptest! {
    /// Classification is total: any URL and user agent yields a result
    #[test]
    fn prop_classify_never_panics(url in ".*", ua in ".*") {
        let classifier = presets::builtin_classifier().unwrap();
        let req = RequestDescriptor::new(url).with_header("User-Agent", ua);
        let _ = classifier.classify(&req);
    }

    /// Same descriptor, same result
    #[test]
    fn prop_classify_idempotent(url in "https?://[a-z.]{1,20}/[a-zA-Z/?=&0-9]{0,40}", ua in "[ -~]{0,40}") {
        let classifier = presets::builtin_classifier().unwrap();
        let req = RequestDescriptor::new(url).with_header("User-Agent", ua);
        prop_assert_eq!(classifier.classify(&req), classifier.classify(&req));
    }

    /// Blocked brand tokens block in any letter case
    #[test]
    fn prop_brand_token_any_case(prefix in "[a-z ]{0,10}", upper in any::<bool>()) {
        let token = if upper { "ALIBABA" } else { "alibaba" };
        let req = RequestDescriptor::new(DISPATCH_URL)
            .with_header("User-Agent", format!("{}{}", prefix, token));
        prop_assert!(presets::amdc().unwrap().classify(&req).is_block());
    }

    /// Unlisted appkeys with a neutral user agent pass
    #[test]
    fn prop_unlisted_appkey_passes(key in 0u32..23782110u32) {
        let req = RequestDescriptor::new(format!("{}?appkey={}", DISPATCH_URL, key))
            .with_header("User-Agent", "Mozilla/5.0");
        prop_assert!(presets::amdc().unwrap().classify(&req).is_passthrough());
    }
}
