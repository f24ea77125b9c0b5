//! Built-in rule sets
//!
//! The two AMDC blockers are versioned independently and deliberately not
//! merged: their token lists overlap but differ.

use crate::blocker::AppBlocker;
use crate::classifier::RequestClassifier;
use crate::error::RewriteError;
use crate::filter::HostnameMatcher;
use crate::mocker::ResponseMocker;
use crate::routing::{Route, RouteAction, RoutingTable, ScriptRegistry};

pub const AMDC_HOST: &str = "amdc.m.taobao.com";
pub const FAWVW_HOST: &str = "oneapp-api.faw-vw.com";

/// Blocked appkey shared by both AMDC rule sets
pub const BLOCKED_APPKEYS: &[&str] = &["23782110"];

/// Brand tokens of the generator-referenced AMDC script
pub const AMDC_BRAND_TOKENS: &[&str] = &[
    "amap",
    "alibaba",
    "cainiao",
    "hema",
    "moon",
    "%E5%A4%A9%E7%8C%AB",
    "%E9%97%B2%E9%B1%BC",
    "%E9%A3%9E%E7%8C%AA",
];

/// Brand tokens of the standalone AliAMDC script
pub const ALI_AMDC_BRAND_TOKENS: &[&str] = &[
    "AMapiPhone",
    "Alibaba",
    "Cainiao4iPhone",
    "Hema4iPhone",
    "%E6%B7%98%E5%AE%9D",
    "%E9%97%B2%E9%B1%BC",
    "%E9%A3%9E%E7%8C%AA%E6%97%85%E8%A1%8C",
];

/// `{"returnStatus":"SUCCEED","hasMore":false,"data":[]}`
pub const EMPTY_LIST_ENVELOPE: &str = r#"{"returnStatus":"SUCCEED","hasMore":false,"data":[]}"#;

/// `{"returnStatus":"SUCCEED","hasMore":false,"data":{}}`
pub const EMPTY_OBJECT_ENVELOPE: &str = r#"{"returnStatus":"SUCCEED","hasMore":false,"data":{}}"#;

const FAWVW_RULES: &[(&str, &str)] = &[
    (
        r"^https?://oneapp-api\.faw-vw\.com/search/firstPage/getPromptList/v1\?.*",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/benefits/benefitsCard/getInfo/v1\?.*",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/booth/getBoothList/v1\?.*showPositionCode=VWAPP_HOME_BUOY",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/booth/getBoothList/v1\?.*showPositionCode=VWAPP_(ICE|MEB)_(OPEN_SCREEN_ADS|CAR_ZHIHU_COLLEGE)",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/booth/getBoothList/v1\?.*showPositionCode=VWAPP_(ICE|MEB)_HOME_(OWNER_BANNER|PROSPECTS_BANNER|CUSTOM_BANNER|KONGO|CUSTOM_KONGO)",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/(customize/getCustomizePageName|recommend/getRecommendInfoFlows)/v1\?.*",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/(activity/getSquareActivityList|theme/getThemeList|post/getPostsByTags)/v1\?.*",
        EMPTY_LIST_ENVELOPE,
    ),
    (
        r"^https?://oneapp-api\.faw-vw\.com/content/(evaluate/getEvaluateCards|collection/getCollectionList)/v1\?.*",
        EMPTY_OBJECT_ENVELOPE,
    ),
];

pub fn amdc() -> Result<AppBlocker, RewriteError> {
    AppBlocker::new(AMDC_BRAND_TOKENS, BLOCKED_APPKEYS)
}

pub fn ali_amdc() -> Result<AppBlocker, RewriteError> {
    AppBlocker::new(ALI_AMDC_BRAND_TOKENS, BLOCKED_APPKEYS)
}

pub fn fawvw() -> Result<ResponseMocker, RewriteError> {
    FAWVW_RULES
        .iter()
        .try_fold(ResponseMocker::new(), |mocker, (pattern, body)| {
            mocker.with_rule(pattern, *body)
        })
}

/// AMDC blocking followed by FAW-VW mocking
pub fn builtin_classifier() -> Result<RequestClassifier, RewriteError> {
    Ok(RequestClassifier::new("builtin")
        .with_strategy(amdc()?)
        .with_strategy(fawvw()?))
}

/// Scripts addressable by name from a routing table
pub fn builtin_scripts() -> Result<ScriptRegistry, RewriteError> {
    let mut registry = ScriptRegistry::new();
    registry.register("AMDC", amdc()?);
    registry.register("AliAMDC", ali_amdc()?);
    Ok(registry)
}

/// Routes wiring the built-in scripts and mocks to their endpoints
pub fn builtin_routes() -> Result<RoutingTable, RewriteError> {
    let mut routes = vec![
        Route::new(
            r"^https?://amdc\.m\.taobao\.com/amdc/mobileDispatch$",
            RouteAction::script("AliAMDC"),
        )?,
        Route::new(r"^https?://amdc\.m\.taobao\.com", RouteAction::script("AMDC"))?,
    ];
    for (pattern, body) in FAWVW_RULES {
        routes.push(Route::new(pattern, RouteAction::json_mock(*body))?);
    }

    let mitm = HostnameMatcher::from_entries([AMDC_HOST, FAWVW_HOST]);
    Ok(RoutingTable::new(routes, mitm))
}
