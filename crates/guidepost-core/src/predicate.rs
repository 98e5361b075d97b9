// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Eligibility predicate: key/type filters plus URL allow/block rules.
//!
//! Rule-set resolution (both structured rules and compiled patterns):
//!
//! | rule set     | nothing matches | allow matches | block matches |
//! |--------------|-----------------|---------------|---------------|
//! | empty        | pass            | –             | –             |
//! | block only   | pass            | –             | fail          |
//! | allow only   | fail            | pass          | –             |
//! | mixed        | fail            | pass          | fail          |
//!
//! Without a location the URL dimension passes.

use std::borrow::Cow;

use guidepost_proto::{ActivationRule, Directive, Guide, RuleOperator, RuleVariable};
use tracing::debug;
use url::Url;

use crate::guide::LocalGuide;
use crate::url_pattern::UrlPattern;

/// Optional key/type restriction supplied by a view asking what to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GuideFilter {
    /// Exact guide key.
    pub key: Option<String>,
    /// Exact guide type.
    pub guide_type: Option<String>,
}

impl GuideFilter {
    /// Filter that accepts every guide.
    pub fn any() -> Self {
        Self::default()
    }

    /// Filter on a guide key.
    pub fn by_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            guide_type: None,
        }
    }

    /// Filter on a guide type.
    pub fn by_type(guide_type: impl Into<String>) -> Self {
        Self {
            key: None,
            guide_type: Some(guide_type.into()),
        }
    }

    /// An absent criterion passes.
    pub fn matches(&self, guide: &Guide) -> bool {
        self.key.as_deref().is_none_or(|k| k == guide.key)
            && self
                .guide_type
                .as_deref()
                .is_none_or(|t| t == guide.guide_type)
    }
}

/// Pathname of a location href. Relative hrefs resolve against a dummy origin.
pub fn location_pathname(href: &str) -> Option<String> {
    let parsed = Url::parse(href).or_else(|_| {
        Url::parse("http://localhost/").and_then(|base| base.join(href))
    });
    match parsed {
        Ok(url) => Some(url.path().to_string()),
        Err(err) => {
            debug!(href, %err, "location is not a url; url rules skipped");
            None
        }
    }
}

/// Whether a structured rule's test holds for `pathname`.
pub fn rule_matches(rule: &ActivationRule, pathname: &str) -> bool {
    if rule.variable != RuleVariable::Pathname {
        return false;
    }
    match rule.operator {
        RuleOperator::EqualTo => {
            let argument = if rule.argument.starts_with('/') {
                Cow::Borrowed(rule.argument.as_str())
            } else {
                Cow::Owned(format!("/{}", rule.argument))
            };
            pathname == argument
        }
        RuleOperator::Contains => pathname.contains(rule.argument.as_str()),
    }
}

/// Fold `(directive, matched)` verdicts into pass/fail per the resolution table.
pub fn resolve_rule_set(verdicts: impl IntoIterator<Item = (Directive, bool)>) -> bool {
    let mut any_rule = false;
    let mut has_allow = false;
    let mut allowed = false;
    for (directive, matched) in verdicts {
        any_rule = true;
        match directive {
            Directive::Block if matched => return false,
            Directive::Block => {}
            Directive::Allow => {
                has_allow = true;
                allowed |= matched;
            }
        }
    }
    if !any_rule || allowed {
        return true;
    }
    !has_allow
}

/// Evaluate structured rules against an optional pathname.
pub fn evaluate_rules(rules: &[ActivationRule], pathname: Option<&str>) -> bool {
    let Some(pathname) = pathname else {
        return true;
    };
    resolve_rule_set(
        rules
            .iter()
            .map(|rule| (rule.directive, rule_matches(rule, pathname))),
    )
}

/// Evaluate compiled patterns against an optional pathname.
pub fn evaluate_patterns(patterns: &[UrlPattern], pathname: Option<&str>) -> bool {
    let Some(pathname) = pathname else {
        return true;
    };
    resolve_rule_set(
        patterns
            .iter()
            .map(|pattern| (pattern.directive(), pattern.is_match(pathname))),
    )
}

/// URL dimension only. Compiled patterns win over structured rules when both exist.
pub fn url_eligible(guide: &LocalGuide, pathname: Option<&str>) -> bool {
    if guide.url_patterns().is_empty() {
        evaluate_rules(&guide.activation_url_rules, pathname)
    } else {
        evaluate_patterns(guide.url_patterns(), pathname)
    }
}

/// Full predicate: filter and URL rules.
pub fn is_eligible(guide: &LocalGuide, filter: &GuideFilter, pathname: Option<&str>) -> bool {
    filter.matches(guide) && url_eligible(guide, pathname)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use guidepost_proto::RawUrlPattern;

    fn rule(directive: Directive, operator: RuleOperator, argument: &str) -> ActivationRule {
        ActivationRule {
            directive,
            variable: RuleVariable::Pathname,
            operator,
            argument: argument.into(),
        }
    }

    fn allow_eq(arg: &str) -> ActivationRule {
        rule(Directive::Allow, RuleOperator::EqualTo, arg)
    }

    fn block_eq(arg: &str) -> ActivationRule {
        rule(Directive::Block, RuleOperator::EqualTo, arg)
    }

    fn compiled(rules: &[ActivationRule]) -> Vec<UrlPattern> {
        rules
            .iter()
            .map(|r| {
                UrlPattern::compile(&RawUrlPattern {
                    directive: r.directive,
                    pathname: r.argument.clone(),
                })
            })
            .collect()
    }

    #[test]
    fn resolution_table_holds_for_rules_and_patterns() {
        let at = Some("/home");
        let cases: Vec<(&str, Vec<ActivationRule>, bool)> = vec![
            ("empty", vec![], true),
            ("block-only no match", vec![block_eq("/admin")], true),
            ("block-only match", vec![block_eq("/home")], false),
            ("allow-only no match", vec![allow_eq("/admin")], false),
            ("allow-only match", vec![allow_eq("/home")], true),
            (
                "mixed no match",
                vec![allow_eq("/admin"), block_eq("/settings")],
                false,
            ),
            (
                "mixed allow match",
                vec![allow_eq("/home"), block_eq("/settings")],
                true,
            ),
            (
                "mixed block match",
                vec![allow_eq("/home"), block_eq("/home")],
                false,
            ),
        ];
        for (name, rules, expected) in cases {
            assert_eq!(evaluate_rules(&rules, at), expected, "rules: {name}");
            assert_eq!(
                evaluate_patterns(&compiled(&rules), at),
                expected,
                "patterns: {name}"
            );
        }
    }

    #[test]
    fn missing_location_skips_url_rules() {
        assert!(evaluate_rules(&[allow_eq("/only-here")], None));
        assert!(evaluate_patterns(&compiled(&[allow_eq("/only-here")]), None));
    }

    #[test]
    fn equal_to_normalizes_leading_slash_and_contains_is_substring() {
        assert!(rule_matches(&allow_eq("dashboard"), "/dashboard"));
        let contains = rule(Directive::Allow, RuleOperator::Contains, "settings");
        assert!(rule_matches(&contains, "/account/settings/billing"));
        assert!(!rule_matches(&contains, "/account"));
    }

    #[test]
    fn unsupported_variables_never_match() {
        let mut r = allow_eq("/home");
        r.variable = RuleVariable::Unsupported;
        assert!(!rule_matches(&r, "/home"));
    }

    #[test]
    fn location_pathname_accepts_absolute_and_relative_hrefs() {
        assert_eq!(
            location_pathname("https://x.com/dashboard?tab=1#top").as_deref(),
            Some("/dashboard")
        );
        assert_eq!(location_pathname("/settings").as_deref(), Some("/settings"));
    }

    #[test]
    fn filter_absence_passes() {
        let guide: Guide = serde_json::from_value(serde_json::json!({
            "id": "1", "key": "g1", "channel_id": "c", "type": "banner",
            "inserted_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(GuideFilter::any().matches(&guide));
        assert!(GuideFilter::by_type("banner").matches(&guide));
        assert!(!GuideFilter::by_type("card").matches(&guide));
        assert!(!GuideFilter::by_key("g2").matches(&guide));
    }
}
