use std::sync::Once;

use clipnote_core::{
    resolve_instruction, DomainRule, InstructionTemplate, FALLBACK_INSTRUCTION,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(clip_logging::initialize_for_tests);
}

fn template(id: &str, content: &str) -> InstructionTemplate {
    InstructionTemplate {
        id: id.to_string(),
        name: id.to_string(),
        content: content.to_string(),
    }
}

fn rule(pattern: &str, template_id: &str) -> DomainRule {
    DomainRule {
        id: format!("rule-{pattern}"),
        domain_pattern: pattern.to_string(),
        template_id: template_id.to_string(),
    }
}

#[test]
fn resolution_is_deterministic() {
    init_logging();
    let templates = vec![template("default", "summarize {content}"), template("t1", "short {content}")];
    let rules = vec![rule("*.a.com", "t1")];

    let first = resolve_instruction(Some("x.a.com"), &rules, &templates, "default");
    for _ in 0..5 {
        assert_eq!(
            resolve_instruction(Some("x.a.com"), &rules, &templates, "default"),
            first
        );
    }
    assert_eq!(first, "short {content}");
}

#[test]
fn first_matching_rule_wins_regardless_of_specificity() {
    init_logging();
    let templates = vec![
        template("default", "d {content}"),
        template("t1", "one {content}"),
        template("t2", "two {content}"),
    ];
    let rules = vec![rule("*.a.com", "t1"), rule("a.com", "t2")];

    assert_eq!(
        resolve_instruction(Some("x.a.com"), &rules, &templates, "default"),
        "one {content}"
    );
}

#[test]
fn wildcard_does_not_match_bare_domain() {
    init_logging();
    let templates = vec![template("default", "d {content}"), template("t1", "w {content}")];
    let rules = vec![rule("*.example.com", "t1")];

    assert_eq!(
        resolve_instruction(Some("blog.example.com"), &rules, &templates, "default"),
        "w {content}"
    );
    assert_eq!(
        resolve_instruction(Some("example.com"), &rules, &templates, "default"),
        "d {content}"
    );
    assert_eq!(
        resolve_instruction(Some("notexample.com"), &rules, &templates, "default"),
        "d {content}"
    );
}

#[test]
fn bare_domain_pattern_matches_www_form() {
    init_logging();
    let templates = vec![template("default", "d {content}"), template("t1", "b {content}")];
    let rules = vec![rule("example.com", "t1")];

    for host in ["example.com", "www.example.com"] {
        assert_eq!(
            resolve_instruction(Some(host), &rules, &templates, "default"),
            "b {content}",
            "{host}"
        );
    }
}

#[test]
fn dangling_template_reference_is_skipped_not_fatal() {
    init_logging();
    let templates = vec![template("default", "d {content}"), template("t2", "two {content}")];
    // First rule points at a template that no longer exists; the second one
    // matching the same host must still be consulted.
    let rules = vec![rule("*.a.com", "deleted"), rule("a.com", "t2")];

    assert_eq!(
        resolve_instruction(Some("x.a.com"), &rules, &templates, "default"),
        "d {content}"
    );
    assert_eq!(
        resolve_instruction(Some("a.com"), &rules, &templates, "default"),
        "two {content}"
    );
}

#[test]
fn unknown_default_degrades_to_first_nonempty_template() {
    init_logging();
    let templates = vec![template("empty", ""), template("t2", "usable {content}")];

    assert_eq!(
        resolve_instruction(Some("a.com"), &[], &templates, "missing"),
        "usable {content}"
    );
}

#[test]
fn empty_template_list_uses_fixed_fallback() {
    init_logging();
    assert_eq!(
        resolve_instruction(Some("a.com"), &[], &[], "default"),
        FALLBACK_INSTRUCTION
    );
    assert_eq!(resolve_instruction(None, &[], &[], "default"), FALLBACK_INSTRUCTION);
}

#[test]
fn null_hostname_skips_rules() {
    init_logging();
    let templates = vec![template("default", "d {content}"), template("t1", "one {content}")];
    let rules = vec![rule("example.com", "t1")];

    assert_eq!(
        resolve_instruction(None, &rules, &templates, "default"),
        "d {content}"
    );
}

#[test]
fn scenario_defaults_only_resolves_default_template() {
    init_logging();
    let templates = clipnote_core::builtin_templates();

    let resolved = resolve_instruction(
        Some("news.example.com"),
        &[],
        &templates,
        clipnote_core::DEFAULT_TEMPLATE_ID,
    );
    assert_eq!(resolved, templates[0].content);
}

#[test]
fn scenario_wildcard_rule_selects_short_summary() {
    init_logging();
    let templates = clipnote_core::builtin_templates();
    let rules = vec![rule("*.example.com", "short-summary")];

    let resolved = resolve_instruction(
        Some("blog.example.com"),
        &rules,
        &templates,
        clipnote_core::DEFAULT_TEMPLATE_ID,
    );
    let short = templates.iter().find(|t| t.id == "short-summary").unwrap();
    assert_eq!(resolved, short.content);
}

#[test]
fn hostname_of_handles_unparsable_urls() {
    init_logging();
    assert_eq!(
        clipnote_core::hostname_of("https://blog.example.com/post/1").as_deref(),
        Some("blog.example.com")
    );
    assert_eq!(clipnote_core::hostname_of("not a url"), None);
}
