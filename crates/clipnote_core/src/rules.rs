use serde::{Deserialize, Serialize};
use url::Url;

/// Substitution marker expected inside instruction template content.
pub const CONTENT_MARKER: &str = "{content}";

/// Last-resort instruction used when no stored template is usable.
pub const FALLBACK_INSTRUCTION: &str = "请总结以下内容：{content}";

/// A named instruction template. `content` is expected to carry exactly one
/// [`CONTENT_MARKER`]; substitution is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// Maps a domain pattern to an instruction template, evaluated in list order.
///
/// A rule whose `template_id` no longer resolves is inert: it is skipped at
/// match time but deliberately never removed, so re-adding the template
/// revives the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRule {
    pub id: String,
    pub domain_pattern: String,
    pub template_id: String,
}

/// Compiled matching form of a domain pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DomainPredicate {
    /// `*.example.com`: any hostname with a nonempty prefix before the base.
    /// The bare base does not match.
    Subdomains(String),
    /// `example.com`: the bare domain or its `www.` form.
    BareOrWww(String),
    /// `www.example.com`: exact match only.
    Exact(String),
}

impl DomainPredicate {
    /// Compiles a pattern string, failing closed: a malformed or empty
    /// pattern yields `None` and never matches.
    fn compile(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern.is_empty() {
            return None;
        }
        if pattern
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '@' | '#' | '?'))
        {
            return None;
        }
        if let Some(base) = pattern.strip_prefix("*.") {
            if base.is_empty() || base.starts_with('.') || base.contains('*') {
                return None;
            }
            return Some(Self::Subdomains(base.to_string()));
        }
        if pattern.contains('*') {
            return None;
        }
        if pattern.starts_with("www.") {
            Some(Self::Exact(pattern))
        } else {
            Some(Self::BareOrWww(pattern))
        }
    }

    fn matches(&self, hostname: &str) -> bool {
        let host = hostname.trim().to_ascii_lowercase();
        match self {
            Self::Subdomains(base) => host
                .strip_suffix(base.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
            Self::BareOrWww(base) => {
                host == *base
                    || host
                        .strip_prefix("www.")
                        .is_some_and(|bare| bare == *base)
            }
            Self::Exact(full) => host == *full,
        }
    }
}

/// Extracts the hostname from a page URL, if it parses.
pub fn hostname_of(page_url: &str) -> Option<String> {
    Url::parse(page_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}

/// Resolves the instruction content to use for a page.
///
/// Rules are consulted in list order; the first rule whose pattern matches
/// the hostname *and* whose `template_id` resolves wins. Otherwise the
/// default template id applies. A selected template with empty content
/// degrades to the first template with non-empty content, and finally to
/// [`FALLBACK_INSTRUCTION`]. This function never fails; it always returns a
/// usable instruction with the content marker intact.
pub fn resolve_instruction(
    hostname: Option<&str>,
    rules: &[DomainRule],
    templates: &[InstructionTemplate],
    default_template_id: &str,
) -> String {
    let mut effective_id = default_template_id;

    if let Some(host) = hostname {
        for rule in rules {
            let Some(predicate) = DomainPredicate::compile(&rule.domain_pattern) else {
                continue;
            };
            if !predicate.matches(host) {
                continue;
            }
            if templates.iter().any(|t| t.id == rule.template_id) {
                effective_id = &rule.template_id;
                break;
            }
            // Dangling template reference: the rule stays inert.
        }
    }

    if let Some(template) = templates.iter().find(|t| t.id == effective_id) {
        if !template.content.is_empty() {
            return template.content.clone();
        }
    }

    if let Some(template) = templates.iter().find(|t| !t.content.is_empty()) {
        return template.content.clone();
    }

    FALLBACK_INSTRUCTION.to_string()
}

#[cfg(test)]
mod tests {
    use super::DomainPredicate;

    fn matches(pattern: &str, host: &str) -> bool {
        DomainPredicate::compile(pattern).is_some_and(|p| p.matches(host))
    }

    #[test]
    fn wildcard_requires_subdomain() {
        assert!(matches("*.example.com", "blog.example.com"));
        assert!(matches("*.example.com", "a.b.example.com"));
        assert!(!matches("*.example.com", "example.com"));
        assert!(!matches("*.example.com", "notexample.com"));
    }

    #[test]
    fn bare_domain_also_matches_www() {
        assert!(matches("example.com", "example.com"));
        assert!(matches("example.com", "www.example.com"));
        assert!(!matches("example.com", "blog.example.com"));
    }

    #[test]
    fn www_pattern_is_exact() {
        assert!(matches("www.example.com", "www.example.com"));
        assert!(!matches("www.example.com", "example.com"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(matches("Example.COM", "EXAMPLE.com"));
        assert!(matches("*.Example.com", "Blog.example.COM"));
    }

    #[test]
    fn malformed_patterns_fail_closed() {
        for pattern in ["", "   ", "*.", "*..com", "ex*mple.com", "http://a.com", "a b.com"] {
            assert!(DomainPredicate::compile(pattern).is_none(), "{pattern:?}");
        }
    }
}
