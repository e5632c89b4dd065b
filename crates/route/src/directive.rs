use std::collections::HashMap;

/// Structured form of `@tag value` annotations: a mapping from lower-cased
/// tag name to the ordered sequence of string values recorded for it.
///
/// A set can be parsed from free documentation text or, preferably, built
/// declaratively at registration time with [`DirectiveSet::builder`]; both
/// produce the same queryable result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectiveSet {
    tags: HashMap<String, Vec<String>>,
}

impl DirectiveSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> DirectiveSetBuilder {
        DirectiveSetBuilder { set: Self::default() }
    }

    /// Extracts directives from documentation text.
    ///
    /// Each line may carry one directive: optional leading `*`, then `@`,
    /// then a name of letters/digits/hyphen/underscore, then an optional
    /// free-text value. Names are case-folded, values trimmed; a repeated
    /// name appends to its value sequence, and a valueless directive still
    /// registers the name. Pure and idempotent.
    pub fn parse(text: &str) -> Self {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();

        for line in text.lines() {
            let Some((name, value)) = parse_line(line) else {
                continue;
            };

            let values = tags.entry(name).or_default();

            if !value.is_empty() {
                values.push(value.to_owned());
            }
        }

        Self { tags }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(&name.to_ascii_lowercase())
    }

    /// A flag is enabled when the tag is present with no value, or when its
    /// first value is not one of `no`/`off`/`false` (case-insensitively).
    /// An absent tag yields `default`.
    pub fn has_flag(&self, name: &str, default: bool) -> bool {
        let Some(values) = self.tags.get(&name.to_ascii_lowercase()) else {
            return default;
        };

        match values.first() {
            None => true,
            Some(first) => !matches!(first.to_ascii_lowercase().as_str(), "no" | "off" | "false"),
        }
    }

    pub fn has_values(&self, name: &str) -> bool {
        !self.values(name).is_empty()
    }

    /// The ordered values recorded for a tag; empty if the tag is absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.tags
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Re-processes `overriding` after `self`: same-named tags are replaced
    /// wholesale, everything else carries over.
    pub fn merge(&self, overriding: &DirectiveSet) -> DirectiveSet {
        let mut tags = self.tags.clone();

        for (name, values) in &overriding.tags {
            tags.insert(name.clone(), values.clone());
        }

        DirectiveSet { tags }
    }
}

fn parse_line(line: &str) -> Option<(String, &str)> {
    let rest = line.trim_start();
    let rest = rest.strip_prefix('*').unwrap_or(rest).trim_start();
    let rest = rest.strip_prefix('@')?;

    let first = rest.chars().next()?;

    if !first.is_ascii_alphabetic() {
        return None;
    }

    let name_end = rest
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    let name = rest[..name_end].to_ascii_lowercase();
    let value = rest[name_end..].trim();

    Some((name, value))
}

/// Builds a [`DirectiveSet`] without any documentation text, for explicit
/// per-handler registration.
#[derive(Debug)]
pub struct DirectiveSetBuilder {
    set: DirectiveSet,
}

impl DirectiveSetBuilder {
    /// Registers a tag with no value (a bare flag).
    pub fn tag(mut self, name: &str) -> Self {
        self.set.tags.entry(name.to_ascii_lowercase()).or_default();
        self
    }

    /// Appends a value to a tag's sequence, registering it if needed.
    pub fn value(mut self, name: &str, value: &str) -> Self {
        self.set
            .tags
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.trim().to_owned());
        self
    }

    pub fn build(self) -> DirectiveSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
        Fetches a single widget.\n\
        \n\
        * @jsonResponder\n\
        * @header X-Frame-Options DENY\n\
        * @header Cache-Control no-store\n\
        @extraVars no\n";

    #[test]
    fn parses_tags_values_and_flags() {
        let set = DirectiveSet::parse(DOC);

        assert!(set.has_tag("jsonresponder"));
        assert!(set.has_flag("jsonResponder", false));
        assert!(!set.has_flag("extraVars", true));
        assert_eq!(set.values("header"), ["X-Frame-Options DENY", "Cache-Control no-store"]);
        assert!(!set.has_values("jsonresponder"));
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(DirectiveSet::parse(DOC), DirectiveSet::parse(DOC));
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let set = DirectiveSet::parse("@JSONResponder");

        assert!(set.has_tag("jsonresponder"));
        assert!(set.has_tag("JsonResponder"));
    }

    #[test]
    fn flag_semantics_follow_the_first_value() {
        let bare = DirectiveSet::parse("@extraVars");
        let off = DirectiveSet::parse("@extraVars no");
        let on = DirectiveSet::parse("@extraVars anything");
        let absent = DirectiveSet::parse("plain text");

        assert!(bare.has_flag("extravars", false));
        assert!(!off.has_flag("extravars", true));
        assert!(on.has_flag("extravars", false));
        assert!(!absent.has_flag("extravars", false));
        assert!(absent.has_flag("extravars", true));
    }

    #[test]
    fn lines_without_directives_are_skipped() {
        let set = DirectiveSet::parse("no tags here\nemail@example.com\n@ nothing\n@1digit");

        assert!(!set.has_tag("example"));
        assert!(!set.has_tag("nothing"));
        assert!(!set.has_tag("1digit"));
    }

    #[test]
    fn builder_matches_parsed_output() {
        let parsed = DirectiveSet::parse("@jsonResponder\n@header X-Test 1");
        let built = DirectiveSet::builder()
            .tag("jsonResponder")
            .value("header", "X-Test 1")
            .build();

        assert_eq!(parsed, built);
    }

    #[test]
    fn merge_lets_the_overriding_set_win() {
        let class = DirectiveSet::parse("@jsonResponder\n@extraVars\n@header X-A 1");
        let method = DirectiveSet::parse("@extraVars no\n@header X-B 2");
        let merged = class.merge(&method);

        assert!(merged.has_flag("jsonresponder", false));
        assert!(!merged.has_flag("extravars", false));
        assert_eq!(merged.values("header"), ["X-B 2"]);
    }
}
