//! Option merging: structured flags plus opaque pass-through tokens.
//!
//! Structured flags are a small, ordered key/value map the front end
//! understands. Raw `--options` tokens are never parsed or validated here;
//! they are forwarded to the backend CLI verbatim, after all structured
//! flags, so the backend's own parser has the last word.

use std::fmt;

/// One normalized argument set for a planned invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionBag {
    // Insertion-ordered; overriding a key keeps its original position so
    // rendering stays deterministic.
    structured: Vec<(String, Option<String>)>,
    raw: Vec<String>,
}

impl OptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a boolean flag (`--detach`).
    pub fn set_flag(&mut self, name: &str) -> &mut Self {
        self.set_entry(name, None)
    }

    /// Set a valued flag (`--image nginx:1.25`), overriding any earlier
    /// value for the same key.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.set_entry(name, Some(value.into()))
    }

    fn set_entry(&mut self, name: &str, value: Option<String>) -> &mut Self {
        match self.structured.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.structured.push((name.to_string(), value)),
        }
        self
    }

    /// Append a repeated valued flag (`--env-add A=1 --env-add B=2`).
    ///
    /// Unlike [`set`](Self::set), repeated keys do not override.
    pub fn push_repeated(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.structured.push((name.to_string(), Some(value.into())));
        self
    }

    /// Append opaque pass-through tokens in user order.
    pub fn push_raw(&mut self, tokens: impl IntoIterator<Item = String>) -> &mut Self {
        self.raw.extend(tokens);
        self
    }

    pub fn structured_get(&self, name: &str) -> Option<&str> {
        self.structured
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn raw_tokens(&self) -> &[String] {
        &self.raw
    }

    /// Merge with fixed precedence: `defaults` < `structured` overrides by
    /// key < `raw` tokens appended verbatim at the end.
    pub fn merge(defaults: &OptionBag, structured: &OptionBag, raw: &[String]) -> OptionBag {
        let mut merged = defaults.clone();
        for (key, value) in &structured.structured {
            merged.set_entry(key, value.clone());
        }
        merged.raw.extend(structured.raw.iter().cloned());
        merged.raw.extend(raw.iter().cloned());
        merged
    }

    /// Split a raw `--options` string into tokens.
    ///
    /// Whitespace-splitting only; quoting inside the string is not
    /// interpreted, the tokens go to the backend CLI exactly as split.
    pub fn split_raw(options: &str) -> Vec<String> {
        options.split_whitespace().map(str::to_string).collect()
    }

    /// Render to argv fragments: structured flags first, then raw tokens.
    pub fn render(&self) -> Vec<String> {
        let mut argv = Vec::new();
        for (key, value) in &self.structured {
            argv.push(format!("--{key}"));
            if let Some(value) = value {
                argv.push(value.clone());
            }
        }
        argv.extend(self.raw.iter().cloned());
        argv
    }

    pub fn is_empty(&self) -> bool {
        self.structured.is_empty() && self.raw.is_empty()
    }
}

impl fmt::Display for OptionBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().join(" "))
    }
}

/// Expand a comma-separated `NAME=VALUE` list into repeated flags on `bag`
/// (`--env-add A=1,B=2` becomes `--env-add A=1 --env-add B=2`).
pub fn push_pair_list(bag: &mut OptionBag, flag: &str, pairs: &str) {
    for pair in pairs.split(',') {
        let pair = pair.trim();
        if !pair.is_empty() {
            bag.push_repeated(flag, pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_overrides_defaults() {
        let mut defaults = OptionBag::new();
        defaults.set("replicas", "1").set_flag("quiet");
        let mut flags = OptionBag::new();
        flags.set("replicas", "3");

        let merged = OptionBag::merge(&defaults, &flags, &[]);
        assert_eq!(merged.structured_get("replicas"), Some("3"));
        // Override keeps the original key position.
        assert_eq!(merged.render(), vec!["--replicas", "3", "--quiet"]);
    }

    #[test]
    fn test_raw_tokens_appended_verbatim() {
        let mut flags = OptionBag::new();
        flags.set_flag("detach");
        let raw = OptionBag::split_raw("--advertise-addr 192.168.1.1 --force");

        let merged = OptionBag::merge(&OptionBag::new(), &flags, &raw);
        assert_eq!(
            merged.render(),
            vec!["--detach", "--advertise-addr", "192.168.1.1", "--force"]
        );
    }

    #[test]
    fn test_raw_may_shadow_structured() {
        // The backend CLI's parser resolves the duplicate, not crane.
        let mut flags = OptionBag::new();
        flags.set("replicas", "3");
        let merged =
            OptionBag::merge(&OptionBag::new(), &flags, &OptionBag::split_raw("--replicas 5"));
        assert_eq!(merged.render(), vec!["--replicas", "3", "--replicas", "5"]);
    }

    #[test]
    fn test_push_pair_list() {
        let mut bag = OptionBag::new();
        push_pair_list(&mut bag, "env-add", "A=1, B=2,,C=3 ");
        assert_eq!(
            bag.render(),
            vec!["--env-add", "A=1", "--env-add", "B=2", "--env-add", "C=3"]
        );
    }

    #[test]
    fn test_split_raw() {
        assert_eq!(OptionBag::split_raw("  "), Vec::<String>::new());
        assert_eq!(OptionBag::split_raw("--a  b"), vec!["--a", "b"]);
    }
}
