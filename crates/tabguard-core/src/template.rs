use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::admission::AdmissionTag;
use crate::config::LimitConfig;

const MISSING_VALUE: &str = "?";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Placeholder keys may be padded with whitespace but never contain braces.
    PATTERN.get_or_init(|| Regex::new(r"\{\s*([^\s{}]+)\s*\}").expect("placeholder pattern"))
}

pub fn render_alert(template: &str, tag: AdmissionTag, config: &LimitConfig) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "which" => tag.scope_label().to_owned(),
            "maxWhich" => option_text(config, tag.limit_key()),
            key => option_text(config, key),
        })
        .into_owned()
}

fn option_text(config: &LimitConfig, key: &str) -> String {
    config
        .field(key)
        .map(|value| value.to_string())
        .unwrap_or_else(|| MISSING_VALUE.to_owned())
}
