//! `{{var}}` prompt templates filled from a prompt's input fields.

use std::collections::HashMap;

use crate::error::AiError;

enum Segment<'a> {
    Text(&'a str),
    Var(&'a str),
}

/// A template split into literal text and placeholders. `unclosed` holds
/// whatever followed a `{{` that never saw its `}}`.
struct Scan<'a> {
    segments: Vec<Segment<'a>>,
    unclosed: Option<&'a str>,
}

fn scan(template: &str) -> Scan<'_> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let before = &rest[..open];
        let after = &rest[open + 2..];

        if let Some(text) = before.strip_suffix('\\') {
            segments.push(Segment::Text(text));
            segments.push(Segment::Text("{{"));
            rest = after;
            continue;
        }

        segments.push(Segment::Text(before));
        match after.find("}}") {
            Some(close) => {
                segments.push(Segment::Var(after[..close].trim()));
                rest = &after[close + 2..];
            }
            None => {
                return Scan {
                    segments,
                    unclosed: Some(after),
                }
            }
        }
    }

    segments.push(Segment::Text(rest));
    Scan {
        segments,
        unclosed: None,
    }
}

/// Fill `{{var}}` placeholders from `vars`.
///
/// Unknown variables are left as-is so a missing field is visible in the
/// rendered prompt. `\{{` emits a literal `{{`.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let Scan { segments, unclosed } = scan(template);
    let mut out = String::with_capacity(template.len());

    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Var(name) => match vars.get(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(&format!("{{{{{name}}}}}")),
            },
        }
    }
    if let Some(tail) = unclosed {
        out.push_str("{{");
        out.push_str(tail);
    }

    out
}

/// Names of all `{{var}}` placeholders in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>, AiError> {
    let Scan { segments, unclosed } = scan(template);
    if let Some(tail) = unclosed {
        return Err(AiError::Config(format!(
            "Unclosed template variable: {{{{{tail}"
        )));
    }

    Ok(segments
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Var(name) => Some(name.to_string()),
            Segment::Text(_) => None,
        })
        .collect())
}

/// Check that every placeholder in `template` is one of `allowed`.
pub fn validate_template(template: &str, allowed: &[&str]) -> Result<(), AiError> {
    for name in placeholders(template)? {
        if !allowed.contains(&name.as_str()) {
            return Err(AiError::Config(format!(
                "Unknown template variable: {{{{{name}}}}}. Allowed: {allowed:?}"
            )));
        }
    }
    Ok(())
}

/// Flatten the top level of a serialized input into template variables.
///
/// Strings are used verbatim, `null` becomes an empty string, arrays of
/// strings are joined with ", ", and anything else is rendered as JSON.
pub fn input_vars(input: &serde_json::Value) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    let Some(map) = input.as_object() else {
        return vars;
    };

    for (key, value) in map {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        vars.insert(key.clone(), rendered);
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_known_vars() {
        let result = render(
            "Stream for {{ name }} in class {{class_level}}",
            &vars(&[("name", "Asha"), ("class_level", "10")]),
        );
        assert_eq!(result, "Stream for Asha in class 10");
    }

    #[test]
    fn leaves_unknown_vars_intact() {
        let result = render("Hello {{who}}", &HashMap::new());
        assert_eq!(result, "Hello {{who}}");
    }

    #[test]
    fn backslash_keeps_braces_literal() {
        let result = render(r#"Reply as \{{"reply": "..."}}"#, &HashMap::new());
        assert_eq!(result, r#"Reply as {{"reply": "..."}}"#);
    }

    #[test]
    fn lists_placeholders() {
        let names = placeholders("{{a}} and {{ b }} but not \\{{c}}").unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn rejects_unclosed_placeholder() {
        assert!(placeholders("oops {{name").is_err());
    }

    #[test]
    fn keeps_unclosed_tail_when_rendering() {
        assert_eq!(render("Hi {{name", &vars(&[("name", "x")])), "Hi {{name");
    }

    #[test]
    fn accepts_known_placeholders() {
        assert!(validate_template("{{goal}} {{interests}}", &["goal", "interests"]).is_ok());
        assert!(validate_template("{{unknown}}", &["goal"]).is_err());
    }

    #[test]
    fn flattens_input_fields() {
        let input = serde_json::json!({
            "name": "Ravi",
            "interests": ["robotics", "music"],
            "marks": { "math": 91 },
            "notes": null,
        });
        let vars = input_vars(&input);
        assert_eq!(vars["name"], "Ravi");
        assert_eq!(vars["interests"], "robotics, music");
        assert_eq!(vars["marks"], r#"{"math":91}"#);
        assert_eq!(vars["notes"], "");
    }
}
