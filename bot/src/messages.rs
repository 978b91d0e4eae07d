use std::collections::{HashMap, HashSet};

use tracing::error;

pub const DEFAULT_ISSUE_BODY: &str = "Pull request {pr_url} was labeled as an emergency.";
pub const DEFAULT_NOTIFY_MESSAGE: &str = "{pr_link} has been labeled as `{label}`";
pub const REVIEW_CHECKLIST: &str = "- [ ] Reviewed";

/// Text with `{name}` placeholders, rendered in a single pass so substituted values are never re-expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    variables: HashSet<String>,
}

impl Template {
    pub fn new(text: &str) -> Self {
        let variables = segments(text)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Variable(name) => Some(name.to_string()),
                Segment::Literal(_) => None,
            })
            .collect();

        Self {
            text: text.to_string(),
            variables,
        }
    }

    pub fn variables(&self) -> &HashSet<String> {
        &self.variables
    }

    pub fn format(&self, values: &HashMap<&'static str, String>) -> String {
        for key in self.variables.iter() {
            if !values.contains_key(key.as_str()) {
                error!(
                    "The template expects a variable: {}, but it wasn't provided",
                    key
                );
            }
        }

        let mut result = String::with_capacity(self.text.len());
        for segment in segments(&self.text) {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Variable(name) => match values.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push('{');
                        result.push_str(name);
                        result.push('}');
                    }
                },
            }
        }
        result
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + 1 + len];
        if !is_variable_name(name) {
            result.push(Segment::Literal(&rest[..start + 1]));
            rest = &rest[start + 1..];
            continue;
        }

        if start > 0 {
            result.push(Segment::Literal(&rest[..start]));
        }
        result.push(Segment::Variable(name));
        rest = &rest[start + len + 2..];
    }

    if !rest.is_empty() {
        result.push(Segment::Literal(rest));
    }
    result
}

pub fn slack_link(url: &str, caption: &str) -> String {
    format!("<{url}|{caption}>")
}

/// Body of the audit issue: the rendered template followed by the review checklist.
pub fn issue_body(template: &Template, pr_url: &str, label: &str) -> String {
    let values = [
        ("pr_url", pr_url.to_string()),
        ("label", label.to_string()),
    ]
    .into_iter()
    .collect();

    let body = template.format(&values);
    format!("{}\n{REVIEW_CHECKLIST}", body.trim_end())
}

/// Slack message for an emergency. The issue line appears only for an issue created in this run.
pub fn notification_text(
    template: Option<&Template>,
    pr_url: &str,
    label: &str,
    issue_url: Option<&str>,
) -> String {
    let values = [
        ("pr_url", pr_url.to_string()),
        ("pr_link", slack_link(pr_url, "Pull request")),
        ("label", label.to_string()),
    ]
    .into_iter()
    .collect();

    let mut text = match template {
        Some(template) => template.format(&values).trim_end().to_string(),
        None => Template::new(DEFAULT_NOTIFY_MESSAGE).format(&values),
    };

    if let Some(issue_url) = issue_url {
        text.push('\n');
        text.push_str(&slack_link(issue_url, "Audit issue created"));
    }
    text
}
