//! Template rendering for dynamic task properties.
//!
//! Placeholders take the form `{{ dotted.path }}` and are looked up in the
//! context's JSON variables. Object keys and array indices are both valid
//! path segments (`outputs.fetch.items.0`).

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::RenderError;

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}";

/// Renders a templated string against a set of variables.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, variables: &Value) -> Result<String, RenderError>;
}

/// Default renderer: plain variable substitution, no expressions or filters.
#[derive(Debug, Clone)]
pub struct VariableRenderer {
    pattern: Regex,
}

impl VariableRenderer {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(PLACEHOLDER).expect("placeholder pattern is a valid regex"),
        }
    }

    /// Process-wide instance, compiled on first use.
    pub fn shared() -> Arc<VariableRenderer> {
        static SHARED: OnceLock<Arc<VariableRenderer>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(VariableRenderer::new())))
    }
}

impl Default for VariableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for VariableRenderer {
    fn render(&self, template: &str, variables: &Value) -> Result<String, RenderError> {
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(template) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = lookup(variables, path.as_str())
                .ok_or_else(|| RenderError::UnknownVariable(path.as_str().to_owned()))?;

            rendered.push_str(&template[last..whole.start()]);
            match value {
                Value::String(s) => rendered.push_str(s),
                other => rendered.push_str(&other.to_string()),
            }
            last = whole.end();
        }

        rendered.push_str(&template[last..]);
        Ok(rendered)
    }
}

fn lookup<'a>(variables: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(variables, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, variables: Value) -> Result<String, RenderError> {
        VariableRenderer::new().render(template, &variables)
    }

    #[test]
    fn string_without_placeholders_is_unchanged() {
        assert_eq!(render("greet.bob", json!({})).unwrap(), "greet.bob");
    }

    #[test]
    fn nested_paths_are_resolved() {
        let vars = json!({ "inputs": { "name": "bob" }, "flow": { "id": "hello" } });
        assert_eq!(
            render("greet.{{ inputs.name }}.{{flow.id}}", vars).unwrap(),
            "greet.bob.hello"
        );
    }

    #[test]
    fn non_string_values_are_rendered_as_json() {
        let vars = json!({ "outputs": { "t1": { "count": 3, "items": ["a", "b"] } } });
        assert_eq!(render("{{ outputs.t1.count }}", vars.clone()).unwrap(), "3");
        assert_eq!(render("{{ outputs.t1.items.1 }}", vars).unwrap(), "b");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        assert_eq!(
            render("{{ inputs.missing }}", json!({ "inputs": {} })),
            Err(RenderError::UnknownVariable("inputs.missing".into()))
        );
    }

    #[test]
    fn shared_renderer_is_compiled_once() {
        assert!(Arc::ptr_eq(&VariableRenderer::shared(), &VariableRenderer::shared()));
    }

    #[test]
    fn storage_uris_survive_rendering() {
        let vars = json!({ "execution": { "id": "42" } });
        assert_eq!(
            render("kestra:///main/{{ execution.id }}/body.json", vars).unwrap(),
            "kestra:///main/42/body.json"
        );
    }
}
