//! Template rendering for lighttpd configuration files
//!
//! Wraps a strict, non-escaping handlebars registry with the two embedded
//! templates. Missing parameters fail the render instead of producing a
//! half-valid configuration.

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use std::path::Path;

use crate::models::LightspawnError;
use crate::writer;

/// Main server configuration template
pub const CONFIG_TEMPLATE: &str = "lighttpd.conf";

/// Rewrite rules template
pub const RULES_TEMPLATE: &str = "rules.conf";

handlebars_helper!(regex_quote: |s: str| regex::escape(s));
handlebars_helper!(config_quote: |s: str| quote_string(s));

/// Escape `value` for use inside a double-quoted lighttpd string.
///
/// lighttpd only recognizes `\"` inside strings; other backslashes are literal.
pub fn quote_string(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Renders named templates with a parameter map
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Create a renderer with the embedded lighttpd templates
    pub fn new() -> Result<Self, LightspawnError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);
        registry.register_helper("regex_quote", Box::new(regex_quote));
        registry.register_helper("config_quote", Box::new(config_quote));

        for (name, source) in [
            (CONFIG_TEMPLATE, include_str!("templates/lighttpd.conf.hbs")),
            (RULES_TEMPLATE, include_str!("templates/rules.conf.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(|e| LightspawnError::Render {
                    template: name.to_string(),
                    source: Box::new(e),
                })?;
        }

        Ok(Self { registry })
    }

    /// Render `template` with `params`
    pub fn render<T: Serialize>(&self, template: &str, params: &T) -> Result<String, LightspawnError> {
        self.registry
            .render(template, params)
            .map_err(|e| LightspawnError::Render {
                template: template.to_string(),
                source: Box::new(e),
            })
    }

    /// Render `template` and write the result to `target`
    pub fn render_to_file<T: Serialize>(
        &self,
        template: &str,
        target: &Path,
        params: &T,
    ) -> Result<(), LightspawnError> {
        let content = self.render(template, params)?;
        writer::write_atomic(target, &content)?;
        Ok(())
    }
}
