//! Server-rendered HTML through Tera.
//!
//! Templates are embedded into the binary, so a deployment is a single
//! executable plus its data directory. Loading sorts base templates first
//! so inheritance chains resolve no matter how the embed iterates.

use anyhow::{anyhow, Context as _, Result};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;
use std::error::Error as StdError;
use tera::{Context, Tera};

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct TemplateFiles;

/// Tera wrapper over the embedded template tree.
pub struct TemplateEngine {
    tera: Tera,
}

static ENGINE: Lazy<TemplateEngine> = Lazy::new(|| match TemplateEngine::new() {
    Ok(engine) => engine,
    Err(err) => {
        tracing::error!(error = %err, "Failed to load embedded templates");
        TemplateEngine { tera: Tera::default() }
    }
});

impl TemplateEngine {
    /// Loads every embedded template into a fresh Tera instance.
    pub fn new() -> Result<Self> {
        let mut templates: Vec<(String, String)> = Vec::new();
        for name in TemplateFiles::iter() {
            let file = TemplateFiles::get(&name)
                .ok_or_else(|| anyhow!("Embedded template vanished: {}", name))?;
            let content = std::str::from_utf8(file.data.as_ref())
                .with_context(|| format!("Template {} is not valid UTF-8", name))?
                .to_string();
            templates.push((name.to_string(), content));
        }

        // Base templates go in first so children can extend them.
        templates.sort_by(|a, b| {
            let a_is_base = a.0 == "base.html" || a.0.ends_with("/base.html");
            let b_is_base = b.0 == "base.html" || b.0.ends_with("/base.html");
            b_is_base.cmp(&a_is_base)
        });

        let mut tera = Tera::default();
        for (name, content) in templates {
            tera.add_raw_template(&name, &content)
                .map_err(|e| anyhow!("Failed to add template {}: {}", name, e))?;
        }
        tera.build_inheritance_chains()
            .map_err(|e| anyhow!("Failed to build template inheritance: {}", e))?;

        Ok(Self { tera })
    }

    /// Renders a template, flattening Tera's error chain into the message.
    pub fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut error_msg = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            anyhow!(error_msg)
        })
    }
}

/// Renders a template against the shared engine.
pub fn render(template: &str, context: &Context) -> Result<String> {
    ENGINE.render(template, context)
}

/// Builds the engine once at startup so a broken template tree fails the
/// process instead of the first request.
pub fn startup_check() -> Result<()> {
    TemplateEngine::new().map(|_| ())
}
