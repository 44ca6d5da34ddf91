//! Jinja template environment for model prompts.
//!
//! Templates are read once from `templates/prompts/` (or `PROMPT_TEMPLATE_DIR`)
//! and addressed by their relative path, e.g. `fingerprint/system.jinja`.

use minijinja::{Environment, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const DEFAULT_TEMPLATE_DIR: &str = "templates/prompts";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn template_dir() -> PathBuf {
    std::env::var("PROMPT_TEMPLATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_DIR))
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

    let dir = template_dir();
    if dir.exists() {
        load_templates(&mut env, &dir, &dir);
    } else {
        tracing::warn!("Prompt template directory {} not found", dir.display());
    }

    env
}

fn load_templates(env: &mut Environment<'static>, base: &Path, current: &Path) {
    let Ok(entries) = std::fs::read_dir(current) else {
        return;
    };

    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            load_templates(env, base, &path);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("jinja") {
            continue;
        }
        let (Ok(relative), Ok(content)) = (path.strip_prefix(base), std::fs::read_to_string(&path))
        else {
            continue;
        };

        // Template names use forward slashes regardless of platform.
        // Leaked: templates live for the whole process.
        let name: &'static str =
            Box::leak(relative.to_string_lossy().replace('\\', "/").into_boxed_str());
        let source: &'static str = Box::leak(content.into_boxed_str());
        match env.add_template(name, source) {
            Ok(()) => tracing::debug!("Loaded prompt template: {}", name),
            Err(e) => tracing::warn!("Failed to load template {}: {}", name, e),
        }
    }
}

fn environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render `template_name` with a serializable context
pub fn render_template<S: serde::Serialize>(
    template_name: &str,
    ctx: S,
) -> Result<String, TemplateError> {
    let template = environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(Value::from_serialize(&ctx))
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
