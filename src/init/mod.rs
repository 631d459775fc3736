//! Project scaffolding.

use crate::config::{DEFAULT_CONFIG_FILE, DEFAULT_RUNTIME};
use crate::error::{BundleError, FsContext, Result};
use crate::invoke::DEFAULT_EVENT_FILE;
use handlebars::Handlebars;
use serde_json::json;
use std::path::{Path, PathBuf};

const CONFIG_TEMPLATE: &str = include_str!("../../templates/config.yaml.hbs");
const SERVICE_TEMPLATE: &str = include_str!("../../templates/service.py");
const EVENT_TEMPLATE: &str = include_str!("../../templates/event.json");
const REQUIREMENTS_TEMPLATE: &str = include_str!("../../templates/requirements.txt");

/// Options for `init`
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Function name written into the config
    pub function_name: String,
    /// Runtime written into the config
    pub runtime: String,
    /// Description written into the config
    pub description: String,
    /// Leave out the sample event
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            function_name: "my_lambda_function".to_string(),
            runtime: DEFAULT_RUNTIME.to_string(),
            description: "My lambda function".to_string(),
            minimal: false,
        }
    }
}

/// Files written and left alone by `init`
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Newly created files
    pub written: Vec<PathBuf>,
    /// Files that already existed
    pub skipped: Vec<PathBuf>,
}

/// Write the template project into `dir`. Existing files are not overwritten.
pub fn init_project(dir: &Path, options: &InitOptions) -> Result<InitReport> {
    std::fs::create_dir_all(dir).fs_context("creating project directory", dir)?;

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);

    let data = json!({
        "function_name": options.function_name,
        "runtime": options.runtime,
        "description": options.description,
    });
    let config = handlebars
        .render_template(CONFIG_TEMPLATE, &data)
        .map_err(BundleError::Template)?;

    let mut files: Vec<(&str, String)> = vec![
        (DEFAULT_CONFIG_FILE, config),
        ("service.py", SERVICE_TEMPLATE.to_string()),
        ("requirements.txt", REQUIREMENTS_TEMPLATE.to_string()),
    ];
    if !options.minimal {
        files.push((DEFAULT_EVENT_FILE, EVENT_TEMPLATE.to_string()));
    }

    let mut report = InitReport::default();
    for (name, contents) in files {
        let path = dir.join(name);
        if path.exists() {
            log::warn!("{} already exists, leaving it untouched", path.display());
            report.skipped.push(path);
            continue;
        }
        std::fs::write(&path, contents).fs_context("writing", &path)?;
        log::debug!("Wrote {}", path.display());
        report.written.push(path);
    }
    Ok(report)
}
