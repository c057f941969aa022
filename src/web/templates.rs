//! HTML templates compiled from disk and recompiled on change.
//!
//! Every file matching the pattern is parsed up front. A set that fails to
//! read or parse never replaces the one being served.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use minijinja::Environment;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to list templates: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("failed to read template {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse template {name}: {source}")]
    Parse { name: String, source: minijinja::Error },
    #[error("pattern matches no files: {pattern}")]
    NoMatches { pattern: String },
    #[error("no template named {0}")]
    Missing(String),
    #[error("failed to render template {name}: {source}")]
    Render { name: String, source: minijinja::Error },
    #[error("failed to watch templates: {0}")]
    Watch(#[from] notify::Error),
}

/// A compiled set of templates, addressed by file name.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
    names: Vec<String>,
}

impl Templates {
    /// Template names in sorted order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Render `name` with `context`. `.html` templates escape their output.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        if !self.contains(name) {
            return Err(TemplateError::Missing(name.to_string()));
        }
        self.env
            .get_template(name)
            .and_then(|template| template.render(context))
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }
}

/// The current set of templates under a directory.
#[derive(Debug)]
pub struct TemplateStore {
    dir: PathBuf,
    pattern: String,
    templates: ArcSwap<Templates>,
}

impl TemplateStore {
    /// Read and compile every file in `dir` matching `pattern`.
    pub fn load(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Result<Arc<Self>, TemplateError> {
        let dir = dir.into();
        let pattern = pattern.into();
        let templates = compile_templates(&dir, &pattern)?;
        tracing::info!(dir = %dir.display(), count = templates.names.len(), "Templates loaded");
        Ok(Arc::new(Self {
            dir,
            pattern,
            templates: ArcSwap::from_pointee(templates),
        }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.load().contains(name)
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        self.templates.load().render(name, context)
    }

    pub fn snapshot(&self) -> Arc<Templates> {
        self.templates.load_full()
    }

    /// Recompile the whole set. On failure the previous set stays in place.
    pub fn reload(&self) -> Result<usize, TemplateError> {
        let templates = compile_templates(&self.dir, &self.pattern)?;
        let count = templates.names.len();
        self.templates.store(Arc::new(templates));
        Ok(count)
    }

    /// Reload whenever the directory changes, until the watcher is dropped.
    pub fn watch(self: &Arc<Self>) -> Result<TemplateWatcher, TemplateError> {
        let store = Arc::clone(self);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        match store.reload() {
                            Ok(count) => tracing::info!(count, "Templates reloaded"),
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload templates. Keeping current set.")
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Template watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %self.dir.display(), "Template watcher started");
        Ok(TemplateWatcher { _watcher: watcher })
    }
}

/// Keeps a template directory watched; dropping it stops watching.
pub struct TemplateWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for TemplateWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TemplateWatcher")
    }
}

fn compile_templates(dir: &Path, pattern: &str) -> Result<Templates, TemplateError> {
    let full = dir.join(pattern).to_string_lossy().into_owned();
    let mut env = Environment::new();
    let mut names = Vec::new();
    for entry in glob::glob(&full)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let source = std::fs::read_to_string(&path).map_err(|source| TemplateError::Read {
            path: path.clone(),
            source,
        })?;
        env.add_template_owned(name.clone(), source)
            .map_err(|source| TemplateError::Parse {
                name: name.clone(),
                source,
            })?;
        names.push(name);
    }
    if names.is_empty() {
        return Err(TemplateError::NoMatches { pattern: full });
    }
    names.sort();
    Ok(Templates { env, names })
}
