use std::collections::HashSet;
use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};

use crate::error::{PracticError, Result};
use crate::sandbox::SandboxEmbed;

static BUNDLED_DIR: Dir = include_dir!("tasks");

/// Everything the host hands a task widget when it mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxEmbed>,
}

impl TaskDefinition {
    pub fn new<T: Into<String>>(title: T, variants: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            variants,
            difficulty: None,
            estimated_time: None,
            task_id: None,
            sandbox: None,
        }
    }

    /// Persistence identifier: the explicit id, or the title with whitespace runs
    /// collapsed to `_`.
    pub fn identifier(&self) -> String {
        derive_identifier(self.task_id.as_deref(), &self.title)
    }

    pub fn difficulty_label(&self, index: usize) -> Option<&str> {
        self.difficulty
            .as_ref()
            .and_then(|labels| labels.get(index))
            .map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        let id = self.identifier();
        if id.is_empty() {
            return Err(PracticError::invalid_task(&self.title, "empty identifier"));
        }
        if self.variants.is_empty() {
            return Err(PracticError::invalid_task(id, "at least one variant is required"));
        }
        if let Some(labels) = &self.difficulty {
            if labels.len() != self.variants.len() {
                return Err(PracticError::invalid_task(
                    id,
                    format!(
                        "{} difficulty labels for {} variants",
                        labels.len(),
                        self.variants.len()
                    ),
                ));
            }
        }
        Ok(())
    }
}

pub fn derive_identifier(task_id: Option<&str>, title: &str) -> String {
    if let Some(id) = task_id.filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    let mut out = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// An ordered collection of tasks, one "page" each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub name: String,
    pub tasks: Vec<TaskDefinition>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// All catalogs shipped with the binary, merged in file-name order.
    pub fn bundled() -> Result<Self> {
        let mut files: Vec<_> = BUNDLED_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        if files.is_empty() {
            return Err(PracticError::MissingCatalog("tasks/*.json".to_string()));
        }

        let mut tasks = Vec::new();
        for file in files {
            let raw = file.contents_utf8().ok_or_else(|| {
                PracticError::MissingCatalog(file.path().display().to_string())
            })?;
            let part: Catalog = serde_json::from_str(raw)?;
            tasks.extend(part.tasks);
        }

        let catalog = Catalog {
            name: "bundled".to_string(),
            tasks,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            let id = task.identifier();
            if !seen.insert(id.clone()) {
                return Err(PracticError::DuplicateTask(id));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn position(&self, identifier: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.identifier() == identifier)
            .ok_or_else(|| PracticError::UnknownTask(identifier.to_string()))
    }
}
