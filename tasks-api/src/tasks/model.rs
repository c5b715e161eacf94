//! Task records, input fields and list parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// A stored task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: DateTime<Utc>,
}

impl Task {
    /// Case-insensitive substring match over name, slug and description.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.slug.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(needle))
                .unwrap_or(false)
    }

    /// Overwrite every field present in `fields`
    pub fn apply(&mut self, fields: TaskFields) {
        if let Some(name) = fields.name {
            self.name = name;
        }
        if let Some(slug) = fields.slug {
            self.slug = slug;
        }
        if let Some(description) = fields.description {
            self.description = Some(description);
        }
        if let Some(completed) = fields.completed {
            self.completed = completed;
        }
        if let Some(due_date) = fields.due_date {
            self.due_date = due_date;
        }
    }
}

/// Client-supplied task fields. Ids are always assigned by the store.
///
/// Creation requires `name`, `slug` and `due_date`; updates apply only
/// the fields that are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskFields {
    /// Check the fields required to create a task
    pub fn validate_new(&self) -> Result<(), String> {
        require_text("name", self.name.as_deref())?;
        require_text("slug", self.slug.as_deref())?;
        if self.due_date.is_none() {
            return Err("due_date is required".to_string());
        }
        Ok(())
    }

    /// Check the fields present in an update
    pub fn validate_patch(&self) -> Result<(), String> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", Some(name))?;
        }
        if let Some(slug) = self.slug.as_deref() {
            require_text("slug", Some(slug))?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        Some(_) => Err(format!("{} must not be empty", field)),
        None => Err(format!("{} is required", field)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    Id,
    Name,
    DueDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

/// List parameters. Unknown query parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub completed: Option<bool>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub order_by_direction: OrderDirection,
}

impl TaskQuery {
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PER_PAGE)
            .min(MAX_PER_PAGE)
    }

    /// Lowercased search term, if any non-blank one was given
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Pagination details returned next to a list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
    pub page: u32,
    pub per_page: u32,
    pub count: usize,
    pub total_count: usize,
}

/// One page of tasks; this is the unit cached for list requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub result: Vec<Task>,
    pub result_info: ResultInfo,
}
