//! Department directory — per-department floor-plan URL, queue color and
//! navigation steps, loaded once from a JSON file and served read-only.
//!
//! The backing hospital database is out of scope here; the directory file is
//! the deployment's source of truth for wayfinding data.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::packet::{GuidanceRequest, NavigationStep};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("cannot read department directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("department directory is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    #[serde(default)]
    pub floor_plan_image: Option<String>,
    #[serde(default)]
    pub queue_color: Option<String>,
    #[serde(default)]
    pub navigation_steps: Vec<NavigationStep>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    departments: Vec<Department>,
}

/// Read-only department lookup. Empty when no directory file is configured.
#[derive(Debug, Default)]
pub struct DepartmentDirectory {
    departments: Vec<Department>,
}

impl DepartmentDirectory {
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)?;
        let file: DirectoryFile = serde_json::from_str(&raw)?;
        Ok(Self {
            departments: file.departments,
        })
    }

    pub fn from_departments(departments: Vec<Department>) -> Self {
        Self { departments }
    }

    /// Case-insensitive, whitespace-trimmed lookup.
    pub fn get(&self, name: &str) -> Option<&Department> {
        let needle = name.trim();
        self.departments
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(needle))
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Fills a request's floor plan, queue color and navigation steps from
    /// the directory when the caller left them blank. Explicit values win.
    pub fn enrich(&self, mut request: GuidanceRequest) -> GuidanceRequest {
        let Some(department) = request
            .registration
            .recommended_department
            .as_deref()
            .and_then(|name| self.get(name))
        else {
            return request;
        };

        if request.floor_plan_image.is_none() {
            request.floor_plan_image = department.floor_plan_image.clone();
        }
        if request.queue_color.is_none() {
            request.queue_color = department.queue_color.clone();
        }
        if request.navigation_steps.is_empty() {
            request.navigation_steps = department.navigation_steps.clone();
        }
        request
    }
}
