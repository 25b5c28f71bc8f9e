//! JSON persistence for project state and run history.
//!
//! One JSON file per project, saved atomically (write-to-temp-then-rename),
//! plus one append-only JSON-lines history log per project.

use crate::error::{CoreError, CoreResult};
use crate::history::{self, RunRecord};
use crate::project::{Project, ProjectId};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed store for projects and their run history.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, id: ProjectId) -> PathBuf {
        self.root.join(format!("project_{}.json", id))
    }

    fn history_path(&self, id: ProjectId) -> PathBuf {
        self.root.join(format!("history_{}.jsonl", id))
    }

    /// Load a project by id.
    pub fn load(&self, id: ProjectId) -> CoreResult<Project> {
        let path = self.project_path(id);
        if !path.exists() {
            return Err(CoreError::ProjectNotFound { id: id.0 });
        }
        let content = fs::read_to_string(&path).map_err(|source| CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        })?;
        let project: Project = serde_json::from_str(&content)?;
        Ok(project)
    }

    /// Save a project atomically.
    ///
    /// Uses write-to-temp-then-rename so a crash mid-write never leaves a
    /// corrupt project file behind.
    pub fn save(&self, project: &Project) -> CoreResult<()> {
        fs::create_dir_all(&self.root)?;

        let path = self.project_path(project.id);
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(project)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;
        log::debug!("saved project {} to {}", project.id, path.display());

        Ok(())
    }

    /// List ids of all stored projects.
    pub fn list(&self) -> CoreResult<Vec<ProjectId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name
                .strip_prefix("project_")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                if let Ok(id) = stem.parse::<u64>() {
                    ids.push(ProjectId(id));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Append a finished run record to the project's history log.
    pub fn append_history(&self, record: &RunRecord) -> CoreResult<()> {
        history::append_record(&self.history_path(record.project_id), record)
    }

    /// Load run history, most recent first.
    pub fn history(&self, id: ProjectId, limit: usize) -> CoreResult<Vec<RunRecord>> {
        history::load_records(&self.history_path(id), limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RunStatus;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path());

        let project = Project::new(ProjectId(1), "demo");
        store.save(&project).unwrap();

        let loaded = store.load(ProjectId(1)).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_load_missing_project() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        let err = store.load(ProjectId(42)).unwrap_err();
        assert!(matches!(err, CoreError::ProjectNotFound { id: 42 }));
    }

    #[test]
    fn test_save_overwrites_atomically() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path());

        let mut project = Project::new(ProjectId(1), "demo");
        store.save(&project).unwrap();

        project.name = "renamed".to_string();
        store.save(&project).unwrap();

        let loaded = store.load(ProjectId(1)).unwrap();
        assert_eq!(loaded.name, "renamed");
        // No leftover temp file.
        assert!(!dir.path().join("project_1.json.tmp").exists());
    }

    #[test]
    fn test_list_projects() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path());

        store.save(&Project::new(ProjectId(2), "b")).unwrap();
        store.save(&Project::new(ProjectId(1), "a")).unwrap();

        assert_eq!(store.list().unwrap(), vec![ProjectId(1), ProjectId(2)]);
    }

    #[test]
    fn test_history_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path());

        let mut record = RunRecord::begin(ProjectId(1), 2);
        record.finish(RunStatus::Completed, None);
        store.append_history(&record).unwrap();

        let loaded = store.history(ProjectId(1), 10).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].run_id, record.run_id);
    }
}
