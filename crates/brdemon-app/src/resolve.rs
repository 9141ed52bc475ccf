//! Working directory resolution

use std::path::PathBuf;

use brdemon_core::prelude::*;
use brdemon_core::{find_project_root, has_pubspec};

use crate::host::HostUi;

const PICK_FOLDER_PROMPT: &str =
    "Failed to detect where to run build_runner. Please choose the project folder.";

/// The paths a command starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoots {
    /// Active file or directory
    pub active: PathBuf,
    /// Workspace root the active path lives in, if known
    pub workspace: Option<PathBuf>,
}

impl ProjectRoots {
    pub fn new(active: impl Into<PathBuf>, workspace: Option<PathBuf>) -> Self {
        Self {
            active: canonical(active.into()),
            workspace: workspace.map(canonical),
        }
    }

    /// Directory that holds `.brdemon/config.toml`
    pub fn config_root(&self) -> PathBuf {
        find_project_root(&self.active, self.workspace.as_deref())
            .or_else(|| self.workspace.clone())
            .unwrap_or_else(|| self.active.clone())
    }
}

fn canonical(path: PathBuf) -> PathBuf {
    dunce::canonicalize(&path).unwrap_or(path)
}

/// Find the project to run `build_runner` in
///
/// Tries the manifest heuristic first and falls back to asking the host. A
/// picked folder without `pubspec.yaml` is still accepted; the spawn reports
/// it as [`Error::NoProject`].
pub async fn resolve_working_directory<H: HostUi>(roots: &ProjectRoots, host: &H) -> Result<PathBuf> {
    if let Some(root) = find_project_root(&roots.active, roots.workspace.as_deref()) {
        debug!("Resolved project root {}", root.display());
        return Ok(root);
    }

    info!(
        "No {} found around {}, asking the host",
        brdemon_core::PUBSPEC_FILENAME,
        roots.active.display()
    );
    match host.pick_folder(PICK_FOLDER_PROMPT).await {
        Some(folder) => {
            let folder = canonical(folder);
            if !has_pubspec(&folder) {
                warn!("Picked folder {} has no pubspec.yaml", folder.display());
            }
            Ok(folder)
        }
        None => Err(Error::SelectionCancelled),
    }
}

/// Resolve without prompting
pub fn resolve_without_prompt(roots: &ProjectRoots) -> Result<PathBuf> {
    find_project_root(&roots.active, roots.workspace.as_deref())
        .ok_or_else(|| Error::no_project(&roots.active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingHost;
    use brdemon_daemon::test_utils::write_pubspec;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_heuristic_wins_without_prompt() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("pkg");
        write_pubspec(&project, false);
        let roots = ProjectRoots::new(&project, Some(temp.path().to_path_buf()));
        let host = RecordingHost::new();

        let dir = resolve_working_directory(&roots, &host).await.unwrap();
        assert_eq!(dir, dunce::canonicalize(&project).unwrap());
        assert!(host.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_picked_folder() {
        let temp = TempDir::new().unwrap();
        let picked = temp.path().join("elsewhere");
        write_pubspec(&picked, true);
        let host = RecordingHost::new().with_folder(Some(picked.clone()));
        let roots = ProjectRoots::new(temp.path(), Some(temp.path().to_path_buf()));

        let dir = resolve_working_directory(&roots, &host).await.unwrap();
        assert_eq!(dir, dunce::canonicalize(&picked).unwrap());
        assert_eq!(host.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_dismissed_picker_cancels() {
        let temp = TempDir::new().unwrap();
        let host = RecordingHost::new().with_folder(None);
        let roots = ProjectRoots::new(temp.path(), Some(temp.path().to_path_buf()));

        let result = resolve_working_directory(&roots, &host).await;
        assert!(matches!(result, Err(Error::SelectionCancelled)));
    }

    #[test]
    fn test_resolve_without_prompt_errors() {
        let temp = TempDir::new().unwrap();
        let roots = ProjectRoots::new(temp.path(), None);
        assert!(matches!(
            resolve_without_prompt(&roots),
            Err(Error::NoProject { .. })
        ));
    }

    #[test]
    fn test_config_root_prefers_project() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("app");
        write_pubspec(&project, true);
        let roots = ProjectRoots::new(project.join("pubspec.yaml"), None);

        assert_eq!(roots.config_root(), dunce::canonicalize(&project).unwrap());
    }
}
