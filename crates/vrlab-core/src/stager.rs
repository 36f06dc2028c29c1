//! Host-side preparation of a node's config directory and startup config.

use crate::CoreError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vrlab_runtime::ConfigRenderer;

/// Subdirectory of the lab directory bind-mounted into the container.
pub const CONFIG_DIR_NAME: &str = "config";

/// A problem that did not stop staging.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageWarning {
    pub node: String,
    pub message: String,
}

/// Outcome of staging: where the config was rendered, and what went wrong
/// without aborting.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StageReport {
    pub rendered: Option<PathBuf>,
    pub warnings: Vec<StageWarning>,
}

impl StageReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn create_dir_permissive(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder.create(path)
}

/// Create `lab_dir` and its config subdirectory if absent.
///
/// Returns the config directory. Existing directories are left as they are.
pub fn ensure_dirs(lab_dir: &Path) -> Result<PathBuf, CoreError> {
    let config_dir = lab_dir.join(CONFIG_DIR_NAME);
    create_dir_permissive(lab_dir)?;
    create_dir_permissive(&config_dir)?;
    Ok(config_dir)
}

/// Render the startup config from `src` into `dest`.
///
/// No source means nothing to do. An unreadable source is an error; a
/// renderer failure is logged and returned as a warning.
pub fn stage_startup_config(
    src: Option<&Path>,
    dest: &Path,
    renderer: &dyn ConfigRenderer,
    node: &str,
) -> Result<StageReport, CoreError> {
    let Some(src) = src.filter(|p| !p.as_os_str().is_empty()) else {
        debug!("node={node}: no startup config to stage");
        return Ok(StageReport::default());
    };

    let template = fs::read_to_string(src).map_err(|source| CoreError::ConfigRead {
        path: src.to_path_buf(),
        source,
    })?;

    match renderer.generate_config(dest, &template) {
        Ok(()) => {
            debug!("node={node}: rendered {} -> {}", src.display(), dest.display());
            Ok(StageReport {
                rendered: Some(dest.to_path_buf()),
                warnings: Vec::new(),
            })
        }
        Err(e) => {
            warn!("node={node}, failed to generate config: {e}");
            Ok(StageReport {
                rendered: None,
                warnings: vec![StageWarning {
                    node: node.to_owned(),
                    message: e.to_string(),
                }],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vrlab_runtime::RenderError;

    /// Writes the template verbatim and counts invocations.
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl ConfigRenderer for CountingRenderer {
        fn generate_config(&self, dest: &Path, template: &str) -> Result<(), RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(dest, template)?;
            Ok(())
        }
    }

    struct FailingRenderer;

    impl ConfigRenderer for FailingRenderer {
        fn generate_config(&self, _dest: &Path, _template: &str) -> Result<(), RenderError> {
            Err(RenderError::Template("function \"serial\" not defined".to_owned()))
        }
    }

    #[test]
    fn ensure_dirs_creates_both_levels() {
        let dir = tempfile::tempdir().unwrap();
        let lab = dir.path().join("clab-dc1").join("r1");
        let config = ensure_dirs(&lab).unwrap();
        assert_eq!(config, lab.join("config"));
        assert!(lab.is_dir());
        assert!(config.is_dir());
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let lab = dir.path().join("r1");
        ensure_dirs(&lab).unwrap();
        fs::write(lab.join("config").join("keep"), "x").unwrap();
        ensure_dirs(&lab).unwrap();
        assert!(lab.join("config").join("keep").exists());
    }

    #[test]
    fn ensure_dirs_fails_when_path_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let lab = dir.path().join("r1");
        fs::write(&lab, "not a dir").unwrap();
        assert!(matches!(ensure_dirs(&lab), Err(CoreError::Io(_))));
    }

    #[test]
    fn no_source_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("startup-config.cfg");
        let renderer = CountingRenderer::default();

        let report = stage_startup_config(None, &dest, &renderer, "r1").unwrap();
        assert_eq!(report, StageReport::default());

        let report = stage_startup_config(Some(Path::new("")), &dest, &renderer, "r1").unwrap();
        assert!(report.rendered.is_none());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(!dest.exists());
    }

    #[test]
    fn renders_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("r1.cfg");
        fs::write(&src, "hostname r1\n").unwrap();
        let dest = dir.path().join("startup-config.cfg");
        let renderer = CountingRenderer::default();

        let report = stage_startup_config(Some(&src), &dest, &renderer, "r1").unwrap();
        assert_eq!(report.rendered.as_deref(), Some(dest.as_path()));
        assert!(report.is_clean());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hostname r1\n");
    }

    #[test]
    fn unreadable_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.cfg");
        let dest = dir.path().join("startup-config.cfg");
        let renderer = CountingRenderer::default();

        let err = stage_startup_config(Some(&src), &dest, &renderer, "r1").unwrap_err();
        assert!(matches!(err, CoreError::ConfigRead { ref path, .. } if *path == src));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(!dest.exists());
    }

    #[test]
    fn render_failure_becomes_warning() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("r1.cfg");
        fs::write(&src, "hostname {{ serial }}\n").unwrap();
        let dest = dir.path().join("startup-config.cfg");

        let report = stage_startup_config(Some(&src), &dest, &FailingRenderer, "r1").unwrap();
        assert!(report.rendered.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].node, "r1");
        assert!(report.warnings[0].message.contains("serial"));
    }
}
