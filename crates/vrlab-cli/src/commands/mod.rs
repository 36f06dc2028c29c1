pub mod completions;
pub mod deploy;
pub mod destroy;
pub mod doctor;
pub mod images;
pub mod inspect;
pub mod kinds;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use vrlab_core::{CoreError, NodeDriver, NodeOptions, NodeRegistry};
use vrlab_runtime::{select_runtime, ContainerRuntime};
use vrlab_schema::{base_dir_of, parse_node_file, NormalizedNode};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NODE_FILE_ERROR: u8 = 2;
pub const EXIT_RUNTIME_ERROR: u8 = 3;

pub const NODE_FILE_PREFIX: &str = "node file error:";
pub const RUNTIME_PREFIX: &str = "runtime error:";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "post-deployed" => Style::new().green().apply_to(state).to_string(),
        "deployed" => Style::new().cyan().bold().apply_to(state).to_string(),
        "pre-deployed" => Style::new().yellow().apply_to(state).to_string(),
        "initialized" => Style::new().blue().apply_to(state).to_string(),
        "deleted" => Style::new().dim().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

/// Render a core error with the prefix `main` uses to pick the exit code.
pub fn core_error(err: &CoreError) -> String {
    match err {
        CoreError::Manifest(_) => err.to_string(),
        CoreError::Runtime(e) => format!("{RUNTIME_PREFIX} {e}"),
        other => other.to_string(),
    }
}

pub fn load_node(path: &Path) -> Result<NormalizedNode, String> {
    let file = parse_node_file(path).map_err(|e| format!("{NODE_FILE_PREFIX} {e}"))?;
    file.normalize(&base_dir_of(path))
        .map_err(|e| format!("{NODE_FILE_PREFIX} {e}"))
}

pub fn open_runtime(name: &str) -> Result<Arc<dyn ContainerRuntime>, String> {
    select_runtime(name)
        .map(Arc::from)
        .map_err(|e| format!("{RUNTIME_PREFIX} {e}"))
}

/// Construct the driver for a loaded node file.
pub fn build_driver(
    node: NormalizedNode,
    runtime: Arc<dyn ContainerRuntime>,
    strict_render: bool,
) -> Result<Box<dyn NodeDriver>, String> {
    let registry = NodeRegistry::with_builtin_kinds().map_err(|e| core_error(&e))?;
    let options = NodeOptions::new()
        .with_mgmt(node.mgmt)
        .with_runtime(runtime)
        .strict_render(strict_render);
    registry
        .create(node.spec, options)
        .map_err(|e| core_error(&e))
}
