use super::{
    build_driver, colorize_state, json_pretty, load_node, open_runtime, EXIT_SUCCESS,
    RUNTIME_PREFIX,
};
use std::path::Path;
use std::sync::Arc;
use vrlab_core::NodeDriver;
use vrlab_runtime::mock::MockRuntime;
use vrlab_runtime::{CancelToken, ContainerRuntime, ExecContext, RuntimeError};

/// Show the spec a driver would hand to the runtime, without deploying.
///
/// With `runtime` set, the live container state is looked up as well.
pub fn run(
    node_file: &Path,
    runtime: Option<&str>,
    cancel: &CancelToken,
    json: bool,
) -> Result<u8, String> {
    let node = load_node(node_file)?;
    let mgmt = node.mgmt.clone();
    // Init never calls the runtime; a mock keeps inspect side-effect free.
    let backend: Arc<dyn ContainerRuntime> = match runtime {
        Some(name) => open_runtime(name)?,
        None => Arc::new(MockRuntime::new()),
    };
    let driver = build_driver(node, backend, false)?;
    let container = match runtime {
        Some(_) => Some(container_state(driver.as_ref(), cancel)?),
        None => None,
    };
    let spec = driver.config();

    if json {
        let mut payload = serde_json::json!({
            "kind": driver.kind(),
            "state": driver.state(),
            "spec": spec,
            "mgmt": mgmt,
        });
        if let Some(container) = &container {
            payload["container"] = serde_json::Value::from(container.as_str());
        }
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("kind:        {}", driver.kind());
        println!("state:       {}", colorize_state(&driver.state().to_string()));
        if let Some(container) = &container {
            println!("container:   {container}");
        }
        println!("short_name:  {}", spec.short_name);
        println!("long_name:   {}", spec.long_name);
        println!("image:       {}", spec.image);
        println!("lab_dir:     {}", spec.lab_dir.display());
        println!(
            "startup:     {}",
            spec.startup_config_source()
                .map_or_else(|| "(none)".to_owned(), |p| p.display().to_string())
        );
        println!("network:     {}", spec.mgmt_network);
        println!("virt:        {}", spec.host_requirements.virt_required);
        println!("cmd:         {}", spec.cmd);
        println!("binds:");
        for bind in &spec.binds {
            println!("  {bind}");
        }
        println!("env:");
        for (key, value) in &spec.env {
            println!("  {key}={value}");
        }
    }
    Ok(EXIT_SUCCESS)
}

fn container_state(driver: &dyn NodeDriver, cancel: &CancelToken) -> Result<String, String> {
    let ctx = ExecContext::background().with_cancel_token(cancel.clone());
    let long_name = &driver.config().long_name;
    match driver.runtime().status(&ctx, long_name) {
        Ok(status) => Ok(status.to_string()),
        Err(RuntimeError::ContainerNotFound(_)) => Ok("absent".to_owned()),
        Err(e) => Err(format!("{RUNTIME_PREFIX} {e}")),
    }
}
