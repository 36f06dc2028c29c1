use super::{build_driver, core_error, json_pretty, load_node, open_runtime, EXIT_SUCCESS};
use std::path::Path;
use vrlab_core::tear_down;
use vrlab_runtime::{CancelToken, ExecContext};

pub fn run(node_file: &Path, runtime: &str, cancel: &CancelToken, json: bool) -> Result<u8, String> {
    let node = load_node(node_file)?;
    let runtime = open_runtime(runtime)?;
    let mut driver = build_driver(node, runtime, false)?;

    let ctx = ExecContext::background().with_cancel_token(cancel.clone());
    tear_down(driver.as_mut(), &ctx).map_err(|e| core_error(&e))?;

    let long_name = &driver.config().long_name;
    if json {
        let payload = serde_json::json!({
            "long_name": long_name,
            "status": driver.state(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("destroyed {long_name}");
    }
    Ok(EXIT_SUCCESS)
}
