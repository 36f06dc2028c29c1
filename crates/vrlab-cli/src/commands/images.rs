use super::{build_driver, json_pretty, load_node, EXIT_SUCCESS};
use std::path::Path;
use std::sync::Arc;
use vrlab_runtime::mock::MockRuntime;

pub fn run(node_file: &Path, json: bool) -> Result<u8, String> {
    let node = load_node(node_file)?;
    let driver = build_driver(node, Arc::new(MockRuntime::new()), false)?;
    let images = driver.images();

    if json {
        println!("{}", json_pretty(&images)?);
    } else {
        for (role, image) in &images {
            println!("{role}: {image}");
        }
    }
    Ok(EXIT_SUCCESS)
}
