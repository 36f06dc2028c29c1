use super::{core_error, json_pretty, EXIT_SUCCESS};
use vrlab_core::NodeRegistry;

pub fn run(json: bool) -> Result<u8, String> {
    let registry = NodeRegistry::with_builtin_kinds().map_err(|e| core_error(&e))?;

    if json {
        let kinds: Vec<_> = registry
            .kinds()
            .map(|kind| {
                serde_json::json!({
                    "kind": kind,
                    "default_credentials": registry.credentials(kind),
                })
            })
            .collect();
        println!("{}", json_pretty(&kinds)?);
    } else {
        for kind in registry.kinds() {
            match registry.credentials(kind) {
                Some(c) => println!("{kind:<16} {}/{}", c.username, c.password),
                None => println!("{kind}"),
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
