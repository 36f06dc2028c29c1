use super::{
    build_driver, core_error, json_pretty, load_node, open_runtime, spin_fail, spin_ok, spinner,
    EXIT_FAILURE, EXIT_SUCCESS,
};
use std::path::Path;
use std::time::Duration;
use vrlab_core::{bring_up, PeerMap};
use vrlab_runtime::{check_host_requirements, format_missing, CancelToken, ExecContext};

pub struct DeployArgs<'a> {
    pub node_file: &'a Path,
    pub runtime: &'a str,
    pub timeout: Option<u64>,
    pub strict_render: bool,
    pub skip_prereqs: bool,
}

pub fn run(args: &DeployArgs<'_>, cancel: &CancelToken, json: bool) -> Result<u8, String> {
    let node = load_node(args.node_file)?;
    let runtime = open_runtime(args.runtime)?;
    let mut driver = build_driver(node, runtime, args.strict_render)?;

    // Init sets virt_required, so the KVM check can only run now.
    if !args.skip_prereqs {
        let missing = check_host_requirements(&driver.config().host_requirements);
        if !missing.is_empty() {
            eprintln!("error: {}", format_missing(&missing));
            return Ok(EXIT_FAILURE);
        }
    }

    let ctx = match args.timeout {
        Some(secs) => ExecContext::with_timeout(Duration::from_secs(secs)),
        None => ExecContext::background(),
    }
    .with_cancel_token(cancel.clone());

    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "deploying {} ({})...",
            driver.config().short_name,
            driver.kind()
        )))
    };

    let report = match bring_up(driver.as_mut(), &ctx, &PeerMap::new()) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "node deployed");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "deploy failed");
            }
            return Err(core_error(&e));
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!("deployed {} as {}", report.short_name, report.long_name);
        for (role, image) in &report.images {
            println!("{role}: {image}");
        }
        if let Some(path) = &report.rendered_config {
            println!("startup config: {}", path.display());
        }
        for w in &report.warnings {
            eprintln!("warning: node {}: {}", w.node, w.message);
        }
    }
    Ok(EXIT_SUCCESS)
}
