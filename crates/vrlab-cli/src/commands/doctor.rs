use super::{EXIT_FAILURE, EXIT_SUCCESS};
use vrlab_core::NodeRegistry;
use vrlab_runtime::{check_host_requirements, check_runtime_prereqs, format_missing};
use vrlab_schema::HostRequirements;

pub fn run(runtime: &str, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    let missing = check_runtime_prereqs(runtime);
    if missing.is_empty() {
        checks.push(Check::pass(
            "runtime_prereqs",
            &format!("Runtime '{runtime}' prerequisites satisfied"),
        ));
    } else {
        all_pass = false;
        checks.push(Check::fail(
            "runtime_prereqs",
            &format!("Missing prerequisites: {}", format_missing(&missing)),
        ));
    }

    let virt = HostRequirements {
        virt_required: true,
    };
    if check_host_requirements(&virt).is_empty() {
        checks.push(Check::pass("kvm", "/dev/kvm is usable"));
    } else {
        all_pass = false;
        checks.push(Check::fail(
            "kvm",
            "/dev/kvm is missing or not accessible (VM-based nodes will not boot)",
        ));
    }

    match NodeRegistry::with_builtin_kinds() {
        Ok(registry) => {
            let kinds: Vec<&str> = registry.kinds().collect();
            checks.push(Check::info(
                "kinds",
                &format!("{} node kinds registered: {}", kinds.len(), kinds.join(", ")),
            ));
        }
        Err(e) => {
            all_pass = false;
            checks.push(Check::fail("kinds", &format!("Kind registry broken: {e}")));
        }
    }

    print_results(&checks, all_pass, json_output)
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("vrlab doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }

    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }
}
