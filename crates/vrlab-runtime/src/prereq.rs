use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::Command;
use vrlab_schema::HostRequirements;

const KVM_DEVICE: &str = "/dev/kvm";

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn kvm_usable(device: &Path) -> bool {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(device)
        .is_ok()
}

/// Check prerequisites for the named runtime backend.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_runtime_prereqs(runtime: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if runtime == "docker" && !command_exists("docker") {
        missing.push(MissingPrereq {
            name: "docker",
            purpose: "creating and running node containers",
            install_hint: "apt install docker.io | dnf install moby-engine | https://docs.docker.com/engine/install/",
        });
    }

    missing
}

/// Check that the host satisfies a node's declared requirements.
pub fn check_host_requirements(req: &HostRequirements) -> Vec<MissingPrereq> {
    check_host_requirements_with(req, Path::new(KVM_DEVICE))
}

fn check_host_requirements_with(req: &HostRequirements, kvm: &Path) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if req.virt_required && !kvm_usable(kvm) {
        missing.push(MissingPrereq {
            name: "kvm",
            purpose: "hardware virtualization for VM-based network OS images",
            install_hint: "enable VT-x/AMD-V in firmware, load kvm_intel or kvm_amd, and grant access to /dev/kvm",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nvrlab needs these to run network-OS nodes.");
    msg
}
