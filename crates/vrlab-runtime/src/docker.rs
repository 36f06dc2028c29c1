use crate::backend::{ContainerHandle, ContainerRuntime, ContainerStatus};
use crate::context::ExecContext;
use crate::RuntimeError;
use serde::Deserialize;
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;
use vrlab_schema::NodeSpec;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runtime backed by the `docker` command-line client.
pub struct DockerRuntime {
    binary: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self {
            binary: "docker".to_owned(),
        }
    }
}

impl DockerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run the client, killing it if the context is cancelled or expires.
    ///
    /// Both pipes are drained on their own threads while the child runs so a
    /// chatty client cannot block on a full pipe.
    fn run(&self, ctx: &ExecContext, args: &[String]) -> Result<Output, RuntimeError> {
        ctx.check()?;
        debug!("{} {}", self.binary, args.join(" "));
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Err(e) = ctx.check() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
            let nap = ctx
                .remaining()
                .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));
            std::thread::sleep(nap);
        };

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    /// Run the client and return trimmed stdout, mapping failures by stderr.
    fn run_checked(
        &self,
        ctx: &ExecContext,
        args: &[String],
        subject: &str,
    ) -> Result<String, RuntimeError> {
        let output = self.run(ctx, args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(classify_failure(&stderr, subject))
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Arguments for `docker create` built from a prepared node spec.
pub fn create_args(spec: &NodeSpec) -> Vec<String> {
    let mut args = vec![
        "create".to_owned(),
        "--name".to_owned(),
        spec.long_name.clone(),
        "--hostname".to_owned(),
        spec.short_name.clone(),
        "--label".to_owned(),
        format!("vrlab-node-kind={}", spec.kind),
        "--label".to_owned(),
        format!("vrlab-node-name={}", spec.short_name),
    ];
    if spec.host_requirements.virt_required {
        args.push("--privileged".to_owned());
    }
    if !spec.mgmt_network.is_empty() {
        args.push("--network".to_owned());
        args.push(spec.mgmt_network.clone());
    }
    for (key, value) in &spec.env {
        args.push("-e".to_owned());
        args.push(format!("{key}={value}"));
    }
    for bind in &spec.binds {
        args.push("-v".to_owned());
        args.push(bind.to_string());
    }
    args.push(spec.image.clone());
    args.extend(spec.cmd.split_whitespace().map(str::to_owned));
    args
}

fn classify_failure(stderr: &str, subject: &str) -> RuntimeError {
    let lower = stderr.to_lowercase();
    if lower.contains("no such container") {
        RuntimeError::ContainerNotFound(subject.to_owned())
    } else if lower.contains("is already in use") || lower.contains("conflict") {
        RuntimeError::AlreadyExists(subject.to_owned())
    } else if lower.contains("no such image")
        || lower.contains("unable to find image")
        || lower.contains("pull access denied")
    {
        RuntimeError::ImageNotFound(subject.to_owned())
    } else {
        RuntimeError::ExecFailed(stderr.trim().to_owned())
    }
}

#[derive(Deserialize)]
struct InspectState {
    #[serde(rename = "Status")]
    status: String,
}

/// Parse the `{{json .State}}` output of `docker inspect`.
fn parse_status(raw: &str) -> Result<ContainerStatus, RuntimeError> {
    let state: InspectState = serde_json::from_str(raw.trim())
        .map_err(|e| RuntimeError::ExecFailed(format!("unexpected docker inspect output: {e}")))?;
    Ok(match state.status.as_str() {
        "created" => ContainerStatus::Created,
        "running" | "restarting" | "paused" => ContainerStatus::Running,
        _ => ContainerStatus::Exited,
    })
}

impl ContainerRuntime for DockerRuntime {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn available(&self) -> bool {
        Command::new(&self.binary)
            .args(["version", "--format", "{{.Server.Version}}"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn create_container(
        &self,
        ctx: &ExecContext,
        spec: &NodeSpec,
    ) -> Result<ContainerHandle, RuntimeError> {
        let id = self.run_checked(ctx, &create_args(spec), &spec.long_name)?;
        if id.is_empty() {
            return Err(RuntimeError::ExecFailed(format!(
                "docker create returned no id for {}",
                spec.long_name
            )));
        }
        Ok(ContainerHandle::new(id))
    }

    fn start_container(
        &self,
        ctx: &ExecContext,
        handle: &ContainerHandle,
        spec: &NodeSpec,
    ) -> Result<ContainerStatus, RuntimeError> {
        let args = vec!["start".to_owned(), handle.as_str().to_owned()];
        self.run_checked(ctx, &args, &spec.long_name)?;
        Ok(ContainerStatus::Running)
    }

    fn delete_container(&self, ctx: &ExecContext, long_name: &str) -> Result<(), RuntimeError> {
        let args = vec!["rm".to_owned(), "-f".to_owned(), long_name.to_owned()];
        self.run_checked(ctx, &args, long_name)?;
        Ok(())
    }

    fn status(&self, ctx: &ExecContext, long_name: &str) -> Result<ContainerStatus, RuntimeError> {
        let args = vec![
            "inspect".to_owned(),
            "--format".to_owned(),
            "{{json .State}}".to_owned(),
            long_name.to_owned(),
        ];
        let raw = self.run_checked(ctx, &args, long_name)?;
        parse_status(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use vrlab_schema::{BindMount, HostRequirements};

    fn prepared_spec() -> NodeSpec {
        NodeSpec {
            kind: "vr-nxos".to_owned(),
            image: "nxos:9.3".to_owned(),
            short_name: "r1".to_owned(),
            long_name: "clab-dc1-r1".to_owned(),
            lab_dir: PathBuf::from("/lab/r1"),
            env: BTreeMap::from([
                ("USERNAME".to_owned(), "admin".to_owned()),
                ("VCPU".to_owned(), "2".to_owned()),
            ]),
            binds: vec![BindMount::read_write("/lab/r1/config", "/config")],
            cmd: "--username admin --hostname r1 --trace".to_owned(),
            host_requirements: HostRequirements {
                virt_required: true,
            },
            mgmt_network: "clab".to_owned(),
            ..NodeSpec::default()
        }
    }

    #[test]
    fn create_args_layout() {
        let args = create_args(&prepared_spec());
        let joined = args.join(" ");
        assert!(joined.starts_with("create --name clab-dc1-r1 --hostname r1"));
        assert!(joined.contains("--privileged"));
        assert!(joined.contains("--network clab"));
        assert!(joined.contains("-e USERNAME=admin -e VCPU=2"));
        assert!(joined.contains("-v /lab/r1/config:/config"));
        assert!(joined.ends_with("nxos:9.3 --username admin --hostname r1 --trace"));
    }

    #[test]
    fn create_args_without_virt_or_network() {
        let spec = NodeSpec {
            host_requirements: HostRequirements::default(),
            mgmt_network: String::new(),
            cmd: String::new(),
            ..prepared_spec()
        };
        let args = create_args(&spec);
        assert!(!args.iter().any(|a| a == "--privileged" || a == "--network"));
        assert_eq!(args.last().map(String::as_str), Some("nxos:9.3"));
    }

    #[test]
    fn failures_are_classified() {
        assert!(matches!(
            classify_failure("Error response from daemon: No such container: x", "x"),
            RuntimeError::ContainerNotFound(n) if n == "x"
        ));
        assert!(matches!(
            classify_failure(
                "Error response from daemon: Conflict. The container name \"/x\" is already in use",
                "x"
            ),
            RuntimeError::AlreadyExists(_)
        ));
        assert!(matches!(
            classify_failure("Unable to find image 'nxos:9.3' locally", "x"),
            RuntimeError::ImageNotFound(_)
        ));
        assert!(matches!(
            classify_failure("  something else  ", "x"),
            RuntimeError::ExecFailed(m) if m == "something else"
        ));
    }

    #[test]
    fn status_parsing() {
        let running = r#"{"Status":"running","Running":true,"Pid":4242}"#;
        assert_eq!(parse_status(running).unwrap(), ContainerStatus::Running);
        assert_eq!(
            parse_status("{\"Status\":\"created\"}\n").unwrap(),
            ContainerStatus::Created
        );
        assert_eq!(
            parse_status(r#"{"Status":"dead"}"#).unwrap(),
            ContainerStatus::Exited
        );
        assert!(parse_status("running").is_err());
    }

    #[test]
    fn missing_binary_is_io_error() {
        let runtime = DockerRuntime::with_binary("/nonexistent/vrlab-docker");
        assert!(!runtime.available());
        let err = runtime
            .delete_container(&ExecContext::background(), "clab-dc1-r1")
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Io(_)));
    }

    #[test]
    fn cancelled_context_skips_spawn() {
        let runtime = DockerRuntime::with_binary("/nonexistent/vrlab-docker");
        let token = crate::context::CancelToken::new();
        token.cancel();
        let ctx = ExecContext::background().with_cancel_token(token);
        assert!(matches!(
            runtime.delete_container(&ctx, "clab-dc1-r1"),
            Err(RuntimeError::Cancelled)
        ));
    }

    fn shell_args(script: &str) -> Vec<String> {
        vec!["-c".to_owned(), script.to_owned()]
    }

    #[test]
    fn large_stderr_does_not_stall_failure() {
        let runtime = DockerRuntime::with_binary("sh");
        let ctx = ExecContext::with_timeout(Duration::from_secs(10));
        let started = std::time::Instant::now();

        let err = runtime
            .run_checked(
                &ctx,
                &shell_args("head -c 200000 /dev/zero | tr '\\000' x >&2; exit 1"),
                "clab-dc1-r1",
            )
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            RuntimeError::ExecFailed(msg) => assert_eq!(msg.len(), 200_000),
            other => panic!("expected ExecFailed, got {other:?}"),
        }
    }

    #[test]
    fn large_stdout_is_collected() {
        let runtime = DockerRuntime::with_binary("sh");
        let out = runtime
            .run_checked(
                &ExecContext::background(),
                &shell_args("head -c 300000 /dev/zero | tr '\\000' y"),
                "clab-dc1-r1",
            )
            .unwrap();
        assert_eq!(out.len(), 300_000);
        assert!(out.bytes().all(|b| b == b'y'));
    }

    #[test]
    fn deadline_kills_slow_client() {
        let runtime = DockerRuntime::with_binary("sh");
        let ctx = ExecContext::with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = runtime
            .run_checked(&ctx, &shell_args("sleep 5"), "clab-dc1-r1")
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DeadlineExceeded));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
