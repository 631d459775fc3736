//! Function invocation: local simulation and remote calls.
//!
//! Local invocation runs the handler in a Python interpreter with the
//! project directory as working directory, the event on stdin, and a
//! context object that mirrors the one Lambda passes. The configured
//! environment variables are exported into the handler process and the
//! configured timeout is enforced.

use crate::aws::{FunctionApi, InvokeOutput};
use crate::bundle::dependencies::find_python;
use crate::config::FunctionConfig;
use crate::error::{InvokeError, Result};
use base64::Engine as _;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default event file name inside a project directory
pub const DEFAULT_EVENT_FILE: &str = "event.json";

const SHIM: &str = include_str!("shim.py");

/// A parsed `<module>.<function>` handler reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    /// Importable module path
    pub module: String,
    /// Function inside the module
    pub function: String,
}

impl HandlerRef {
    /// Parse a handler string. Dotted module paths are allowed; the last
    /// segment names the function.
    pub fn parse(handler: &str) -> std::result::Result<Self, InvokeError> {
        match handler.rsplit_once('.') {
            Some((module, function)) if !module.is_empty() && !function.is_empty() => Ok(Self {
                module: module.to_string(),
                function: function.to_string(),
            }),
            _ => Err(InvokeError::InvalidHandler {
                handler: handler.to_string(),
            }),
        }
    }

    /// Source file for the module, relative to the project
    pub fn file_name(&self) -> PathBuf {
        let mut path: PathBuf = self.module.split('.').collect();
        path.set_extension("py");
        path
    }
}

/// Read and parse an event file
pub fn read_event(path: &Path) -> std::result::Result<serde_json::Value, InvokeError> {
    let contents = std::fs::read_to_string(path).map_err(|e| InvokeError::Event {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| InvokeError::Event {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Everything needed to run a handler locally
#[derive(Debug, Clone)]
pub struct LocalInvocation {
    /// Project directory (working directory of the handler)
    pub project: PathBuf,
    /// Handler to call
    pub handler: HandlerRef,
    /// Event payload
    pub event: serde_json::Value,
    /// Function name exposed on the context
    pub function_name: String,
    /// Memory limit exposed on the context
    pub memory_size: i32,
    /// Hard timeout
    pub timeout: Duration,
    /// Variables exported into the handler process
    pub environment: BTreeMap<String, String>,
    /// Interpreter
    pub python: PathBuf,
}

/// Result of a local invocation
#[derive(Debug, Clone)]
pub struct LocalResult {
    /// JSON-encoded handler return value
    pub output: String,
    /// Wall-clock execution time
    pub duration: Duration,
    /// Request id passed on the context
    pub request_id: String,
    /// Timeout that applied
    pub timeout: Duration,
}

impl LocalInvocation {
    /// Prepare a local invocation from the project config and event file
    pub fn from_config(
        project: &Path,
        config: &FunctionConfig,
        event_file: &Path,
        python: Option<&Path>,
    ) -> Result<Self> {
        let handler = HandlerRef::parse(config.handler()?)?;
        let event = read_event(event_file)?;
        let python = find_python(python)
            .map_err(|e| InvokeError::InterpreterNotFound(e.to_string()))?;

        let mut environment = config.environment().unwrap_or_default();
        if let Some(profile) = &config.profile {
            environment.insert("AWS_PROFILE".to_string(), profile.clone());
        }

        let timeout_secs = u64::try_from(config.timeout_or_default()).unwrap_or(0).max(1);

        Ok(Self {
            project: project.to_path_buf(),
            handler,
            event,
            function_name: config.function_name.clone().unwrap_or_default(),
            memory_size: config.memory_size_or_default(),
            timeout: Duration::from_secs(timeout_secs),
            environment,
            python,
        })
    }

    /// Variables describing the invocation to the context object
    fn context_environment(&self, request_id: &str) -> BTreeMap<String, String> {
        let deadline = chrono::Utc::now().timestamp_millis() + self.timeout.as_millis() as i64;
        let mut vars = BTreeMap::new();
        vars.insert("AWS_LAMBDA_FUNCTION_NAME".to_string(), self.function_name.clone());
        vars.insert("AWS_LAMBDA_FUNCTION_VERSION".to_string(), "$LATEST".to_string());
        vars.insert(
            "AWS_LAMBDA_FUNCTION_MEMORY_SIZE".to_string(),
            self.memory_size.to_string(),
        );
        vars.insert("LAMBDA_DEPLOY_REQUEST_ID".to_string(), request_id.to_string());
        vars.insert("LAMBDA_DEPLOY_DEADLINE_MS".to_string(), deadline.to_string());
        vars
    }

    /// Run the handler
    pub async fn run(&self) -> Result<LocalResult> {
        let module_file = self.project.join(self.handler.file_name());
        if !module_file.is_file() {
            log::warn!("Handler module {} not found; relying on the import path", module_file.display());
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let result_file = tempfile::NamedTempFile::new()?;
        let shim_file = tempfile::Builder::new().suffix(".py").tempfile()?;
        std::fs::write(shim_file.path(), SHIM)?;

        let mut command = Command::new(&self.python);
        command
            .arg(shim_file.path())
            .arg(&self.handler.module)
            .arg(&self.handler.function)
            .arg(result_file.path())
            .current_dir(&self.project)
            .envs(&self.environment)
            .envs(self.context_environment(&request_id))
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!(
            "Invoking {}.{} with {}",
            self.handler.module,
            self.handler.function,
            self.python.display()
        );

        let payload = serde_json::to_vec(&self.event)?;
        let start = Instant::now();
        let mut child = command.spawn()?;
        let stdin = child.stdin.take();

        // The event is fed while stderr drains, both inside the timeout
        let write_event = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&payload).await {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("Handler exited before reading the whole event");
                    Ok(())
                }
                other => other,
            }
        };
        let execution = async {
            let (written, output) = tokio::join!(write_event, child.wait_with_output());
            written?;
            output
        };

        let output = match tokio::time::timeout(self.timeout, execution).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(InvokeError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
        };
        let duration = start.elapsed();

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() {
            eprint!("{stderr}");
        }
        if !output.status.success() {
            return Err(InvokeError::HandlerFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.lines().last().unwrap_or_default().to_string(),
            }
            .into());
        }

        let output = std::fs::read_to_string(result_file.path())?;
        Ok(LocalResult {
            output,
            duration,
            request_id,
            timeout: self.timeout,
        })
    }
}

/// Invoke the deployed function with an event payload
pub async fn invoke_remote<F: FunctionApi>(
    functions: &F,
    config: &FunctionConfig,
    event: &serde_json::Value,
) -> Result<InvokeOutput> {
    let name = config.effective_function_name()?;
    log::info!("Invoking deployed function {}", name);
    Ok(functions.invoke(&name, serde_json::to_vec(event)?).await?)
}

/// Decode the base64 log tail returned by a remote invoke
pub fn decode_log_tail(log_result: &str) -> String {
    base64::engine::general_purpose::STANDARD
        .decode(log_result)
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_else(|_| log_result.to_string())
}
