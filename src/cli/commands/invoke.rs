//! Invoke command implementation.

use super::helpers::load_project;
use crate::aws::AwsClients;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{InvokeError, Result};
use crate::invoke::{LocalInvocation, decode_log_tail, invoke_remote, read_event};

/// Execute invoke command
pub(super) async fn execute_invoke(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Invoke {
        project,
        event_file,
        remote,
        python,
    } = &args.command
    else {
        unreachable!("execute_invoke called with non-Invoke command");
    };

    let loaded = load_project(project)?;
    let event_path = loaded.root.join(event_file);

    if *remote {
        let event = read_event(&event_path)?;
        let clients = AwsClients::connect(&loaded.config).await;
        let output = invoke_remote(&clients.lambda, &loaded.config, &event).await?;

        // Payload goes to stdout unconditionally so it can be piped
        println!("{}", String::from_utf8_lossy(&output.payload));
        if let Some(log) = &output.log_result {
            config.verbose_println(&decode_log_tail(log));
        }
        if let Some(error) = output.function_error {
            return Err(InvokeError::HandlerFailed {
                code: output.status_code,
                stderr: error,
            }
            .into());
        }
        return Ok(());
    }

    let invocation = LocalInvocation::from_config(
        &loaded.root,
        &loaded.config,
        &event_path,
        python.as_deref(),
    )?;
    let result = invocation.run().await?;

    println!("{}", result.output);
    config.verbose_println(&format!("request id: {}", result.request_id));
    config.verbose_println(&format!(
        "execution time: {:.8}s",
        result.duration.as_secs_f64()
    ));
    config.verbose_println(&format!(
        "function execution timeout: {}s",
        result.timeout.as_secs()
    ));
    Ok(())
}
