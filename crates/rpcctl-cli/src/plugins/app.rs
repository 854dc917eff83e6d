//! Engine-wide commands: method discovery, version, init and shutdown.

use rpcctl_plugins::output::print_dict;
use rpcctl_plugins::{ArgKind, ArgSpec, CommandError, CommandSpec, Invocation, ParamObject, Plugin};
use serde_json::Value;

use super::call;

pub(crate) struct AppPlugin;

impl Plugin for AppPlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(
                "rpc_get_methods",
                "Get list of supported RPC methods",
                rpc_get_methods,
            )
            .arg(
                ArgSpec::option("current", ArgKind::Flag)
                    .help("Only methods callable in the current state"),
            )
            .arg(
                ArgSpec::option("include_aliases", ArgKind::Flag)
                    .help("Include deprecated method aliases"),
            ),
            CommandSpec::new(
                "spdk_get_version",
                "Get the engine version",
                spdk_get_version,
            ),
            CommandSpec::new(
                "framework_wait_init",
                "Block until subsystem initialization completes",
                framework_wait_init,
            ),
            CommandSpec::new(
                "spdk_kill_instance",
                "Send a signal to the engine",
                spdk_kill_instance,
            )
            .arg(
                ArgSpec::positional("sig_name", ArgKind::String)
                    .help("Signal to send, e.g. SIGTERM"),
            ),
        ]
    }
}

fn rpc_get_methods(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let mut params = ParamObject::new();
    for flag in ["current", "include_aliases"] {
        if invocation.args.value(flag) == Some(&Value::Bool(true)) {
            params.insert(flag, Value::Bool(true));
        }
    }
    let methods = call(&mut invocation, "rpc_get_methods", params)?.into_value();
    print_dict(invocation.output, &methods)?;
    Ok(())
}

fn spdk_get_version(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let version = call(&mut invocation, "spdk_get_version", ParamObject::new())?.into_value();
    print_dict(invocation.output, &version)?;
    Ok(())
}

fn framework_wait_init(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    call(&mut invocation, "framework_wait_init", ParamObject::new())?;
    Ok(())
}

fn spdk_kill_instance(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = ParamObject::new().with(
        "sig_name",
        Value::from(invocation.args.require_str("sig_name")?),
    );
    let outcome = call(&mut invocation, "spdk_kill_instance", params)?;
    if outcome.is_terminated() {
        tracing::debug!(target: "rpcctl_cli", "engine closed the connection after kill");
    }
    Ok(())
}
