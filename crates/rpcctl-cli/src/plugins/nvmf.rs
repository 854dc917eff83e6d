//! NVMe-oF target commands.

use rpcctl_plugins::output::print_json;
use rpcctl_plugins::{ArgKind, ArgSpec, CommandError, CommandSpec, Invocation, Param, ParamObject, Plugin};
use serde_json::Value;

use super::{call, supplied};

/// Well-known NQN of the discovery subsystem.
const DISCOVERY_NQN: &str = "nqn.2014-08.org.nvmexpress.discovery";

const LISTEN_ADDRESS_KEYS: &[&str] = &["trtype", "traddr", "trsvcid", "adrfam"];
const NAMESPACE_KEYS: &[&str] = &["bdev_name", "nsid", "nguid", "eui64", "uuid"];

pub(crate) struct NvmfPlugin;

impl Plugin for NvmfPlugin {
    fn name(&self) -> &str {
        "nvmf"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(
                "nvmf_create_transport",
                "Create an NVMe-oF transport",
                nvmf_create_transport,
            )
            .arg(
                ArgSpec::option("trtype", ArgKind::String)
                    .short('t')
                    .required()
                    .help("Transport type, e.g. RDMA or TCP"),
            )
            .arg(ArgSpec::option("tgt_name", ArgKind::String).help("Name of the parent target"))
            .arg(ArgSpec::option("max_queue_depth", ArgKind::Integer).short('q'))
            .arg(ArgSpec::option("max_io_qpairs_per_ctrlr", ArgKind::Integer).short('m'))
            .arg(ArgSpec::option("in_capsule_data_size", ArgKind::Integer).short('c'))
            .arg(ArgSpec::option("max_io_size", ArgKind::Integer).short('i'))
            .arg(ArgSpec::option("io_unit_size", ArgKind::Integer).short('u'))
            .arg(ArgSpec::option("max_aq_depth", ArgKind::Integer).short('a'))
            .arg(ArgSpec::option("num_shared_buffers", ArgKind::Integer).short('n'))
            .arg(
                ArgSpec::option("no_srq", ArgKind::Flag)
                    .short('r')
                    .help("Disable the per-thread shared receive queue"),
            )
            .arg(
                ArgSpec::option("no_c2h_success", ArgKind::Flag)
                    .short('o')
                    .help("Disable C2H success optimisation"),
            ),
            listener_command(
                "nvmf_subsystem_add_listener",
                "Add a listener to an NVMe-oF subsystem",
            ),
            listener_command(
                "nvmf_subsystem_remove_listener",
                "Remove a listener from an NVMe-oF subsystem",
            ),
            CommandSpec::new(
                "nvmf_subsystem_add_ns",
                "Add a namespace to an NVMe-oF subsystem",
                nvmf_subsystem_add_ns,
            )
            .arg(ArgSpec::positional("nqn", ArgKind::String).help("Subsystem NQN"))
            .arg(ArgSpec::positional("bdev_name", ArgKind::String).help("Name of the bdev to expose"))
            .arg(ArgSpec::option("tgt_name", ArgKind::String).help("Name of the parent target"))
            .arg(ArgSpec::option("nsid", ArgKind::Integer).short('n').help("Namespace ID"))
            .arg(ArgSpec::option("nguid", ArgKind::String).short('g').help("Namespace globally unique identifier"))
            .arg(ArgSpec::option("eui64", ArgKind::String).short('e').help("Namespace EUI-64 identifier"))
            .arg(ArgSpec::option("uuid", ArgKind::String).short('u').help("Namespace UUID")),
        ]
    }
}

fn listener_command(name: &str, help: &str) -> CommandSpec {
    CommandSpec::new(name, help, subsystem_listener)
        .arg(ArgSpec::positional("nqn", ArgKind::String).help("Subsystem NQN, or 'discovery'"))
        .arg(
            ArgSpec::option("trtype", ArgKind::String)
                .short('t')
                .required()
                .help("Transport type, e.g. RDMA or TCP"),
        )
        .arg(
            ArgSpec::option("traddr", ArgKind::String)
                .short('a')
                .required()
                .help("Transport address"),
        )
        .arg(ArgSpec::option("adrfam", ArgKind::String).short('f').help("Address family, e.g. IPv4"))
        .arg(ArgSpec::option("trsvcid", ArgKind::String).short('s').help("Transport service ID, e.g. a port"))
        .arg(ArgSpec::option("tgt_name", ArgKind::String).help("Name of the parent target"))
}

/// Rewrites the `discovery` shorthand to the discovery subsystem's NQN.
fn canonical_nqn(mut params: ParamObject) -> ParamObject {
    if params.value("nqn").and_then(Value::as_str) == Some("discovery") {
        params.insert("nqn", Value::from(DISCOVERY_NQN));
    }
    params
}

fn nvmf_create_transport(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let mut params = supplied(&invocation);
    if let Some(Param::Value(Value::Bool(disabled))) = params.remove("no_c2h_success")
        && disabled
    {
        params.insert("c2h_success", Value::Bool(false));
    }
    let params = params.apply_defaults([
        ("no_srq", Value::Bool(false)),
        ("c2h_success", Value::Bool(true)),
    ]);
    call(&mut invocation, "nvmf_create_transport", params)?;
    Ok(())
}

fn subsystem_listener(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let method = invocation.args.require_str("called_rpc_name")?.to_owned();
    let params = canonical_nqn(invocation.args.clone().strip_globals())
        .apply_defaults([("tgt_name", Param::Absent)])
        .group_as("listen_address", LISTEN_ADDRESS_KEYS)
        .remove_null();
    call(&mut invocation, &method, params)?;
    Ok(())
}

fn nvmf_subsystem_add_ns(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = canonical_nqn(invocation.args.clone().strip_globals())
        .group_as("namespace", NAMESPACE_KEYS)
        .remove_null();
    let nsid = call(&mut invocation, "nvmf_subsystem_add_ns", params)?.into_value();
    print_json(invocation.output, &nsid)?;
    Ok(())
}
