//! Unit tests for the builtin command handlers.

use rpcctl_client::{Outcome, RpcClientError};
use rpcctl_config::Config;
use rpcctl_plugins::CommandRegistry;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::cli::Cli;
use crate::tests::support::StubCall;

#[fixture]
fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    catalog()
        .load(&mut registry, &["scheduler"])
        .expect("builtin plugins load");
    registry
}

/// Parses `argv` as a command line and dispatches it against `client`.
fn run(
    registry: &CommandRegistry,
    argv: &[&str],
    client: &mut StubCall,
) -> (Result<(), CommandError>, String) {
    let matches = Cli::command_tree(registry)
        .try_get_matches_from(std::iter::once("rpcctl").chain(argv.iter().copied()))
        .expect("command line parses");
    let globals = Cli::default().globals(&Config::default());
    let (spec, namespace) = registry.resolve(&matches, &globals).expect("command resolves");
    let mut output = Vec::new();
    let result = registry.dispatch(spec.name(), &namespace, client, &mut output);
    (result, String::from_utf8(output).expect("utf-8 output"))
}

fn reply(value: Value) -> Result<Outcome, RpcClientError> {
    Ok(Outcome::Value(value))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[test]
fn default_catalog_omits_the_scheduler() {
    let mut registry = CommandRegistry::new();
    catalog().load::<&str>(&mut registry, &[]).expect("load");
    assert_eq!(registry.plugin_of("spdk_get_version"), Some("core"));
    assert_eq!(registry.plugin_of("bdev_get_bdevs"), Some("bdev"));
    assert_eq!(registry.plugin_of("framework_set_scheduler"), None);
    assert_eq!(registry.names().next(), Some("rpc_get_methods"));
}

#[rstest]
fn scheduler_loads_on_request(registry: CommandRegistry) {
    assert_eq!(registry.plugin_of("framework_set_scheduler"), Some("scheduler"));
}

// ---------------------------------------------------------------------------
// app
// ---------------------------------------------------------------------------

#[rstest]
#[case(&["rpc_get_methods"], None)]
#[case(&["rpc_get_methods", "--current"], Some(json!({"current": true})))]
#[case(
    &["rpc_get_methods", "--current", "--include-aliases"],
    Some(json!({"current": true, "include_aliases": true}))
)]
fn rpc_get_methods_sends_only_set_flags(
    registry: CommandRegistry,
    #[case] argv: &[&str],
    #[case] expected: Option<Value>,
) {
    let mut client = StubCall::replying([reply(json!(["spdk_get_version"]))]);

    let (result, output) = run(&registry, argv, &mut client);

    result.expect("success");
    assert_eq!(client.calls, vec![(String::from("rpc_get_methods"), expected)]);
    assert_eq!(output, "[\n  \"spdk_get_version\"\n]\n");
}

#[rstest]
fn kill_instance_accepts_a_closed_connection(registry: CommandRegistry) {
    let mut client = StubCall::replying([Ok(Outcome::Terminated)]);

    let (result, output) = run(&registry, &["spdk_kill_instance", "SIGTERM"], &mut client);

    result.expect("terminated is success");
    assert_eq!(
        client.calls,
        vec![(
            String::from("spdk_kill_instance"),
            Some(json!({"sig_name": "SIGTERM"}))
        )]
    );
    assert!(output.is_empty());
}

// ---------------------------------------------------------------------------
// bdev
// ---------------------------------------------------------------------------

#[rstest]
fn malloc_create_converts_size_to_blocks(registry: CommandRegistry) {
    let mut client = StubCall::replying([reply(json!("Malloc0"))]);

    let (result, output) = run(
        &registry,
        &["bdev_malloc_create", "64", "512", "-b", "Malloc0"],
        &mut client,
    );

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(
            String::from("bdev_malloc_create"),
            Some(json!({"num_blocks": 131_072, "block_size": 512, "name": "Malloc0"}))
        )]
    );
    assert_eq!(output, "Malloc0\n");
}

#[rstest]
#[case(&["bdev_malloc_create", "64", "0"])]
#[case(&["bdev_malloc_create", "0", "512"])]
#[case(&["bdev_null_create", "Null0", "64", "-4096"])]
fn nonsensical_sizes_fail_before_calling(registry: CommandRegistry, #[case] argv: &[&str]) {
    let mut client = StubCall::default();

    let (result, _) = run(&registry, argv, &mut client);

    assert!(matches!(result, Err(CommandError::InvalidArgument { .. })));
    assert!(client.calls.is_empty());
}

#[rstest]
fn null_create_sends_name_first(registry: CommandRegistry) {
    let mut client = StubCall::replying([reply(json!("Null0"))]);

    let (result, _) = run(
        &registry,
        &["bdev_null_create", "Null0", "1", "4096", "-u", "f5a8"],
        &mut client,
    );

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(
            String::from("bdev_null_create"),
            Some(json!({"name": "Null0", "num_blocks": 256, "block_size": 4096, "uuid": "f5a8"}))
        )]
    );
}

#[rstest]
#[case(&["bdev_get_bdevs"], None)]
#[case(&["bdev_get_bdevs", "-b", "Malloc0", "-t", "100"], Some(json!({"name": "Malloc0", "timeout_ms": 100})))]
fn get_bdevs_omits_unsupplied_filters(
    registry: CommandRegistry,
    #[case] argv: &[&str],
    #[case] expected: Option<Value>,
) {
    let mut client = StubCall::replying([reply(json!([]))]);

    let (result, output) = run(&registry, argv, &mut client);

    result.expect("success");
    assert_eq!(client.calls, vec![(String::from("bdev_get_bdevs"), expected)]);
    assert_eq!(output, "[]\n");
}

#[rstest]
fn rpc_errors_propagate_from_handlers(registry: CommandRegistry) {
    let mut client = StubCall::replying([Err(RpcClientError::Rpc {
        method: String::from("bdev_malloc_delete"),
        request: json!({"method": "bdev_malloc_delete"}),
        error: json!({"code": -19, "message": "No such device"}),
    })]);

    let (result, _) = run(&registry, &["bdev_malloc_delete", "Malloc9"], &mut client);

    assert!(matches!(
        result,
        Err(CommandError::Rpc(RpcClientError::Rpc { .. }))
    ));
}

// ---------------------------------------------------------------------------
// nvmf
// ---------------------------------------------------------------------------

#[rstest]
#[case("nvmf_subsystem_add_listener")]
#[case("nvmf_subsystem_remove_listener")]
fn listeners_group_the_address(registry: CommandRegistry, #[case] command: &str) {
    let mut client = StubCall::replying([reply(json!(true))]);

    let (result, output) = run(
        &registry,
        &[
            command,
            "discovery",
            "-t",
            "tcp",
            "-a",
            "127.0.0.1",
            "-s",
            "4420",
        ],
        &mut client,
    );

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(
            command.to_owned(),
            Some(json!({
                "nqn": "nqn.2014-08.org.nvmexpress.discovery",
                "listen_address": {"trtype": "tcp", "traddr": "127.0.0.1", "trsvcid": "4420"}
            }))
        )]
    );
    assert!(output.is_empty());
}

#[rstest]
#[case(&["nvmf_create_transport", "-t", "TCP"], json!({"trtype": "TCP", "no_srq": false, "c2h_success": true}))]
#[case(
    &["nvmf_create_transport", "-t", "RDMA", "-r", "-o", "-q", "64"],
    json!({"trtype": "RDMA", "max_queue_depth": 64, "no_srq": true, "c2h_success": false})
)]
fn create_transport_fills_defaults(
    registry: CommandRegistry,
    #[case] argv: &[&str],
    #[case] expected: Value,
) {
    let mut client = StubCall::replying([reply(json!(true))]);

    let (result, _) = run(&registry, argv, &mut client);

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(String::from("nvmf_create_transport"), Some(expected))]
    );
}

#[rstest]
fn add_ns_groups_namespace_fields(registry: CommandRegistry) {
    let mut client = StubCall::replying([reply(json!(1))]);

    let (result, output) = run(
        &registry,
        &["nvmf_subsystem_add_ns", "nqn.2016-06.io.spdk:cnode1", "Malloc0", "-n", "1"],
        &mut client,
    );

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(
            String::from("nvmf_subsystem_add_ns"),
            Some(json!({
                "nqn": "nqn.2016-06.io.spdk:cnode1",
                "namespace": {"bdev_name": "Malloc0", "nsid": 1}
            }))
        )]
    );
    assert_eq!(output, "1\n");
}

// ---------------------------------------------------------------------------
// scheduler
// ---------------------------------------------------------------------------

#[rstest]
fn set_scheduler_sends_name_and_period(registry: CommandRegistry) {
    let mut client = StubCall::default();

    let (result, _) = run(
        &registry,
        &["framework_set_scheduler", "dynamic", "-p", "1000000"],
        &mut client,
    );

    result.expect("success");
    assert_eq!(
        client.calls,
        vec![(
            String::from("framework_set_scheduler"),
            Some(json!({"name": "dynamic", "period": 1_000_000}))
        )]
    );
}
