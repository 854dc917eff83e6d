//! Unit tests for command declarations.

use clap::Command;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;

fn noop(_: Invocation<'_>) -> Result<(), CommandError> {
    Ok(())
}

#[fixture]
fn malloc_create() -> CommandSpec {
    CommandSpec::new("bdev_malloc_create", "Create a malloc bdev", noop)
        .arg(ArgSpec::positional("total_size", ArgKind::Float).help("Size in MiB"))
        .arg(ArgSpec::positional("block_size", ArgKind::Integer))
        .arg(ArgSpec::option("name", ArgKind::String).short('b'))
        .arg(ArgSpec::option("uuid", ArgKind::String).short('u'))
        .arg(ArgSpec::option("optimal_io_boundary", ArgKind::Integer).short('o'))
}

fn parse(spec: &CommandSpec, argv: &[&str]) -> Result<ArgMatches, clap::Error> {
    let root = Command::new("rpcctl").subcommand(spec.to_clap());
    let mut full = vec!["rpcctl", spec.name()];
    full.extend_from_slice(argv);
    let matches = root.try_get_matches_from(full)?;
    Ok(matches
        .subcommand_matches(spec.name())
        .cloned()
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[rstest]
fn well_formed_specs_validate(malloc_create: CommandSpec) {
    assert_eq!(malloc_create.validate(), Ok(()));
}

#[rstest]
#[case("")]
#[case("  ")]
#[case("bdev get")]
#[case("-x")]
fn unusable_command_names_are_rejected(#[case] name: &str) {
    let spec = CommandSpec::new(name, "", noop);
    assert!(matches!(
        spec.validate(),
        Err(ConfigurationError::InvalidName { .. })
    ));
}

#[test]
fn repeated_arguments_are_rejected() {
    let spec = CommandSpec::new("bdev_null_create", "", noop)
        .arg(ArgSpec::positional("name", ArgKind::String))
        .arg(ArgSpec::option("name", ArgKind::String));
    assert_eq!(
        spec.validate(),
        Err(ConfigurationError::DuplicateArgument {
            command: String::from("bdev_null_create"),
            argument: String::from("name"),
        })
    );
}

#[rstest]
#[case("timeout")]
#[case("verbose")]
#[case("server_addr")]
fn global_argument_names_are_reserved(#[case] argument: &str) {
    let spec = CommandSpec::new("bdev_get_bdevs", "", noop)
        .arg(ArgSpec::option(argument, ArgKind::String));
    assert!(matches!(
        spec.validate(),
        Err(ConfigurationError::ReservedArgument { .. })
    ));
}

#[rstest]
#[case('b', 'b')]
#[case('h', 'x')]
fn clashing_short_flags_are_rejected(#[case] first: char, #[case] second: char) {
    let spec = CommandSpec::new("bdev_get_bdevs", "", noop)
        .arg(ArgSpec::option("name", ArgKind::String).short(first))
        .arg(ArgSpec::option("bdev", ArgKind::String).short(second));
    assert!(matches!(
        spec.validate(),
        Err(ConfigurationError::ConflictingShort { .. })
    ));
}

#[test]
fn positional_flags_are_rejected() {
    let spec = CommandSpec::new("rpc_get_methods", "", noop)
        .arg(ArgSpec::positional("current", ArgKind::Flag));
    assert!(matches!(
        spec.validate(),
        Err(ConfigurationError::InvalidArgument { .. })
    ));
}

// ---------------------------------------------------------------------------
// Namespace extraction
// ---------------------------------------------------------------------------

#[rstest]
fn namespace_carries_globals_and_declared_arguments(malloc_create: CommandSpec) {
    let matches = parse(&malloc_create, &["64", "512", "-b", "Malloc0"]).expect("parse");
    let globals = ParamObject::new().with("verbose", json!(false));

    let namespace = malloc_create.namespace(&matches, &globals);

    let keys: Vec<&str> = namespace.keys().collect();
    assert_eq!(
        keys,
        vec![
            "verbose",
            "called_rpc_name",
            "total_size",
            "block_size",
            "name",
            "uuid",
            "optimal_io_boundary",
        ]
    );
    assert_eq!(namespace.value("total_size"), Some(&json!(64.0)));
    assert_eq!(namespace.value("block_size"), Some(&json!(512)));
    assert_eq!(namespace.value("name"), Some(&json!("Malloc0")));
    assert_eq!(namespace.get("uuid"), Some(&Param::Absent));
    assert_eq!(
        namespace.value("called_rpc_name"),
        Some(&json!("bdev_malloc_create"))
    );
}

#[test]
fn flags_default_to_false_and_options_to_declared_defaults() {
    let spec = CommandSpec::new("rpc_get_methods", "", noop)
        .arg(ArgSpec::option("current", ArgKind::Flag))
        .arg(ArgSpec::option("period", ArgKind::Integer).default_value(1000));
    let matches = parse(&spec, &[]).expect("parse");

    let namespace = spec.namespace(&matches, &ParamObject::new());

    assert_eq!(namespace.value("current"), Some(&json!(false)));
    assert_eq!(namespace.value("period"), Some(&json!(1000)));
}

#[test]
fn list_arguments_collect_every_value() {
    let spec = CommandSpec::new("bdev_raid_create", "", noop)
        .arg(ArgSpec::option("base_bdevs", ArgKind::List).short('b'));
    let matches = parse(&spec, &["-b", "Malloc0", "Malloc1"]).expect("parse");

    let namespace = spec.namespace(&matches, &ParamObject::new());

    assert_eq!(
        namespace.value("base_bdevs"),
        Some(&json!(["Malloc0", "Malloc1"]))
    );
}

#[rstest]
fn malformed_numbers_fail_to_parse(malloc_create: CommandSpec) {
    assert!(parse(&malloc_create, &["64", "big"]).is_err());
}

#[rstest]
fn missing_positionals_fail_to_parse(malloc_create: CommandSpec) {
    assert!(parse(&malloc_create, &["64"]).is_err());
}

#[test]
fn long_flags_replace_underscores() {
    let spec = CommandSpec::new("bdev_get_bdevs", "", noop)
        .arg(ArgSpec::option("timeout_ms", ArgKind::Integer).short('t'));
    let matches = parse(&spec, &["--timeout-ms", "250"]).expect("parse");

    let namespace = spec.namespace(&matches, &ParamObject::new());

    assert_eq!(namespace.value("timeout_ms"), Some(&json!(250)));
}
