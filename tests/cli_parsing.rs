use clap::Parser;
use ctxlog::cli::{Cli, Commands};
use ctxlog::{FieldValue, Level};

#[test]
fn test_parse_serve_with_bind() {
    let cli = Cli::try_parse_from(["ctxlog", "serve", "--bind", "0.0.0.0:9000"]).unwrap();

    match cli.command {
        Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000")),
        other => panic!("Wrong command: {other:?}"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn test_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["ctxlog", "sweep", "--config", "/etc/ctxlog.yaml", "--json"])
        .unwrap();

    assert!(matches!(cli.command, Commands::Sweep(_)));
    assert_eq!(cli.config.unwrap().to_str(), Some("/etc/ctxlog.yaml"));
    assert!(cli.json);
}

#[test]
fn test_parse_emit() {
    let cli = Cli::try_parse_from([
        "ctxlog",
        "emit",
        "user login",
        "--level",
        "warn",
        "--trace-id",
        "req-001",
        "-f",
        "user_id=42",
        "-f",
        "admin=false",
    ])
    .unwrap();

    match cli.command {
        Commands::Emit(args) => {
            assert_eq!(args.message, "user login");
            assert_eq!(args.level, Level::Warn);
            assert_eq!(args.trace_id.as_deref(), Some("req-001"));
            assert_eq!(args.fields.len(), 2);
            assert_eq!(args.fields[0].key(), "user_id");
            assert_eq!(args.fields[0].value(), &FieldValue::Int(42));
            assert_eq!(args.fields[1].value(), &FieldValue::Bool(false));
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_emit_defaults_to_info() {
    let cli = Cli::try_parse_from(["ctxlog", "emit", "hello"]).unwrap();
    match cli.command {
        Commands::Emit(args) => {
            assert_eq!(args.level, Level::Info);
            assert!(args.trace_id.is_none());
            assert!(args.fields.is_empty());
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_rejects_bad_level_and_field() {
    assert!(Cli::try_parse_from(["ctxlog", "emit", "x", "--level", "loud"]).is_err());
    assert!(Cli::try_parse_from(["ctxlog", "emit", "x", "-f", "novalue"]).is_err());
}
