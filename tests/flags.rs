// tests/flags.rs

use std::collections::BTreeMap;

use flue::exec::{Arguments, CompilerKind, Flag, FlagError};

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn switch_is_derived_from_name() {
    assert_eq!(Flag::new("o").switch(), "-o");
    assert_eq!(Flag::new("source_map").switch(), "--source-map");
    assert_eq!(Flag::new("config").switch(), "--config");
    assert_eq!(Flag::new("x").with_switch("--extra").switch(), "--extra");
}

#[test]
fn required_flag_rejects_blank_values() {
    let flag = Flag::new("config").required();
    assert!(flag.is_required());
    assert_eq!(
        flag.validate(None),
        Err(FlagError::InvalidFlagValue("config".to_string()))
    );
    assert_eq!(
        flag.validate(Some("   ")),
        Err(FlagError::InvalidFlagValue("config".to_string()))
    );
    assert_eq!(
        flag.validate(Some("  config.rb ")),
        Ok(Some("config.rb".to_string()))
    );
}

#[test]
fn optional_flag_accepts_absence() {
    assert_eq!(Flag::new("source_map").validate(None), Ok(None));
    assert_eq!(Flag::new("source_map").validate(Some("")), Ok(None));
}

#[test]
fn unknown_flag_is_rejected() {
    let args = CompilerKind::Uglify.arguments();
    let err = args
        .render("uglify", &values(&[("mangle", "true")]))
        .unwrap_err();
    assert_eq!(
        err,
        FlagError::InvalidFlag {
            backend: "uglify".to_string(),
            name: "mangle".to_string(),
        }
    );
    assert_eq!(err.to_string(), "unknown flag 'mangle' for uglify");
}

#[test]
fn render_orders_pairs_by_flag_name() {
    let args = Arguments::new([Flag::new("zeta"), Flag::new("alpha"), Flag::new("m")]);
    let rendered = args
        .render("test", &values(&[("zeta", "z"), ("m", "1"), ("alpha", "a")]))
        .unwrap();
    assert_eq!(rendered, vec!["--alpha", "a", "-m", "1", "--zeta", "z"]);
}

#[test]
fn missing_required_flag_fails_render() {
    let args = Arguments::new([Flag::new("config").required()]);
    assert!(args.contains("config"));
    assert_eq!(
        args.render("compass", &BTreeMap::new()),
        Err(FlagError::InvalidFlagValue("config".to_string()))
    );
}

#[test]
fn backends_publish_their_flags() {
    let uglify = CompilerKind::Uglify.arguments();
    assert!(uglify.contains("source_map"));
    assert!(uglify.contains("source_map_root"));
    assert_eq!(uglify.get("source_map").unwrap().switch(), "--source-map");

    assert!(CompilerKind::Compass.arguments().contains("config"));
    assert!(!CompilerKind::Coffee.arguments().contains("source_map"));

    let command = CompilerKind::Command {
        cmd: "true".to_string(),
    };
    assert_eq!(command.name(), "command");
    assert!(
        command
            .arguments()
            .render("command", &values(&[("anything", "x")]))
            .is_err()
    );
}
