use std::collections::HashMap;
use std::io::Write;
use strata::Error;
use strata::solver::{BackendKind, Domain, Relation, SolverConfig, SolverSession, Status};

fn session() -> SolverSession {
    SolverSession::open(SolverConfig::default()).unwrap()
}

#[test]
fn solver_solves_a_small_integer_program() {
    let session = session();
    let mut m = session.create_model("knapsack");
    let a = m.add_binary("a");
    let b = m.add_binary("b");
    let c = m.add_binary("c");
    m.add_constraint("capacity", a * 3.0 + b * 4.0 + c * 5.0, Relation::Le, 8.0);
    // maximize 4a + 5b + 7c
    m.add_objective(a * -4.0 + b * -5.0 + c * -7.0);

    assert_eq!(m.optimize().unwrap(), Status::Optimal);
    assert_eq!(
        (
            m.bool_value(a).unwrap(),
            m.bool_value(b).unwrap(),
            m.bool_value(c).unwrap()
        ),
        (true, false, true)
    );
}

#[test]
fn solver_values_are_unavailable_before_optimizing() {
    let session = session();
    let mut m = session.create_model("unsolved");
    let x = m.add_integer("x", 0, 3);
    assert_eq!(m.value(x), None);
    assert!(m.int_value(x).is_err());
    assert!(m.compute_iis().is_err());
}

#[test]
fn solver_minimizes_a_squared_term_exactly() {
    let session = session();
    let mut m = session.create_model("parabola");
    let x = m.add_integer("x", -10, 10);
    m.add_squared_term(1.0, x - 3.0);
    m.solve().unwrap();
    assert_eq!(m.int_value(x).unwrap(), 3);
}

#[test]
fn solver_balances_two_squared_terms() {
    let session = session();
    let mut m = session.create_model("balance");
    let x = m.add_integer("x", 0, 10);
    let y = m.add_integer("y", 0, 10);
    m.add_constraint("sum", x + y, Relation::Eq, 10.0);
    m.add_squared_term(1.0, x);
    m.add_squared_term(1.0, y);
    m.solve().unwrap();
    assert_eq!(m.int_value(x).unwrap(), 5);
    assert_eq!(m.int_value(y).unwrap(), 5);
}

#[test]
fn solver_rejects_squares_of_continuous_expressions() {
    let session = session();
    let mut m = session.create_model("continuous");
    let x = m.add_var("x", Domain::Continuous, 0.0, 1.0);
    m.add_squared_term(1.0, x);
    assert!(matches!(m.optimize(), Err(Error::Solver { .. })));
}

#[test]
fn solver_reports_an_irreducible_infeasible_subset() {
    let session = session();
    let mut m = session.create_model("tiny");
    let x = m.add_integer("x", 0, 5);
    m.add_constraint("low", x, Relation::Ge, 4.0);
    m.add_constraint("loose", x, Relation::Le, 10.0);
    m.add_constraint("high", x, Relation::Le, 2.0);

    let err = m.solve().unwrap_err();
    assert_eq!(
        err,
        Error::Infeasible {
            model: "tiny".to_string(),
            diagnostic: vec!["low".to_string(), "high".to_string()],
        }
    );
    assert_eq!(m.status(), Some(&Status::Infeasible));
    assert_eq!(m.value(x), None);
}

#[test]
fn solver_blames_a_constraint_against_variable_bounds() {
    let session = session();
    let mut m = session.create_model("bounds");
    let x = m.add_integer("x", 0, 5);
    let y = m.add_integer("y", 0, 5);
    m.add_constraint("ok", x + y, Relation::Le, 6.0);
    m.add_constraint("too_big", x, Relation::Ge, 7.0);
    assert_eq!(m.optimize().unwrap(), Status::Infeasible);
    assert_eq!(m.compute_iis().unwrap(), vec!["too_big".to_string()]);
}

#[test]
fn solver_skips_the_diagnostic_when_disabled() {
    let config = SolverConfig {
        diagnose_infeasible: false,
        ..SolverConfig::default()
    };
    let session = SolverSession::open(config).unwrap();
    let mut m = session.create_model("quiet");
    let x = m.add_binary("x");
    m.add_constraint("two", x, Relation::Eq, 2.0);
    match m.solve() {
        Err(Error::Infeasible { diagnostic, .. }) => assert!(diagnostic.is_empty()),
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn solver_session_outlives_its_models() {
    let session = session();
    for i in 0..3 {
        let mut m = session.create_model(format!("m{i}"));
        let x = m.add_integer("x", 0, 10);
        m.add_constraint("floor", x, Relation::Ge, f64::from(i));
        m.add_objective(x);
        m.solve().unwrap();
        assert_eq!(m.int_value(x).unwrap(), i64::from(i));
    }
    assert_eq!(session.backend_name(), "microlp");
    session.close();
}

#[test]
fn solver_config_reads_environment_style_keys() {
    let vars: HashMap<&str, &str> = [
        ("STRATA_SOLVER_BACKEND", "MicroLP"),
        ("STRATA_SOLVER_TIME_LIMIT", "2.5"),
        ("STRATA_SOLVER_DIAGNOSE", "off"),
    ]
    .into_iter()
    .collect();
    let config = SolverConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(config.backend, BackendKind::MicroLp);
    assert_eq!(config.time_limit_secs, Some(2.5));
    assert!(!config.diagnose_infeasible);

    let defaults = SolverConfig::from_lookup(|_| None).unwrap();
    assert_eq!(defaults, SolverConfig::default());
}

#[test]
fn solver_config_rejects_malformed_values() {
    for (key, value) in [
        ("STRATA_SOLVER_BACKEND", "gurobi"),
        ("STRATA_SOLVER_TIME_LIMIT", "soon"),
        ("STRATA_SOLVER_TIME_LIMIT", "-1"),
        ("STRATA_SOLVER_DIAGNOSE", "maybe"),
    ] {
        let err = SolverConfig::from_lookup(|k| (k == key).then(|| value.to_string())).unwrap_err();
        assert!(
            matches!(err, Error::SolverUnavailable { .. }),
            "{key}={value}: {err:?}"
        );
    }
}

#[test]
fn solver_config_fails_loudly_on_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SolverConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::SolverUnavailable { .. }));
}

#[test]
fn solver_config_parses_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solver.json");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, r#"{{"backend": "microlp", "time_limit_secs": 30}}"#).unwrap();
    drop(f);
    let config = SolverConfig::from_json_file(&path).unwrap();
    assert_eq!(config.time_limit_secs, Some(30.0));
    assert!(config.diagnose_infeasible);

    std::fs::write(&path, r#"{"backend": "microlp", "threads": 4}"#).unwrap();
    assert!(SolverConfig::from_json_file(&path).is_err());
}

#[test]
fn solver_session_rejects_an_invalid_time_limit() {
    let config = SolverConfig {
        time_limit_secs: Some(f64::NAN),
        ..SolverConfig::default()
    };
    assert!(matches!(
        SolverSession::open(config),
        Err(Error::SolverUnavailable { .. })
    ));
}
