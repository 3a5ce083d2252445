use htcondor_apid::api::query_dto::QueryParamsDto;
use htcondor_apid::domain::attribute::Projection;
use htcondor_apid::domain::query_spec::{QuerySpec, parse_identifier, quote_string_literal, require_balanced_constraint};
use htcondor_apid::domain::resource::{AdType, DaemonType, ResourceKind};
use htcondor_apid::error::Error;

fn params() -> QueryParamsDto {
    QueryParamsDto::default()
}

fn with_constraint(constraint: &str) -> QueryParamsDto {
    QueryParamsDto { constraint: Some(constraint.to_string()), ..Default::default() }
}

#[test]
fn test_job_requirements_start_from_true() {
    let spec = QuerySpec::jobs(ResourceKind::Jobs, None, None, None, &params()).unwrap();

    assert_eq!(spec.requirements().as_deref(), Some("true"));
    assert_eq!(spec.projection(), &Projection::All);
}

#[test]
fn test_job_requirements_conjoin_ids_and_constraint_in_order() {
    let spec = QuerySpec::jobs(ResourceKind::Jobs, Some(123), Some(0), None, &with_constraint("Owner == \"alice\" || true")).unwrap();

    assert_eq!(spec.requirements().as_deref(), Some("true && clusterid == 123 && procid == 0 && (Owner == \"alice\" || true)"));
}

#[test]
fn test_identifier_zero_is_honoured() {
    let spec = QuerySpec::jobs(ResourceKind::History, Some(0), None, None, &params()).unwrap();

    assert_eq!(spec.requirements().as_deref(), Some("true && clusterid == 0"));
}

#[test]
fn test_procid_without_clusterid_is_rejected() {
    let err = QuerySpec::jobs(ResourceKind::Jobs, None, Some(1), None, &params()).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_jobs_constructor_rejects_other_resources() {
    assert!(QuerySpec::jobs(ResourceKind::Status, None, None, None, &params()).is_err());
    assert!(QuerySpec::jobs(ResourceKind::Config, None, None, None, &params()).is_err());
}

#[test]
fn test_attribute_overrides_projection() {
    let params = QueryParamsDto { projection: Some("Owner,JobStatus".to_string()), ..Default::default() };
    let spec = QuerySpec::jobs(ResourceKind::Jobs, Some(123), Some(0), Some("cmd"), &params).unwrap();

    assert_eq!(spec.attribute(), Some("cmd"));
    assert_eq!(spec.projection().to_argument().as_deref(), Some("cmd,clusterid,procid"));
}

#[test]
fn test_projection_gets_job_identity_keys() {
    let params = QueryParamsDto { projection: Some("Owner".to_string()), ..Default::default() };
    let spec = QuerySpec::jobs(ResourceKind::Jobs, None, None, None, &params).unwrap();

    assert_eq!(spec.projection().to_argument().as_deref(), Some("Owner,clusterid,procid"));
}

#[test]
fn test_invalid_attribute_and_projection_are_rejected() {
    let err = QuerySpec::jobs(ResourceKind::Jobs, Some(1), Some(0), Some("foo;bar"), &params()).unwrap_err();
    assert_eq!(err.status_code(), 400);

    let params = QueryParamsDto { projection: Some("foo;bar".to_string()), ..Default::default() };
    let err = QuerySpec::status(None, None, &params).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_blank_parameters_are_ignored() {
    let params = QueryParamsDto {
        projection: Some("  ".to_string()),
        constraint: Some("".to_string()),
        query: Some(" ".to_string()),
        daemon: None,
    };
    let spec = QuerySpec::status(None, None, &params).unwrap();

    assert_eq!(spec.ad_type(), AdType::Any);
    assert_eq!(spec.user_constraint(), None);
    assert!(spec.projection().is_all());
    assert_eq!(spec.requirements(), None);
}

#[test]
fn test_status_query_types() {
    let query = |q: &str| QueryParamsDto { query: Some(q.to_string()), ..Default::default() };

    assert_eq!(QuerySpec::status(None, None, &query("startd")).unwrap().ad_type(), AdType::Startd);
    assert_eq!(QuerySpec::status(None, None, &query("submitter")).unwrap().ad_type(), AdType::Submitter);
    assert_eq!(QuerySpec::status(None, None, &query("submitters")).unwrap().ad_type(), AdType::Submitter);

    let err = QuerySpec::status(None, None, &query("bogus")).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(err.to_string().contains("bogus"));
    assert!(err.to_string().contains("startd"));
}

#[test]
fn test_status_requirements() {
    let named = QuerySpec::status(Some("slot1@exec01.example.org"), None, &params()).unwrap();
    assert_eq!(named.requirements().as_deref(), Some("(name == \"slot1@exec01.example.org\")"));

    let both = QuerySpec::status(Some("exec01"), None, &with_constraint("Cpus > 1")).unwrap();
    assert_eq!(both.requirements().as_deref(), Some("(name == \"exec01\") && (Cpus > 1)"));

    let constraint_only = QuerySpec::status(None, None, &with_constraint("Cpus > 1")).unwrap();
    assert_eq!(constraint_only.requirements().as_deref(), Some("Cpus > 1"));
}

#[test]
fn test_status_name_must_not_look_like_a_flag() {
    let err = QuerySpec::status(Some("-pool"), None, &params()).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_status_attribute_projection() {
    let spec = QuerySpec::status(Some("exec01"), Some("Memory"), &params()).unwrap();

    assert_eq!(spec.name(), Some("exec01"));
    assert_eq!(spec.attribute(), Some("Memory"));
    assert_eq!(spec.projection().to_argument().as_deref(), Some("Memory,name"));
}

#[test]
fn test_config_spec() {
    let spec = QuerySpec::config(Some("condor_version"), &params()).unwrap();
    assert_eq!(spec.kind(), ResourceKind::Config);
    assert_eq!(spec.attribute(), Some("condor_version"));
    assert_eq!(spec.daemon(), None);
    assert_eq!(spec.requirements(), None);

    let daemon = QueryParamsDto { daemon: Some("schedd".to_string()), ..Default::default() };
    assert_eq!(QuerySpec::config(None, &daemon).unwrap().daemon(), Some(DaemonType::Schedd));

    let bad_daemon = QueryParamsDto { daemon: Some("shadow".to_string()), ..Default::default() };
    assert_eq!(QuerySpec::config(None, &bad_daemon).unwrap_err().status_code(), 400);

    assert_eq!(QuerySpec::config(Some("foo bar"), &params()).unwrap_err().status_code(), 400);
}

#[test]
fn test_parse_identifier() {
    assert_eq!(parse_identifier("clusterid", "123").unwrap(), 123);
    assert_eq!(parse_identifier("procid", "0").unwrap(), 0);

    for raw in ["abc", "-1", "1.5", ""] {
        let err = parse_identifier("clusterid", raw).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{:?} should be rejected", raw);
    }
}

#[test]
fn test_quote_string_literal() {
    assert_eq!(quote_string_literal("exec01"), "\"exec01\"");
    assert_eq!(quote_string_literal("a\"b\\c"), "\"a\\\"b\\\\c\"");
}

#[test]
fn test_constraint_cannot_close_the_id_conjunction() {
    for constraint in ["true) || (true", "true)", ")(", "(Owner == \"bob\"", "Owner == \"bob"] {
        let err = QuerySpec::jobs(ResourceKind::Jobs, Some(124), None, None, &with_constraint(constraint)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{:?} gave {:?}", constraint, err);

        let err = QuerySpec::status(Some("exec01"), None, &with_constraint(constraint)).unwrap_err();
        assert_eq!(err.status_code(), 400, "{:?}", constraint);
    }
}

#[test]
fn test_balanced_constraints_are_accepted() {
    for constraint in ["(Owner == \"bob\") || (JobStatus == 2)", "Cmd == \"a)b\"", "Args == \"say \\\"(hi\\\"\"", "((1))"] {
        assert_eq!(require_balanced_constraint(constraint).unwrap(), constraint);
    }

    let spec = QuerySpec::jobs(ResourceKind::Jobs, Some(124), None, None, &with_constraint("Cmd == \"a)b\"")).unwrap();
    assert_eq!(spec.requirements().as_deref(), Some("true && clusterid == 124 && (Cmd == \"a)b\")"));
}
