//! Integration tests for compose files on disk

use monux_compose::{
    ComposeEngine, ComposeService, EnvironmentEntry, ServiceOptions, VolumeMount,
    get_traefik_labels, parse_compose, yaml,
};
use monux_core::{Config, DeploymentTarget, FileStatus, Paths};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

const PROD_COMPOSE: &str = "\
services:
    traefik:
        image: \"traefik:v3\"
        ports:
            - \"80:80\"
            - \"443:443\"
";

fn workspace() -> (TempDir, ComposeEngine) {
    let temp = TempDir::new().unwrap();
    let engine = ComposeEngine::new(Paths::with_config(temp.path(), Config::default()));
    (temp, engine)
}

#[test]
fn test_added_service_round_trips_with_labels() {
    let (_temp, engine) = workspace();
    let path = engine.paths().compose_file(DeploymentTarget::Prod);
    fs::write(&path, PROD_COMPOSE).unwrap();

    let mut service = ComposeService::with_image("cms", "directus/directus:11");
    service
        .volumes
        .push(VolumeMount::new("cms-uploads", "/directus/uploads"));
    service
        .environment
        .push(EnvironmentEntry::new("DB_HOST", "${db_host}"));
    service.labels.push("com.example.owner=web".to_string());

    let options = ServiceOptions {
        prod_port: Some(8055),
        is_public: true,
        sub_domain: Some("cms".to_string()),
        compose_file: Some(DeploymentTarget::Prod),
        ..ServiceOptions::default()
    };
    let results = engine.add_service_to_compose(&service, &options).unwrap();
    assert_eq!(results, vec![(path.clone(), FileStatus::Updated)]);

    let definition = parse_compose(&path).unwrap();
    assert_eq!(definition.services.len(), 2);
    assert_eq!(definition.services[0].name, "traefik");

    let mut expected = service.clone();
    expected.labels.extend(
        get_traefik_labels("cms", 8055, DeploymentTarget::Prod, Some("cms")).unwrap(),
    );
    assert_eq!(definition.services[1], expected);
    assert_eq!(
        definition.services[1].labels[..3],
        [
            "com.example.owner=web",
            "traefik.enable=true",
            "traefik.http.routers.cms.rule=Host(`cms.${prod_root_domain}`)",
        ]
    );
}

#[test]
fn test_serialization_is_stable() {
    let (_temp, engine) = workspace();
    let path = engine.paths().compose_file(DeploymentTarget::Prod);
    fs::write(&path, PROD_COMPOSE).unwrap();

    engine
        .add_service_to_compose(
            &ComposeService::with_build("site", "./apps/site"),
            &ServiceOptions {
                prod_port: Some(4000),
                is_public: true,
                compose_file: Some(DeploymentTarget::Prod),
                ..ServiceOptions::default()
            },
        )
        .unwrap();
    engine
        .add_volume_to_compose("db-data", Some(DeploymentTarget::Prod))
        .unwrap();

    let first = fs::read_to_string(&path).unwrap();
    let reparsed = parse_compose(&path).unwrap();
    assert_eq!(yaml::render(&reparsed), first);
    assert!(first.starts_with(PROD_COMPOSE));
    assert!(first.ends_with("\nvolumes:\n    db-data:\n"));
}

#[test]
fn test_dev_file_gets_port_mapping_only() {
    let (_temp, engine) = workspace();
    engine
        .add_service_to_compose(
            &ComposeService::with_build("api", "./apps/api"),
            &ServiceOptions {
                dev_port: Some(3001),
                prod_port: Some(3000),
                is_public: true,
                sub_domain: Some("api".to_string()),
                compose_file: None,
            },
        )
        .unwrap();

    let dev = fs::read_to_string(engine.paths().compose_file(DeploymentTarget::Dev)).unwrap();
    assert_eq!(
        dev,
        "services:\n    api:\n        build: ./apps/api\n        ports:\n            - \"3001:3000\"\n"
    );
}

#[test]
fn test_missing_file_is_reported() {
    let (temp, _engine) = workspace();
    let err = parse_compose(&temp.path().join("docker-compose.yaml")).unwrap_err();
    assert!(matches!(
        err,
        monux_compose::Error::Core(monux_core::Error::FileNotFound { .. })
    ));
}

proptest! {
    #[test]
    fn test_traefik_labels_deterministic(
        name in "[a-z][a-z0-9-]{0,12}",
        port in 1u16..=u16::MAX,
        sub_domain in proptest::option::of("[a-v][a-z0-9]{0,8}"),
    ) {
        prop_assert!(
            get_traefik_labels(&name, port, DeploymentTarget::Dev, sub_domain.as_deref())
                .unwrap()
                .is_empty()
        );

        let prod = get_traefik_labels(&name, port, DeploymentTarget::Prod, sub_domain.as_deref()).unwrap();
        prop_assert_eq!(
            &prod,
            &get_traefik_labels(&name, port, DeploymentTarget::Prod, sub_domain.as_deref()).unwrap()
        );
        prop_assert_eq!(prod[0].as_str(), "traefik.enable=true");
        let redirects = prod.iter().any(|l| l.contains("www-redirect.redirectregex"));
        prop_assert_eq!(redirects, sub_domain.is_none());
        if sub_domain.is_none() {
            prop_assert!(prod[1].contains("Host(`www.${prod_root_domain}`)"), "unexpected host rule: {}", prod[1]);
        }
    }
}

#[test]
fn test_www_rejected_for_dev_only_service() {
    let (temp, engine) = workspace();
    let options = ServiceOptions {
        dev_port: Some(4200),
        is_public: true,
        sub_domain: Some("www".to_string()),
        compose_file: Some(DeploymentTarget::Dev),
        ..ServiceOptions::default()
    };
    let err = engine
        .add_service_to_compose(&ComposeService::with_build("site", "./apps/site"), &options)
        .unwrap_err();
    assert!(matches!(err, monux_compose::Error::ReservedSubDomain { .. }));
    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}
