//! Traefik routing labels.
//!
//! Public services are routed by the traefik reverse proxy based on docker
//! labels. The root domain comes from compose interpolation of the
//! `stage_root_domain` and `prod_root_domain` environment variables, or is
//! `localhost` for the local target.

use crate::error::{Error, Result};
use monux_core::DeploymentTarget;

/// Sub-domain that cannot be assigned to a service.
pub const RESERVED_SUB_DOMAIN: &str = "www";

/// Certificate resolver configured on the traefik service.
pub const CERT_RESOLVER: &str = "letsencrypt";

/// Root domain expression for `target`, `None` for dev.
#[must_use]
pub const fn root_domain(target: DeploymentTarget) -> Option<&'static str> {
    match target {
        DeploymentTarget::Dev => None,
        DeploymentTarget::Local => Some("localhost"),
        DeploymentTarget::Stage => Some("${stage_root_domain}"),
        DeploymentTarget::Prod => Some("${prod_root_domain}"),
    }
}

/// Reject the reserved `www` sub-domain.
///
/// # Errors
///
/// Returns [`Error::ReservedSubDomain`] for `www` in any letter case.
pub fn check_sub_domain(sub_domain: Option<&str>) -> Result<()> {
    match sub_domain {
        Some(sub_domain) if sub_domain.eq_ignore_ascii_case(RESERVED_SUB_DOMAIN) => {
            Err(Error::ReservedSubDomain {
                sub_domain: sub_domain.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Labels routing `name` on `port` for `target`.
///
/// Without a sub-domain the service answers on the root domain and on
/// `www.`, which redirects to the root domain. Dev needs no routing and
/// always yields no labels.
///
/// # Errors
///
/// Returns [`Error::ReservedSubDomain`] for the `www` sub-domain.
pub fn get_traefik_labels(
    name: &str,
    port: u16,
    target: DeploymentTarget,
    sub_domain: Option<&str>,
) -> Result<Vec<String>> {
    check_sub_domain(sub_domain)?;
    let Some(root) = root_domain(target) else {
        return Ok(Vec::new());
    };

    let router = format!("traefik.http.routers.{name}");
    let compress = format!("{name}-compress");
    let redirect = format!("{name}-www-redirect");
    let (scheme, entrypoint) = if target.uses_tls() {
        ("https", "websecure")
    } else {
        ("http", "web")
    };

    let rule = match sub_domain {
        Some(sub_domain) => format!("Host(`{sub_domain}.{root}`)"),
        None => format!("Host(`{root}`) || Host(`www.{root}`)"),
    };

    let mut labels = vec![
        "traefik.enable=true".to_string(),
        format!("{router}.rule={rule}"),
        format!("{router}.entrypoints={entrypoint}"),
    ];
    if target.uses_tls() {
        labels.push(format!("{router}.tls.certresolver={CERT_RESOLVER}"));
    }
    labels.push(format!(
        "traefik.http.services.{name}.loadbalancer.server.port={port}"
    ));
    labels.push(format!("traefik.http.middlewares.{compress}.compress=true"));

    let mut middlewares = compress;
    if sub_domain.is_none() {
        let middleware = format!("traefik.http.middlewares.{redirect}.redirectregex");
        labels.push(format!("{middleware}.regex=^{scheme}://www\\.(.*)"));
        labels.push(format!("{middleware}.replacement={scheme}://$${{1}}"));
        labels.push(format!("{middleware}.permanent=true"));
        middlewares = format!("{middlewares},{redirect}");
    }
    labels.push(format!("{router}.middlewares={middlewares}"));

    tracing::trace!(name, target = %target, labels = labels.len(), "Computed traefik labels");
    Ok(labels)
}
