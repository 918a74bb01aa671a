use super::Outcome;
use serde_json::json;
use tracing::instrument;

/// Package and build details.
#[instrument]
pub fn get_version_info() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let description = env!("CARGO_PKG_DESCRIPTION");

    tracing::debug!(
        package_name = name,
        package_version = version,
        "Gathering package information"
    );

    format!(
        "{name} {version} - {description}\n\
        Target: {}\n\
        Correlation ID: {}",
        std::env::consts::ARCH,
        crate::tracing::correlation_id()
    )
}

/// `monux version`
pub fn execute() -> Outcome {
    Outcome::done(
        get_version_info(),
        json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version_info_format() {
        let version_info = get_version_info();

        assert!(version_info.starts_with("monux "));
        assert!(version_info.contains(env!("CARGO_PKG_VERSION")));
        assert!(version_info.contains("Target:"));
        assert!(version_info.contains("Correlation ID:"));
    }

    #[test]
    fn test_version_json_payload() {
        let Outcome::Done { data, .. } = execute() else {
            panic!("expected success");
        };
        assert_eq!(data["name"], "monux");
    }
}
