//! User-Agent string sent with every site request.

/// Default User-Agent for site requests (identifies the tool and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ancestry-gedcom-download/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("ancestry-gedcom-download/")
                .expect("UA has tool prefix"),
            "UA must contain crate version"
        );
    }
}
