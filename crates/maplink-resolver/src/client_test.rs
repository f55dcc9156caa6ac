use super::*;

#[test]
fn html_and_script_types_are_textual() {
    assert!(is_textual_content_type("text/html; charset=UTF-8"));
    assert!(is_textual_content_type("application/json"));
    assert!(is_textual_content_type("application/javascript"));
    assert!(is_textual_content_type("application/xhtml+xml"));
    assert!(is_textual_content_type("TEXT/PLAIN"));
}

#[test]
fn binary_types_are_not_textual() {
    assert!(!is_textual_content_type("image/png"));
    assert!(!is_textual_content_type("application/octet-stream"));
    assert!(!is_textual_content_type("font/woff2"));
}

#[test]
fn identities_present_distinct_user_agents() {
    assert!(Identity::Mobile.user_agent().contains("Mobile"));
    assert!(!Identity::Desktop.user_agent().contains("Mobile"));
    assert_ne!(Identity::Mobile.label(), Identity::Desktop.label());
}

#[test]
fn clients_build_from_default_config() {
    let clients = HttpClients::new(&ResolverConfig::default());
    assert!(clients.is_ok(), "expected Ok, got: {:?}", clients.err());
}

#[test]
fn invalid_accept_language_is_rejected() {
    let config = ResolverConfig {
        accept_language: "fr\nFR".to_string(),
        ..ResolverConfig::default()
    };
    let err = HttpClients::new(&config).unwrap_err();
    assert!(
        matches!(err, ResolveError::InvalidHeader { name, .. } if name == "accept-language"),
        "expected InvalidHeader, got: {err:?}"
    );
}
