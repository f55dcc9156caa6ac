//! Integration tests for the network-facing building blocks: redirect
//! bridges, the manual redirect follower, and the opaque-ID hops.
//!
//! Every endpoint base is pointed at a local `wiremock` server, so no real
//! network traffic is made.

use std::time::Duration;

use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use maplink_resolver::bridge::{resolve_via_bridge, Bridge};
use maplink_resolver::client::{HttpClients, Identity};
use maplink_resolver::opaque::{follow_cid, follow_place_id, resolve_opaque};
use maplink_resolver::redirect::follow_manually;
use maplink_resolver::{BrowserSettings, ResolveError, ResolverConfig};

fn test_config(server: &MockServer) -> ResolverConfig {
    let base = server.uri();
    ResolverConfig {
        applink_url: format!("{base}/maps"),
        redirector_url: format!("{base}/url"),
        cid_lookup_url: format!("{base}/"),
        place_search_url: format!("{base}/maps/search/"),
        request_timeout: Duration::from_secs(5),
        extra_short_hosts: vec!["localhost".to_string()],
        browser: BrowserSettings {
            enabled: false,
            ..BrowserSettings::default()
        },
        ..ResolverConfig::default()
    }
}

fn clients(config: &ResolverConfig) -> HttpClients {
    HttpClients::new(config).expect("failed to build test HTTP clients")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), "text/html")
}

async fn mount_place_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex("^/maps/place/"))
        .respond_with(html("<html><body>place</body></html>"))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Bridges
// ---------------------------------------------------------------------------

#[tokio::test]
async fn applink_bridge_returns_settled_url_sanitized() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/maps"))
        .and(query_param("source", "applink"))
        .and(query_param("link", "https://maps.app.goo.gl/AbC"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{base}/maps/place/X/@36.75,3.06,17z/data=!3d36.75!4d3.06?entry=ttu").as_str(),
        ))
        .mount(&server)
        .await;
    mount_place_pages(&server).await;

    let config = test_config(&server);
    let resolved = resolve_via_bridge(
        &clients(&config),
        &config,
        Bridge::Applink,
        "https://maps.app.goo.gl/AbC",
    )
    .await
    .expect("applink bridge should resolve");

    assert_eq!(resolved, format!("{base}/maps/place/X/@36.75,3.06,17z"));
}

#[tokio::test]
async fn redirector_bridge_falls_back_to_page_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/url"))
        .and(query_param("sa", "t"))
        .and(query_param("source", "maps_applink"))
        .respond_with(html(
            r#"<html><a href="https://www.google.com/maps/@1,2">map</a>
               <a href="https://www.google.com/maps/place/Cafe/@48.85,2.29,17z?hl=fr">place</a></html>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let resolved = resolve_via_bridge(
        &clients(&config),
        &config,
        Bridge::UrlRedirector,
        "https://goo.gl/maps/xyz",
    )
    .await
    .expect("redirector bridge should resolve from body");

    assert_eq!(resolved, "https://www.google.com/maps/place/Cafe/@48.85,2.29,17z");
}

#[tokio::test]
async fn bridge_without_usable_url_is_no_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps"))
        .respond_with(html("<html><body>Sign in to continue</body></html>"))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = resolve_via_bridge(
        &clients(&config),
        &config,
        Bridge::Applink,
        "https://maps.app.goo.gl/gone",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::NoMatch { .. }), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Manual follower
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_follow_resolves_relative_location_and_deobfuscates_body() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/s/abc"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/hop/1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hop/1"))
        .respond_with(html(
            r#"<script>var u="https:\x2F\x2Fwww.google.com\x2Fmaps\x2Fplace\x2FCafe";</script>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let followed = follow_manually(
        &clients(&config),
        &format!("http://localhost:{port}/s/abc"),
        Identity::Mobile,
        10,
    )
    .await
    .expect("manual follow should succeed");

    assert_eq!(followed.final_url, format!("http://localhost:{port}/hop/1"));
    assert!(
        followed.html.contains("https://www.google.com/maps/place/Cafe"),
        "html: {}",
        followed.html
    );
}

#[tokio::test]
async fn manual_follow_stops_at_hop_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/loop"))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let start = format!("{}/loop", server.uri());
    let followed = follow_manually(&clients(&config), &start, Identity::Desktop, 3)
        .await
        .expect("exhausting the hop budget is not an error");

    assert_eq!(followed.final_url, start);
    assert!(followed.html.is_empty());
}

// ---------------------------------------------------------------------------
// Opaque identifiers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cid_lookup_returns_location_header() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("cid", "291470376679806048"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{base}/maps/place/Resolved/@48.85,2.29,17z").as_str(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let resolved = follow_cid(&clients(&config), &config, "40b82c3688c9460")
        .await
        .expect("CID lookup should resolve");

    assert_eq!(resolved, format!("{base}/maps/place/Resolved/@48.85,2.29,17z"));
}

#[tokio::test]
async fn place_id_search_returns_settled_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/maps/search/"))
        .and(query_param("api", "1"))
        .and(query_param("query_place_id", "ChIJabc"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{base}/maps/place/P/@1.5,2.5,17z").as_str(),
        ))
        .mount(&server)
        .await;
    mount_place_pages(&server).await;

    let config = test_config(&server);
    let resolved = follow_place_id(&clients(&config), &config, "ChIJabc")
        .await
        .expect("place ID search should resolve");

    assert_eq!(resolved, format!("{base}/maps/place/P/@1.5,2.5,17z"));
}

#[tokio::test]
async fn resolve_opaque_prefers_cid_and_sanitizes() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("cid", "291470376679806048"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{base}/maps/place/Resolved/@48.85,2.29,17z?utm_source=share").as_str(),
        ))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let resolved = resolve_opaque(
        &clients(&config),
        &config,
        "https://www.google.com/maps/place/X/data=!4m2!3m1!1s0x47e66e1f06e2b70f:0x40b82c3688c9460",
    )
    .await;

    assert_eq!(
        resolved,
        Some(format!("{base}/maps/place/Resolved/@48.85,2.29,17z"))
    );
}

#[tokio::test]
async fn resolve_opaque_unwraps_q_param_without_network() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let resolved = resolve_opaque(
        &clients(&config),
        &config,
        "https://www.google.com/url?q=https%3A%2F%2Fwww.google.com%2Fmaps%2Fplace%2FWrapped%3Fentry%3Dttu",
    )
    .await;

    assert_eq!(resolved.as_deref(), Some("https://www.google.com/maps/place/Wrapped"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
