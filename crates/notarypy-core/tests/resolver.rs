//! End-to-end resolver tests against mocked and fake index backends.

use std::sync::Arc;
use std::time::Duration;

use notarypy_core::{
    AttestationResult, BadgeResponse, IndexClient, IndexConfig, QueryParams,
};
use notarypy_test::{
    FakeIndex, FakeResponse, MockAttestationSource, TEST_FILENAME, TEST_PACKAGE, TEST_VERSION,
    bare_provenance, github_provenance, gitlab_provenance, test_badge_path, test_badge_request,
    test_resolver,
};

fn fake_index_resolver(index: &FakeIndex) -> notarypy_core::BadgeResolver {
    let client = IndexClient::new(
        IndexConfig::new(index.base_url()).with_timeout(Duration::from_millis(500)),
    )
    .unwrap();
    test_resolver(Arc::new(client))
}

async fn location_for(index: &FakeIndex, response: FakeResponse) -> String {
    index.respond(TEST_PACKAGE, TEST_VERSION, TEST_FILENAME, response);
    let resolver = fake_index_resolver(index);
    let response = resolver
        .handle(&test_badge_path(), &QueryParams::default())
        .await;
    assert_eq!(response.status(), 302);
    response.location().unwrap().to_string()
}

#[tokio::test]
async fn test_github_publisher_label_in_badge() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(
        &index,
        FakeResponse::json(&github_provenance("org/my-repo", "release.yml")),
    )
    .await;

    assert!(location.contains("Verified_by_my-repo_release"), "{location}");
    assert!(location.ends_with("-success.svg"));
}

#[tokio::test]
async fn test_no_bundles_is_plain_verified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(&index, FakeResponse::json(&bare_provenance())).await;

    assert_eq!(
        location,
        "https://img.shields.io/badge/PyPI_Attestation-Verified-success.svg"
    );
}

#[tokio::test]
async fn test_other_publisher_is_plain_verified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(&index, FakeResponse::json(&gitlab_provenance())).await;

    assert!(location.ends_with("PyPI_Attestation-Verified-success.svg"));
}

#[tokio::test]
async fn test_not_found_is_unverified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(&index, FakeResponse::status(404)).await;

    assert!(location.ends_with("PyPI_Attestation-None-red.svg"));
}

#[tokio::test]
async fn test_non_200_success_is_unverified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(&index, FakeResponse::status(204)).await;

    assert!(location.ends_with("PyPI_Attestation-None-red.svg"));
}

#[tokio::test]
async fn test_non_json_body_is_unverified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(&index, FakeResponse::text(200, "<html>maintenance</html>")).await;

    assert!(location.ends_with("PyPI_Attestation-None-red.svg"));
}

#[tokio::test]
async fn test_timeout_is_unverified() {
    let index = FakeIndex::start().await.unwrap();
    let location = location_for(
        &index,
        FakeResponse::json(&bare_provenance()).with_delay(Duration::from_secs(3)),
    )
    .await;

    assert!(location.ends_with("PyPI_Attestation-None-red.svg"));
}

#[tokio::test]
async fn test_network_failure_is_unverified() {
    let index = FakeIndex::start().await.unwrap();
    let resolver = fake_index_resolver(&index);
    drop(index);
    // Give the aborted listener task a moment to release the socket.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = resolver
        .handle(&test_badge_path(), &QueryParams::default())
        .await;
    assert!(response.location().unwrap().ends_with("None-red.svg"));
}

#[tokio::test]
async fn test_style_passthrough() {
    let resolver = test_resolver(Arc::new(MockAttestationSource::new()));
    let response = resolver
        .handle(&test_badge_path(), &QueryParams::parse("style=flat-square"))
        .await;

    assert!(
        response
            .location()
            .unwrap()
            .ends_with("?style=flat-square")
    );
}

#[tokio::test]
async fn test_query_mode_reaches_source() {
    let source = MockAttestationSource::always(AttestationResult::verified(None));
    let resolver = test_resolver(Arc::new(source.clone()));

    let response = resolver
        .handle(
            "/.netlify/functions/badge",
            &QueryParams::parse("package=p&version=1.0&filename=p-1.0.tar.gz"),
        )
        .await;

    assert_eq!(response.status(), 302);
    let lookups = source.lookups();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].package_name, "p");
    assert_eq!(lookups[0].filename, "p-1.0.tar.gz");
}

#[tokio::test]
async fn test_missing_parameters_never_reach_source() {
    let source = MockAttestationSource::new();
    let resolver = test_resolver(Arc::new(source.clone()));

    for (path, query) in [
        ("/badge/p/v", ""),
        ("/badge//v/f", ""),
        ("/badge", "package=p&version=v"),
        ("/functions/badge/p", ""),
        ("/badge/p/../f", ""),
        ("/badge", "package=p%0A&version=v&filename=f"),
    ] {
        let response = resolver.handle(path, &QueryParams::parse(query)).await;
        assert_eq!(response.status(), 400, "{path}?{query}");
        let body: serde_json::Value = serde_json::from_str(&response.body()).unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Missing parameters")
        );
    }

    assert_eq!(source.lookup_count(), 0);
}

#[tokio::test]
async fn test_usage_banner_for_root() {
    let resolver = test_resolver(Arc::new(MockAttestationSource::new()));
    let response = resolver.handle("/", &QueryParams::default()).await;

    assert_eq!(response, BadgeResponse::Usage);
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_identical_requests_identical_location() {
    let index = FakeIndex::start().await.unwrap();
    index.respond(
        TEST_PACKAGE,
        TEST_VERSION,
        TEST_FILENAME,
        FakeResponse::json(&github_provenance("org/repo", "ci.yml")),
    );
    let resolver = fake_index_resolver(&index);
    let query = QueryParams::parse("style=plastic");

    let first = resolver.handle(&test_badge_path(), &query).await;
    let second = resolver.handle(&test_badge_path(), &query).await;

    assert_eq!(first.location(), second.location());
    assert_eq!(index.hits(), 2);
}

#[tokio::test]
async fn test_status_codes_are_bounded() {
    let resolver = test_resolver(Arc::new(MockAttestationSource::new()));

    for (path, query) in [
        ("/", ""),
        ("/badge/p/v/f", ""),
        ("/badge/p/v", ""),
        ("/badge/p/../f", ""),
        ("/nothing/here", "package=p"),
    ] {
        let status = resolver
            .handle(path, &QueryParams::parse(query))
            .await
            .status();
        assert!(matches!(status, 200 | 302 | 400 | 500), "{path}: {status}");
    }
}

#[tokio::test]
async fn test_extra_path_segments_use_first_three() {
    let source = MockAttestationSource::new();
    let resolver = test_resolver(Arc::new(source.clone()));

    let response = resolver
        .handle("/badge/a/b/c/d/e", &QueryParams::parse("style=x"))
        .await;

    assert_eq!(response.status(), 302);
    assert!(response.location().unwrap().ends_with("None-red.svg?style=x"));
    let lookups = source.lookups();
    assert_eq!(lookups.len(), 1);
    assert_eq!(
        (
            lookups[0].package_name.as_str(),
            lookups[0].version.as_str(),
            lookups[0].filename.as_str()
        ),
        ("a", "b", "c")
    );
}

#[tokio::test]
async fn test_queued_results_then_default() {
    let source = MockAttestationSource::new()
        .with_result(AttestationResult::verified(Some("repo_release".into())))
        .with_result(AttestationResult::verified(None));
    let resolver = test_resolver(Arc::new(source.clone()));
    let request = test_badge_request();

    let first = resolver.resolve_detailed(&request).await;
    assert_eq!(
        first.attestation.publisher_label.as_deref(),
        Some("repo_release")
    );
    assert!(first.target.url.contains("Verified_by_repo_release"));

    let second = resolver.resolve(&request).await;
    assert!(second.url.ends_with("PyPI_Attestation-Verified-success.svg"));

    let third = resolver.resolve_detailed(&request).await;
    assert!(!third.attestation.verified);

    assert_eq!(source.lookup_count(), 3);
    assert_eq!(source.lookups()[0], request);
}

#[tokio::test]
async fn test_resolver_exposes_its_parser() {
    let resolver = test_resolver(Arc::new(MockAttestationSource::new()));

    let parsed = resolver
        .parser()
        .parse(&test_badge_path(), &QueryParams::default())
        .unwrap();

    assert_eq!(parsed, test_badge_request());
    assert_eq!(
        resolver.parser().prefixes(),
        notarypy_core::DEFAULT_ROUTE_PREFIXES
    );
}
