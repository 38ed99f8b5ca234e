//! Integration tests for `ShopMemberClient` using wiremock HTTP mocks.

use valet_core::config::AppConfig;
use valet_core::{MemberDirectory, Plate};
use valet_upstream::ShopMemberClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ShopMemberClient {
    let mut config = AppConfig::default();
    config.member.base_url = base_url.to_owned();
    config.member.timeout_secs = 2;
    ShopMemberClient::new(&config.member).expect("client construction should not fail")
}

#[tokio::test]
async fn bound_plates_are_returned_in_profile_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member/info"))
        .and(query_param("user_id", "user-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "carPlateList": [
                { "carPlate": "辽A66D6J" },
                { "carPlate": "川ADM641" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let plates = client.bound_plates("user-42").await.expect("should parse plates");

    assert_eq!(plates, vec![Plate::from("辽A66D6J"), Plate::from("川ADM641")]);
}

#[tokio::test]
async fn blank_plate_entries_are_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "carPlateList": [
                { "carPlate": "辽A66D6J" },
                { "carPlate": "" },
                { "carPlate": "   " }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let plates = client.bound_plates("user-42").await.expect("should parse plates");

    assert_eq!(plates, vec![Plate::from("辽A66D6J")]);
}

#[tokio::test]
async fn unknown_member_means_no_bound_plates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member/info"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let plates = client.bound_plates("nobody").await.expect("404 is not an error");

    assert!(plates.is_empty());
}

#[tokio::test]
async fn profile_without_plate_list_means_no_bound_plates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let plates = client.bound_plates("user-42").await.expect("should tolerate missing list");

    assert!(plates.is_empty());
}
