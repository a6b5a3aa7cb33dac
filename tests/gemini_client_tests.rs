use base64::{Engine as _, engine::general_purpose::STANDARD};
use pretty_assertions::assert_eq;
use serde_json::json;
use studio_lights::{
    config::GeminiConfig,
    gemini::{ContentRequest, GeminiClient, GenerativeModel, Part},
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        base_url: base_url.to_string(),
        api_key: "test-api-key".to_string(),
        image_model: "image-model".to_string(),
        analysis_model: "judge-model".to_string(),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_image_request_round_trip() {
    let server = MockServer::start().await;
    let rendered = b"\x89PNG-bytes";

    Mock::given(method("POST"))
        .and(path("/v1beta/models/image-model:generateContent"))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": {"imageSize": "1K"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Rendered."},
                        {"inlineData": {"mimeType": "image/png", "data": STANDARD.encode(rendered)}}
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(create_test_config(&server.uri())).unwrap();
    let response = client
        .generate_content(ContentRequest::image(
            vec![Part::image("image/jpeg", vec![1, 2]), Part::text("studio shot")],
            "1K",
        ))
        .await
        .unwrap();

    let image = response.first_image().unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, rendered.to_vec());
    assert_eq!(response.text(), "Rendered.");
}

#[tokio::test]
async fn test_json_request_routes_to_analysis_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/judge-model:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"pass\": true}"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(create_test_config(&server.uri())).unwrap();
    let response = client
        .generate_content(ContentRequest::json(vec![Part::text("judge")]))
        .await
        .unwrap();

    assert_eq!(response.text(), "{\"pass\": true}");
    assert!(response.first_image().is_none());
}

#[tokio::test]
async fn test_http_error_is_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(create_test_config(&server.uri())).unwrap();
    let err = client
        .generate_content(ContentRequest::image(vec![Part::text("x")], "1K"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Generation error"));
    assert!(message.contains("429"));
    assert!(message.contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn test_empty_candidates_yield_no_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(create_test_config(&server.uri())).unwrap();
    let response = client
        .generate_content(ContentRequest::image(vec![Part::text("x")], "2K"))
        .await
        .unwrap();

    assert!(response.parts.is_empty());
    assert!(response.into_first_image().is_none());
}
