use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ocrdesk::config::Config;

/// A small white PNG, good enough for the validator and preprocessor.
pub fn png_fixture() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([255, 255, 255])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

/// OCR.Space success body carrying `text` as the single parsed page.
pub fn ocr_success(text: &str) -> serde_json::Value {
    serde_json::json!({
        "ParsedResults": [{
            "ParsedText": text,
            "FileParseExitCode": 1,
            "ErrorMessage": "",
            "TextOverlay": { "Lines": [] }
        }],
        "OCRExitCode": 1,
        "IsErroredOnProcessing": false,
        "ProcessingTimeInMilliseconds": "42"
    })
}

/// Starts a mock OCR endpoint answering every POST with `text`.
pub async fn mock_ocr(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocr_success(text)))
        .mount(&server)
        .await;
    server
}

pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.ocr.api_key = Some("test-key".to_string());
    config.ocr.endpoint = format!("{}/parse/image", server.uri());
    config.ocr.timeout_secs = 5;
    config.upload.max_bytes = 1024 * 1024;
    config.session.history_limit = 20;
    config
}
