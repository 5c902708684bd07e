// HTTP 接口集成测试：通过 tower::ServiceExt::oneshot 直接驱动路由，
// 字体固定为内置点阵字体，保证结果与运行环境无关。

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose;
use http_body_util::BodyExt;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use image_processor_api::api;
use image_processor_api::image_handler::{FontCatalog, ImageConfig, ImageServiceState};
use image_processor_api::settings::ServerSettings;
use serde_json::Value;
use std::io::Cursor;
use tower::ServiceExt;

const BOUNDARY: &str = "----image-api-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn app_with(settings: &ServerSettings) -> Router {
    let service = ImageServiceState::with_config(ImageConfig::default(), FontCatalog::builtin_only())
        .expect("service init failed");
    api::router(service, settings)
}

fn app() -> Router {
    app_with(&ServerSettings::default())
}

fn png(image: DynamicImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    png(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([0, 0, 0, 0]),
    )))
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request build failed")
}

fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn urlencoded_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request build failed")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body read failed")
        .to_bytes()
        .to_vec();
    (status, headers, body)
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response is not JSON")
}

#[tokio::test]
async fn binary_upload_returns_jpeg_attachment() {
    let source = transparent_png(64, 32);
    let request = multipart_request(
        "/api/procesar-imagen",
        &[
            Part::File {
                name: "imagen",
                filename: "in.png",
                content_type: "image/png",
                bytes: &source,
            },
            Part::Text("texto", "hola"),
            Part::Text("x", "2"),
            Part::Text("y", "2"),
            Part::Text("tamaño_fuente", "12"),
            Part::Text("color_texto", "red"),
        ],
    );

    let (status, headers, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"imagen_procesada_hola.jpg\""
    );

    let output = image::load_from_memory(&body).expect("output should be a JPEG");
    assert_eq!(output.dimensions(), (64, 32));
    assert!(!output.color().has_alpha());

    // 远离文字的区域应为合成后的白底
    let corner = output.to_rgb8().get_pixel(60, 28).0;
    assert!(corner.iter().all(|&c| c >= 240), "corner was {:?}", corner);
}

#[tokio::test]
async fn non_image_content_type_is_rejected_with_400() {
    let request = multipart_request(
        "/api/procesar-imagen",
        &[
            Part::File {
                name: "imagen",
                filename: "notes.txt",
                content_type: "text/plain",
                bytes: b"just text",
            },
            Part::Text("texto", "hola"),
            Part::Text("x", "0"),
            Part::Text("y", "0"),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json(&body)["detail"].as_str().unwrap_or_default().to_string();
    assert!(detail.contains("image/"), "detail was {}", detail);
}

#[tokio::test]
async fn image_content_type_with_undecodable_bytes_is_500() {
    let request = multipart_request(
        "/api/procesar-imagen",
        &[
            Part::File {
                name: "imagen",
                filename: "broken.png",
                content_type: "image/png",
                bytes: b"definitely not a png",
            },
            Part::Text("texto", "hola"),
            Part::Text("x", "0"),
            Part::Text("y", "0"),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["detail"].is_string());
}

#[tokio::test]
async fn missing_coordinate_is_422() {
    let source = transparent_png(8, 8);
    let request = multipart_request(
        "/api/procesar-imagen",
        &[
            Part::File {
                name: "imagen",
                filename: "in.png",
                content_type: "image/png",
                bytes: &source,
            },
            Part::Text("texto", "hola"),
            Part::Text("x", "0"),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = json(&body)["detail"].as_str().unwrap_or_default().to_string();
    assert!(detail.contains("`y`"), "detail was {}", detail);
}

#[tokio::test]
async fn empty_text_is_422() {
    let encoded = general_purpose::STANDARD.encode(png(DynamicImage::new_rgb8(8, 8)));
    let request = urlencoded_request(
        "/api/procesar-imagen-base64",
        &[("texto", ""), ("x", "0"), ("y", "0"), ("imagen_base64", &encoded)],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = json(&body)["detail"].as_str().unwrap_or_default().to_string();
    assert!(detail.contains("`texto`"), "detail was {}", detail);
}

#[tokio::test]
async fn oversized_font_is_500() {
    let encoded = general_purpose::STANDARD.encode(png(DynamicImage::new_rgb8(8, 8)));
    let request = urlencoded_request(
        "/api/procesar-imagen-base64",
        &[
            ("texto", "W"),
            ("x", "0"),
            ("y", "0"),
            ("tamaño_fuente", "60000"),
            ("imagen_base64", &encoded),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["detail"].is_string());
}

#[tokio::test]
async fn base64_form_returns_data_url() {
    let encoded = general_purpose::STANDARD.encode(png(DynamicImage::new_rgb8(40, 20)));
    let data_url = format!("data:image/png;base64,{}", encoded);
    let request = urlencoded_request(
        "/api/procesar-imagen-base64",
        &[
            ("texto", "saludos"),
            ("x", "1"),
            ("y", "1"),
            ("imagen_base64", &data_url),
            ("color_texto", "white"),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["filename"], "imagen_procesada_saludos.jpg");

    let data = payload["imagen_procesada"].as_str().expect("data url string");
    let jpeg = general_purpose::STANDARD
        .decode(data.strip_prefix("data:image/jpeg;base64,").expect("jpeg data url"))
        .expect("valid base64");
    let output = image::load_from_memory(&jpeg).expect("output should decode");
    assert_eq!(output.dimensions(), (40, 20));
}

#[tokio::test]
async fn base64_with_and_without_prefix_produce_identical_output() {
    let encoded = general_purpose::STANDARD.encode(png(DynamicImage::new_rgb8(24, 24)));
    let prefixed = format!("data:image/png;base64,{}", encoded);

    let mut outputs = Vec::new();
    for payload in [encoded.as_str(), prefixed.as_str()] {
        let request = urlencoded_request(
            "/api/procesar-imagen-base64",
            &[("texto", "x"), ("x", "3"), ("y", "3"), ("imagen_base64", payload)],
        );
        let (status, _, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        outputs.push(json(&body)["imagen_procesada"].clone());
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn base64_endpoint_accepts_multipart_too() {
    let encoded = general_purpose::STANDARD.encode(png(DynamicImage::new_rgb8(16, 16)));
    let request = multipart_request(
        "/api/procesar-imagen-base64",
        &[
            Part::Text("texto", "mp"),
            Part::Text("x", "0"),
            Part::Text("y", "0"),
            Part::Text("imagen_base64", &encoded),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);
}

#[tokio::test]
async fn malformed_base64_is_500_with_detail() {
    let request = urlencoded_request(
        "/api/procesar-imagen-base64",
        &[
            ("texto", "hola"),
            ("x", "0"),
            ("y", "0"),
            ("imagen_base64", "data:image/png;base64,@@@not base64@@@"),
        ],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json(&body)["detail"].as_str().unwrap_or_default().to_string();
    assert!(detail.contains("Base64"), "detail was {}", detail);
}

#[tokio::test]
async fn inspect_reports_png_metadata() {
    let source = png(DynamicImage::new_luma8(100, 50));
    let request = multipart_request(
        "/api/info-imagen",
        &[Part::File {
            name: "imagen",
            filename: "gray.png",
            content_type: "image/png",
            bytes: &source,
        }],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let info = json(&body);
    assert_eq!(info["width"], 100);
    assert_eq!(info["height"], 50);
    assert_eq!(info["format"], "PNG");
    assert_eq!(info["mode"], "L");
    let expected_kb = source.len() as f64 / 1024.0;
    assert!((info["size_kb"].as_f64().unwrap_or_default() - expected_kb).abs() < 1e-9);
}

#[tokio::test]
async fn inspect_of_garbage_is_500() {
    let request = multipart_request(
        "/api/info-imagen",
        &[Part::File {
            name: "imagen",
            filename: "x.bin",
            content_type: "application/octet-stream",
            bytes: b"\x00\x01\x02 not an image",
        }],
    );

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["detail"].is_string());
}

#[tokio::test]
async fn health_reports_online() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request build failed");

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    assert_eq!(payload["status"], "online");
    assert_eq!(payload["service"], "image-processor-api");
    assert_eq!(payload["version"], "1.0.0");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("request build failed");

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let endpoints = &json(&body)["endpoints"];
    assert!(endpoints.get("POST /api/procesar-imagen").is_some());
    assert!(endpoints.get("GET /health").is_some());
}

#[tokio::test]
async fn unknown_route_uses_detail_shape() {
    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .expect("request build failed");

    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["detail"], "Not Found");
}

#[tokio::test]
async fn cors_mirrors_request_origin() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .expect("request build failed");

    let (status, headers, _) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://example.com"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn oversized_body_is_413() {
    let settings = ServerSettings {
        max_body_bytes: 1024,
        ..ServerSettings::default()
    };
    let big = vec![0u8; 8 * 1024];
    let request = multipart_request(
        "/api/info-imagen",
        &[Part::File {
            name: "imagen",
            filename: "big.png",
            content_type: "image/png",
            bytes: &big,
        }],
    );

    let (status, _, body) = send(app_with(&settings), request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json(&body)["detail"].is_string());
}
