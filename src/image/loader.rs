use super::ImagePayload;
use crate::{Error, Result};
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

/// Longest side, in pixels, of an image sent to a provider.
pub const MAX_DIMENSION: u32 = 2048;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("vision-describer/", env!("CARGO_PKG_VERSION"));

fn encode_png(image: DynamicImage) -> Result<ImagePayload> {
    let image = if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        tracing::debug!(
            "Downscaling {}x{} image to fit {}px",
            image.width(),
            image.height(),
            MAX_DIMENSION
        );
        image.resize(
            MAX_DIMENSION,
            MAX_DIMENSION,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        image
    };

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    Ok(ImagePayload::from_base64_with_mime(
        base64::engine::general_purpose::STANDARD.encode(&bytes),
        "image/png",
    ))
}

/// Decode any supported image format, downscale, and re-encode as PNG.
pub fn payload_from_image_bytes(bytes: &[u8]) -> Result<ImagePayload> {
    let image = image::load_from_memory(bytes)?;
    encode_png(image)
}

async fn payload_from_image_bytes_blocking(bytes: Vec<u8>) -> Result<ImagePayload> {
    tokio::task::spawn_blocking(move || payload_from_image_bytes(&bytes))
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
}

pub async fn load_from_file(path: &Path) -> Result<ImagePayload> {
    tracing::debug!("Loading image from {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    payload_from_image_bytes_blocking(bytes).await
}

async fn download(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: format!("Image download from {} failed", url),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

/// Download an image and process it like [`load_from_file`].
///
/// Transport failures are retried up to three times (300ms, 600ms, 1.2s).
pub async fn load_from_url(client: &Client, url: &str) -> Result<ImagePayload> {
    let strategy = ExponentialBackoff::from_millis(2).factor(150).take(3);

    let bytes = RetryIf::spawn(
        strategy,
        move || async move {
            download(client, url).await.map_err(|e| {
                tracing::warn!("Image download attempt failed: {}", e);
                e
            })
        },
        |e: &Error| matches!(e, Error::Timeout | Error::Connection(_)),
    )
    .await?;

    payload_from_image_bytes_blocking(bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn decode(payload: &ImagePayload) -> DynamicImage {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.base64())
            .unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_load_from_file_keeps_small_images() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("small.png");
        std::fs::write(&file, create_test_image(10, 10)).unwrap();

        let payload = load_from_file(&file).await.unwrap();

        assert_eq!(payload.mime_type(), "image/png");
        let img = decode(&payload);
        assert_eq!((img.width(), img.height()), (10, 10));
    }

    #[tokio::test]
    async fn test_load_from_file_downscales_preserving_aspect() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("wide.png");
        std::fs::write(&file, create_test_image(4096, 16)).unwrap();

        let payload = load_from_file(&file).await.unwrap();

        let img = decode(&payload);
        assert_eq!(img.width(), MAX_DIMENSION);
        assert_eq!(img.height(), 8);
    }

    #[tokio::test]
    async fn test_load_from_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_from_file(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_non_image_bytes_are_rejected() {
        let err = payload_from_image_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/picture.png"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_image(4, 4)))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/picture.png", server.uri());
        let payload = load_from_url(&Client::new(), &url).await.unwrap();

        let img = decode(&payload);
        assert_eq!((img.width(), img.height()), (4, 4));
    }

    #[tokio::test]
    async fn test_load_from_url_does_not_retry_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/gone.png", server.uri());
        let err = load_from_url(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, .. }));
    }
}
