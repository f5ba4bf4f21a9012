//! Signature images staged next to the layout sources before rendering.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::surface::RenderSurface;
use super::ExportError;
use crate::receipt::document::SignatoryLine;

/// An image ready to be written onto a render surface.
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Image formats Typst can embed, detected from magic bytes.
fn image_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }
    if data.starts_with(b"GIF8") {
        return Some("gif");
    }
    let head = String::from_utf8_lossy(&data[..data.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("svg");
    }
    None
}

/// Decode the payload of a base64 `data:` URI.
fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let (meta, payload) = uri.strip_prefix("data:")?.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

/// Upper bound on one signature image.
pub const MAX_SIGNATURE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct SignatureFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl SignatureFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_bytes: MAX_SIGNATURE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn fetch_bytes(&self, reference: &str) -> Option<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_uri(reference).filter(|bytes| bytes.len() <= self.max_bytes);
        }
        if !(reference.starts_with("http://") || reference.starts_with("https://")) {
            return None;
        }

        let response = match self.client.get(reference).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                log::warn!("Signature image request returned {}", r.status());
                return None;
            }
            Err(e) => {
                log::warn!("Signature image request failed: {}", e);
                return None;
            }
        };
        self.read_capped(response).await
    }

    /// Read the body chunk by chunk, giving up once it exceeds `max_bytes`.
    async fn read_capped(&self, mut response: reqwest::Response) -> Option<Vec<u8>> {
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            log::warn!("Signature image is larger than {} bytes", self.max_bytes);
            return None;
        }

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > self.max_bytes {
                        log::warn!("Signature image is larger than {} bytes", self.max_bytes);
                        return None;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => return Some(body),
                Err(e) => {
                    log::warn!("Signature image download failed: {}", e);
                    return None;
                }
            }
        }
    }

    /// Fetch every signatory's image, best effort. The result is index-aligned
    /// with `signatories`; an image that cannot be fetched or recognised is `None`.
    pub async fn collect(&self, signatories: &[SignatoryLine]) -> Vec<Option<StagedImage>> {
        let mut staged = Vec::with_capacity(signatories.len());
        for (i, sig) in signatories.iter().enumerate() {
            let image = match sig.signature_image.as_deref() {
                Some(reference) => self.fetch_bytes(reference).await.and_then(|bytes| {
                    match image_extension(&bytes) {
                        Some(ext) => Some(StagedImage {
                            file_name: format!("signature-{i}.{ext}"),
                            bytes,
                        }),
                        None => {
                            log::warn!("Signature image for {} is not a supported format", sig.name);
                            None
                        }
                    }
                }),
                None => None,
            };
            staged.push(image);
        }
        staged
    }
}

/// Write staged images onto the surface, returning the file names for the layout.
pub fn stage_images(
    surface: &RenderSurface,
    images: &[Option<StagedImage>],
) -> Result<Vec<Option<String>>, ExportError> {
    images
        .iter()
        .map(|image| match image {
            Some(image) => {
                surface.write(&image.file_name, &image.bytes)?;
                Ok(Some(image.file_name.clone()))
            }
            None => Ok(None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn signatory(image: Option<&str>) -> SignatoryLine {
        SignatoryLine {
            name: "Jane Roe".to_string(),
            designation: "Authorized Signatory".to_string(),
            signature_image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_image_extension_detection() {
        assert_eq!(image_extension(PNG_HEADER), Some("png"));
        assert_eq!(image_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(image_extension(b"GIF89a"), Some("gif"));
        assert_eq!(image_extension(b"  <svg xmlns=\"\"></svg>"), Some("svg"));
        assert_eq!(image_extension(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(PNG_HEADER));
        assert_eq!(decode_data_uri(&uri).unwrap(), PNG_HEADER);
        assert!(decode_data_uri("data:text/plain,hello").is_none());
        assert!(decode_data_uri("https://cdn.test/a.png").is_none());
    }

    #[tokio::test]
    async fn test_collect_is_index_aligned_and_best_effort() {
        let fetcher = SignatureFetcher::new(reqwest::Client::new());
        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(PNG_HEADER));

        let staged = fetcher
            .collect(&[
                signatory(None),
                signatory(Some(&data_uri)),
                signatory(Some("relative/sig.png")),
                signatory(Some("data:image/png;base64,!!!")),
            ])
            .await;

        assert_eq!(staged.len(), 4);
        assert!(staged[0].is_none());
        assert_eq!(staged[1].as_ref().unwrap().file_name, "signature-1.png");
        assert!(staged[2].is_none());
        assert!(staged[3].is_none());
    }

    fn padded_png(len: usize) -> Vec<u8> {
        let mut body = PNG_HEADER.to_vec();
        body.resize(len, 0);
        body
    }

    /// Serve a 4 KiB PNG on an ephemeral port, returning its URL.
    fn spawn_image_host() -> (String, actix_web::dev::ServerHandle) {
        use actix_web::{web, App, HttpResponse, HttpServer};

        let server = HttpServer::new(|| {
            App::new().route(
                "/sig.png",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("image/png")
                        .body(padded_png(4096))
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}/sig.png", addr), handle)
    }

    #[actix_web::test]
    async fn test_oversized_signature_is_skipped() {
        let (url, handle) = spawn_image_host();

        let capped = SignatureFetcher::new(reqwest::Client::new()).with_max_bytes(1024);
        let staged = capped.collect(&[signatory(Some(&url))]).await;
        assert!(staged[0].is_none());

        let default = SignatureFetcher::new(reqwest::Client::new());
        let staged = default.collect(&[signatory(Some(&url))]).await;
        assert_eq!(staged[0].as_ref().unwrap().bytes.len(), 4096);

        handle.stop(true).await;
    }

    #[tokio::test]
    async fn test_oversized_data_uri_is_skipped() {
        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(padded_png(4096)));
        let fetcher = SignatureFetcher::new(reqwest::Client::new()).with_max_bytes(1024);
        assert!(fetcher.collect(&[signatory(Some(&data_uri))]).await[0].is_none());
    }

    #[test]
    fn test_stage_images_writes_files() {
        let surface = RenderSurface::acquire("test").unwrap();
        let images = vec![
            None,
            Some(StagedImage {
                file_name: "signature-1.png".to_string(),
                bytes: PNG_HEADER.to_vec(),
            }),
        ];

        let names = stage_images(&surface, &images).unwrap();
        assert_eq!(names, vec![None, Some("signature-1.png".to_string())]);
        assert!(surface.file("signature-1.png").exists());
    }
}
