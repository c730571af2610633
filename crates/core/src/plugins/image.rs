//! Raster image conversions backed by the `image` crate.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::engine::{CompressionLevel, ConversionOptions};
use crate::format::mime_type_of;
use crate::metadata::{Dimensions, MetadataResult};
use crate::plugin::{format_list, Plugin, PluginError, PluginInput, PluginOutput};

/// Converts between common raster formats, with optional rotate and resize.
///
/// Recognised image options (in `options.image`, falling back to
/// `options.format_options`):
/// - `rotate`: 90, 180 or 270
/// - `resize`: `"WxH"`, an exact resize
#[derive(Debug)]
pub struct ImagePlugin {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Default for ImagePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePlugin {
    pub fn new() -> Self {
        Self {
            inputs: format_list(&["png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "webp"]),
            outputs: format_list(&["png", "jpg", "jpeg", "gif", "bmp", "tiff"]),
        }
    }
}

/// Geometry edits requested through image options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Edits {
    rotate: Option<u16>,
    resize: Option<(u32, u32)>,
}

impl Edits {
    fn from_options(options: &ConversionOptions) -> Result<Self, PluginError> {
        let rotate = match options.image_option("rotate") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_rotation(value)?),
        };
        let resize = match options.image_option("resize") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_resize(value)?),
        };
        Ok(Self { rotate, resize })
    }

    fn apply(self, mut image: DynamicImage) -> DynamicImage {
        if let Some((width, height)) = self.resize {
            image = image.resize_exact(width, height, FilterType::Lanczos3);
        }
        match self.rotate {
            Some(90) => image.rotate90(),
            Some(180) => image.rotate180(),
            Some(270) => image.rotate270(),
            _ => image,
        }
    }
}

fn parse_rotation(value: &Value) -> Result<u16, PluginError> {
    let degrees = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    match degrees {
        Some(0) => Ok(0),
        Some(d @ (90 | 180 | 270)) => Ok(d as u16),
        _ => Err(PluginError::invalid_option(
            "rotate",
            format!("expected 90, 180 or 270, got {value}"),
        )),
    }
}

fn parse_resize(value: &Value) -> Result<(u32, u32), PluginError> {
    let invalid = || PluginError::invalid_option("resize", format!("expected WxH, got {value}"));
    let spec = value.as_str().ok_or_else(invalid)?;
    let (w, h) = spec
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

fn png_compression(level: CompressionLevel) -> CompressionType {
    match level {
        CompressionLevel::None | CompressionLevel::Low => CompressionType::Fast,
        CompressionLevel::Medium => CompressionType::Default,
        CompressionLevel::High | CompressionLevel::Maximum => CompressionType::Best,
    }
}

fn encode(image: &DynamicImage, format: &str, options: &ConversionOptions) -> Result<Vec<u8>, PluginError> {
    let mut buffer = Vec::new();
    let failed = |e: image::ImageError| PluginError::encode(format, e);

    match format {
        "jpg" | "jpeg" => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, options.quality.clamp(1, 100));
            image.to_rgb8().write_with_encoder(encoder).map_err(failed)?;
        }
        "png" => {
            let encoder = PngEncoder::new_with_quality(
                &mut buffer,
                png_compression(options.compression),
                PngFilter::Adaptive,
            );
            image.write_with_encoder(encoder).map_err(failed)?;
        }
        "gif" | "bmp" | "tiff" => {
            let target = match format {
                "gif" => ImageFormat::Gif,
                "bmp" => ImageFormat::Bmp,
                _ => ImageFormat::Tiff,
            };
            // GIF and BMP encoders only take 8-bit RGB(A)
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buffer), target)
                .map_err(failed)?;
        }
        other => {
            return Err(PluginError::UnsupportedOutput {
                format: other.to_string(),
            })
        }
    }

    Ok(buffer)
}

/// Raised when the awaiting conversion is dropped, usually by a timeout.
#[derive(Debug, Default)]
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn flag(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Decode, edit and encode on a blocking thread, checking `cancelled` between stages.
fn transcode(
    data: &[u8],
    source: &str,
    target: &str,
    edits: Edits,
    options: &ConversionOptions,
    cancelled: &AtomicBool,
) -> Result<Vec<u8>, PluginError> {
    let check = || {
        if cancelled.load(Ordering::SeqCst) {
            debug!(from = %source, to = %target, "Image conversion abandoned");
            return Err(PluginError::Other("image conversion cancelled".to_string()));
        }
        Ok(())
    };

    check()?;
    let image = image::load_from_memory(data).map_err(|e| PluginError::decode(source, e))?;
    debug!(
        from = %source,
        to = %target,
        width = image.width(),
        height = image.height(),
        ?edits,
        "Converting image"
    );
    check()?;
    let image = edits.apply(image);
    check()?;
    encode(&image, target, options)
}

fn describe(data: &[u8], format: &str) -> Result<MetadataResult, PluginError> {
    let image = image::load_from_memory(data).map_err(|e| PluginError::decode(format, e))?;

    let mut result = MetadataResult::new(format, mime_type_of(format), data.len() as u64);
    result.dimensions = Some(Dimensions {
        width: image.width(),
        height: image.height(),
    });
    result.custom.insert(
        "color_type".to_string(),
        Value::from(format!("{:?}", image.color())),
    );
    result
        .custom
        .insert("has_alpha".to_string(), Value::from(image.color().has_alpha()));
    Ok(result)
}

#[async_trait]
impl Plugin for ImagePlugin {
    fn name(&self) -> &str {
        "image"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn input_formats(&self) -> &[String] {
        &self.inputs
    }

    fn output_formats(&self) -> &[String] {
        &self.outputs
    }

    async fn convert(
        &self,
        input: PluginInput<'_>,
        options: &ConversionOptions,
    ) -> Result<PluginOutput, PluginError> {
        let target = options.output_format.as_deref().unwrap_or(input.format).to_string();
        let edits = Edits::from_options(options)?;
        let data = input.data.to_vec();
        let source = input.format.to_string();
        let options = options.clone();
        let guard = CancelOnDrop::default();
        let cancelled = guard.flag();

        // decoding and encoding are CPU bound
        let bytes = tokio::task::spawn_blocking(move || {
            transcode(&data, &source, &target, edits, &options, &cancelled)
        })
        .await
        .map_err(|e| PluginError::Other(format!("image task failed: {e}")))??;

        Ok(PluginOutput::Bytes(bytes))
    }

    fn supports_metadata(&self) -> bool {
        true
    }

    async fn extract_metadata(&self, input: PluginInput<'_>) -> Result<MetadataResult, PluginError> {
        let data = input.data.to_vec();
        let format = input.format.to_string();

        tokio::task::spawn_blocking(move || describe(&data, &format))
            .await
            .map_err(|e| PluginError::Other(format!("image task failed: {e}")))?
    }

    fn validate_options(&self, options: &ConversionOptions) -> bool {
        Edits::from_options(options).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::png_bytes;
    use serde_json::json;

    fn options_for(format: &str) -> ConversionOptions {
        ConversionOptions {
            output_format: Some(format.to_string()),
            ..Default::default()
        }
    }

    async fn convert(data: &[u8], options: &ConversionOptions) -> Result<DynamicImage, PluginError> {
        let output = ImagePlugin::new()
            .convert(PluginInput { data, format: "png" }, options)
            .await?;
        Ok(image::load_from_memory(&output.into_bytes()).unwrap())
    }

    #[tokio::test]
    async fn test_png_to_jpeg() {
        let output = ImagePlugin::new()
            .convert(
                PluginInput {
                    data: &png_bytes(8, 4),
                    format: "png",
                },
                &options_for("jpg"),
            )
            .await
            .unwrap()
            .into_bytes();

        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[tokio::test]
    async fn test_each_output_format_encodes() {
        for format in ["png", "gif", "bmp", "tiff"] {
            let decoded = convert(&png_bytes(3, 2), &options_for(format)).await.unwrap();
            assert_eq!((decoded.width(), decoded.height()), (3, 2), "{format}");
        }
    }

    #[tokio::test]
    async fn test_rotate_and_resize() {
        let options = options_for("png")
            .with_image_option("resize", json!("10x6"))
            .with_image_option("rotate", json!(90));

        let decoded = convert(&png_bytes(4, 4), &options).await.unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 10));
    }

    #[tokio::test]
    async fn test_corrupt_input_is_decode_error() {
        let err = convert(b"\x89PNG nope", &options_for("jpg")).await.unwrap_err();
        assert!(matches!(err, PluginError::Decode { .. }));
    }

    #[test]
    fn test_validate_options() {
        let plugin = ImagePlugin::new();
        assert!(plugin.validate_options(&options_for("png")));
        assert!(plugin.validate_options(&options_for("png").with_image_option("rotate", json!("180"))));
        assert!(!plugin.validate_options(&options_for("png").with_image_option("rotate", json!(45))));
        assert!(!plugin.validate_options(&options_for("png").with_image_option("resize", json!("0x3"))));
        assert!(!plugin.validate_options(&options_for("png").with_image_option("resize", json!(12))));
    }

    #[tokio::test]
    async fn test_extract_metadata() {
        let result = ImagePlugin::new()
            .extract_metadata(PluginInput {
                data: &png_bytes(5, 9),
                format: "png",
            })
            .await
            .unwrap();

        assert_eq!(result.mime_type, "image/png");
        assert_eq!(result.dimensions, Some(Dimensions { width: 5, height: 9 }));
        assert!(result.custom.contains_key("color_type"));
        assert_eq!(result.custom["has_alpha"], json!(false));
    }

    #[tokio::test]
    async fn test_extract_metadata_corrupt_input() {
        let err = ImagePlugin::new()
            .extract_metadata(PluginInput {
                data: b"\x89PNG nope",
                format: "png",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Decode { .. }));
    }

    #[test]
    fn test_dropped_conversion_stops_blocking_work() {
        let guard = CancelOnDrop::default();
        let cancelled = guard.flag();
        let png = png_bytes(4, 4);

        let output = transcode(&png, "png", "bmp", Edits::default(), &options_for("bmp"), &cancelled);
        assert!(output.is_ok());

        drop(guard);
        assert!(cancelled.load(Ordering::SeqCst));
        let err = transcode(&png, "png", "bmp", Edits::default(), &options_for("bmp"), &cancelled)
            .unwrap_err();
        assert!(matches!(err, PluginError::Other(ref m) if m.contains("cancelled")));
    }
}
