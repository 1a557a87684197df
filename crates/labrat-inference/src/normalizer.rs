//! Image normalization to provider constraints.
//!
//! Turns a client-supplied base64 string (optionally a `data:` URL) into a
//! [`NormalizedImage`]: bounded dimensions, no alpha channel, and an encoding
//! whose base64 form fits the provider's size budget.
//!
//! Normalization is deterministic and CPU-bound. Async callers should run it
//! on a blocking worker (`tokio::task::spawn_blocking`).

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageEncoder, ImageFormat, Rgb, RgbImage};
use tracing::{debug, instrument, trace};

use labrat_core::{defaults, base64_len, Error, ImageEncoding, NormalizedImage, RawMedia, Result};

/// How the normalized image is re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// JPEG, starting at the given quality.
    AlwaysJpeg { quality: u8 },
    /// PNG, falling back to JPEG from `fallback_quality` when the base64 PNG
    /// exceeds the size budget.
    PreferPng { fallback_quality: u8 },
}

/// Limits applied by [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_dimension: u32,
    pub size_budget_bytes: usize,
    pub policy: EncodingPolicy,
}

impl NormalizeOptions {
    /// General chat path: 1568px, JPEG quality 95.
    pub fn chat() -> Self {
        Self {
            max_dimension: defaults::CHAT_MAX_DIMENSION,
            size_budget_bytes: defaults::IMAGE_SIZE_BUDGET_BYTES,
            policy: EncodingPolicy::AlwaysJpeg {
                quality: defaults::CHAT_JPEG_QUALITY,
            },
        }
    }

    /// Whiteboard drawing path: 1024px, PNG with a JPEG 85 fallback.
    pub fn drawing() -> Self {
        Self {
            max_dimension: defaults::DRAWING_MAX_DIMENSION,
            size_budget_bytes: defaults::IMAGE_SIZE_BUDGET_BYTES,
            policy: EncodingPolicy::PreferPng {
                fallback_quality: defaults::FALLBACK_JPEG_QUALITY,
            },
        }
    }
}

/// Split an optional `data:<mime>;base64,` prefix off an encoded image.
///
/// Returns the declared encoding (if the prefix names a known image type)
/// and the bare base64 payload.
pub fn parse_data_url(raw: &str) -> (Option<ImageEncoding>, &str) {
    let raw = raw.trim();
    let Some(rest) = raw.strip_prefix("data:") else {
        return (None, raw);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.split(';').next().unwrap_or_default();
            (ImageEncoding::from_mime(mime), payload)
        }
        None => (None, rest),
    }
}

/// Normalize a base64 (or data-URL) encoded image.
#[instrument(
    skip(raw, options),
    fields(subsystem = "image", op = "normalize", max_dimension = options.max_dimension)
)]
pub fn normalize(raw: &str, options: &NormalizeOptions) -> Result<NormalizedImage> {
    let (declared, payload) = parse_data_url(raw);
    let declared = declared.or_else(|| ImageEncoding::from_mime(defaults::DEFAULT_IMAGE_MIME));

    // Browsers occasionally wrap long base64 strings.
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned.as_bytes())?;
    if bytes.is_empty() {
        return Err(Error::InvalidEncoding("decoded image is empty".to_string()));
    }

    debug!(
        declared = ?declared,
        size_bytes = bytes.len(),
        "Decoded image payload"
    );

    normalize_with_hint(&bytes, declared, options)
}

/// Normalize an already-decoded upload, using its media kind as the
/// declared type.
pub fn normalize_media(media: &RawMedia, options: &NormalizeOptions) -> Result<NormalizedImage> {
    normalize_with_hint(&media.data, media.declared_encoding(), options)
}

fn normalize_with_hint(
    bytes: &[u8],
    declared: Option<ImageEncoding>,
    options: &NormalizeOptions,
) -> Result<NormalizedImage> {
    let decoded = decode(bytes, declared)?;

    let (width, height) = decoded.dimensions();
    if width < defaults::MIN_IMAGE_DIMENSION || height < defaults::MIN_IMAGE_DIMENSION {
        return Err(Error::ImageTooSmall {
            width,
            height,
            min: defaults::MIN_IMAGE_DIMENSION,
        });
    }

    let resized = match target_dimensions(width, height, options.max_dimension) {
        Some((new_width, new_height)) => {
            debug!(
                width,
                height, new_width, new_height, "Downscaling image to provider limit"
            );
            decoded.resize_exact(new_width, new_height, FilterType::Lanczos3)
        }
        None => decoded,
    };

    let (encoding, encoded, rgb) = fit_budget(flatten_to_rgb(resized), options)?;

    // The produced payload must decode back to non-empty bytes.
    let b64 = base64::engine::general_purpose::STANDARD.encode(&encoded);
    let round_trip = base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .map_err(|_| Error::EmptyOutput)?;
    if round_trip.is_empty() {
        return Err(Error::EmptyOutput);
    }

    let normalized = NormalizedImage {
        encoding,
        width: rgb.width(),
        height: rgb.height(),
        size_bytes: encoded.len(),
        bytes: encoded,
    };

    debug!(
        width = normalized.width,
        height = normalized.height,
        encoding = %normalized.encoding,
        size_bytes = normalized.size_bytes,
        "Image normalized"
    );

    Ok(normalized)
}

/// Decode by content signature. The declared type is only used when the
/// bytes carry no recognizable signature.
fn decode(bytes: &[u8], declared: Option<ImageEncoding>) -> Result<DynamicImage> {
    let format = match image::guess_format(bytes) {
        Ok(detected) => {
            if let Some(declared) = declared.filter(|d| image_format(*d) != detected) {
                debug!(declared = %declared, detected = ?detected, "Declared image type does not match content");
            }
            detected
        }
        Err(_) => match declared {
            Some(declared) => image_format(declared),
            None => {
                return Err(Error::UnreadableImage(
                    "Failed to decode image: unrecognized format".to_string(),
                ))
            }
        },
    };

    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        Error::UnreadableImage(format!("Failed to decode image as {:?}: {}", format, e))
    })
}

fn image_format(encoding: ImageEncoding) -> ImageFormat {
    match encoding {
        ImageEncoding::Png => ImageFormat::Png,
        ImageEncoding::Jpeg => ImageFormat::Jpeg,
        ImageEncoding::Webp => ImageFormat::WebP,
        ImageEncoding::Gif => ImageFormat::Gif,
    }
}

/// Dimensions after fitting the longer side to `max_dimension`, or `None`
/// when the image already fits.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (short as f64 * max_dimension as f64 / long as f64).round() as u32;
        scaled.max(1)
    };
    if width >= height {
        Some((max_dimension, scale(height, width)))
    } else {
        Some((scale(width, height), max_dimension))
    }
}

/// Composite alpha onto opaque white and drop to 3-channel RGB.
fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    trace!("Compositing alpha channel onto white");
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}

/// Encode per policy, then trade JPEG quality and finally resolution until
/// the base64 form fits the size budget.
fn fit_budget(
    rgb: RgbImage,
    options: &NormalizeOptions,
) -> Result<(ImageEncoding, Vec<u8>, RgbImage)> {
    let budget = options.size_budget_bytes;
    let start_quality = match options.policy {
        EncodingPolicy::AlwaysJpeg { quality } => quality,
        EncodingPolicy::PreferPng { fallback_quality } => {
            let png = encode_png(&rgb)?;
            if base64_len(png.len()) <= budget {
                return Ok((ImageEncoding::Png, png, rgb));
            }
            debug!(
                size_bytes = png.len(),
                budget,
                "PNG exceeds size budget, falling back to JPEG"
            );
            fallback_quality
        }
    };
    let floor = defaults::MIN_JPEG_QUALITY.min(start_quality);

    let mut rgb = rgb;
    let mut last_len = 0;
    for step in 0..=defaults::MAX_BUDGET_DOWNSCALES {
        let qualities = if step == 0 {
            jpeg_qualities(start_quality, floor)
        } else {
            let width = scale_down(rgb.width());
            let height = scale_down(rgb.height());
            if (width, height) == (rgb.width(), rgb.height()) {
                break;
            }
            debug!(width, height, budget, "Downscaling further to fit size budget");
            rgb = image::imageops::resize(&rgb, width, height, FilterType::Lanczos3);
            vec![floor]
        };

        for quality in qualities {
            let jpeg = encode_jpeg(&rgb, quality)?;
            last_len = base64_len(jpeg.len());
            if last_len <= budget {
                return Ok((ImageEncoding::Jpeg, jpeg, rgb));
            }
            trace!(quality, size_bytes = last_len, budget, "JPEG still over budget");
        }
    }

    Err(Error::ImageOverBudget {
        size_bytes: last_len,
        budget,
    })
}

/// `start`, stepping down to `floor` inclusive.
fn jpeg_qualities(start: u8, floor: u8) -> Vec<u8> {
    let mut qualities = vec![start];
    let mut quality = start;
    while quality > floor {
        quality = quality.saturating_sub(defaults::JPEG_QUALITY_STEP).max(floor);
        qualities.push(quality);
    }
    qualities
}

fn scale_down(side: u32) -> u32 {
    let scaled = (side as f64 * defaults::BUDGET_DOWNSCALE_FACTOR).round() as u32;
    scaled.max(defaults::MIN_IMAGE_DIMENSION).min(side)
}

fn encode_png(rgb: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    PngEncoder::new(&mut buf)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::Internal(format!("PNG encoding failed: {}", e)))?;
    Ok(buf.into_inner())
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::Internal(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_base64(image: DynamicImage) -> String {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    fn solid_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])))
    }

    #[test]
    fn test_parse_data_url_with_prefix() {
        let (encoding, payload) = parse_data_url("data:image/jpeg;base64,AAAA");
        assert_eq!(encoding, Some(ImageEncoding::Jpeg));
        assert_eq!(payload, "AAAA");
    }

    #[test]
    fn test_parse_data_url_without_prefix() {
        let (encoding, payload) = parse_data_url("  AAAA ");
        assert_eq!(encoding, None);
        assert_eq!(payload, "AAAA");
    }

    #[test]
    fn test_parse_data_url_unknown_mime() {
        let (encoding, payload) = parse_data_url("data:application/octet-stream;base64,QUJD");
        assert_eq!(encoding, None);
        assert_eq!(payload, "QUJD");
    }

    #[test]
    fn test_target_dimensions_within_limit() {
        assert_eq!(target_dimensions(800, 600, 1024), None);
        assert_eq!(target_dimensions(1024, 1024, 1024), None);
    }

    #[test]
    fn test_target_dimensions_landscape() {
        assert_eq!(target_dimensions(3000, 2000, 1024), Some((1024, 683)));
    }

    #[test]
    fn test_target_dimensions_portrait() {
        assert_eq!(target_dimensions(1000, 4000, 1568), Some((392, 1568)));
    }

    #[test]
    fn test_target_dimensions_extreme_aspect_never_zero() {
        assert_eq!(target_dimensions(100_000, 10, 1024), Some((1024, 1)));
    }

    #[test]
    fn test_invalid_base64_is_invalid_encoding() {
        let err = normalize("!!!not base64!!!", &NormalizeOptions::chat()).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }

    #[test]
    fn test_empty_payload_is_invalid_encoding() {
        let err = normalize("data:image/png;base64,", &NormalizeOptions::chat()).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }

    #[test]
    fn test_non_image_bytes_are_unreadable() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(b"this is plainly not an image");
        let err = normalize(&b64, &NormalizeOptions::chat()).unwrap_err();
        assert!(matches!(err, Error::UnreadableImage(_)));
    }

    #[test]
    fn test_too_small_image_rejected() {
        let b64 = png_base64(solid_rgb(5, 200));
        let err = normalize(&b64, &NormalizeOptions::drawing()).unwrap_err();
        match err {
            Error::ImageTooSmall { width, height, min } => {
                assert_eq!((width, height, min), (5, 200, 10));
            }
            other => panic!("expected ImageTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let b64 = png_base64(solid_rgb(640, 480));
        let normalized = normalize(&b64, &NormalizeOptions::drawing()).unwrap();
        assert_eq!((normalized.width, normalized.height), (640, 480));
        assert_eq!(normalized.encoding, ImageEncoding::Png);
    }

    #[test]
    fn test_chat_path_always_jpeg() {
        let b64 = format!("data:image/png;base64,{}", png_base64(solid_rgb(200, 100)));
        let normalized = normalize(&b64, &NormalizeOptions::chat()).unwrap();
        assert_eq!(normalized.encoding, ImageEncoding::Jpeg);
        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 100));
    }

    #[test]
    fn test_chat_path_caps_at_1568() {
        let b64 = png_base64(solid_rgb(2000, 1000));
        let normalized = normalize(&b64, &NormalizeOptions::chat()).unwrap();
        assert_eq!(normalized.width, 1568);
        assert_eq!(normalized.height, 784);
    }

    #[test]
    fn test_drawing_with_alpha_is_flattened_and_resized() {
        // Transparent canvas with an opaque dark stroke, like a browser drawing.
        let mut canvas = RgbaImage::from_pixel(3000, 2000, Rgba([0, 0, 0, 0]));
        for x in 100..2900 {
            for y in 990..1010 {
                canvas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let b64 = format!(
            "data:image/png;base64,{}",
            png_base64(DynamicImage::ImageRgba8(canvas))
        );

        let normalized = normalize(&b64, &NormalizeOptions::drawing()).unwrap();

        assert_eq!(normalized.width.max(normalized.height), 1024);
        assert!(matches!(
            normalized.encoding,
            ImageEncoding::Png | ImageEncoding::Jpeg
        ));

        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (normalized.width, normalized.height));

        // Transparent background became white, not black.
        let corner = decoded.to_rgb8().get_pixel(0, 0).0;
        assert!(corner.iter().all(|&c| c > 240), "corner was {:?}", corner);

        let ratio = normalized.width as f64 / normalized.height as f64;
        assert!((ratio - 1.5).abs() < 0.01);
    }

    /// Deterministic pseudo-random pixels that defeat compression.
    fn noise_rgb(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x2545_f491;
        RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            };
            Rgb([next(), next(), next()])
        })
    }

    #[test]
    fn test_png_over_budget_falls_back_to_jpeg() {
        let noisy = noise_rgb(64, 64);
        let png_len = base64_len(encode_png(&noisy).unwrap().len());
        let jpeg_len = base64_len(encode_jpeg(&noisy, defaults::FALLBACK_JPEG_QUALITY).unwrap().len());
        assert!(jpeg_len < png_len);

        let options = NormalizeOptions {
            size_budget_bytes: jpeg_len,
            ..NormalizeOptions::drawing()
        };
        let b64 = png_base64(DynamicImage::ImageRgb8(noisy));

        let normalized = normalize(&b64, &options).unwrap();
        assert_eq!(normalized.encoding, ImageEncoding::Jpeg);
        assert_eq!((normalized.width, normalized.height), (64, 64));
        assert!(normalized.base64_len() <= options.size_budget_bytes);
        assert!(image::load_from_memory(&normalized.bytes).is_ok());
    }

    #[test]
    fn test_chat_path_noise_fits_size_budget() {
        let b64 = png_base64(DynamicImage::ImageRgb8(noise_rgb(1568, 1568)));
        let options = NormalizeOptions::chat();

        let normalized = normalize(&b64, &options).unwrap();

        assert_eq!(normalized.encoding, ImageEncoding::Jpeg);
        assert!(normalized.base64_len() <= options.size_budget_bytes);
        assert_eq!(normalized.width, normalized.height);
        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (normalized.width, normalized.height));
    }

    #[test]
    fn test_drawing_path_noise_fits_size_budget() {
        let b64 = png_base64(DynamicImage::ImageRgb8(noise_rgb(1024, 1024)));
        let options = NormalizeOptions::drawing();

        let normalized = normalize(&b64, &options).unwrap();

        assert!(normalized.base64_len() <= options.size_budget_bytes);
    }

    #[test]
    fn test_unreachable_budget_is_typed_error() {
        let b64 = png_base64(DynamicImage::ImageRgb8(noise_rgb(64, 64)));
        let options = NormalizeOptions {
            size_budget_bytes: 64,
            ..NormalizeOptions::chat()
        };

        let err = normalize(&b64, &options).unwrap_err();
        match err {
            Error::ImageOverBudget { size_bytes, budget } => {
                assert_eq!(budget, 64);
                assert!(size_bytes > 64);
            }
            other => panic!("expected ImageOverBudget, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_qualities_step_to_floor() {
        assert_eq!(jpeg_qualities(95, 50), vec![95, 85, 75, 65, 55, 50]);
        assert_eq!(jpeg_qualities(85, 50), vec![85, 75, 65, 55, 50]);
        assert_eq!(jpeg_qualities(40, 40), vec![40]);
    }

    #[test]
    fn test_content_signature_beats_declared_type() {
        let mut buf = Cursor::new(Vec::new());
        solid_rgb(40, 30)
            .write_to(&mut buf, image::ImageFormat::Jpeg)
            .unwrap();
        let b64 = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        );

        let normalized = normalize(&b64, &NormalizeOptions::drawing()).unwrap();
        assert_eq!((normalized.width, normalized.height), (40, 30));
    }

    #[test]
    fn test_declared_type_used_when_signature_missing() {
        let garbage = base64::engine::general_purpose::STANDARD.encode([0x13u8; 64]);

        let err = normalize(&format!("data:image/jpeg;base64,{}", garbage), &NormalizeOptions::chat())
            .unwrap_err();
        assert!(err.to_string().contains("Jpeg"), "got {}", err);

        // No prefix: the default mime applies.
        let err = normalize(&garbage, &NormalizeOptions::chat()).unwrap_err();
        assert!(err.to_string().contains("Png"), "got {}", err);

        // A non-image media kind carries no declaration at all.
        let media = RawMedia {
            data: vec![0x13u8; 64],
            kind: labrat_core::MediaKind::Unknown,
            filename: None,
        };
        let err = normalize_media(&media, &NormalizeOptions::chat()).unwrap_err();
        assert!(err.to_string().contains("unrecognized format"), "got {}", err);
    }

    #[test]
    fn test_normalize_media_decodes_upload() {
        let mut buf = Cursor::new(Vec::new());
        solid_rgb(120, 80)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        let media = RawMedia {
            data: buf.into_inner(),
            kind: labrat_core::MediaKind::Image(ImageEncoding::Png),
            filename: Some("sketch.png".to_string()),
        };

        let normalized = normalize_media(&media, &NormalizeOptions::drawing()).unwrap();
        assert_eq!((normalized.width, normalized.height), (120, 80));
        assert_eq!(normalized.encoding, ImageEncoding::Png);
    }

    #[test]
    fn test_output_round_trips_through_base64() {
        let b64 = png_base64(solid_rgb(50, 50));
        let normalized = normalize(&b64, &NormalizeOptions::drawing()).unwrap();
        let reencoded = normalized.to_base64();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(reencoded)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (50, 50));
        assert_eq!(normalized.base64_len(), normalized.to_base64().len());
    }
}
