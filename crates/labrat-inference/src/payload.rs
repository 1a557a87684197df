//! Payload assembly with pre-flight validation.
//!
//! Everything that can be rejected locally is rejected here, before a
//! provider call is spent.

use tracing::debug;

use labrat_core::{
    defaults, ContentItem, Error, ImageEncoding, InferencePayload, NormalizedImage, Prompt,
    RequestClass, Result,
};

/// Build the single-turn payload for `class`: prompt text first, then the
/// image when present.
///
/// # Errors
///
/// - `MissingImage` when `class` requires an image and none was supplied
/// - `UnsupportedImageEncoding` when the image encoding is not in `accepted`
/// - `InvalidEncoding` when the base64 image is implausibly short
pub fn assemble(
    prompt: Prompt,
    image: Option<NormalizedImage>,
    class: RequestClass,
    accepted: &[ImageEncoding],
) -> Result<InferencePayload> {
    if class.requires_image() && image.is_none() {
        return Err(Error::MissingImage(class.to_string()));
    }

    let mut items = vec![ContentItem::Text(prompt.into_inner())];

    if let Some(image) = image {
        if !accepted.contains(&image.encoding) {
            return Err(Error::UnsupportedImageEncoding(image.encoding.to_string()));
        }
        let encoded_len = image.base64_len();
        if encoded_len <= defaults::MIN_ENCODED_IMAGE_LEN {
            return Err(Error::InvalidEncoding(format!(
                "encoded image is only {} characters",
                encoded_len
            )));
        }
        items.push(ContentItem::Image(image));
    }

    debug!(
        subsystem = "inference",
        op = "assemble",
        request_class = class.as_str(),
        item_count = items.len(),
        "Payload assembled"
    );

    Ok(InferencePayload::from_items(items))
}
