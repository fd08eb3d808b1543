use serde_json::Value;

use crate::models::{GenerationRequest, RawGenerationRequest};

pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a product description.")]
    MissingDescription,
    #[error("Product description must be at least 10 characters.")]
    DescriptionTooShort,
    #[error("Product description must be at most 5000 characters.")]
    DescriptionTooLong,
    #[error("Please upload at least one product image.")]
    MissingImages,
}

// ── Shared checks ────────────────────────────────────────────────────────────

/// Trims the description and checks its length. Used by both the relay
/// handler and the client before anything touches the network.
pub fn check_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    let len = trimmed.chars().count();
    if len < MIN_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooShort);
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(trimmed.to_string())
}

pub fn check_images<T>(images: &[T]) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(ValidationError::MissingImages);
    }
    Ok(())
}

/// Blank reference URLs count as absent.
pub fn normalize_reference_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ── Wire boundary ────────────────────────────────────────────────────────────

impl TryFrom<RawGenerationRequest> for GenerationRequest {
    type Error = ValidationError;

    fn try_from(raw: RawGenerationRequest) -> Result<Self, Self::Error> {
        let description = match raw.product_description {
            Some(Value::String(s)) => s,
            _ => return Err(ValidationError::MissingDescription),
        };
        let product_description = check_description(&description)?;

        // Non-string entries would be skipped by the relay anyway. Dropping
        // them here means the prompt's section count and the parser's
        // mismatch warning both use the number of string entries.
        let images: Vec<String> = match raw.images {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        check_images(&images)?;

        let reference_url = match &raw.reference_url {
            Some(Value::String(s)) => normalize_reference_url(Some(s.as_str())),
            _ => None,
        };

        Ok(GenerationRequest {
            product_description,
            reference_url,
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawGenerationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_lengths_inside_bounds() {
        assert!(check_description(&"a".repeat(10)).is_ok());
        assert!(check_description(&"a".repeat(5000)).is_ok());
        assert_eq!(
            check_description("   ten chars!   ").unwrap(),
            "ten chars!"
        );
    }

    #[test]
    fn rejects_lengths_outside_bounds() {
        assert_eq!(
            check_description(&"a".repeat(9)),
            Err(ValidationError::DescriptionTooShort)
        );
        assert_eq!(
            check_description(&"a".repeat(5001)),
            Err(ValidationError::DescriptionTooLong)
        );
        assert_eq!(
            check_description("  \n\t "),
            Err(ValidationError::MissingDescription)
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 10 Hangul syllables are 30 bytes.
        assert!(check_description("편안한의자입니다요오").is_ok());
        assert_eq!(
            check_description(&"가".repeat(5001)),
            Err(ValidationError::DescriptionTooLong)
        );
    }

    #[test]
    fn messages_name_the_limits() {
        assert_eq!(
            ValidationError::DescriptionTooShort.to_string(),
            "Product description must be at least 10 characters."
        );
        assert_eq!(
            ValidationError::DescriptionTooLong.to_string(),
            "Product description must be at most 5000 characters."
        );
    }

    #[test]
    fn empty_images_fail_even_with_valid_description() {
        let err = GenerationRequest::try_from(raw(json!({
            "productDescription": "A perfectly valid description",
            "images": []
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingImages);
    }

    #[test]
    fn missing_or_mistyped_fields() {
        let err = GenerationRequest::try_from(raw(json!({ "images": ["data:image/png;base64,AA"] })))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingDescription);

        let err = GenerationRequest::try_from(raw(json!({
            "productDescription": 42,
            "images": ["data:image/png;base64,AA"]
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingDescription);

        let err = GenerationRequest::try_from(raw(json!({
            "productDescription": "A perfectly valid description",
            "images": "data:image/png;base64,AA"
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingImages);

        let err = GenerationRequest::try_from(raw(json!({
            "productDescription": "A perfectly valid description",
            "images": [1, null]
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingImages);
    }

    #[test]
    fn description_is_checked_before_images() {
        let err = GenerationRequest::try_from(raw(json!({ "productDescription": "short" })))
            .unwrap_err();
        assert_eq!(err, ValidationError::DescriptionTooShort);
    }

    #[test]
    fn builds_typed_request() {
        let req = GenerationRequest::try_from(raw(json!({
            "productDescription": "  A comfortable ergonomic office chair  ",
            "referenceUrl": "   ",
            "images": ["data:image/png;base64,AA", 7, "data:image/jpeg;base64,BB"]
        })))
        .unwrap();
        assert_eq!(req.product_description, "A comfortable ergonomic office chair");
        assert_eq!(req.reference_url, None);
        assert_eq!(req.images.len(), 2);

        let req = GenerationRequest::try_from(raw(json!({
            "productDescription": "A comfortable ergonomic office chair",
            "referenceUrl": " https://shop.example/item/1 ",
            "images": ["data:image/png;base64,AA"]
        })))
        .unwrap();
        assert_eq!(req.reference_url.as_deref(), Some("https://shop.example/item/1"));
    }

    #[test]
    fn prompt_counts_only_string_images() {
        let req = GenerationRequest::try_from(raw(json!({
            "productDescription": "A comfortable ergonomic office chair",
            "images": ["data:image/png;base64,AA", {"url": "x"}, "data:image/png;base64,BB"]
        })))
        .unwrap();
        let prompt = crate::prompt::build_prompt(
            &req.product_description,
            req.reference_url.as_deref(),
            req.images.len(),
        );
        assert!(prompt.contains("exactly 2 sections"));
    }
}
