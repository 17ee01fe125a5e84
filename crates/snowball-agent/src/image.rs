//! Product image lookup in search results

use std::sync::LazyLock;

use regex::Regex;

/// Image used when a search result carries no recognisable image URL
pub const FALLBACK_IMAGE_URL: &str =
    "https://cdn.shopify.com/s/files/1/0948/4369/9488/files/printer-front.avif?v=1750994570";

/// Patterns tried in order; the URL is the last capture group.
static IMAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // ![alt](url)
        r"(?i)!\[([^\]]*)\]\((https?://[^\s)]+\.(?:png|jpg|jpeg|avif|webp)(?:\?[^\s)]*)?)\)",
        // bare image URL
        r"(?i)(https?://\S+\.(?:png|jpg|jpeg|avif|webp)(?:\?\S*)?)",
        // Image URL: <url>
        r"(?i)Image\s+URL:\s*(https?://\S+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Find the first product image URL in free text
pub fn extract_image_url(text: &str) -> Option<String> {
    IMAGE_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.iter().flatten().last())
            .map(|m| m.as_str().to_string())
    })
}

/// Like [`extract_image_url`], falling back to [`FALLBACK_IMAGE_URL`]
pub fn image_url_or_fallback(text: &str) -> String {
    extract_image_url(text).unwrap_or_else(|| {
        tracing::info!("No image URL found in search result, using fallback");
        FALLBACK_IMAGE_URL.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_image_wins() {
        let text = "See https://cdn.example.com/other.png and \
            ![Front](https://cdn.shopify.com/files/printer.avif?v=17) for details";
        assert_eq!(
            extract_image_url(text).as_deref(),
            Some("https://cdn.shopify.com/files/printer.avif?v=17")
        );
    }

    #[test]
    fn test_bare_url() {
        let text = "Photo: https://cdn.example.com/a/b/desk.JPEG here";
        assert_eq!(
            extract_image_url(text).as_deref(),
            Some("https://cdn.example.com/a/b/desk.JPEG")
        );
    }

    #[test]
    fn test_image_url_label() {
        let text = "Name: Lamp\nImage URL: https://img.example.com/lamp?id=4\nPrice: 10";
        assert_eq!(
            extract_image_url(text).as_deref(),
            Some("https://img.example.com/lamp?id=4")
        );
    }

    #[test]
    fn test_fallback() {
        assert_eq!(extract_image_url("no pictures here"), None);
        assert_eq!(image_url_or_fallback("no pictures here"), FALLBACK_IMAGE_URL);
    }
}
