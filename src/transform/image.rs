//! Image optimization: JPEG recompression, PNG re-encoding, SVG minification.
//!
//! Fixed configuration, mode-independent:
//! - JPEG: lossy re-encode at quality 93
//! - PNG: lossless re-encode at best compression, adaptive filtering
//! - SVG: strip comments, whitespace and the root `viewBox` attribute,
//!   preserving element `id`s
//! - anything else copies through unchanged

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// JPEG re-encode quality.
pub const JPEG_QUALITY: u8 = 93;

/// Optimize one image by extension. Unknown formats pass through.
pub fn optimize(ext: Option<&str>, content: &[u8]) -> Result<Vec<u8>, String> {
    match ext {
        Some("jpg" | "jpeg") => recompress_jpeg(content),
        Some("png") => recompress_png(content),
        Some("svg") => minify_svg(content),
        _ => Ok(content.to_vec()),
    }
}

fn recompress_jpeg(content: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(content, ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(out)
}

fn recompress_png(content: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(content, ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(out)
}

/// Minify SVG markup.
///
/// Drops comments and inter-element whitespace, and removes the
/// `viewBox` attribute from the root `<svg>` element. `id` attributes
/// are never touched so fragment references keep working.
fn minify_svg(content: &[u8]) -> Result<Vec<u8>, String> {
    let source = std::str::from_utf8(content).map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new(Vec::new());
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Comment(_)) => {}
            Ok(Event::Start(e)) => writer
                .write_event(Event::Start(strip_viewbox(&e)))
                .map_err(|e| e.to_string())?,
            Ok(Event::Empty(e)) => writer
                .write_event(Event::Empty(strip_viewbox(&e)))
                .map_err(|e| e.to_string())?,
            Ok(event) => writer.write_event(event).map_err(|e| e.to_string())?,
            Err(e) => return Err(e.to_string()),
        }
    }

    Ok(writer.into_inner())
}

fn strip_viewbox(element: &BytesStart<'_>) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let is_root = name.eq_ignore_ascii_case("svg");

    let mut out = BytesStart::new(name.clone());
    for attr in element.attributes().flatten() {
        if is_root && attr.key.as_ref().eq_ignore_ascii_case(b"viewBox") {
            continue;
        }
        out.push_attribute(attr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png() -> Vec<u8> {
        let img = image::DynamicImage::new_rgba8(4, 4);
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_png_roundtrip_is_valid() {
        let optimized = optimize(Some("png"), &sample_png()).unwrap();
        assert!(image::load_from_memory_with_format(&optimized, ImageFormat::Png).is_ok());
    }

    #[test]
    fn test_jpeg_roundtrip_is_valid() {
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut jpeg = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let optimized = optimize(Some("jpg"), &jpeg).unwrap();
        assert!(image::load_from_memory_with_format(&optimized, ImageFormat::Jpeg).is_ok());
    }

    #[test]
    fn test_corrupt_image_is_an_error() {
        assert!(optimize(Some("png"), b"not a png").is_err());
    }

    #[test]
    fn test_unknown_extension_passes_through() {
        let content = b"GIF89a...".to_vec();
        assert_eq!(optimize(Some("gif"), &content).unwrap(), content);
        assert_eq!(optimize(None, &content).unwrap(), content);
    }

    #[test]
    fn test_svg_strips_viewbox_keeps_ids() {
        let svg = br#"<svg viewBox="0 0 10 10" width="10">
            <!-- a comment -->
            <rect id="box" viewBox="ignored-on-non-root"/>
        </svg>"#;

        let out = minify_svg(svg).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(!out.contains(r#"<svg viewBox"#));
        assert!(out.starts_with("<svg"));
        assert!(out.contains(r#"id="box""#));
        assert!(!out.contains("comment"));
        // Non-root viewBox attributes are left alone.
        assert!(out.contains(r#"viewBox="ignored-on-non-root""#));
    }

    #[test]
    fn test_svg_invalid_utf8_is_an_error() {
        assert!(minify_svg(&[0xff, 0xfe, 0x00]).is_err());
    }
}
