//! Style compilation: sass preprocessing plus vendor prefixing.
//!
//! Two passes, matching the fixed stage order of the style chain:
//! 1. `compile_sass` - scss to css (`grass`), compressed in production,
//!    expanded in development. Plain `.css` inputs bypass this pass.
//! 2. `postprocess` - vendor prefixing against the browser target set
//!    (`lightningcss`), run in both modes; printing is minified only in
//!    production.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

/// Compile an scss file to css.
///
/// Takes the path rather than content so `@use`/`@import` resolve
/// relative to the source file.
pub fn compile_sass(path: &Path, minify: bool) -> Result<String, String> {
    let style = if minify {
        grass::OutputStyle::Compressed
    } else {
        grass::OutputStyle::Expanded
    };

    grass::from_path(path, &grass::Options::default().style(style)).map_err(|e| e.to_string())
}

/// Vendor-prefix and reprint css.
pub fn postprocess(source: &str, minify: bool) -> Result<String, String> {
    let targets = browser_targets();

    let mut sheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;

    // The prefixing pass runs in both modes; only printing differs.
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let result = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(result.code)
}

/// Browser set the prefixer targets.
///
/// Versions are encoded `major << 16 | minor << 8`.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(12 << 16),
        ios_saf: Some(12 << 16),
        ..Browsers::default()
    })
}
