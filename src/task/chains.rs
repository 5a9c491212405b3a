//! Per-category transform chain construction.
//!
//! Fixed stage order (reordering changes output semantics):
//!
//! | Category | Stages |
//! |---|---|
//! | markup  | read → markdown |
//! | style   | sass → prefix, rename `style.min.css` |
//! | scripts | read → compile, bundle, rename `main.min.js` |
//! | images  | newer → read → optimize |
//! | fonts   | read (plain copy) |

use std::path::PathBuf;

use crate::chain::{AssetItem, Collector, Stage, TransformChain, TransformError, read_stage};
use crate::core::AssetCategory;
use crate::incremental::newer_stage;
use crate::registry::PathRegistry;
use crate::transform::script::ScriptLang;
use crate::transform::{image, markup, script, style};

/// Build the chain for one category.
///
/// Mode-dependent behavior is resolved at run time through the stage
/// context, so one chain serves both build modes.
pub fn chain_for(category: AssetCategory) -> TransformChain {
    let chain = match category {
        AssetCategory::Markup => TransformChain::new(vec![read_stage(), markdown_stage()]),
        AssetCategory::Style => TransformChain::new(vec![sass_stage(), prefix_stage()]),
        AssetCategory::Script => TransformChain::new(vec![read_stage(), compile_script_stage()])
            .with_collector(bundle_collector()),
        AssetCategory::Image => {
            TransformChain::new(vec![newer_stage(), read_stage(), optimize_stage()])
        }
        AssetCategory::Font => TransformChain::new(vec![read_stage()]),
    };

    chain.with_rename(PathRegistry::spec(category).rename)
}

/// Markdown to HTML; output extension becomes `.html`.
fn markdown_stage() -> Stage {
    Stage::new("markdown", |mut item, ctx| {
        let source = utf8(&item)?;
        item.content = markup::compile(source, ctx.mode.minify).into_bytes();
        item.rel.set_extension("html");
        Ok(vec![item])
    })
}

/// Sass compilation. Reads through `grass` for `.scss` sources so
/// imports resolve; plain `.css` inputs are read as-is.
fn sass_stage() -> Stage {
    Stage::new("sass", |mut item, ctx| {
        let is_scss = item
            .source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == "scss");

        let css = if is_scss {
            style::compile_sass(&item.source, ctx.mode.minify)
                .map_err(|m| TransformError::stage(&item.source, m))?
        } else {
            std::fs::read_to_string(&item.source).map_err(|source| TransformError::Read {
                path: item.source.clone(),
                source,
            })?
        };

        item.content = css.into_bytes();
        item.rel.set_extension("css");
        Ok(vec![item])
    })
}

/// Vendor prefixing, after compilation in both modes.
fn prefix_stage() -> Stage {
    Stage::new("prefix", |mut item, ctx| {
        let source = utf8(&item)?;
        let css = style::postprocess(source, ctx.mode.minify)
            .map_err(|m| TransformError::stage(&item.source, m))?;
        item.content = css.into_bytes();
        Ok(vec![item])
    })
}

/// Per-module script compilation, routed by extension.
fn compile_script_stage() -> Stage {
    Stage::new("compile", |mut item, ctx| {
        let ext = item
            .source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        // The dispatch table was validated at startup; an unknown
        // extension here means the file appeared outside the patterns.
        let lang = ScriptLang::from_extension(ext)
            .ok_or_else(|| TransformError::stage(&item.source, format!("no compiler for .{ext}")))?;

        let source = utf8(&item)?;
        let js = script::compile(source, &item.source, lang, ctx.mode.minify)
            .map_err(|m| TransformError::stage(&item.source, m))?;

        item.content = js.into_bytes();
        item.rel.set_extension("js");
        Ok(vec![item])
    })
}

/// Concatenate compiled modules into the single bundle file.
fn bundle_collector() -> Collector {
    Collector::new("bundle", |mut items| {
        items.sort_by(|a, b| a.rel.cmp(&b.rel));

        let mut bundle = AssetItem::new(PathBuf::new(), PathBuf::from("main.js"));
        for item in items {
            bundle.content.extend_from_slice(&item.content);
            if !bundle.content.ends_with(b"\n") {
                bundle.content.push(b'\n');
            }
        }
        Ok(bundle)
    })
}

/// Image optimization with fixed per-format configuration.
fn optimize_stage() -> Stage {
    Stage::new("optimize", |mut item, _ctx| {
        let ext = item.source.extension().and_then(|e| e.to_str());
        item.content = image::optimize(ext, &item.content)
            .map_err(|m| TransformError::stage(&item.source, m))?;
        Ok(vec![item])
    })
}

fn utf8(item: &AssetItem) -> Result<&str, TransformError> {
    std::str::from_utf8(&item.content)
        .map_err(|e| TransformError::stage(&item.source, format!("invalid utf-8: {e}")))
}
