//! Script compilation: TypeScript/JavaScript to bundled JavaScript.
//!
//! Each source file is parsed with oxc, type-stripped through the
//! transformer, optionally minified (production), and printed. The task
//! layer concatenates the per-module outputs into the single bundle file.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

/// Source language of one script module.
///
/// Every extension the script patterns can match must map to exactly one
/// of these; the dispatch table is validated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLang {
    TypeScript,
    JavaScript,
}

impl ScriptLang {
    /// Static extension dispatch. `None` means no compiler handles the
    /// extension, which is a startup configuration error.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Self::TypeScript),
            "js" | "mjs" => Some(Self::JavaScript),
            _ => None,
        }
    }

    fn source_type(self) -> SourceType {
        match self {
            Self::TypeScript => SourceType::ts(),
            Self::JavaScript => SourceType::mjs(),
        }
    }
}

/// Compile one module to JavaScript.
///
/// Production: compress + mangle + minified printing. Development: type
/// stripping only, readable printing.
pub fn compile(source: &str, path: &Path, lang: ScriptLang, minify: bool) -> Result<String, String> {
    let allocator = Allocator::default();

    let parsed = Parser::new(&allocator, source, lang.source_type()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(error.to_string());
    }
    let mut program = parsed.program;

    // Type stripping (no-op for plain JavaScript input).
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed = Transformer::new(&allocator, path, &TransformOptions::default())
        .build_with_scoping(scoping, &mut program);
    if let Some(error) = transformed.errors.first() {
        return Err(error.to_string());
    }

    if minify {
        let minified = Minifier::new(MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::smallest()),
        })
        .minify(&allocator, &mut program);

        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(minified.scoping)
            .build(&program)
            .code;
        Ok(code)
    } else {
        Ok(Codegen::new().build(&program).code)
    }
}
