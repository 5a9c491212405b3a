//! Asset category definitions.

/// Class of source file, determines source/destination pair and transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Markup templates (`src/index/`) - compiled to HTML
    Markup,
    /// Stylesheets (`src/style/`) - compiled, prefixed, renamed
    Style,
    /// Scripts (`src/scripts/`) - transpiled and bundled
    Script,
    /// Images (`src/images/`) - optimized, incrementally skipped
    Image,
    /// Webfonts (`src/fonts/`) - copied as-is, not watched
    Font,
}

impl AssetCategory {
    /// All categories, in registry order.
    pub const ALL: [Self; 5] = [
        Self::Markup,
        Self::Style,
        Self::Script,
        Self::Image,
        Self::Font,
    ];

    /// Categories covered by the full production build, in run order.
    /// Fonts are excluded; they are only copied on explicit request.
    pub const ORCHESTRATED: [Self; 4] = [Self::Markup, Self::Style, Self::Script, Self::Image];

    /// Display name, also used as the log prefix for the category's task.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Style => "style",
            Self::Script => "scripts",
            Self::Image => "images",
            Self::Font => "fonts",
        }
    }

    /// Parse a category name from the CLI.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "index" => Ok(Self::Markup),
            "style" | "styles" => Ok(Self::Style),
            "script" | "scripts" => Ok(Self::Script),
            "image" | "images" => Ok(Self::Image),
            "font" | "fonts" => Ok(Self::Font),
            other => Err(format!(
                "unknown asset category `{other}` (expected markup, style, scripts, images or fonts)"
            )),
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(AssetCategory::parse("markup"), Ok(AssetCategory::Markup));
        assert_eq!(AssetCategory::parse("Styles"), Ok(AssetCategory::Style));
        assert_eq!(AssetCategory::parse("scripts"), Ok(AssetCategory::Script));
        assert_eq!(AssetCategory::parse("images"), Ok(AssetCategory::Image));
        assert_eq!(AssetCategory::parse("fonts"), Ok(AssetCategory::Font));
    }

    #[test]
    fn test_parse_unknown_name() {
        assert!(AssetCategory::parse("pdf").is_err());
    }

    #[test]
    fn test_orchestrated_order() {
        // The full build runs markup first and images last.
        assert_eq!(AssetCategory::ORCHESTRATED[0], AssetCategory::Markup);
        assert_eq!(AssetCategory::ORCHESTRATED[3], AssetCategory::Image);
        assert!(!AssetCategory::ORCHESTRATED.contains(&AssetCategory::Font));
    }
}
