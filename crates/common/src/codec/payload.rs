use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_THEME: &str = "tomorrow";
pub const DEFAULT_MODE: &str = "javascript";
pub const DEFAULT_FONT_SIZE: u32 = 14;
pub const DEFAULT_TAB_SIZE: u32 = 4;

/// Editor themes a reader knows how to render
pub const THEMES: &[&str] = &[
    "tomorrow",
    "monokai",
    "github",
    "kuroir",
    "twilight",
    "xcode",
    "textmate",
    "solarized_dark",
    "solarized_light",
    "terminal",
];

/// Language modes a reader knows how to highlight
pub const MODES: &[&str] = &[
    "javascript",
    "java",
    "python",
    "xml",
    "ruby",
    "sass",
    "markdown",
    "mysql",
    "json",
    "html",
    "handlebars",
    "golang",
    "csharp",
    "elixir",
    "typescript",
    "css",
];

pub const FONT_SIZES: &[u32] = &[14, 16, 18, 20, 24, 28, 32, 40];
pub const TAB_SIZES: &[u32] = &[1, 2, 3, 4];

/// Rendering hints stored next to the content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub theme: String,
    pub mode: String,
    pub font_size: u32,
    pub tab_size: u32,
}

impl Default for MetaData {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            mode: DEFAULT_MODE.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

impl MetaData {
    /// Whether every field is one of the catalogued values
    ///
    /// Unknown values still round-trip; this is only a hint for callers.
    pub fn is_known(&self) -> bool {
        THEMES.contains(&self.theme.as_str())
            && MODES.contains(&self.mode.as_str())
            && FONT_SIZES.contains(&self.font_size)
            && TAB_SIZES.contains(&self.tab_size)
    }
}

/// The unit that is encrypted, chunked and published
///
/// `data` is any JSON value; pastes store the source text as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub data: Value,
    pub meta_data: MetaData,
}

impl Payload {
    pub fn new(data: Value, meta_data: MetaData) -> Self {
        Self { data, meta_data }
    }

    /// A paste of plain source text
    pub fn text(source: impl Into<String>, meta_data: MetaData) -> Self {
        Self::new(Value::String(source.into()), meta_data)
    }

    /// The source text, if `data` holds a string
    pub fn as_text(&self) -> Option<&str> {
        self.data.as_str()
    }
}
