//! The structures and functions for configuration. Must be accessible to main.

/// The overall options.
pub struct RefsConfig<'a> {
    pub input: &'a str,
    pub output: Option<&'a str>,
    pub format: Output,
    pub transform: bool,
}

impl RefsConfig<'_> {
    pub fn new<'a>(
        input: &'a str,
        output: Option<&'a str>,
        format: Output,
        transform: bool,
    ) -> RefsConfig<'a> {
        RefsConfig {
            input,
            output,
            format,
            transform,
        }
    }
}

/// Output formats
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Output {
    Html,
    Json,
    Yaml,
    Ron,
}

impl Output {
    /// The format named on the command line.
    pub fn from_name(name: &str) -> Option<Output> {
        match name {
            "html" => Some(Output::Html),
            "json" => Some(Output::Json),
            "yaml" => Some(Output::Yaml),
            "ron" => Some(Output::Ron),
            _ => None,
        }
    }

    /// The format implied by a file's extension.
    pub fn from_path(path: &str) -> Option<Output> {
        let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "html" | "htm" | "xhtml" => Some(Output::Html),
            "yml" => Some(Output::Yaml),
            e => Output::from_name(e),
        }
    }
}

/// Input formats
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Input {
    Markup,
    Json,
}

impl Input {
    /// JSON files hold a serialized tree; anything else is markup.
    pub fn from_path(path: &str) -> Input {
        if path.to_ascii_lowercase().ends_with(".json") {
            Input::Json
        } else {
            Input::Markup
        }
    }
}
