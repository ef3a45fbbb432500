use std::path::Path;

/// Fenced-code language tag for a file, based on its name or extension.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    if let Some(tag) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(language_for_file_name)
    {
        return Some(tag);
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| language_for_extension(&ext.to_lowercase()))
}

// Exact filenames (case sensitive)
fn language_for_file_name(name: &str) -> Option<&'static str> {
    match name {
        "Dockerfile" => Some("dockerfile"),
        "Makefile" | "GNUmakefile" => Some("makefile"),
        "Rakefile" | "Gemfile" => Some("ruby"),
        _ => None,
    }
}

// Extensions, matched lowercase
pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "rs" => Some("rust"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "jsx" => Some("jsx"),
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("tsx"),
        "py" | "pyi" => Some("python"),
        "rb" | "rake" => Some("ruby"),
        "go" => Some("go"),
        "java" => Some("java"),
        "kt" | "kts" => Some("kotlin"),
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some("cpp"),
        "cs" => Some("csharp"),
        "php" => Some("php"),
        "swift" => Some("swift"),
        "sh" | "bash" | "zsh" => Some("bash"),
        "html" | "htm" => Some("html"),
        "css" => Some("css"),
        "scss" => Some("scss"),
        "json" => Some("json"),
        "yaml" | "yml" => Some("yaml"),
        "toml" => Some("toml"),
        "xml" => Some("xml"),
        "md" | "markdown" => Some("markdown"),
        "sql" => Some("sql"),
        "vue" => Some("vue"),
        "svelte" => Some("svelte"),
        _ => None,
    }
}
