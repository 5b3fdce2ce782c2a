/// Extensions recognized as presentation files, lowercase and dot-prefixed.
pub const PRESENTATION_EXTENSIONS: &[&str] = &[".ppt", ".pptx", ".pptm"];

/// Maps each of `< > : " / \ | ? *` to `_`. Nothing else is altered.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}

/// Case-insensitive check against [`PRESENTATION_EXTENSIONS`].
pub fn is_presentation(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    PRESENTATION_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Splits `name` into stem and extension (with its dot). A leading dot does not
/// start an extension, so `.pptx` has an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
