/// Reduces a client-supplied file name to a safe basename: any directory
/// part is dropped and characters outside `[A-Za-z0-9._-]` become `_`.
pub fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let clean = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect::<String>();
    match clean.trim_start_matches('.') {
        "" => String::from("upload"),
        trimmed => trimmed.to_string(),
    }
}

/// Stem and extension (dot included) of a file name.
pub fn split(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(i) => name.split_at(i),
    }
}
