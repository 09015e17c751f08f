/// Derive a URL-safe slug from a recipe title: lowercase, ASCII alphanumerics
/// kept, every other run of characters collapsed to a single dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        // A title with no usable characters still needs a probe base.
        return "recipe".to_string();
    }
    slug
}
