use crate::shared::validation::NON_SLUG_RUN_REGEX;

/// Derive a category slug from its display name.
///
/// Lowercases, then collapses each run of characters outside `[a-z0-9]` into a
/// single `-`. Leading and trailing separators are kept, so `"Others "` becomes
/// `"others-"`. Applying it to its own output is a no-op.
pub fn slugify(name: &str) -> String {
    NON_SLUG_RUN_REGEX
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}
