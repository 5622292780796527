//! Slug allocation.
//!
//! A slug is derived from the title once, at creation, and never changes.

use std::sync::LazyLock;

use agora_common::AppResult;
use agora_db::repositories::PostRepository;
use rand::Rng;
use regex::Regex;

/// Slug used when a title has no ASCII-representable characters.
const FALLBACK_SLUG: &str = "post";

/// Characters replaced before stripping.
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('ç', "c"),
    ('Ç', "C"),
    ('ğ', "g"),
    ('Ğ', "G"),
    ('ı', "i"),
    ('İ', "I"),
    ('ö', "o"),
    ('Ö', "O"),
    ('ş', "s"),
    ('Ş', "S"),
    ('ü', "u"),
    ('Ü', "U"),
    ('à', "a"),
    ('á', "a"),
    ('â', "a"),
    ('ä', "a"),
    ('ã', "a"),
    ('å', "a"),
    ('è', "e"),
    ('é', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('ì', "i"),
    ('í', "i"),
    ('î', "i"),
    ('ï', "i"),
    ('ñ', "n"),
    ('ò', "o"),
    ('ó', "o"),
    ('ô', "o"),
    ('õ', "o"),
    ('ù', "u"),
    ('ú', "u"),
    ('û', "u"),
    ('ß', "ss"),
    ('æ', "ae"),
    ('ø', "o"),
];

#[allow(clippy::unwrap_used)]
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());

#[allow(clippy::unwrap_used)]
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[allow(clippy::unwrap_used)]
static HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Turn a title into a URL-safe slug candidate.
///
/// May return an empty string when nothing survives stripping.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut transliterated = String::with_capacity(title.len());
    for c in title.chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => transliterated.push_str(to),
            None => transliterated.push(c),
        }
    }

    let lowered = transliterated.to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS_RE.replace_all(&hyphenated, "-");

    collapsed.trim_matches('-').to_string()
}

/// Picks a free slug by probing the post store.
#[derive(Clone)]
pub struct SlugAllocator {
    post_repo: PostRepository,
}

impl SlugAllocator {
    /// Create a new slug allocator.
    #[must_use]
    pub const fn new(post_repo: PostRepository) -> Self {
        Self { post_repo }
    }

    /// Allocate a slug for `title`.
    ///
    /// On collision a random `-<0..1000>` suffix is appended to the base and
    /// the store is checked again. The loop ends with overwhelming probability
    /// but has no hard bound; a race with a concurrent insert is caught by the
    /// unique index and reported as `Conflict` at insert time.
    pub async fn allocate(&self, title: &str) -> AppResult<String> {
        let mut base = slugify(title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }

        let mut candidate = base.clone();
        while self.post_repo.slug_exists(&candidate).await? {
            let suffix: u32 = rand::thread_rng().gen_range(0..1000);
            tracing::debug!(slug = %candidate, "Slug taken, retrying with suffix");
            candidate = format!("{base}-{suffix}");
        }

        Ok(candidate)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn count_result(n: i64) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        vec![maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_slugify_collapses_whitespace_and_hyphens() {
        assert_eq!(slugify("  Rust   --  is   fun  "), "rust-is-fun");
        assert_eq!(slugify("-leading and trailing-"), "leading-and-trailing");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Çok Güzel Şeyler"), "cok-guzel-seyler");
        assert_eq!(slugify("İstanbul'da ılık"), "istanbulda-ilik");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
    }

    #[test]
    fn test_slugify_strips_everything_else() {
        assert_eq!(slugify("日本語"), "");
        assert_eq!(slugify("100% done?"), "100-done");
    }

    #[test]
    fn test_slugify_sanitized_ampersand_title() {
        let title = crate::sanitize::plain_text("Tom & Jerry");
        assert_eq!(slugify(&title), "tom-jerry");
    }

    #[tokio::test]
    async fn test_allocate_free_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(0)])
                .into_connection(),
        );

        let allocator = SlugAllocator::new(PostRepository::new(db));
        let slug = allocator.allocate("Hello, World!").await.unwrap();

        assert_eq!(slug, "hello-world");
    }

    #[tokio::test]
    async fn test_allocate_retries_with_suffix() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(1)])
                .append_query_results([count_result(1)])
                .append_query_results([count_result(0)])
                .into_connection(),
        );

        let allocator = SlugAllocator::new(PostRepository::new(db));
        let slug = allocator.allocate("Hello, World!").await.unwrap();

        let suffix = slug.strip_prefix("hello-world-").unwrap();
        let n: u32 = suffix.parse().unwrap();
        assert!(n < 1000);
    }

    #[tokio::test]
    async fn test_allocate_falls_back_for_empty_base() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(0)])
                .into_connection(),
        );

        let allocator = SlugAllocator::new(PostRepository::new(db));
        assert_eq!(allocator.allocate("!!!").await.unwrap(), "post");
    }
}
