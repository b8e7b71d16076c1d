//! Unique name generation.
//!
//! [`UniqueNameGenerator`] mints identifiers that avoid a set of disallowed
//! names. Numbering starts at `1` and is appended directly to the base:
//! `value`, `value1`, `value2`, ...
//!
//! The generator is language-neutral. Keyword escaping and identifier
//! validity are the caller's concern; see the language crate for the rules
//! of a concrete language.

use std::collections::HashSet;

/// Generates names that are not in a set of used names.
///
/// With case-insensitive comparison, `Value` and `value` collide.
#[derive(Debug, Clone, Default)]
pub struct UniqueNameGenerator {
    /// Names already in use (case-folded when comparison is case-insensitive).
    used_names: HashSet<String>,
    case_sensitive: bool,
}

impl UniqueNameGenerator {
    /// Create a generator with no used names.
    pub fn new(case_sensitive: bool) -> Self {
        UniqueNameGenerator {
            used_names: HashSet::new(),
            case_sensitive,
        }
    }

    /// Create a generator with explicit used names.
    pub fn with_used_names<I, S>(used_names: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut generator = UniqueNameGenerator::new(case_sensitive);
        for name in used_names {
            generator.mark_used(name.as_ref());
        }
        generator
    }

    /// Check if comparison is case-sensitive.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Check if a name is already in use.
    pub fn is_in_use(&self, name: &str) -> bool {
        self.used_names.contains(self.fold(name).as_ref())
    }

    /// Add a name to the set of used names.
    ///
    /// Call this after generating a name if you need to generate multiple
    /// unique names in sequence.
    pub fn mark_used(&mut self, name: &str) {
        let folded = self.fold(name).into_owned();
        self.used_names.insert(folded);
    }

    /// Generate a unique name based on `base`.
    ///
    /// If `base` is not in use, returns it directly. Otherwise appends the
    /// smallest numeric suffix (`1`, `2`, ...) that yields an unused name.
    pub fn generate(&self, base: &str) -> String {
        if !self.is_in_use(base) {
            return base.to_string();
        }

        let mut suffix: u64 = 1;
        loop {
            let candidate = format!("{}{}", base, suffix);
            if !self.is_in_use(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Generate a unique name and mark it used.
    pub fn generate_and_mark(&mut self, base: &str) -> String {
        let name = self.generate(base);
        self.mark_used(&name);
        name
    }

    /// Number of used names.
    pub fn used_count(&self) -> usize {
        self.used_names.len()
    }

    fn fold<'n>(&self, name: &'n str) -> std::borrow::Cow<'n, str> {
        if self.case_sensitive {
            std::borrow::Cow::Borrowed(name)
        } else {
            std::borrow::Cow::Owned(name.to_lowercase())
        }
    }
}

/// Convenience function to generate a unique name against a fixed set.
pub fn generate_unique_name<S: AsRef<str>>(
    base: &str,
    disallowed: &[S],
    case_sensitive: bool,
) -> String {
    UniqueNameGenerator::with_used_names(disallowed, case_sensitive).generate(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_base_is_returned() {
        assert_eq!(generate_unique_name::<&str>("value", &[], true), "value");
    }

    #[test]
    fn test_suffixes_count_up() {
        let name = generate_unique_name("value", &["value", "value1", "value3"], true);
        assert_eq!(name, "value2");
    }

    #[test]
    fn test_case_sensitive_does_not_collide() {
        assert_eq!(generate_unique_name("Foo", &["foo"], true), "Foo");
    }

    #[test]
    fn test_case_insensitive_disambiguates() {
        assert_eq!(generate_unique_name("Foo", &["foo"], false), "Foo1");
        assert_eq!(generate_unique_name("Foo", &["foo", "FOO1"], false), "Foo2");
    }

    #[test]
    fn test_mark_used_prevents_repeat() {
        let mut generator = UniqueNameGenerator::with_used_names(["item"], true);
        let first = generator.generate_and_mark("item");
        let second = generator.generate_and_mark("item");
        let third = generator.generate_and_mark("item");
        assert_eq!(first, "item1");
        assert_eq!(second, "item2");
        assert_eq!(third, "item3");
        assert_eq!(generator.used_count(), 4);
    }

    #[test]
    fn test_generated_name_never_in_disallowed() {
        let mut disallowed: Vec<String> = vec!["x".into()];
        for _ in 0..20 {
            let name = generate_unique_name("x", &disallowed, false);
            assert!(!disallowed.iter().any(|d| d.eq_ignore_ascii_case(&name)));
            disallowed.push(name);
        }
    }
}
