//! Locale catalogs: JSON documents resolved by dotted key.

use std::path::Path;

use serde_json::Value;

use crate::error::Result;

/// Locale shipped with every build and used when a requested one is missing.
pub const DEFAULT_LOCALE: &str = "en";

/// Dotted-key lookup over a locale document with a default-locale fallback.
///
/// A key missing from both documents resolves to the key itself, so untranslated
/// strings stay visible instead of disappearing.
pub struct Translator {
    locale: String,
    catalog: Value,
    fallback: Value,
}

impl Translator {
    /// Build a translator from already-parsed JSON sources.
    pub fn from_sources(locale: impl Into<String>, catalog: &str, fallback: &str) -> Result<Self> {
        Ok(Self {
            locale: locale.into(),
            catalog: serde_json::from_str(catalog)?,
            fallback: serde_json::from_str(fallback)?,
        })
    }

    /// Load `<locale>.json` from `dir`, falling back to the default locale's
    /// file when the requested one is absent.
    pub fn load_dir(dir: &Path, locale: &str) -> Result<Self> {
        let fallback = read_locale_file(dir, DEFAULT_LOCALE)?.unwrap_or(Value::Null);
        let (locale, catalog) = match read_locale_file(dir, locale)? {
            Some(catalog) => (locale.to_string(), catalog),
            None => {
                tracing::debug!("Locale '{locale}' not found, using '{DEFAULT_LOCALE}'");
                (DEFAULT_LOCALE.to_string(), fallback.clone())
            }
        };

        Ok(Self {
            locale,
            catalog,
            fallback,
        })
    }

    /// The locale this translator resolved to.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Resolve a dotted key, e.g. `t("sync.pending_banner")`.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        lookup(&self.catalog, key)
            .or_else(|| lookup(&self.fallback, key))
            .map_or_else(|| key.to_string(), str::to_string)
    }

    /// Resolve a dotted key and substitute `{name}` placeholders.
    #[must_use]
    pub fn t_with(&self, key: &str, substitutions: &[(&str, &str)]) -> String {
        let mut resolved = self.t(key);
        for (name, value) in substitutions {
            resolved = resolved.replace(&format!("{{{name}}}"), value);
        }
        resolved
    }
}

fn lookup<'a>(document: &'a Value, key: &str) -> Option<&'a str> {
    let mut cursor = document;
    for segment in key.split('.') {
        cursor = cursor.get(segment)?;
    }
    cursor.as_str()
}

fn read_locale_file(dir: &Path, locale: &str) -> Result<Option<Value>> {
    let path = dir.join(format!("{locale}.json"));
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EN: &str = r#"{"sync": {"pending_banner": "{count} notes waiting to sync"}, "notes": {"empty": "No notes yet"}}"#;
    const ES: &str = r#"{"notes": {"empty": "Sin notas"}}"#;

    #[test]
    fn dotted_key_resolves_nested_value() {
        let translator = Translator::from_sources("en", EN, EN).unwrap();
        assert_eq!(translator.t("notes.empty"), "No notes yet");
    }

    #[test]
    fn missing_key_echoes_the_key() {
        let translator = Translator::from_sources("en", EN, EN).unwrap();
        assert_eq!(translator.t("notes.does_not_exist"), "notes.does_not_exist");
        assert_eq!(translator.t("sync"), "sync");
    }

    #[test]
    fn partial_catalog_falls_back_to_default_locale() {
        let translator = Translator::from_sources("es", ES, EN).unwrap();
        assert_eq!(translator.t("notes.empty"), "Sin notas");
        assert_eq!(
            translator.t("sync.pending_banner"),
            "{count} notes waiting to sync"
        );
    }

    #[test]
    fn substitutions_fill_placeholders() {
        let translator = Translator::from_sources("en", EN, EN).unwrap();
        assert_eq!(
            translator.t_with("sync.pending_banner", &[("count", "3")]),
            "3 notes waiting to sync"
        );
    }

    #[test]
    fn missing_locale_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), EN).unwrap();

        let translator = Translator::load_dir(dir.path(), "fr").unwrap();
        assert_eq!(translator.locale(), "en");
        assert_eq!(translator.t("notes.empty"), "No notes yet");
    }

    #[test]
    fn present_locale_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), EN).unwrap();
        std::fs::write(dir.path().join("es.json"), ES).unwrap();

        let translator = Translator::load_dir(dir.path(), "es").unwrap();
        assert_eq!(translator.locale(), "es");
        assert_eq!(translator.t("notes.empty"), "Sin notas");
    }
}
