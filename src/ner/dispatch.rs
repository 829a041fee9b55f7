//! Language to backend dispatch.

use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::models::Language;

/// The NER backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Remote,
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Local => "local",
        }
    }
}

/// Where a language's text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Remote { model: &'a str },
    Local { model: &'a str },
    Unsupported,
}

/// Validated language table. Each supported language maps to exactly one
/// backend kind and model name.
#[derive(Debug, Clone)]
pub struct BackendDispatch {
    routes: BTreeMap<Language, (BackendKind, String)>,
}

impl BackendDispatch {
    pub fn new(
        supported: &[Language],
        remote: &BTreeMap<Language, String>,
        local: &BTreeMap<Language, String>,
    ) -> Result<Self, ConfigError> {
        for language in remote.keys().chain(local.keys()) {
            if !supported.contains(language) {
                return Err(ConfigError::UnsupportedMapping(*language));
            }
        }

        let mut routes = BTreeMap::new();
        for language in supported {
            let route = match (remote.get(language), local.get(language)) {
                (Some(_), Some(_)) => return Err(ConfigError::AmbiguousLanguage(*language)),
                (Some(model), None) => (BackendKind::Remote, model.clone()),
                (None, Some(model)) => (BackendKind::Local, model.clone()),
                (None, None) => return Err(ConfigError::UnmappedLanguage(*language)),
            };
            routes.insert(*language, route);
        }

        Ok(Self { routes })
    }

    pub fn dispatch(&self, language: Language) -> Route<'_> {
        match self.routes.get(&language) {
            Some((BackendKind::Remote, model)) => Route::Remote { model },
            Some((BackendKind::Local, model)) => Route::Local { model },
            None => Route::Unsupported,
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = (Language, BackendKind, &str)> {
        self.routes
            .iter()
            .map(|(lang, (kind, model))| (*lang, *kind, model.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(Language, &str)]) -> BTreeMap<Language, String> {
        entries.iter().map(|(l, m)| (*l, m.to_string())).collect()
    }

    #[test]
    fn test_dispatch_routes() {
        let dispatch = BackendDispatch::new(
            &[Language::English, Language::French],
            &table(&[(Language::English, "english-conll-200831")]),
            &table(&[(Language::French, "fr_core_news_sm")]),
        )
        .unwrap();

        assert_eq!(
            dispatch.dispatch(Language::English),
            Route::Remote {
                model: "english-conll-200831"
            }
        );
        assert_eq!(
            dispatch.dispatch(Language::French),
            Route::Local {
                model: "fr_core_news_sm"
            }
        );
        assert_eq!(dispatch.dispatch(Language::Czech), Route::Unsupported);
    }

    #[test]
    fn test_unmapped_supported_language_rejected() {
        let err = BackendDispatch::new(
            &[Language::English, Language::Danish],
            &table(&[(Language::English, "m")]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnmappedLanguage(Language::Danish)));
    }

    #[test]
    fn test_language_in_both_tables_rejected() {
        let err = BackendDispatch::new(
            &[Language::English],
            &table(&[(Language::English, "a")]),
            &table(&[(Language::English, "b")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousLanguage(Language::English)));
    }

    #[test]
    fn test_mapping_outside_supported_set_rejected() {
        let err = BackendDispatch::new(
            &[Language::English],
            &table(&[(Language::English, "a")]),
            &table(&[(Language::Swedish, "sv")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedMapping(Language::Swedish)));
    }
}
