use std::sync::Arc;

use crate::route::Route;

/// Primary subtag of a language tag: `en-us` -> `en`
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Choose one language variant of a path key.
///
/// For each preferred tag in order, an exact (case-insensitive) variant wins,
/// then a variant matching its primary subtag. Failing that, the
/// language-agnostic variant. A request without any preference takes the first
/// registered variant. Otherwise the key yields nothing.
pub fn pick<'v, I>(variants: I, preferred: &[String]) -> Option<&'v Arc<Route>>
where
    I: Iterator<Item = (Option<&'v str>, &'v Arc<Route>)> + Clone,
{
    for tag in preferred {
        let tag = tag.as_str();
        let exact = variants
            .clone()
            .find(|(lang, _)| lang.is_some_and(|l| l.eq_ignore_ascii_case(tag)));
        if let Some((_, route)) = exact {
            return Some(route);
        }
        let primary = primary_subtag(tag);
        if primary.len() < tag.len() {
            let by_primary = variants
                .clone()
                .find(|(lang, _)| lang.is_some_and(|l| l.eq_ignore_ascii_case(primary)));
            if let Some((_, route)) = by_primary {
                return Some(route);
            }
        }
    }
    if let Some((_, route)) = variants.clone().find(|(lang, _)| lang.is_none()) {
        return Some(route);
    }
    if preferred.is_empty() {
        return variants.clone().next().map(|(_, route)| route);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::route::{RouteMethod, RouteOptions};
    use serde_json::Value;

    fn variant(language: Option<&str>) -> Arc<Route> {
        let options = match language {
            Some(l) => RouteOptions::new().language(l),
            None => RouteOptions::new(),
        };
        let handler = handler_fn(|_| async { Ok(Value::Null) });
        Arc::new(Route::new(RouteMethod::Any, "/", handler, options).unwrap())
    }

    fn langs(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn choose<'v>(routes: &'v [Arc<Route>], preferred: &[&str]) -> Option<&'v Arc<Route>> {
        pick(routes.iter().map(|r| (r.language(), r)), &langs(preferred))
    }

    #[test]
    fn test_preference_order_beats_registration_order() {
        let routes = [variant(None), variant(Some("de")), variant(Some("en"))];
        let chosen = choose(&routes, &["fr", "en", "de"]).unwrap();
        assert_eq!(chosen.language(), Some("en"));
    }

    #[test]
    fn test_preferred_variant_over_agnostic() {
        let routes = [variant(Some("en")), variant(None)];
        assert_eq!(choose(&routes, &["fr", "en"]).unwrap().language(), Some("en"));
        assert_eq!(choose(&routes, &["fr"]).unwrap().language(), None);
    }

    #[test]
    fn test_primary_subtag_fallback() {
        let routes = [variant(Some("en")), variant(Some("pt-br"))];
        assert_eq!(choose(&routes, &["en-GB"]).unwrap().language(), Some("en"));
        assert_eq!(choose(&routes, &["PT-BR"]).unwrap().language(), Some("pt-br"));
    }

    #[test]
    fn test_no_preference_takes_first_registered() {
        let routes = [variant(Some("fr")), variant(Some("en"))];
        assert_eq!(choose(&routes, &[]).unwrap().language(), Some("fr"));
        // an unmet preference does not fall back to an arbitrary language
        assert!(choose(&routes, &["de"]).is_none());
    }

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("en-us"), "en");
        assert_eq!(primary_subtag("zh_hant"), "zh");
        assert_eq!(primary_subtag("fr"), "fr");
    }
}
