//! Line commands for `aisle interactive`.

use aisle_core::{AppError, Facets, FilterSet, SortKey};

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Plain text: the new query text.
    Query(String),
    More,
    Refresh,
    Retry,
    Sort(SortKey),
    /// `key=value` pairs to merge into the current filters; empty clears all.
    Filter(Vec<(String, String)>),
    /// Fetch and list the values each filter accepts.
    Facets,
    Clear,
    Help,
    Quit,
    /// Blank line.
    Nothing,
}

/// Parses one input line.
///
/// # Errors
///
/// Returns `AppError::ConfigError` for unknown commands and malformed
/// arguments.
pub fn parse_line(line: &str) -> Result<LineCommand, AppError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.trim_start().strip_prefix(':') else {
        if line.trim().is_empty() {
            return Ok(LineCommand::Nothing);
        }
        return Ok(LineCommand::Query(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match name {
        "more" | "m" => Ok(LineCommand::More),
        "refresh" | "r" => Ok(LineCommand::Refresh),
        "retry" => Ok(LineCommand::Retry),
        "facets" => Ok(LineCommand::Facets),
        "clear" | "c" => Ok(LineCommand::Clear),
        "help" | "h" | "?" => Ok(LineCommand::Help),
        "quit" | "q" | "exit" => Ok(LineCommand::Quit),
        "sort" => match rest.as_slice() {
            [key] => key.parse().map(LineCommand::Sort),
            _ => Err(AppError::ConfigError("Usage: :sort KEY".to_string())),
        },
        "filter" | "f" => rest
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| {
                        AppError::ConfigError(format!("Expected key=value, got '{}'", pair))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(LineCommand::Filter),
        _ => Err(AppError::ConfigError(format!(
            "Unknown command ':{}'. Type :help for the list",
            name
        ))),
    }
}

/// Merges `pairs` into `current`. No pairs clears every filter.
///
/// Once `facets` are known, values outside them are rejected before
/// anything is sent.
pub fn merge_filters(
    current: FilterSet,
    pairs: &[(String, String)],
    facets: Option<&Facets>,
) -> Result<FilterSet, AppError> {
    if pairs.is_empty() {
        return Ok(FilterSet::new());
    }
    let mut filters = current;
    for (key, value) in pairs {
        if let Some(facets) = facets {
            facets.check(key, value)?;
        }
        filters.set(key, value)?;
    }
    Ok(filters)
}

/// Successive prefixes of `text`, the way a search field reports typing.
pub fn keystrokes(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .map(move |(i, c)| &text[..i + c.len_utf8()])
}

pub const HELP: &str = "\
  <text>                 replace the query text (debounced)
  :more                  load the next page
  :refresh               pull to refresh
  :retry                 retry after a failure
  :sort KEY              latest, price_asc, price_desc, name_asc, name_desc
  :filter key=value ...  category, item_type, skin_type, concern; no pairs clears
  :facets                list the values each filter accepts
  :clear                 clear the query
  :quit                  leave";

#[cfg(test)]
mod tests {
    use super::*;
    use aisle_core::Attribute;

    #[test]
    fn test_plain_text_is_a_query() {
        assert_eq!(
            parse_line("rice water toner\n").unwrap(),
            LineCommand::Query("rice water toner".to_string())
        );
        assert_eq!(parse_line("   ").unwrap(), LineCommand::Nothing);
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_line(":more").unwrap(), LineCommand::More);
        assert_eq!(parse_line(":refresh").unwrap(), LineCommand::Refresh);
        assert_eq!(parse_line(":retry").unwrap(), LineCommand::Retry);
        assert_eq!(parse_line(":clear").unwrap(), LineCommand::Clear);
        assert_eq!(parse_line(":facets").unwrap(), LineCommand::Facets);
        assert_eq!(parse_line(":q").unwrap(), LineCommand::Quit);
        assert_eq!(
            parse_line(":sort price_asc").unwrap(),
            LineCommand::Sort(SortKey::PriceAsc)
        );
        assert!(parse_line(":sort").is_err());
        assert!(parse_line(":sort cheapest").is_err());
        assert!(parse_line(":frobnicate").is_err());
    }

    #[test]
    fn test_filter_pairs() {
        assert_eq!(
            parse_line(":filter category=skincare concern=").unwrap(),
            LineCommand::Filter(vec![
                ("category".to_string(), "skincare".to_string()),
                ("concern".to_string(), String::new()),
            ])
        );
        assert_eq!(parse_line(":filter").unwrap(), LineCommand::Filter(vec![]));
        assert!(parse_line(":filter category").is_err());
    }

    #[test]
    fn test_merge_filters() {
        let current = FilterSet::new().with_category("skincare");
        let merged = merge_filters(
            current.clone(),
            &[("skin_type".to_string(), "dry".to_string())],
            None,
        )
        .unwrap();
        assert_eq!(merged, current.clone().with_skin_type("dry"));

        let cleared =
            merge_filters(merged, &[("category".to_string(), String::new())], None).unwrap();
        assert_eq!(cleared, FilterSet::new().with_skin_type("dry"));

        assert!(merge_filters(current.clone(), &[], None).unwrap().is_empty());
        assert!(
            merge_filters(current, &[("brand".to_string(), "x".to_string())], None).is_err()
        );
    }

    #[test]
    fn test_merge_filters_checks_known_facets() {
        let facets = Facets {
            skin_types: vec![Attribute {
                key: "dry_skin".to_string(),
                label: Some("Dry Skin".to_string()),
            }],
            ..Facets::default()
        };
        let pair = |k: &str, v: &str| vec![(k.to_string(), v.to_string())];

        let merged =
            merge_filters(FilterSet::new(), &pair("skin_type", "dry_skin"), Some(&facets))
                .unwrap();
        assert_eq!(merged, FilterSet::new().with_skin_type("dry_skin"));

        let rejected = merge_filters(merged.clone(), &pair("skin_type", "dry"), Some(&facets));
        match rejected {
            Err(AppError::ConfigError(msg)) => assert!(msg.contains("Choices: dry_skin")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }

        // Empty vocabularies do not restrict.
        assert!(merge_filters(merged, &pair("concern", "acne"), Some(&facets)).is_ok());
    }

    #[test]
    fn test_keystrokes() {
        let typed: Vec<&str> = keystrokes("soap").collect();
        assert_eq!(typed, vec!["s", "so", "soa", "soap"]);

        let typed: Vec<&str> = keystrokes("crème").collect();
        assert_eq!(typed.last(), Some(&"crème"));
        assert_eq!(typed.len(), 5);
    }
}
