//! Terminal rendering of search snapshots.

use aisle_core::{Attribute, Epoch, Facets, FilterSet, Product, SearchState, SearchStatus};

/// Formats one product as a list row.
pub fn product_line(index: usize, product: &Product) -> String {
    let brand = product
        .brand
        .as_deref()
        .map(|b| format!(" ({})", b))
        .unwrap_or_default();
    let stock = if product.stock <= 0 { "  [out of stock]" } else { "" };
    format!(
        "{:>4}. {}{}  {}{}",
        index + 1,
        truncate_text(&product.name, 60),
        brand,
        product.display_price(),
        stock
    )
}

/// One-line summary of the screen state.
pub fn status_line(state: &SearchState) -> String {
    let mut line = format!(
        "[{}] \"{}\" sort={} | {} items",
        state.status,
        state.query.trim(),
        state.sort,
        state.items.len()
    );
    let filters = state.filters.to_params();
    if !filters.is_empty() {
        let joined: Vec<String> = filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        line.push_str(&format!(" | {}", joined.join(" ")));
    }
    if state.status == SearchStatus::Idle && !state.items.is_empty() {
        line.push_str(if state.has_more {
            " | :more for next page"
        } else {
            " | end of results"
        });
    }
    if let Some(error) = &state.error {
        line.push_str(&format!(" | {}", error.message));
        if error.retryable {
            line.push_str(" (:retry)");
        }
    }
    line
}

/// Turns a stream of snapshots into the lines that changed.
///
/// Items are printed once each; a new epoch starts a fresh list.
#[derive(Debug, Default)]
pub struct SnapshotPrinter {
    epoch: Option<Epoch>,
    printed: usize,
    last_status: Option<String>,
}

impl SnapshotPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&mut self, state: &SearchState) -> Vec<String> {
        let mut lines = Vec::new();

        if self.epoch != Some(state.epoch) {
            self.epoch = Some(state.epoch);
            self.printed = 0;
        }
        self.printed = self.printed.min(state.items.len());

        for (i, product) in state.items.iter().enumerate().skip(self.printed) {
            lines.push(product_line(i, product));
        }
        self.printed = state.items.len();

        let status = status_line(state);
        if self.last_status.as_deref() != Some(status.as_str()) {
            lines.push(status.clone());
            self.last_status = Some(status);
        }
        lines
    }
}

/// Lists the accepted values of every filter key, one key per line.
pub fn facet_lines(facets: &Facets) -> Vec<String> {
    let labelled = |attrs: &[Attribute]| -> Vec<String> {
        attrs
            .iter()
            .map(|a| match &a.label {
                Some(label) => format!("{} ({})", a.key, label),
                None => a.key.clone(),
            })
            .collect()
    };

    FilterSet::KEYS
        .iter()
        .map(|&key| {
            let values = match key {
                "category" => facets
                    .categories
                    .iter()
                    .map(|c| match &c.name {
                        Some(name) => format!("{} ({})", c.id, name),
                        None => c.id.clone(),
                    })
                    .collect(),
                "skin_type" => labelled(&facets.skin_types),
                "concern" => labelled(&facets.concerns),
                _ => facets
                    .choices(key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            };
            if values.is_empty() {
                format!("  {:<10} (any)", key)
            } else {
                format!("  {:<10} {}", key, values.join(", "))
            }
        })
        .collect()
}

/// Collapses whitespace and cuts `text` to `max_len` characters.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
