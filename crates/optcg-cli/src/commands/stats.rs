//! Stats command handler

use anyhow::Result;

use optcg_core::{Filter, Store};

use crate::output::Output;

/// Show totals and breakdowns for the cards matching a filter
pub fn show(store: &Store, filter: &Filter, output: &Output) -> Result<()> {
    if !filter.is_empty() {
        output.message(&format!(
            "Statistics for {} matching card(s)\n",
            store.search(filter).len()
        ));
    }
    output.print_stats(&store.statistics(filter))
}
