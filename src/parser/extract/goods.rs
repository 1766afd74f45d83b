use anyhow::Result;
use indexmap::IndexMap;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::SelectorConfig;
use crate::parser::dom::{all_texts, compile};
use crate::parser::{or_default, ExtractError};

/// Two parallel sequences on the page: dish names and their prices.
struct Layout {
    label: &'static str,
    names: Selector,
    prices: Selector,
}

impl Layout {
    fn collect(&self, doc: &Html) -> IndexMap<String, String> {
        let names = all_texts(doc, &self.names);
        let prices = all_texts(doc, &self.prices);
        debug!("{} layout: {} names, {} prices", self.label, names.len(), prices.len());
        names.into_iter().zip(prices).collect()
    }
}

/// Menu items, tried in the "showcase" (photo cards) layout and then the
/// plain "list" layout.
pub struct Goods {
    layouts: [Layout; 2],
}

impl Goods {
    pub fn new(sel: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            layouts: [
                Layout {
                    label: "showcase",
                    names: compile(&sel.showcase_names)?,
                    prices: compile(&sel.showcase_prices)?,
                },
                Layout {
                    label: "list",
                    names: compile(&sel.list_names)?,
                    prices: compile(&sel.list_prices)?,
                },
            ],
        })
    }

    pub fn extract(&self, doc: &Html) -> IndexMap<String, String> {
        or_default("goods", self.try_extract(doc))
    }

    fn try_extract(&self, doc: &Html) -> Result<IndexMap<String, String>, ExtractError> {
        self.layouts
            .iter()
            .map(|layout| layout.collect(doc))
            .find(|goods| !goods.is_empty())
            .ok_or(ExtractError::Missing("goods"))
    }
}
