//! Parse exchange ticker strings like `"BTCUSDT"`, `"BTC/USDT"`, `"ETH-BTC"`
//! into a base/quote pair.

const SEPARATORS: [char; 3] = ['/', '-', '_'];

/// Longest-suffix-wins quote currency list. Order matters only for
/// readability; `parse` always searches for the longest match.
const KNOWN_QUOTES: &[&str] = &[
    "USDT", "USDC", "BUSD", "USD", "EUR", "GBP", "BTC", "ETH", "BNB", "TUSD", "DAI",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolPair {
    pub base: String,
    pub quote: String,
    pub original: String,
}

impl SymbolPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            original: original.into(),
        }
    }

    pub fn to_string_normalized(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    pub fn is_valid(&self) -> bool {
        !self.base.is_empty() && !self.quote.is_empty()
    }

    /// Parse `symbol` into a base/quote pair. Returns `None` when neither a
    /// separator nor a known quote-currency suffix is found.
    pub fn parse(symbol: &str) -> Option<SymbolPair> {
        if symbol.is_empty() {
            return None;
        }

        for sep in SEPARATORS {
            if let Some(pos) = symbol.find(sep) {
                if pos > 0 && pos < symbol.len() - 1 {
                    return Some(SymbolPair::new(&symbol[..pos], &symbol[pos + 1..], symbol));
                }
            }
        }

        let upper = symbol.to_uppercase();
        let mut best: Option<&str> = None;
        for &quote in KNOWN_QUOTES {
            if upper.len() > quote.len() && upper.ends_with(quote) {
                if best.map(|b| quote.len() > b.len()).unwrap_or(true) {
                    best = Some(quote);
                }
            }
        }

        best.map(|quote| {
            let base = &upper[..upper.len() - quote.len()];
            SymbolPair::new(base, quote, symbol)
        })
    }

    pub fn shares_currency(a: &SymbolPair, b: &SymbolPair) -> bool {
        a.base == b.base || a.base == b.quote || a.quote == b.base || a.quote == b.quote
    }

    pub fn common_currency(a: &SymbolPair, b: &SymbolPair) -> Option<String> {
        if a.base == b.base || a.base == b.quote {
            Some(a.base.clone())
        } else if a.quote == b.base || a.quote == b.quote {
            Some(a.quote.clone())
        } else {
            None
        }
    }
}
