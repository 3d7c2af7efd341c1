//! Symbol list parsing.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("malformed symbol '{0}': expected BASE/QUOTE")]
    Malformed(String),
}

/// Parse a comma-separated `BASE/QUOTE` list, uppercased, order preserved.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        match symbol.split_once('/') {
            Some((base, quote))
                if !base.is_empty()
                    && !quote.is_empty()
                    && !quote.contains('/')
                    && !symbol.contains(char::is_whitespace) => {}
            _ => return Err(SymbolListError::Malformed(trimmed.to_string())),
        }
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Filesystem-safe stem for a symbol: `BTC/USDT` -> `BTC-USDT`.
pub fn file_stem(symbol: &str) -> String {
    symbol.replace('/', "-")
}
