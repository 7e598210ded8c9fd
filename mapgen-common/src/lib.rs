//! Common utilities for the mapgen toolkit

pub mod error;

pub use error::{suggest_correction, Error, Result};

#[cfg(test)]
mod tests {
    use crate::error::suggest_correction;

    #[test]
    fn suggest_correction_returns_expected_country() {
        let known = ["Belgium", "Germany", "Netherlands"];
        assert_eq!(suggest_correction("Belgum", known), Some("Belgium".to_string()));
    }
}
