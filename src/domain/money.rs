//! Monetary types for price, volume and rate representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume (asset units) represented as a Decimal for precision.
pub type Volume = Decimal;

/// Fractional rate such as a fee or a relative spread (0.001 = 0.1%).
pub type Rate = Decimal;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_times_volume_is_notional() {
        let price: Price = dec!(61000);
        let volume: Volume = dec!(0.5);
        let fee: Rate = dec!(0.001);

        assert_eq!(price * volume, dec!(30500));
        assert_eq!(price * volume * fee, dec!(30.5));
    }
}
