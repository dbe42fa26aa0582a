//! Lot sizing from account balance
//!
//! Lots are derived from margin: `balance · leverage · margin_usage` buys
//! that much notional, divided by the notional of one lot at the current
//! price. The result is split into legs no larger than the per-position cap.

use super::RiskError;
use crate::config::SizingConfig;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Planned lot split for one position
#[derive(Debug, Clone, PartialEq)]
pub struct LotPlan {
    /// Sum of all legs
    pub total: Decimal,
    /// Lots per leg
    pub legs: Vec<Decimal>,
}

/// Computes lot plans from balance and price
#[derive(Debug, Clone)]
pub struct LotSizer {
    pub leverage: Decimal,
    pub margin_usage: Decimal,
    pub contract_size: Decimal,
    pub lot_step: Decimal,
    pub max_lots_per_position: Decimal,
    pub max_lots_per_account: Decimal,
    pub max_legs: usize,
}

impl LotSizer {
    /// Create from SizingConfig
    pub fn from_config(config: &SizingConfig) -> Self {
        Self {
            leverage: config.leverage,
            margin_usage: config.margin_usage,
            contract_size: config.contract_size,
            lot_step: config.lot_step,
            max_lots_per_position: config.max_lots_per_position,
            max_lots_per_account: config.max_lots_per_account,
            max_legs: config.max_legs,
        }
    }

    /// Round down to a whole number of lot steps
    pub fn floor_step(&self, lots: Decimal) -> Decimal {
        if self.lot_step <= Decimal::ZERO {
            return lots;
        }
        (lots / self.lot_step).floor() * self.lot_step
    }

    /// Plan lots for a position at `price` (quote units, not fixed-point)
    pub fn plan(&self, balance: Decimal, price: Decimal) -> Result<LotPlan, RiskError> {
        if price <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice(price));
        }
        let affordable =
            balance * self.leverage * self.margin_usage / (self.contract_size * price);
        let lots = self.floor_step(affordable.min(self.max_lots_per_account));
        if lots < self.lot_step || lots <= Decimal::ZERO {
            return Err(RiskError::InsufficientBalance { balance, price });
        }

        let needed = (lots / self.max_lots_per_position).ceil();
        let count = needed
            .to_usize()
            .unwrap_or(usize::MAX)
            .clamp(1, self.max_legs.max(1));
        let per_leg = self
            .floor_step(lots / Decimal::from(count))
            .min(self.max_lots_per_position);
        if per_leg < self.lot_step || per_leg <= Decimal::ZERO {
            return Err(RiskError::InsufficientBalance { balance, price });
        }

        let legs = vec![per_leg; count];
        Ok(LotPlan {
            total: per_leg * Decimal::from(count),
            legs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> LotSizer {
        LotSizer {
            leverage: dec!(25),
            margin_usage: dec!(0.92),
            contract_size: dec!(1000),
            lot_step: dec!(0.1),
            max_lots_per_position: dec!(10),
            max_lots_per_account: dec!(100),
            max_legs: 100,
        }
    }

    #[test]
    fn test_split_into_legs() {
        // 100000 * 25 * 0.92 / (1000 * 110) = 20.909 -> 20.9 lots, 3 legs
        let plan = sizer().plan(dec!(100000), dec!(110)).unwrap();
        assert_eq!(plan.legs.len(), 3);
        assert_eq!(plan.legs[0], dec!(6.9));
        assert_eq!(plan.total, dec!(20.7));

        // 20000 * 23 / 110000 = 4.18 -> 4.1 lots, one leg
        let plan = sizer().plan(dec!(20000), dec!(110)).unwrap();
        assert_eq!(plan.legs, vec![dec!(4.1)]);
    }

    #[test]
    fn test_account_cap() {
        let plan = sizer().plan(dec!(10000000), dec!(110)).unwrap();
        assert_eq!(plan.total, dec!(100));
        assert_eq!(plan.legs.len(), 10);
        assert!(plan.legs.iter().all(|lots| *lots == dec!(10)));
    }

    #[test]
    fn test_leg_count_bounded() {
        let mut sizer = sizer();
        sizer.max_legs = 2;
        let plan = sizer.plan(dec!(10000000), dec!(110)).unwrap();
        assert_eq!(plan.legs, vec![dec!(10), dec!(10)]);
    }

    #[test]
    fn test_insufficient_balance() {
        assert!(matches!(
            sizer().plan(dec!(100), dec!(110)),
            Err(RiskError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_invalid_price() {
        assert_eq!(
            sizer().plan(dec!(100000), dec!(0)),
            Err(RiskError::InvalidPrice(dec!(0)))
        );
    }
}
