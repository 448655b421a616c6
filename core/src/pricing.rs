//! Promotion pricing.
//!
//! A quote is the cheapest way to pay for exactly `quantity` tickets using
//! any mix of the raffle's bundles and single tickets. Bundles can be used
//! any number of times, so this is an unbounded min-cost cover solved with a
//! table over `0..=quantity`.

use crate::types::{Money, Promotion, PromotionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bundle used in a quote, with how many times it was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBundle {
    /// Promotion applied
    pub promotion_id: PromotionId,
    /// Tickets per bundle
    pub quantity: u32,
    /// Price per bundle
    pub price: Money,
    /// Times the bundle was applied
    pub times: u32,
}

/// Price breakdown for a number of tickets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Tickets quoted
    pub quantity: u32,
    /// Single ticket price
    pub unit_price: Money,
    /// `quantity * unit_price`
    pub subtotal: Money,
    /// Cheapest total
    pub total: Money,
    /// `subtotal - total`
    pub savings: Money,
    /// Bundles making up the total, largest first
    pub bundles: Vec<AppliedBundle>,
    /// Tickets charged at the unit price
    pub singles: u32,
}

#[derive(Clone, Copy)]
enum Step {
    Single,
    Bundle(usize),
}

/// Cheapest price for exactly `quantity` tickets.
///
/// Promotions with a zero quantity or larger than `quantity` are ignored.
#[must_use]
pub fn quote(quantity: u32, unit_price: Money, promotions: &[Promotion]) -> Quote {
    let n = quantity as usize;
    let usable: Vec<&Promotion> = promotions
        .iter()
        .filter(|p| p.quantity > 0 && p.quantity <= quantity)
        .collect();

    let mut cost: Vec<Money> = Vec::with_capacity(n + 1);
    let mut step: Vec<Step> = Vec::with_capacity(n + 1);
    cost.push(Money::ZERO);
    step.push(Step::Single);

    for i in 1..=n {
        let mut best = cost[i - 1].saturating_add(unit_price);
        let mut best_step = Step::Single;
        for (index, promotion) in usable.iter().enumerate() {
            let size = promotion.quantity as usize;
            if size <= i {
                let candidate = cost[i - size].saturating_add(promotion.price);
                if candidate < best {
                    best = candidate;
                    best_step = Step::Bundle(index);
                }
            }
        }
        cost.push(best);
        step.push(best_step);
    }

    let mut singles = 0u32;
    let mut used: BTreeMap<usize, u32> = BTreeMap::new();
    let mut i = n;
    while i > 0 {
        match step[i] {
            Step::Single => {
                singles += 1;
                i -= 1;
            }
            Step::Bundle(index) => {
                *used.entry(index).or_default() += 1;
                i -= usable[index].quantity as usize;
            }
        }
    }

    let mut bundles: Vec<AppliedBundle> = used
        .into_iter()
        .map(|(index, times)| AppliedBundle {
            promotion_id: usable[index].id,
            quantity: usable[index].quantity,
            price: usable[index].price,
            times,
        })
        .collect();
    bundles.sort_by(|a, b| b.quantity.cmp(&a.quantity));

    let subtotal = unit_price.saturating_multiply(quantity);
    let total = cost[n];

    Quote {
        quantity,
        unit_price,
        subtotal,
        total,
        savings: subtotal.saturating_sub(total),
        bundles,
        singles,
    }
}
