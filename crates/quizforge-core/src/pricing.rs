//! Pricing constants.
//!
//! There is a single purchasable product: a pack of credits at a fixed
//! price. Generation costs are flat per kind.

/// Credits debited for one quiz generation.
pub const QUIZ_COST_CREDITS: i64 = 1;

/// Credits debited for one cram-pack generation.
pub const CRAM_COST_CREDITS: i64 = 3;

/// Credits granted per completed checkout session.
pub const CREDITS_PER_PURCHASE: i64 = 10;

/// Price of the credit pack in USD cents.
pub const CREDIT_PACK_PRICE_CENTS: i64 = 990;

/// Display name of the credit pack on the checkout page.
pub const CREDIT_PACK_PRODUCT_NAME: &str = "QuizForge Credits (10)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cram_costs_more_than_quiz() {
        assert!(CRAM_COST_CREDITS > QUIZ_COST_CREDITS);
    }

    #[test]
    fn one_purchase_covers_at_least_one_cram() {
        assert!(CREDITS_PER_PURCHASE >= CRAM_COST_CREDITS);
    }
}
