//! Closed-form valuation of single European option contracts.

pub mod black_scholes;

pub use black_scholes::{
    norm_cdf, norm_pdf, price_call, price_put, MarketParams, OptionContract, PricingError,
    DAYS_PER_YEAR,
};
