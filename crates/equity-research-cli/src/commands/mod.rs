pub mod pe;
pub mod scenarios;
pub mod valuation;
