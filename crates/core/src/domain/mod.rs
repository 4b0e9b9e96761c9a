pub mod lead;
pub mod opportunity;
pub mod pricing;
pub mod quote;
