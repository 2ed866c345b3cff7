pub mod payments;
pub mod rates;
pub mod recommend;
pub mod simulate;
