pub(crate) mod augment;
pub mod normal;
pub mod probit_mixed;
