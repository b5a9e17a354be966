pub mod convert;
pub mod index;
pub mod search;
pub mod suggest;
