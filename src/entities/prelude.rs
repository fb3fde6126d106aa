#![allow(unused_imports)]

pub use super::airdrop::Entity as Airdrop;
