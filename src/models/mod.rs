pub mod airdrop;
