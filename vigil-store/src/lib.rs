pub mod ring;

pub use ring::RingLogStore;
