mod immutability;

pub use immutability::ImmutabilityRule;
