mod bias;
mod dice;
#[cfg(feature = "parse")]
mod parse;
mod properties;
mod sampler;
mod store;
