#[cfg(test)]
pub mod common;

#[cfg(test)]
mod reuse_and_renewal;
