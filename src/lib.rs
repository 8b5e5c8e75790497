//! Download driver and tooling for Scubapro G2 dive computers.

pub mod cache;
pub mod commands;
pub mod g2;
pub mod settings;
pub mod traits;

#[cfg(test)]
mod test_helpers;
