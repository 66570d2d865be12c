pub mod account;
pub mod attendance;
pub mod report;
pub mod roster;

#[cfg(test)]
mod scenarios;
