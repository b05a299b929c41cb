pub mod camera;
pub mod error;
pub mod frame;
pub mod layout;
pub mod orbit;

#[cfg(test)]
mod tests;
