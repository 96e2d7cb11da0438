pub mod extract;
pub mod openai;
pub mod remote;

#[cfg(test)]
pub(crate) mod stub;
