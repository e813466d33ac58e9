pub mod openai;
#[cfg(test)]
pub mod scripted;
