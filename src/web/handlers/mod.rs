// Route handlers, one module per API area.

pub mod age;
pub mod hate_speech;
