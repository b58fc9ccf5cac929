//! 封装器.

pub mod wav;
