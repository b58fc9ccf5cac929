//! 解封装器.

pub mod ebl;
