pub mod ema;

pub use ema::{batch_ema, step_ema, Ema};
