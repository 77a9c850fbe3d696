use std::future::Future;

use crate::error::Result;
use crate::input::event::KeyCode;
use crate::state::snapshot::Grid;

/// External move decision. The returned code goes straight to the dispatcher.
pub trait MoveOracle: Send {
    fn decide(&mut self, grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send;
}

/// Wraps a plain closure as an oracle.
pub struct FnOracle<F> {
    decide: F,
}

impl<F> FnOracle<F>
where
    F: FnMut(&Grid) -> KeyCode + Send,
{
    pub fn new(decide: F) -> Self {
        Self { decide }
    }
}

impl<F> MoveOracle for FnOracle<F>
where
    F: FnMut(&Grid) -> KeyCode + Send,
{
    fn decide(&mut self, grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send {
        let code = (self.decide)(grid);
        async move { Ok(code) }
    }
}
