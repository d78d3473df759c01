//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler of some `Args`.
///
/// The same abstraction describes domain commands, storage operations, audit
/// sinks and background tasks, so that each of them is expressed as a set of
/// `Handler<Operation>` implementations and composed via trait bounds.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
