//! Shell-executable backends for the delta change-management engine.
//!
//! Two runners for targets without a module loader: [`ExecRunner`]
//! hands the artifact path to an interpreter program, [`EvalRunner`]
//! pipes the artifact body through an interactive database shell inside
//! a transactional template. Rollback resolves the `.rollback.` twin of
//! the committed artifact.

mod error;
mod eval;
mod exec;

pub use error::{Result, ShellError};
pub use eval::{wrap, EvalConfig, EvalRunner};
pub use exec::{ExecConfig, ExecRunner};
