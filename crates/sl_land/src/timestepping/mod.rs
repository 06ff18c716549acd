// crates/sl_land/src/timestepping/mod.rs

//! 积分器接线
//!
//! - [`problem`]: 倾向、Jacobian 与 DSS 闭包
//! - [`callback`]: 周期性驱动更新回调
//! - [`imex`]: ARS111 IMEX 积分器与固定次数 Newton 迭代

pub mod callback;
pub mod imex;
pub mod problem;

pub use callback::{Callback, CallbackSet, DriverUpdateCallback, TIME_TOLERANCE};
pub use imex::{solve, ImexAlgorithm, ImexTableau, Integrator, NewtonsMethod, Solution, UpdateEvery};
pub use problem::{
    dss, make_exp_tendency, make_imp_tendency, make_jacobian, make_set_initial_cache, DssFn, ImexFunction, Problem,
    SetInitialCacheFn, TendencyFn, WfactFn,
};
