// crates/sl_land/src/timestepping/problem.rs

//! IMEX 问题
//!
//! 把耦合模型包装成积分器可直接调用的闭包：
//!
//! | 闭包 | 作用 |
//! |------|------|
//! | `t_exp` | 显式倾向（会刷新地表通量诊断量） |
//! | `t_imp` | 隐式倾向（会刷新土壤诊断量） |
//! | `wfact` | 在当前状态组装并分解 `W = I - Δtγ·J` |
//! | `dss`   | 逐场执行 DSS |
//!
//! 所有闭包在读取缓存前都会检查缓存已初始化。

use std::sync::Arc;

use crate::error::LandResult;
use crate::model::physics::{explicit_tendency, implicit_tendency, update_soil_diagnostics};
use crate::model::{set_initial_cache, Cache, Jacobian, LandModel, StateVector};

/// 倾向闭包：`(dY, Y, p, t)`
pub type TendencyFn = Box<dyn Fn(&mut StateVector, &StateVector, &mut Cache, f64) -> LandResult<()> + Send + Sync>;

/// Jacobian 闭包：`(W, Y, p, Δtγ, t)`
pub type WfactFn = Box<dyn Fn(&mut Jacobian, &StateVector, &mut Cache, f64, f64) -> LandResult<()> + Send + Sync>;

/// 网格同步闭包：`(Y, p, t)`
pub type DssFn = Box<dyn Fn(&mut StateVector, &mut Cache, f64) + Send + Sync>;

/// 初始缓存闭包：`(p, Y, t0)`
pub type SetInitialCacheFn = Box<dyn Fn(&mut Cache, &StateVector, f64) -> LandResult<()> + Send + Sync>;

/// 显式倾向
pub fn make_exp_tendency(model: Arc<LandModel>) -> TendencyFn {
    Box::new(move |dy, y, p, _t| {
        p.ensure_initialized()?;
        explicit_tendency(&model, dy, y, p);
        Ok(())
    })
}

/// 隐式倾向
pub fn make_imp_tendency(model: Arc<LandModel>) -> TendencyFn {
    Box::new(move |dy, y, p, _t| {
        p.ensure_initialized()?;
        update_soil_diagnostics(&model, y, p);
        implicit_tendency(&model, dy, y, p);
        Ok(())
    })
}

/// Jacobian 组装与分解
pub fn make_jacobian(model: Arc<LandModel>) -> WfactFn {
    Box::new(move |w, y, p, dtgamma, _t| {
        p.ensure_initialized()?;
        update_soil_diagnostics(&model, y, p);
        w.update(&model, y, p, dtgamma)
    })
}

/// 初始缓存
pub fn make_set_initial_cache(model: Arc<LandModel>) -> SetInitialCacheFn {
    Box::new(move |p, y, t0| set_initial_cache(&model, p, y, t0))
}

/// DSS：对状态向量的每个场取共享节点平均
pub fn dss(model: Arc<LandModel>) -> DssFn {
    Box::new(move |y, _p, _t| {
        let _span = tracing::debug_span!("dss").entered();
        let domain = model.domain();
        for field in y.fields_mut() {
            domain.dss(field);
        }
    })
}

/// IMEX 右端项
pub struct ImexFunction {
    /// 显式倾向
    pub t_exp: TendencyFn,
    /// 隐式倾向
    pub t_imp: TendencyFn,
    /// W 组装与分解
    pub wfact: WfactFn,
    /// 网格同步
    pub dss: DssFn,
    /// W 原型
    pub jac_prototype: Jacobian,
}

impl ImexFunction {
    /// 由模型构建全部闭包
    pub fn new(model: &Arc<LandModel>) -> Self {
        Self {
            t_exp: make_exp_tendency(Arc::clone(model)),
            t_imp: make_imp_tendency(Arc::clone(model)),
            wfact: make_jacobian(Arc::clone(model)),
            dss: dss(Arc::clone(model)),
            jac_prototype: Jacobian::prototype(model),
        }
    }
}

impl std::fmt::Debug for ImexFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImexFunction").finish_non_exhaustive()
    }
}

/// 待求解的问题
#[derive(Debug)]
pub struct Problem {
    /// 右端项
    pub f: ImexFunction,
    /// 初始状态
    pub y0: StateVector,
    /// 时间区间 [s]
    pub tspan: (f64, f64),
    /// 缓存
    pub p: Cache,
    /// 模型
    pub model: Arc<LandModel>,
}

impl Problem {
    /// 组合问题
    pub fn new(model: Arc<LandModel>, y0: StateVector, p: Cache, tspan: (f64, f64)) -> Self {
        Self {
            f: ImexFunction::new(&model),
            y0,
            tspan,
            p,
            model,
        }
    }
}
