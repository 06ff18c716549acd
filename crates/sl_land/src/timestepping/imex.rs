// crates/sl_land/src/timestepping/imex.rs

//! IMEX 时间积分
//!
//! ## ARS111（隐式/显式欧拉）
//!
//! ```text
//! Ŷ       = Y^n + Δt·T_exp(Y^n, t^n)
//! Y^{n+1} = Ŷ + Δt·T_imp(Y^{n+1}, t^{n+1})
//! ```
//!
//! 隐式方程用固定次数的 Newton 迭代求解：
//!
//! ```text
//! R = Y - Ŷ - Δt·T_imp(Y)
//! W = I - Δt·J
//! W·ΔY = -R,  Y ← Y + ΔY
//! ```
//!
//! 迭代次数固定，不做收敛判断提前退出。每个阶段结束后执行 DSS。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::callback::{CallbackSet, TIME_TOLERANCE};
use super::problem::{ImexFunction, Problem};
use crate::error::{LandError, LandResult};
use crate::model::{Cache, Jacobian, LandModel, StateVector};

/// Jacobian 更新时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateEvery {
    /// 每次 Newton 迭代都重新组装并分解
    #[default]
    NewNewtonIteration,
    /// 每个时间步只在第一次迭代时组装
    NewTimeStep,
}

/// 固定迭代次数的 Newton 方法
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonsMethod {
    /// 迭代次数
    pub max_iters: usize,
    /// Jacobian 更新时机
    pub update_j: UpdateEvery,
}

impl Default for NewtonsMethod {
    fn default() -> Self {
        Self {
            max_iters: 3,
            update_j: UpdateEvery::NewNewtonIteration,
        }
    }
}

/// IMEX Butcher 表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImexTableau {
    /// 一阶隐式/显式欧拉
    #[default]
    Ars111,
}

impl ImexTableau {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ars111 => "ARS111",
        }
    }

    /// 时间精度阶数
    pub fn order(&self) -> u8 {
        match self {
            Self::Ars111 => 1,
        }
    }

    /// 隐式级数
    pub fn stages(&self) -> u8 {
        match self {
            Self::Ars111 => 1,
        }
    }
}

/// IMEX 算法
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImexAlgorithm {
    /// Butcher 表
    pub tableau: ImexTableau,
    /// 隐式级求解器
    pub newton: NewtonsMethod,
}

impl ImexAlgorithm {
    /// ARS111 + 给定 Newton 设置
    pub fn ars111(newton: NewtonsMethod) -> Self {
        Self {
            tableau: ImexTableau::Ars111,
            newton,
        }
    }
}

/// 求解结果
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// 末时刻
    pub t: f64,
    /// 末状态
    pub u: StateVector,
    /// 步数
    pub n_steps: usize,
}

/// 积分器
pub struct Integrator {
    alg: ImexAlgorithm,
    f: ImexFunction,
    model: Arc<LandModel>,
    u: StateVector,
    p: Cache,
    t: f64,
    tf: f64,
    dt: f64,
    tstops: Vec<f64>,
    next_stop: usize,
    callbacks: CallbackSet,
    n_steps: usize,

    // 工作区
    base: StateVector,
    tendency: StateVector,
    residual: StateVector,
    delta: StateVector,
    jacobian: Jacobian,
}

impl Integrator {
    /// 初始化积分器并触发回调的初始化
    pub fn init(problem: Problem, alg: ImexAlgorithm, dt: f64, mut callbacks: CallbackSet) -> LandResult<Self> {
        let Problem {
            f,
            y0,
            tspan: (t0, tf),
            mut p,
            model,
        } = problem;

        if dt.is_nan() || dt <= 0.0 {
            return Err(LandError::solver(format!("时间步长必须为正: {}", dt)));
        }
        if tf < t0 {
            return Err(LandError::solver(format!("时间区间无效: [{}, {}]", t0, tf)));
        }
        if alg.newton.max_iters == 0 {
            return Err(LandError::solver("Newton 迭代次数必须 >= 1"));
        }
        p.ensure_initialized()?;

        callbacks.initialize(t0, &y0, &mut p)?;

        let mut tstops: Vec<f64> = callbacks
            .tstops()
            .into_iter()
            .filter(|&s| s > t0 + TIME_TOLERANCE && s < tf - TIME_TOLERANCE)
            .collect();
        tstops.push(tf);

        tracing::debug!(
            "积分器 {}: t ∈ [{}, {}], Δt = {}, {} 个停靠时刻",
            alg.tableau.name(),
            t0,
            tf,
            dt,
            tstops.len()
        );

        let jacobian = f.jac_prototype.clone();
        Ok(Self {
            alg,
            f,
            model,
            base: y0.zeros_like(),
            tendency: y0.zeros_like(),
            residual: y0.zeros_like(),
            delta: y0.zeros_like(),
            u: y0,
            p,
            t: t0,
            tf,
            dt,
            tstops,
            next_stop: 0,
            callbacks,
            n_steps: 0,
            jacobian,
        })
    }

    /// 当前时刻
    pub fn t(&self) -> f64 {
        self.t
    }

    /// 当前状态
    pub fn u(&self) -> &StateVector {
        &self.u
    }

    /// 当前缓存
    pub fn cache(&self) -> &Cache {
        &self.p
    }

    /// 模型
    pub fn model(&self) -> &Arc<LandModel> {
        &self.model
    }

    /// 已完成步数
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// 回调集合
    pub fn callbacks(&self) -> &CallbackSet {
        &self.callbacks
    }

    /// 是否已到达末时刻
    pub fn is_finished(&self) -> bool {
        self.t >= self.tf - TIME_TOLERANCE
    }

    /// 推进一步；步末恰好落在停靠时刻上时不再越过它
    pub fn step(&mut self) -> LandResult<()> {
        if self.is_finished() {
            return Err(LandError::solver(format!("积分已经到达末时刻 {}", self.tf)));
        }
        let _span = tracing::debug_span!("step").entered();

        let stop = self.tstops[self.next_stop];
        let landed = self.t + self.dt >= stop - TIME_TOLERANCE;
        let (h, t_new) = if landed {
            (stop - self.t, stop)
        } else {
            (self.dt, self.t + self.dt)
        };

        self.ars111_step(h, t_new)?;

        self.t = t_new;
        self.n_steps += 1;
        if landed {
            self.next_stop += 1;
        }
        self.callbacks.after_step(self.t, &self.u, &mut self.p)?;
        Ok(())
    }

    fn ars111_step(&mut self, h: f64, t_new: f64) -> LandResult<()> {
        let f = &self.f;

        // 显式级
        (f.t_exp)(&mut self.tendency, &self.u, &mut self.p, self.t)?;
        self.base.copy_from(&self.u);
        self.base.axpy(h, &self.tendency);
        (f.dss)(&mut self.base, &mut self.p, self.t);

        // 隐式级：以显式预测为初值
        let mut y = self.base.clone();
        {
            let _span = tracing::debug_span!("newton").entered();
            for iter in 0..self.alg.newton.max_iters {
                (f.t_imp)(&mut self.tendency, &y, &mut self.p, t_new)?;
                // -R = Ŷ + Δt·T_imp(Y) - Y
                self.residual.copy_from(&self.base);
                self.residual.axpy(h, &self.tendency);
                self.residual.axpy(-1.0, &y);

                let refactor = match self.alg.newton.update_j {
                    UpdateEvery::NewNewtonIteration => true,
                    UpdateEvery::NewTimeStep => iter == 0,
                };
                if refactor {
                    (f.wfact)(&mut self.jacobian, &y, &mut self.p, h, t_new)?;
                }
                self.jacobian.solve(&mut self.delta, &self.residual)?;
                y.axpy(1.0, &self.delta);
            }
        }
        (f.dss)(&mut y, &mut self.p, t_new);

        if !y.is_finite() {
            return Err(LandError::solver(format!("t = {} 处出现非有限值", t_new)));
        }
        self.u = y;
        Ok(())
    }

    /// 积分到末时刻
    pub fn solve(mut self) -> LandResult<Solution> {
        let _span = tracing::debug_span!("solve").entered();
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.into_solution())
    }

    /// 以当前状态结束
    pub fn into_solution(self) -> Solution {
        Solution {
            t: self.t,
            u: self.u,
            n_steps: self.n_steps,
        }
    }
}

impl std::fmt::Debug for Integrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrator")
            .field("alg", &self.alg)
            .field("t", &self.t)
            .field("tf", &self.tf)
            .field("dt", &self.dt)
            .field("n_steps", &self.n_steps)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// 初始化并积分到末时刻
pub fn solve(problem: Problem, alg: ImexAlgorithm, dt: f64, callbacks: CallbackSet) -> LandResult<Solution> {
    Integrator::init(problem, alg, dt, callbacks)?.solve()
}
