// crates/sl_land/tests/driver_callback.rs

//! 驱动更新回调测试
//!
//! 回调只在 {t0, t0+3h, t0+6h, …} ≤ tf 触发，与积分步长无关。

use std::sync::Arc;

use sl_config::{ParameterRegistry, SimulationConfig};
use sl_land::data::{DataSource, SyntheticDataSource};
use sl_land::timestepping::{CallbackSet, DriverUpdateCallback, Integrator};
use sl_land::{setup_model, setup_simulation};

const HOUR: f64 = 3600.0;

fn source() -> Arc<dyn DataSource> {
    Arc::new(SyntheticDataSource::new())
}

/// 以给定步长积分到末时刻，返回回调触发时刻
fn fire_times(dt: f64, tf: f64) -> Vec<f64> {
    let sim = SimulationConfig {
        dt,
        tf,
        ..SimulationConfig::tiny()
    };
    let (problem, alg, dt, callbacks) = setup_simulation(&sim, &source(), &ParameterRegistry::defaults())
        .unwrap()
        .into_parts();
    let mut integrator = Integrator::init(problem, alg, dt, callbacks).unwrap();
    while !integrator.is_finished() {
        integrator.step().unwrap();
    }
    assert_eq!(integrator.t(), tf);

    let history = integrator
        .callbacks()
        .find("DriverUpdateCallback")
        .unwrap()
        .history()
        .to_vec();
    // 缓存中的驱动来自最后一次触发
    assert_eq!(Some(&integrator.cache().drivers.time), history.last());
    history
}

#[test]
fn test_cadence_independent_of_step_size() {
    let expected = vec![0.0, 3.0 * HOUR, 6.0 * HOUR];
    for dt in [900.0, 1000.0, 7000.0, 20_000.0] {
        assert_eq!(fire_times(dt, 6.0 * HOUR), expected, "dt = {}", dt);
    }
}

#[test]
fn test_no_fire_past_final_time() {
    // tf 不在网格上：最后一次触发在 6h
    let times = fire_times(900.0, 7.0 * HOUR);
    assert_eq!(times, vec![0.0, 3.0 * HOUR, 6.0 * HOUR]);
}

#[test]
fn test_schedule_computed_from_index() {
    let sim = SimulationConfig::tiny();
    let model = setup_model(&sim, &source(), &ParameterRegistry::defaults()).unwrap();
    let week = 7.0 * 86_400.0;
    let callback = DriverUpdateCallback::new(model, 0.0, week, 3.0 * HOUR);
    let schedule = callback.schedule();
    assert_eq!(schedule.len(), 57);
    assert_eq!(schedule[0], 0.0);
    assert_eq!(schedule[56], week);
    for (k, &t) in schedule.iter().enumerate() {
        assert_eq!(t, k as f64 * 3.0 * HOUR);
    }
}

#[test]
fn test_fires_once_at_initialization() {
    let sim = SimulationConfig::tiny();
    let (problem, alg, dt, callbacks) = setup_simulation(&sim, &source(), &ParameterRegistry::defaults())
        .unwrap()
        .into_parts();
    let integrator = Integrator::init(problem, alg, dt, callbacks).unwrap();
    let history = integrator.callbacks().find("DriverUpdateCallback").unwrap().history();
    assert_eq!(history, &[sim.t0]);
}

#[test]
fn test_empty_callback_set_has_no_stops() {
    let set = CallbackSet::new();
    assert!(set.is_empty());
    assert!(set.tstops().is_empty());
    assert!(set.find("DriverUpdateCallback").is_none());
}
