// crates/sl_land/src/setup.rs

//! 完整模拟装配
//!
//! 按固定顺序装配一次模拟：
//!
//! 1. 球壳网格
//! 2. 土壤（属性图 + 反照率图）、冠层、积雪、产流、土壤 CO2 参数包
//! 3. 再分析大气/辐射驱动与卫星 LAI
//! 4. 耦合模型、初始状态与初始缓存
//! 5. IMEX 问题、ARS111 算法与驱动更新回调
//!
//! 每次调用都新建全部对象，调用之间不共享可变状态。

use sl_config::{ParameterRegistry, SimulationConfig};
use std::sync::Arc;

use crate::data::DataSource;
use crate::domain::Domain;
use crate::error::LandResult;
use crate::forcing::ForcingInputs;
use crate::model::{initialize, LandModel, LandModelBuilder, PhysicalConstants};
use crate::params::{
    canopy_maps, soil_albedo_parameters, soil_organic_carbon, soil_parameters, topmodel_runoff,
    CanopyParametersBuilder, SnowParametersBuilder, SoilCO2Parameters,
};
use crate::timestepping::{CallbackSet, DriverUpdateCallback, ImexAlgorithm, NewtonsMethod, Problem, UpdateEvery};

/// 积雪反照率
pub const SNOW_ALBEDO: f64 = 0.67;
/// 冠层热容 [J/m²/K]
pub const CANOPY_HEAT_CAPACITY: f64 = 2.5e3;

/// 一次模拟所需的全部对象
#[derive(Debug)]
pub struct SimulationSetup {
    /// 问题
    pub problem: Problem,
    /// 算法
    pub algorithm: ImexAlgorithm,
    /// 时间步长 [s]
    pub dt: f64,
    /// 回调
    pub callbacks: CallbackSet,
}

impl SimulationSetup {
    /// 拆分为 `(问题, 算法, 步长, 回调)`
    pub fn into_parts(self) -> (Problem, ImexAlgorithm, f64, CallbackSet) {
        (self.problem, self.algorithm, self.dt, self.callbacks)
    }
}

/// 装配耦合模型
pub fn setup_model(
    sim: &SimulationConfig,
    source: &Arc<dyn DataSource>,
    registry: &ParameterRegistry,
) -> LandResult<Arc<LandModel>> {
    let _span = tracing::debug_span!("setup_model").entered();
    sim.validate()?;

    let domain = Domain::spherical_shell(&sim.domain)?;
    let subsurface = domain.subsurface_space();
    let surface = domain.surface_space();
    let coords = domain.coords();

    let albedo = soil_albedo_parameters(surface, coords, source.as_ref())?;
    let soil = soil_parameters(subsurface, coords, source.as_ref())?
        .with_albedo(albedo)
        .build(subsurface, surface, registry)?;

    let canopy = CanopyParametersBuilder::new(canopy_maps(surface, coords, source.as_ref())?)
        .with_ac_canopy(CANOPY_HEAT_CAPACITY)
        .build(surface, registry)?;

    let snow = SnowParametersBuilder::new()
        .with_albedo(SNOW_ALBEDO)
        .build(surface, sim.dt, registry)?;

    let runoff = topmodel_runoff(surface, coords, source.as_ref())?;
    let soilco2 = SoilCO2Parameters::new(subsurface, registry)?;
    let soc = soil_organic_carbon(subsurface, coords, source.as_ref())?;

    let forcing = ForcingInputs::load(source, &domain, sim, registry)?;

    let model = LandModelBuilder::new(Arc::clone(&domain))
        .with_soil(soil)
        .with_canopy(canopy)
        .with_snow(snow)
        .with_soilco2(soilco2, soc)
        .with_runoff(runoff)
        .with_forcing(forcing)
        .with_constants(PhysicalConstants::from_registry(registry)?)
        .build()?;
    Ok(Arc::new(model))
}

/// 装配 IMEX 问题
pub fn setup_prob(
    sim: &SimulationConfig,
    source: &Arc<dyn DataSource>,
    registry: &ParameterRegistry,
) -> LandResult<Problem> {
    let model = setup_model(sim, source, registry)?;
    let (y0, p, _coords) = initialize(&model, sim.t0)?;
    Ok(Problem::new(model, y0, p, (sim.t0, sim.tf)))
}

/// 装配问题、算法、步长与回调
pub fn setup_simulation(
    sim: &SimulationConfig,
    source: &Arc<dyn DataSource>,
    registry: &ParameterRegistry,
) -> LandResult<SimulationSetup> {
    let problem = setup_prob(sim, source, registry)?;

    let algorithm = ImexAlgorithm::ars111(NewtonsMethod {
        max_iters: sim.newton_iterations,
        update_j: UpdateEvery::NewNewtonIteration,
    });

    let driver_update = DriverUpdateCallback::new(
        Arc::clone(&problem.model),
        sim.t0,
        sim.tf,
        sim.driver_update_interval,
    );
    let callbacks = CallbackSet::new().with(driver_update);

    Ok(SimulationSetup {
        problem,
        algorithm,
        dt: sim.dt,
        callbacks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DatasetKey, SyntheticDataSource};
    use crate::error::{DataAccessError, LandError};

    fn source() -> Arc<dyn DataSource> {
        Arc::new(SyntheticDataSource::new())
    }

    #[test]
    fn test_setup_simulation_wires_everything() {
        let sim = SimulationConfig::tiny();
        let setup = setup_simulation(&sim, &source(), &ParameterRegistry::defaults()).unwrap();
        assert_eq!(setup.dt, sim.dt);
        assert_eq!(setup.algorithm.newton.max_iters, 3);
        assert_eq!(setup.callbacks.len(), 1);
        assert!(setup.problem.p.is_initialized());
        assert_eq!(setup.problem.tspan, (sim.t0, sim.tf));
        assert_eq!(setup.problem.model.canopy.energy.ac_canopy, CANOPY_HEAT_CAPACITY);
        assert_eq!(setup.problem.model.snow.albedo, SNOW_ALBEDO);
    }

    #[test]
    fn test_missing_forcing_propagates() {
        let sim = SimulationConfig::tiny();
        let key = DatasetKey::Era5Forcing {
            year: sim.forcing_year,
            tier: sim.forcing_tier.clone(),
        };
        let source: Arc<dyn DataSource> = Arc::new(SyntheticDataSource::new().without(key));
        let err = setup_prob(&sim, &source, &ParameterRegistry::defaults()).unwrap_err();
        assert!(matches!(err, LandError::DataAccess(DataAccessError::NotFound { .. })));
    }

    #[test]
    fn test_missing_registry_entry_is_configuration_error() {
        let mut registry = ParameterRegistry::defaults();
        registry.remove("emissivity_bare_soil");
        let err = setup_prob(&SimulationConfig::tiny(), &source(), &registry).unwrap_err();
        assert!(matches!(err, LandError::Configuration(_)));
    }
}
