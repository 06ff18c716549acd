// crates/sl_land/src/model/land.rs

//! 耦合陆面模型
//!
//! [`LandModelBuilder`] 组合各子模型参数包、外部驱动和网格，并检查每个
//! 参数包都定义在网格对应的分区上。

use std::sync::Arc;

use super::thermo::PhysicalConstants;
use crate::domain::{Domain, Space, SpatialField};
use crate::error::ConfigError;
use crate::forcing::ForcingInputs;
use crate::params::{CanopyParameters, RunoffParameters, SnowParameters, SoilCO2Parameters, SoilParameters};

/// 耦合陆面模型（土壤 + 土壤 CO2 + 冠层 + 积雪）
#[derive(Debug)]
pub struct LandModel {
    domain: Arc<Domain>,
    /// 土壤
    pub soil: SoilParameters,
    /// 冠层
    pub canopy: CanopyParameters,
    /// 积雪
    pub snow: SnowParameters,
    /// 土壤 CO2
    pub soilco2: SoilCO2Parameters,
    /// 土壤有机碳 [kg C/m³]（地下）
    pub soil_organic_carbon: SpatialField,
    /// 产流
    pub runoff: RunoffParameters,
    /// 外部驱动
    pub forcing: ForcingInputs,
    /// 物理常数
    pub constants: PhysicalConstants,
}

impl LandModel {
    /// 模型名称
    pub const NAME: &'static str = "SoilCanopySnowModel";

    /// 网格
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// 地下空间
    pub fn subsurface_space(&self) -> Space {
        self.domain.subsurface_space()
    }

    /// 地表空间
    pub fn surface_space(&self) -> Space {
        self.domain.surface_space()
    }

    /// 冠层水力隔室数
    pub fn n_compartments(&self) -> usize {
        self.canopy.hydraulics.n_compartments()
    }
}

/// 模型构建器
///
/// # 示例
///
/// ```ignore
/// let model = LandModelBuilder::new(domain)
///     .with_soil(soil)
///     .with_canopy(canopy)
///     .with_snow(snow)
///     .with_soilco2(soilco2, soc)
///     .with_runoff(runoff)
///     .with_forcing(forcing)
///     .with_constants(constants)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct LandModelBuilder {
    domain: Arc<Domain>,
    soil: Option<SoilParameters>,
    canopy: Option<CanopyParameters>,
    snow: Option<SnowParameters>,
    soilco2: Option<(SoilCO2Parameters, SpatialField)>,
    runoff: Option<RunoffParameters>,
    forcing: Option<ForcingInputs>,
    constants: Option<PhysicalConstants>,
}

impl LandModelBuilder {
    /// 以网格创建构建器
    pub fn new(domain: Arc<Domain>) -> Self {
        Self {
            domain,
            soil: None,
            canopy: None,
            snow: None,
            soilco2: None,
            runoff: None,
            forcing: None,
            constants: None,
        }
    }

    /// 土壤参数
    pub fn with_soil(mut self, soil: SoilParameters) -> Self {
        self.soil = Some(soil);
        self
    }

    /// 冠层参数
    pub fn with_canopy(mut self, canopy: CanopyParameters) -> Self {
        self.canopy = Some(canopy);
        self
    }

    /// 积雪参数
    pub fn with_snow(mut self, snow: SnowParameters) -> Self {
        self.snow = Some(snow);
        self
    }

    /// 土壤 CO2 参数与土壤有机碳
    pub fn with_soilco2(mut self, params: SoilCO2Parameters, soil_organic_carbon: SpatialField) -> Self {
        self.soilco2 = Some((params, soil_organic_carbon));
        self
    }

    /// 产流参数
    pub fn with_runoff(mut self, runoff: RunoffParameters) -> Self {
        self.runoff = Some(runoff);
        self
    }

    /// 外部驱动
    pub fn with_forcing(mut self, forcing: ForcingInputs) -> Self {
        self.forcing = Some(forcing);
        self
    }

    /// 物理常数
    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = Some(constants);
        self
    }

    /// 构建模型
    pub fn build(self) -> Result<LandModel, ConfigError> {
        fn present<T>(value: Option<T>, name: &str) -> Result<T, ConfigError> {
            value.ok_or_else(|| ConfigError::Missing(name.to_string()))
        }
        fn check(name: &str, expected: Space, actual: Space) -> Result<(), ConfigError> {
            if expected != actual {
                return Err(ConfigError::PartitionMismatch {
                    field: name.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
            Ok(())
        }

        let soil = present(self.soil, "soil")?;
        let canopy = present(self.canopy, "canopy")?;
        let snow = present(self.snow, "snow")?;
        let (soilco2, soil_organic_carbon) = present(self.soilco2, "soilco2")?;
        let runoff = present(self.runoff, "runoff")?;
        let forcing = present(self.forcing, "forcing")?;
        let constants = present(self.constants, "constants")?;

        let subsurface = self.domain.subsurface_space();
        let surface = self.domain.surface_space();
        check("soil", subsurface, soil.subsurface_space())?;
        check("soil.albedo", surface, soil.surface_space())?;
        check("canopy", surface, canopy.surface_space())?;
        check("snow", surface, snow.surface_space())?;
        check("soilco2", subsurface, soilco2.subsurface_space())?;
        check("soil_organic_carbon", subsurface, *soil_organic_carbon.space())?;
        check("runoff", surface, runoff.surface_space())?;
        check("forcing", surface, forcing.space())?;

        tracing::debug!(
            "组装 {}: {} 列, {} 层, {} 个冠层隔室",
            LandModel::NAME,
            self.domain.n_columns(),
            self.domain.n_layers(),
            canopy.hydraulics.n_compartments()
        );

        Ok(LandModel {
            domain: self.domain,
            soil,
            canopy,
            snow,
            soilco2,
            soil_organic_carbon,
            runoff,
            forcing,
            constants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataSource, SyntheticDataSource};
    use crate::params::{
        canopy_maps, soil_albedo_parameters, soil_organic_carbon, soil_parameters, topmodel_runoff,
        CanopyParametersBuilder, SnowParametersBuilder,
    };
    use sl_config::{ParameterRegistry, SimulationConfig};

    /// 同一网格上的全部参数包
    struct Bundles {
        soil: SoilParameters,
        canopy: CanopyParameters,
        snow: SnowParameters,
        soilco2: SoilCO2Parameters,
        soc: SpatialField,
        runoff: RunoffParameters,
        forcing: ForcingInputs,
    }

    fn domain() -> Arc<Domain> {
        Domain::spherical_shell(&SimulationConfig::tiny().domain).unwrap()
    }

    fn source() -> Arc<dyn DataSource> {
        Arc::new(SyntheticDataSource::new())
    }

    /// 土壤属性取自 `domain`，反照率取自 `albedo_domain`
    fn soil(domain: &Domain, albedo_domain: &Domain) -> SoilParameters {
        let source = SyntheticDataSource::new();
        let surface = albedo_domain.surface_space();
        let albedo = soil_albedo_parameters(surface, albedo_domain.coords(), &source).unwrap();
        soil_parameters(domain.subsurface_space(), domain.coords(), &source)
            .unwrap()
            .with_albedo(albedo)
            .build(domain.subsurface_space(), surface, &ParameterRegistry::defaults())
            .unwrap()
    }

    fn bundles(domain: &Arc<Domain>) -> Bundles {
        let registry = ParameterRegistry::defaults();
        let source = source();
        let sim = SimulationConfig::tiny();
        let (subsurface, surface, coords) = (domain.subsurface_space(), domain.surface_space(), domain.coords());
        Bundles {
            soil: soil(domain, domain),
            canopy: CanopyParametersBuilder::new(canopy_maps(surface, coords, source.as_ref()).unwrap())
                .build(surface, &registry)
                .unwrap(),
            snow: SnowParametersBuilder::new().build(surface, sim.dt, &registry).unwrap(),
            soilco2: SoilCO2Parameters::new(subsurface, &registry).unwrap(),
            soc: soil_organic_carbon(subsurface, coords, source.as_ref()).unwrap(),
            runoff: topmodel_runoff(surface, coords, source.as_ref()).unwrap(),
            forcing: ForcingInputs::load(&source, domain, &sim, &registry).unwrap(),
        }
    }

    fn assemble(domain: &Arc<Domain>, b: Bundles) -> Result<LandModel, ConfigError> {
        LandModelBuilder::new(Arc::clone(domain))
            .with_soil(b.soil)
            .with_canopy(b.canopy)
            .with_snow(b.snow)
            .with_soilco2(b.soilco2, b.soc)
            .with_runoff(b.runoff)
            .with_forcing(b.forcing)
            .with_constants(PhysicalConstants::from_registry(&ParameterRegistry::defaults()).unwrap())
            .build()
    }

    fn mismatched_field(result: Result<LandModel, ConfigError>) -> String {
        match result {
            Err(ConfigError::PartitionMismatch { field, .. }) => field,
            Err(other) => panic!("意外错误: {}", other),
            Ok(_) => panic!("不同网格上的参数包应被拒绝"),
        }
    }

    #[test]
    fn test_matching_bundles_assemble() {
        let domain = domain();
        let model = assemble(&domain, bundles(&domain)).unwrap();
        assert_eq!(model.subsurface_space(), domain.subsurface_space());
        assert_eq!(model.surface_space(), domain.surface_space());
        assert_eq!(model.n_compartments(), 1);
    }

    #[test]
    fn test_bundle_on_other_domain_rejected() {
        let cases: [(&str, fn(&mut Bundles, Bundles)); 7] = [
            ("soil", |b, o| b.soil = o.soil),
            ("canopy", |b, o| b.canopy = o.canopy),
            ("snow", |b, o| b.snow = o.snow),
            ("soilco2", |b, o| b.soilco2 = o.soilco2),
            ("soil_organic_carbon", |b, o| b.soc = o.soc),
            ("runoff", |b, o| b.runoff = o.runoff),
            ("forcing", |b, o| b.forcing = o.forcing),
        ];
        let other = domain();
        let domain = domain();
        for (field, swap) in cases {
            let mut b = bundles(&domain);
            swap(&mut b, bundles(&other));
            assert_eq!(mismatched_field(assemble(&domain, b)), field);
        }
    }

    #[test]
    fn test_soil_albedo_on_other_domain_rejected() {
        let other = domain();
        let domain = domain();
        let mut b = bundles(&domain);
        b.soil = soil(&domain, &other);
        assert_eq!(mismatched_field(assemble(&domain, b)), "soil.albedo");
    }

    #[test]
    fn test_missing_soil() {
        let domain = domain();
        let b = bundles(&domain);
        let err = LandModelBuilder::new(Arc::clone(&domain))
            .with_canopy(b.canopy)
            .with_snow(b.snow)
            .with_soilco2(b.soilco2, b.soc)
            .with_runoff(b.runoff)
            .with_forcing(b.forcing)
            .with_constants(PhysicalConstants::from_registry(&ParameterRegistry::defaults()).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref name) if name == "soil"));
    }
}
