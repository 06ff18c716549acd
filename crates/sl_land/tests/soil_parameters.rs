// crates/sl_land/tests/soil_parameters.rs

//! 参数构建器集成测试
//!
//! 验证：
//! - 空间变化参数位于传入的分区上
//! - 省略可选字段时取注册表默认值，提供时取覆盖值
//! - 临界饱和度由曲线形状参数导出且可复现

use std::sync::Arc;

use sl_config::{DomainConfig, ParameterRegistry, SimulationConfig};
use sl_land::data::{DataSource, SyntheticDataSource};
use sl_land::domain::{Domain, Partition};
use sl_land::params::{
    canopy_maps, soil_albedo_parameters, soil_parameters, topmodel_runoff, CanopyParametersBuilder, RetentionCurve,
    SnowParametersBuilder, SoilAlbedoParameters, SoilParametersBuilder, VanGenuchten,
};
use sl_land::{ConfigError, SpatialField};

fn fixture() -> (Arc<Domain>, SyntheticDataSource) {
    let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
    (domain, SyntheticDataSource::new())
}

// ============================================================
// 分区一致性
// ============================================================

#[test]
fn test_loaded_fields_live_on_requested_partition() {
    let (domain, source) = fixture();
    let registry = ParameterRegistry::defaults();
    let (sub, sfc) = (domain.subsurface_space(), domain.surface_space());

    let albedo = soil_albedo_parameters(sfc, domain.coords(), &source).unwrap();
    let soil = soil_parameters(sub, domain.coords(), &source)
        .unwrap()
        .with_albedo(albedo)
        .build(sub, sfc, &registry)
        .unwrap();

    for field in [
        &soil.porosity,
        &soil.residual_water,
        &soil.saturated_conductivity,
        &soil.specific_storage,
        soil.dry_heat_capacity(),
        soil.critical_saturation(),
    ] {
        assert_eq!(*field.space(), sub);
        assert_eq!(field.space().partition(), Partition::Subsurface);
    }
    assert_eq!(*soil.retention.space(), sub);
    assert_eq!(*soil.albedo.par_albedo_dry.space(), sfc);
    assert_eq!(*soil.albedo.nir_albedo_wet.space(), sfc);

    let canopy = CanopyParametersBuilder::new(canopy_maps(sfc, domain.coords(), &source).unwrap())
        .build(sfc, &registry)
        .unwrap();
    assert_eq!(canopy.surface_space(), sfc);
    assert_eq!(*canopy.conductance.g1.space(), sfc);
    assert_eq!(*canopy.hydraulics.rooting_depth.space(), sfc);

    let runoff = topmodel_runoff(sfc, domain.coords(), &source).unwrap();
    assert_eq!(*runoff.f_max.space(), sfc);
}

#[test]
fn test_field_from_other_partition_is_rejected() {
    let (domain, _) = fixture();
    let (sub, sfc) = (domain.subsurface_space(), domain.surface_space());
    let curve = RetentionCurve::from(VanGenuchten::new(2.0, 2.0).unwrap());

    let err = SoilParametersBuilder::new()
        .with_porosity(SpatialField::filled(sfc, 0.45))
        .with_residual_water(0.05)
        .with_saturated_conductivity(1e-5)
        .with_specific_storage(1e-3)
        .with_retention(curve)
        .with_albedo(SoilAlbedoParameters::uniform(sfc, 0.2, 0.3))
        .build(sub, sfc, &ParameterRegistry::defaults())
        .unwrap_err();
    assert!(matches!(err, ConfigError::PartitionMismatch { .. }));
}

#[test]
fn test_fields_from_other_domain_are_rejected() {
    let (domain, _) = fixture();
    let other = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
    let err = SoilParametersBuilder::new()
        .with_porosity(SpatialField::filled(other.subsurface_space(), 0.45))
        .with_residual_water(0.05)
        .with_saturated_conductivity(1e-5)
        .with_specific_storage(1e-3)
        .with_retention(RetentionCurve::from(VanGenuchten::new(2.0, 2.0).unwrap()))
        .with_albedo(SoilAlbedoParameters::uniform(domain.surface_space(), 0.2, 0.3))
        .build(domain.subsurface_space(), domain.surface_space(), &ParameterRegistry::defaults())
        .unwrap_err();
    assert!(matches!(err, ConfigError::PartitionMismatch { .. }));
}

// ============================================================
// 默认值与覆盖值
// ============================================================

fn scalar_builder(domain: &Domain) -> SoilParametersBuilder {
    SoilParametersBuilder::new()
        .with_porosity(0.45)
        .with_residual_water(0.05)
        .with_saturated_conductivity(1e-5)
        .with_specific_storage(1e-3)
        .with_retention(RetentionCurve::from(VanGenuchten::new(2.0, 2.0).unwrap()))
        .with_albedo(SoilAlbedoParameters::uniform(domain.surface_space(), 0.2, 0.3))
}

#[test]
fn test_omitted_fields_take_registry_defaults() {
    let (domain, _) = fixture();
    let registry = ParameterRegistry::defaults();
    let soil = scalar_builder(&domain)
        .build(domain.subsurface_space(), domain.surface_space(), &registry)
        .unwrap();
    assert_eq!(soil.emissivity, registry.get("emissivity_bare_soil").unwrap());
    assert_eq!(soil.z_0m, registry.get("soil_momentum_roughness_length").unwrap());
    assert_eq!(soil.z_0b, registry.get("soil_scalar_roughness_length").unwrap());

    let snow = SnowParametersBuilder::new()
        .build(domain.surface_space(), 450.0, &registry)
        .unwrap();
    assert_eq!(snow.emissivity, registry.get("snow_emissivity").unwrap());
}

#[test]
fn test_overrides_win_over_defaults() {
    let (domain, _) = fixture();
    let soil = scalar_builder(&domain)
        .with_emissivity(0.9)
        .with_z_0m(0.02)
        .with_z_0b(0.002)
        .build(domain.subsurface_space(), domain.surface_space(), &ParameterRegistry::defaults())
        .unwrap();
    assert_eq!(soil.emissivity, 0.9);
    assert_eq!(soil.z_0m, 0.02);
    assert_eq!(soil.z_0b, 0.002);
}

#[test]
fn test_missing_default_without_override_fails() {
    let (domain, _) = fixture();
    let mut registry = ParameterRegistry::defaults();
    registry.remove("soil_momentum_roughness_length");

    let err = scalar_builder(&domain)
        .build(domain.subsurface_space(), domain.surface_space(), &registry)
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingParameter(name) if name == "soil_momentum_roughness_length"));

    // 提供覆盖值即可
    assert!(scalar_builder(&domain)
        .with_z_0m(0.01)
        .build(domain.subsurface_space(), domain.surface_space(), &registry)
        .is_ok());
}

// ============================================================
// 导出量
// ============================================================

#[test]
fn test_critical_saturation_is_reproducible() {
    let a = VanGenuchten::new(2.6, 2.0).unwrap();
    let b = VanGenuchten::new(2.6, 2.0).unwrap();
    assert_eq!(a.critical_saturation().to_bits(), b.critical_saturation().to_bits());
    assert_eq!(a, b);

    let (domain, source) = fixture();
    let build = || {
        let (sub, sfc) = (domain.subsurface_space(), domain.surface_space());
        soil_parameters(sub, domain.coords(), &source)
            .unwrap()
            .with_albedo(soil_albedo_parameters(sfc, domain.coords(), &source).unwrap())
            .build(sub, sfc, &ParameterRegistry::defaults())
            .unwrap()
    };
    assert_eq!(build().critical_saturation(), build().critical_saturation());
}

#[test]
fn test_critical_saturation_follows_curve() {
    let (domain, source) = fixture();
    let (sub, sfc) = (domain.subsurface_space(), domain.surface_space());
    let soil = soil_parameters(sub, domain.coords(), &source)
        .unwrap()
        .with_albedo(soil_albedo_parameters(sfc, domain.coords(), &source).unwrap())
        .build(sub, sfc, &ParameterRegistry::defaults())
        .unwrap();
    for (curve, &s_c) in soil.retention.data().iter().zip(soil.critical_saturation().data()) {
        assert_eq!(curve.critical_saturation(), s_c);
    }
}

#[test]
fn test_setup_uses_same_source_contract() {
    // 同一数据源可被多个装配共享
    let source: Arc<dyn DataSource> = Arc::new(SyntheticDataSource::new());
    let sim = SimulationConfig::tiny();
    let registry = ParameterRegistry::defaults();
    let a = sl_land::setup_model(&sim, &source, &registry).unwrap();
    let b = sl_land::setup_model(&sim, &source, &registry).unwrap();
    assert_ne!(a.domain().id(), b.domain().id());
    assert_eq!(a.soil.porosity.data(), b.soil.porosity.data());
}
