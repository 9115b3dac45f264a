//! Benchmarks for the curveforge-curves calibration pipeline.
//!
//! Run with: cargo bench -p curveforge-curves

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use curveforge_core::{Currency, Date, DayCount, Tenor};
use curveforge_curves::prelude::*;
use curveforge_math::{Extrapolation, Interpolation};

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn valuation() -> Date {
    Date::from_ymd(2024, 3, 15).unwrap()
}

fn ois_sources() -> (InMemoryConfigurationSource, InMemorySnapshot) {
    let tenors = [
        ("3M", Tenor::months(3), 0.0300),
        ("6M", Tenor::months(6), 0.0308),
        ("1Y", Tenor::years(1), 0.0315),
        ("2Y", Tenor::years(2), 0.0330),
        ("3Y", Tenor::years(3), 0.0338),
        ("5Y", Tenor::years(5), 0.0350),
        ("7Y", Tenor::years(7), 0.0358),
        ("10Y", Tenor::years(10), 0.0365),
    ];

    let mut nodes = Vec::new();
    let mut snapshot = InMemorySnapshot::new();
    for (label, tenor, quote) in tenors {
        let id = format!("USD-OIS-{label}");
        nodes.push(CurveNodeWithId {
            id: MarketDataId::new(&id),
            node: CurveNode::Cash {
                currency: Currency::USD,
                start: Tenor::ZERO,
                tenor,
                day_count: DayCount::Act360,
                index: None,
            },
        });
        snapshot = snapshot.with_value("USD-OIS", &id, quote);
    }

    let config = CurveConstructionConfiguration::new(
        "USD-BASE",
        vec![CurveGroupConfiguration::single(
            "USD-OIS",
            vec![
                CurveRole::Discounting(Currency::USD),
                CurveRole::OvernightForward(OvernightIndex::new("SOFR", Currency::USD)),
            ],
        )],
    );
    let configs = InMemoryConfigurationSource::new()
        .with_configuration(config)
        .with_definition(
            "USD-OIS",
            CurveDefinition::Interpolated {
                interpolation: Interpolation::Linear,
                left: Extrapolation::Flat,
                right: Extrapolation::Flat,
            },
        )
        .with_specification(CurveSpecification {
            curve_name: "USD-OIS".into(),
            nodes,
        });
    (configs, snapshot)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_single_group_bootstrap(c: &mut Criterion) {
    let (configs, snapshot) = ois_sources();
    let fixings = InMemoryFixings::new();
    let published = InMemoryBundles::new();
    let driver = CalibrationDriver::new(&configs, &snapshot, &fixings, &published);
    let request = ConstructionRequest::new("USD-BASE", valuation());
    let variant = VariantCapabilities::discounting();

    c.bench_function("bootstrap_ois_8_nodes", |b| {
        b.iter(|| driver.construct(black_box(&request), &variant).unwrap())
    });
}

fn bench_curve_lookups(c: &mut Criterion) {
    let (configs, snapshot) = ois_sources();
    let fixings = InMemoryFixings::new();
    let published = InMemoryBundles::new();
    let driver = CalibrationDriver::new(&configs, &snapshot, &fixings, &published);
    let result = driver
        .construct(
            &ConstructionRequest::new("USD-BASE", valuation()),
            &VariantCapabilities::discounting(),
        )
        .unwrap();

    let mut group = c.benchmark_group("provider_lookups");
    group.bench_function("discount_factor", |b| {
        b.iter(|| {
            result
                .provider
                .discount_factor(Currency::USD, black_box(5.0))
                .unwrap()
        })
    });
    group.bench_function("forward_rate", |b| {
        let key = ForwardRateKey::Overnight(OvernightIndex::new("SOFR", Currency::USD));
        b.iter(|| {
            result
                .provider
                .forward_rate(&key, black_box(2.0), 2.25, 0.25)
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(calibration, bench_single_group_bootstrap, bench_curve_lookups,);

criterion_main!(calibration);
