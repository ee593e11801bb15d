//! Benchmarks for the year loop.
//!
//! A synthetic overlay of waste sites over background polygons, classified,
//! merged and rated for a run of consecutive years.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recharge_estimator::data::{BrmpPolygon, DispositionRecord, WasteSiteRecord};
use recharge_estimator::overlay::StaticOverlay;
use recharge_estimator::{
    DispositionLookup, LifecycleDates, LookupTables, ParcelOverlay, ParcelRow, RechargeLookup, RetData,
    RunConfig, YearBatchDriver,
};

const SOILS: [&str; 3] = ["Qy", "Ri", "XX"];

fn synthetic(sites: i64, parcels_per_site: usize) -> (RetData, ParcelOverlay) {
    let mut rng = StdRng::seed_from_u64(1943);

    let mut recharge = RechargeLookup::new(SOILS.iter().map(|s| s.to_string()).collect());
    recharge.add_row("Shrub-Steppe", "Mature", &[Some(3.6), Some(4.0), Some(4.2)]);
    recharge.add_row("Disturbed", "Bare", &[Some(55.4), Some(63.0), Some(27.0)]);
    recharge.add_row("Barrier/MinRchrg", "Barrier", &[Some(0.1), Some(0.1), None]);

    let mut data = RetData::with_lookups(LookupTables {
        disposition: DispositionLookup::from_rows(vec![
            ("default", "Shrub-Steppe", "Mature"),
            ("Closed in Place", "Barrier/MinRchrg", "Barrier"),
            ("Remove/Treat/Dispose", "Disturbed", "Bare"),
        ])
        .unwrap(),
        recharge,
    });
    for fid in 0..8 {
        data.brmp.insert(fid, BrmpPolygon { cover_type: Some("Shrub-Steppe".to_string()) });
    }

    let mut rows = Vec::new();
    for site in 0..sites {
        let site_id = format!("216-S-{}", site);
        let start = rng.gen_range(1944..1990);
        let end = start + rng.gen_range(0..20);
        let current = end + rng.gen_range(1..15);
        let fin = current + rng.gen_range(1..30);
        data.ehsit.insert(
            site,
            WasteSiteRecord {
                hazsite_id: Some(site),
                site_num: site_id.clone(),
            },
        );
        data.dispositions.insert(
            site_id,
            DispositionRecord {
                dates: LifecycleDates::new(Some(start), Some(end), Some(current), Some(fin)),
                actual_disposition: Some("Remove/Treat/Dispose".to_string()),
                tpa_disposition: Some("Closed in Place".to_string()),
                disposition: None,
            },
        );

        for i in 0..parcels_per_site {
            rows.push(ParcelRow {
                soil_type: Some(SOILS[rng.gen_range(0..SOILS.len())].to_string()),
                brmp_fid: Some(rng.gen_range(0..8)),
                ehsit_fid: Some(site),
                ..ParcelRow::new(format!("p{}_{}", site, i))
            });
        }
    }

    (data, ParcelOverlay::new(rows))
}

fn year_batch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("year_batch");
    group.sample_size(10);

    for sites in [100_i64, 1_000] {
        let (data, overlay) = synthetic(sites, 4);
        let source = StaticOverlay(overlay);
        let config = RunConfig {
            years: (1943..=2000).collect(),
            ..Default::default()
        };

        group.bench_function(format!("sites_{sites}_years_58"), |b| {
            b.iter(|| {
                let mut driver = match YearBatchDriver::new(data.clone(), &config) {
                    Ok(driver) => driver,
                    Err(_) => return,
                };
                let mut parcels = 0usize;
                let result = driver.run(&source, |output| {
                    parcels += output.records.len();
                    Ok(())
                });
                black_box((result.is_ok(), parcels));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, year_batch_benchmark);
criterion_main!(benches);
