use geo_radius::{
    AddressRecord, Coordinate, DistanceAlgorithm, DistanceUnit, GeoSearchError,
    InMemoryAddressStore, RadiusSearchService, SearchOptions, decimal_to_dms,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), GeoSearchError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = Arc::new(InMemoryAddressStore::from_records([
        AddressRecord::new(1, "user", "1")
            .at(Coordinate::new(40.73, -73.935)?)
            .label("Home"),
        AddressRecord::new(2, "user", "1")
            .at(Coordinate::new(40.9, -74.5)?)
            .label("Warehouse"),
    ]));
    let service = RadiusSearchService::builder().store(store).build()?;

    let report = service.optimize_store();
    println!(
        "Index created: {}, uses index: {:?}",
        report.index_created(),
        report.query_uses_index
    );

    let nyc = Coordinate::new(40.7128, -74.0060)?;
    println!(
        "Center: {} ({}, {})",
        nyc,
        decimal_to_dms(nyc.latitude()),
        decimal_to_dms(nyc.longitude())
    );

    for algorithm in DistanceAlgorithm::ALL {
        let options = SearchOptions::new().algorithm(algorithm);
        let result = service.find_within_radius(nyc, 10.0, DistanceUnit::Kilometers, &options)?;
        for hit in &result {
            println!(
                "{:>13}: #{} {} at {:.3} km",
                algorithm.as_str(),
                hit.record.id,
                hit.record.label.as_deref().unwrap_or("-"),
                hit.distance
            );
        }
    }

    let nearest = service.find_nearest(nyc, 2, DistanceUnit::Miles, &SearchOptions::new())?;
    let nearest_ids: Vec<(u64, f64)> = nearest.iter().map(|h| (h.record.id, h.distance)).collect();
    println!("Nearest (miles): {:?}", nearest_ids);

    let stats = service.get_spatial_stats()?;
    println!("Coverage: {}% of {} records", stats.coordinate_coverage_percent, stats.total_records);

    Ok(())
}
