//! Demonstration of latitude/longitude grid generation

use globe_regions::*;

fn main() -> Result<()> {
    for (radius, lat_step, lon_step) in [(101.0, 10.0, 10.0), (101.0, 30.0, 45.0)] {
        let lines = graticule(radius, lat_step, lon_step)?;
        let latitudes = lines.iter().filter(|l| l.kind == LineKind::Latitude).count();
        let points: usize = lines.iter().map(|l| l.points.len()).sum();

        println!(
            "radius {} every {}°/{}°: {} latitude lines, {} longitude lines, {} points",
            radius,
            lat_step,
            lon_step,
            latitudes,
            lines.len() - latitudes,
            points
        );
    }

    let lines = graticule(1.0, 40.0, 90.0)?;
    if let Some(equator) = lines.iter().find(|l| l.kind == LineKind::Latitude && l.degrees == 0.0) {
        let sample = equator.to_f32();
        println!("\nEquator starts at {:?}", sample[0]);
        println!("which unprojects to {:?}", unproject(equator.points[0]));
    }

    Ok(())
}
