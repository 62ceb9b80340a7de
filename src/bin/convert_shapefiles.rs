//! Convert Cumberland County flood shapefiles to GeoJSON (WGS84).
//! Converts at 0.1 m increments for both FundySide and NorthSide, then the
//! two auxiliary ocean point files.

use anyhow::Result;
use floodprep::geometric::flood::FloodConverter;

fn main() -> Result<()> {
    let mut converter = FloodConverter::new(None, None);
    converter.run()?;

    println!("\n=== Done: {} files converted ===", converter.converted);
    if !converter.errors.is_empty() {
        println!("Errors/skips: {}", converter.errors.len());
        for error in &converter.errors {
            println!("  - {}", error);
        }
    }
    Ok(())
}
