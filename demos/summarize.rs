use std::str::FromStr;

use forecast::Forecast;
use miette::{miette, IntoDiagnostic, Result};

fn main() -> Result<()> {
    let file = std::env::args().nth(1).ok_or_else(|| miette!("Missing filename"))?;
    let raw = std::fs::read_to_string(file).into_diagnostic()?;

    let forecast = Forecast::from_str(&raw)?;

    print!("{}", forecast.overview()?);
    println!();
    print!("{}", forecast.daily_breakdown()?);

    Ok(())
}
