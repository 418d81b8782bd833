//! Interactive render loop.
//!
//! Stands in for the selection UI: prompts for a state and a year, renders,
//! writes the bundle, and optionally records the view the user ended on so
//! the next render of that state starts there.

use std::path::Path;

use caps_map_municipality_models::{LastActiveView, LatLng, StateCode};
use dialoguer::{Confirm, Input, Select};

use crate::{FileSession, bundle_path, write_bundle};

/// Runs the prompt loop until the user declines another render.
///
/// # Errors
///
/// Returns an error if a prompt fails, the output directory cannot be
/// created, or a render fails for a reason other than missing geometry.
pub fn run(session: &mut FileSession, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out_dir)?;

    let labels: Vec<String> = StateCode::ALL
        .iter()
        .map(|state| format!("{state} - {}", state.name()))
        .collect();
    let default_state = StateCode::ALL
        .iter()
        .position(|&s| s == StateCode::Sp)
        .unwrap_or(0);

    loop {
        let idx = Select::new()
            .with_prompt("State")
            .items(&labels)
            .default(default_state)
            .interact()?;
        let state = StateCode::ALL[idx];

        let years = session.config().years;
        let year: i32 = Input::new()
            .with_prompt(format!("Year ({}-{})", years.min, years.max))
            .default(years.default)
            .validate_with(|y: &i32| {
                if years.contains(*y) {
                    Ok(())
                } else {
                    Err(format!("must be within {}-{}", years.min, years.max))
                }
            })
            .interact_text()?;

        match session.render(state, year) {
            Ok(bundle) => {
                let path = bundle_path(out_dir, state, year);
                write_bundle(&bundle, &path)?;
                println!(
                    "{state} {year}: {} municipalities, {} matched, population {} -> {}",
                    bundle.features.features.len(),
                    bundle.report.matched,
                    bundle
                        .population_year
                        .map_or_else(|| "none".to_string(), |y| y.to_string()),
                    path.display()
                );

                if Confirm::new()
                    .with_prompt("Record the view you ended on for this state?")
                    .default(false)
                    .interact()?
                {
                    let view = prompt_view(bundle.viewport.center, bundle.viewport.zoom)?;
                    session.update_viewport(state, view);
                }
            }
            Err(e) if e.is_missing_geometry() => {
                println!("No geometry available for {state}");
            }
            Err(e) => return Err(e.into()),
        }

        if !Confirm::new()
            .with_prompt("Render another?")
            .default(true)
            .interact()?
        {
            break;
        }
    }

    Ok(())
}

fn prompt_view(center: [f64; 2], zoom: u8) -> Result<LastActiveView, Box<dyn std::error::Error>> {
    let lat: f64 = Input::new()
        .with_prompt("Latitude")
        .default(center[0])
        .interact_text()?;
    let lng: f64 = Input::new()
        .with_prompt("Longitude")
        .default(center[1])
        .interact_text()?;
    let zoom: f64 = Input::new()
        .with_prompt("Zoom")
        .default(f64::from(zoom))
        .interact_text()?;

    Ok(LastActiveView {
        center: LatLng { lat, lng },
        zoom,
    })
}
