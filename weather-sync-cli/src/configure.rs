use anyhow::{Context, Result};
use inquire::{Confirm, CustomType, Text, validator::Validation};
use weather_sync_core::{Config, Coordinate, scheduler::validate_interval};

/// Walk through the settings interactively and save them.
pub fn run(mut config: Config) -> Result<()> {
    config.server.base_url = Text::new("Server base URL:")
        .with_default(&config.server.base_url)
        .prompt()
        .context("Failed to read server URL")?;

    config.retry.max_attempts = CustomType::<u32>::new("Attempts per request:")
        .with_default(config.retry.max_attempts)
        .with_validator(|n: &u32| {
            Ok(if *n >= 1 {
                Validation::Valid
            } else {
                Validation::Invalid("At least one attempt is required".into())
            })
        })
        .prompt()
        .context("Failed to read retry attempts")?;

    config.retry.delay_ms = CustomType::<u64>::new("Delay between attempts (ms):")
        .with_default(config.retry.delay_ms)
        .prompt()
        .context("Failed to read retry delay")?;

    config.scheduler.interval_secs = CustomType::<u64>::new("Automatic update interval (s):")
        .with_default(config.scheduler.interval_secs)
        .with_validator(|n: &u64| {
            Ok(match validate_interval(*n) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()
        .context("Failed to read update interval")?;

    let set_location = Confirm::new("Set a default location?")
        .with_default(config.location.is_none())
        .prompt()
        .context("Failed to read answer")?;

    if set_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Failed to read longitude")?;
        config.set_default_coordinate(Coordinate::new(latitude, longitude)?);
    }

    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
