use clap::Subcommand;
use pomodoro_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dotted key, e.g. "schedule.focus_duration" or "notifications.enabled"
        key: String,
    },
    /// Change one setting; the schedule must stay runnable
    Set {
        /// Dotted key
        key: String,
        /// New value (minutes for durations)
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Print every setting as it is stored in config.toml
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore the 25/5/15/4 schedule
    Reset,
    /// Print the location of config.toml
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // A file that `start` would refuse is never written.
            config.session_config().validate()?;
            config.save()?;
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("schedule reset to defaults in {}", Config::path()?.display());
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
    }
    Ok(())
}
